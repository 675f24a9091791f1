//! API route configuration.

use axum::Router;
use axum::routing::{delete, get, post, put};
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use super::handlers::{self, HealthResponse};
use super::state::AppState;
use super::v1::{
    self, AdminUserResponse, AgentLogResponse, AgentResponse, CreateAdminUserRequest,
    CreateAgentRequest, CreateExpenseRequest, CustomerRequest, ErrorResponse, ExpenseResponse,
    GeneratePaymentLinkRequest, ModulePermissionBody, PaginatedAgentLogs, PaymentLinkResponse,
    PermissionsBody, SendOtpRequest, SendOtpResponse, SessionResponse, VerifyOtpRequest,
    VerifyOtpResponse, WebhookResponse,
};
use crate::db::Database;
use crate::mcp::mcp_routes;

/// Build routes with generic database type.
///
/// Applies the turbofish to every handler that is generic over `Database`.
macro_rules! routes {
    ($D:ty => {
        $($method:ident $path:literal => $($handler:ident)::+),* $(,)?
    }) => {{
        let router = Router::new();
        $(
            let router = router.route($path, $method($($handler)::+::<$D>));
        )*
        router
    }};
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "crmhub API",
        version = "0.1.0",
        description = "CRM backend: agent administration, payments, OTP login and MCP tool servers",
        license(name = "GPL-2.0")
    ),
    paths(
        handlers::health,
        v1::list_agents,
        v1::get_agent,
        v1::create_agent,
        v1::delete_agent,
        v1::get_permissions,
        v1::set_permissions,
        v1::list_agent_logs,
        v1::list_admin_users,
        v1::create_admin_user,
        v1::create_expense,
        v1::send_otp,
        v1::verify_otp,
        v1::generate_payment_link,
        v1::razorpay_webhook,
        v1::cashfree_webhook,
    ),
    components(
        schemas(
            HealthResponse,
            AgentResponse,
            CreateAgentRequest,
            ModulePermissionBody,
            PermissionsBody,
            AgentLogResponse,
            PaginatedAgentLogs,
            AdminUserResponse,
            CreateAdminUserRequest,
            CreateExpenseRequest,
            ExpenseResponse,
            SendOtpRequest,
            SendOtpResponse,
            VerifyOtpRequest,
            VerifyOtpResponse,
            SessionResponse,
            CustomerRequest,
            GeneratePaymentLinkRequest,
            PaymentLinkResponse,
            WebhookResponse,
            ErrorResponse,
        )
    ),
    tags(
        (name = "system", description = "System health"),
        (name = "agents", description = "AI agents, permissions and audit log"),
        (name = "admin-users", description = "CRM staff accounts"),
        (name = "expenses", description = "Standalone expense endpoint"),
        (name = "auth", description = "Mobile OTP login"),
        (name = "payments", description = "Payment links and gateway webhooks")
    )
)]
pub struct ApiDoc;

/// Create the application router.
///
/// MCP servers are mounted at `/mcp/<module>`; `ct` stops their sessions on
/// shutdown.
pub fn create_router<D: Database + 'static>(state: AppState<D>, ct: CancellationToken) -> Router {
    let api = ApiDoc::openapi();

    let system_routes = Router::new().route("/health", get(handlers::health));

    let admin_routes = routes!(D => {
        get "/api/v1/agents" => v1::list_agents,
        post "/api/v1/agents" => v1::create_agent,
        get "/api/v1/agents/{id}" => v1::get_agent,
        delete "/api/v1/agents/{id}" => v1::delete_agent,
        get "/api/v1/agents/{id}/permissions" => v1::get_permissions,
        put "/api/v1/agents/{id}/permissions" => v1::set_permissions,
        get "/api/v1/agent-logs" => v1::list_agent_logs,
        get "/api/v1/admin-users" => v1::list_admin_users,
        post "/api/v1/admin-users" => v1::create_admin_user,
    });

    // Edge endpoints keep their bare paths
    let edge_routes = routes!(D => {
        post "/create-expense" => v1::create_expense,
        post "/send-otp" => v1::send_otp,
        post "/verify-otp" => v1::verify_otp,
        post "/generate-payment-link" => v1::generate_payment_link,
        post "/razorpay-webhook" => v1::razorpay_webhook,
        post "/cashfree-webhook" => v1::cashfree_webhook,
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    system_routes
        .merge(admin_routes)
        .merge(edge_routes)
        .merge(mcp_routes(state.db_arc(), ct))
        .merge(Scalar::with_url("/docs", api))
        .with_state(state)
        .layer(cors)
}
