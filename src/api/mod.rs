//! HTTP server: REST administration API, gateway/OTP edge endpoints and the
//! per-module MCP servers.

mod handlers;
pub mod routes;
mod state;
pub mod v1;


use std::net::IpAddr;

use miette::Diagnostic;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::db::Database;
use crate::payments::DEFAULT_API_URL;

pub use state::AppState;

/// Errors starting or running the API server.
#[derive(Error, Diagnostic, Debug)]
pub enum ApiError {
    #[error("Failed to bind to {addr}")]
    #[diagnostic(
        code(crmhub::api::bind_failed),
        help("Is another process using this port? Try --port or CRMHUB_PORT.")
    )]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error")]
    #[diagnostic(code(crmhub::api::server_error))]
    Server {
        #[source]
        source: std::io::Error,
    },
}

/// API server configuration
pub struct Config {
    /// Host address to bind to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::from([0, 0, 0, 0]),
            port: 3000,
        }
    }
}

/// Credentials and endpoints of the external services.
///
/// Every field is optional: a missing gateway key disables link generation
/// (503), a missing webhook secret disables signature checks, and a missing
/// OTP webhook only logs the code.
#[derive(Debug, Clone)]
pub struct IntegrationConfig {
    pub razorpay_key_id: Option<String>,
    pub razorpay_key_secret: Option<String>,
    pub razorpay_webhook_secret: Option<String>,
    pub razorpay_api_url: String,
    pub cashfree_webhook_secret: Option<String>,
    pub otp_webhook_url: Option<String>,
}

impl Default for IntegrationConfig {
    fn default() -> Self {
        Self {
            razorpay_key_id: None,
            razorpay_key_secret: None,
            razorpay_webhook_secret: None,
            razorpay_api_url: DEFAULT_API_URL.to_string(),
            cashfree_webhook_secret: None,
            otp_webhook_url: None,
        }
    }
}

/// Initialize tracing subscriber with env filter
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "crmhub=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Run the API server until Ctrl-C.
pub async fn run<D: Database + 'static>(
    config: Config,
    integrations: IntegrationConfig,
    db: D,
) -> Result<(), ApiError> {
    init_tracing();

    let ct = CancellationToken::new();
    let state = AppState::new(db, integrations);
    let app = routes::create_router(state, ct.clone()).layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|source| ApiError::Bind {
            addr: addr.clone(),
            source,
        })?;
    info!("API server listening on http://{}", addr);
    info!("MCP servers mounted under http://{}/mcp/<module>", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
            ct.cancel();
        })
        .await
        .map_err(|source| ApiError::Server { source })
}
