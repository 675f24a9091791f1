//! MCP Streamable HTTP service creation
//!
//! This module provides functions to create the per-module MCP services
//! that can be integrated with an Axum router.

use std::sync::Arc;

use axum::Router;
use rmcp::transport::streamable_http_server::{
    StreamableHttpServerConfig, StreamableHttpService, session::local::LocalSessionManager,
};
use tokio_util::sync::CancellationToken;

use crate::db::Database;

use super::server::McpServer;
use super::tools::{AppointmentTools, ContactTools, ExpenseTools, LeadTools, ModuleTools, TaskTools};

/// Create the Streamable HTTP service for one module.
///
/// Sessions are issued on `initialize` and kept in memory by
/// `LocalSessionManager`; they do not survive a restart.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use axum::Router;
/// use tokio_util::sync::CancellationToken;
/// # use crmhub::db::SqliteDatabase;
/// # use crmhub::mcp::{create_mcp_service, tools::TaskTools};
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let db = Arc::new(SqliteDatabase::in_memory().await?);
/// let service = create_mcp_service::<_, TaskTools<_>>(db, CancellationToken::new());
///
/// let app: Router = Router::new().nest_service("/mcp/tasks-server", service);
/// # Ok(())
/// # }
/// ```
pub fn create_mcp_service<D, T>(
    db: Arc<D>,
    cancellation_token: CancellationToken,
) -> StreamableHttpService<McpServer<D, T>>
where
    D: Database + 'static,
    T: ModuleTools<D>,
{
    // Service factory: one McpServer per session.
    let service_factory =
        move || -> Result<McpServer<D, T>, std::io::Error> { Ok(McpServer::new(Arc::clone(&db))) };

    let config = StreamableHttpServerConfig {
        stateful_mode: true,
        cancellation_token,
        ..Default::default()
    };

    StreamableHttpService::new(
        service_factory,
        LocalSessionManager::default().into(),
        config,
    )
}

/// Mount every module server under `/mcp/<module-name>`.
pub fn mcp_routes<S, D>(db: Arc<D>, cancellation_token: CancellationToken) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    D: Database + 'static,
{
    fn mount<S, D, T>(
        router: Router<S>,
        db: &Arc<D>,
        cancellation_token: &CancellationToken,
    ) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
        D: Database + 'static,
        T: ModuleTools<D>,
    {
        let path = format!("/mcp/{}", T::MODULE.name());
        let service = create_mcp_service::<D, T>(Arc::clone(db), cancellation_token.child_token());
        router.nest_service(&path, service)
    }

    let router = Router::new();
    let router = mount::<S, D, TaskTools<D>>(router, &db, &cancellation_token);
    let router = mount::<S, D, ExpenseTools<D>>(router, &db, &cancellation_token);
    let router = mount::<S, D, AppointmentTools<D>>(router, &db, &cancellation_token);
    let router = mount::<S, D, LeadTools<D>>(router, &db, &cancellation_token);
    mount::<S, D, ContactTools<D>>(router, &db, &cancellation_token)
}
