mod handlers;
mod middleware;

use std::{net::SocketAddr, sync::Arc};

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};
use tracing::{info, warn};

use crate::{
    application::{error::AppError, publish::PublishService, repos::ProjectsRepo},
    infra::error::InfraError,
};

pub use middleware::REQUEST_ID_HEADER;

#[derive(Clone)]
pub struct HttpState {
    pub projects: Arc<dyn ProjectsRepo>,
    pub publisher: Arc<PublishService>,
    pub app_hostname: String,
}

pub fn build_router(state: HttpState) -> Router {
    Router::new()
        .route("/healthcheck", get(handlers::healthcheck))
        .route("/api/publish/{id}", post(handlers::publish_project))
        .with_state(state)
        .layer(axum_middleware::from_fn(middleware::log_responses))
        .layer(axum_middleware::from_fn(middleware::set_request_context))
}

/// Serve `router` on `addr` until Ctrl-C.
pub async fn serve(addr: SocketAddr, router: Router) -> Result<(), AppError> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(target = "valet::http", %addr, "listening");

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(target = "valet::http", error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!(target = "valet::http", "shutdown signal received");
}
