use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use tracing::info;
use valet_api_types::{HealthResponse, PublishRequestBody, PublishResponse};

use crate::{
    application::{artifacts::PublishRequest, error::AppError},
    domain::error::DomainError,
};

use super::HttpState;

pub async fn healthcheck() -> Json<HealthResponse> {
    Json(HealthResponse::okay(env!("CARGO_PKG_VERSION")))
}

pub async fn publish_project(
    State(state): State<HttpState>,
    Path(id): Path<String>,
    body: Result<Json<PublishRequestBody>, JsonRejection>,
) -> Result<Json<PublishResponse>, AppError> {
    let Json(body) = body.map_err(|rejection| AppError::validation(rejection.body_text()))?;

    let project_id: i64 = id
        .parse()
        .map_err(|_| AppError::Domain(DomainError::invalid_id(&id)))?;

    let project = state
        .projects
        .find_by_id(project_id)
        .await?
        .ok_or_else(|| AppError::project_not_found(project_id))?;

    let request = PublishRequest {
        project,
        actor_username: body.username,
        app_hostname: state.app_hostname.clone(),
    };
    let result = state.publisher.publish(&request).await?;

    info!(
        target = "valet::http::publish",
        project_id,
        username = %request.actor_username,
        "publish request served"
    );

    Ok(Json(PublishResponse::new(
        result.public_shell_url,
        result.public_embed_url,
    )))
}
