use std::error::Error as StdError;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use valet_api_types::ErrorResponse;

use crate::{
    application::{publish::PublishError, repos::RepoError},
    domain::error::DomainError,
    infra::error::InfraError,
};

/// Diagnostic chain attached to error responses for the response logger.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub status: StatusCode,
    pub messages: Vec<String>,
    /// Storage key of the artifact whose upload sank a publish.
    pub failed_key: Option<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, status: StatusCode, error: &dyn StdError) -> Self {
        let mut messages = Vec::new();
        messages.push(error.to_string());
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self {
            source,
            status,
            messages,
            failed_key: None,
        }
    }

    pub fn with_failed_key(mut self, key: Option<&str>) -> Self {
        self.failed_key = key.map(str::to_string);
        self
    }

    pub fn attach(self, response: &mut Response) {
        response.extensions_mut().insert(self);
    }
}

/// Error rendered as `{"error": message}` with the report attached for the
/// response logger.
#[derive(Debug)]
pub struct HttpError {
    status: StatusCode,
    public_message: String,
    report: ErrorReport,
}

impl HttpError {
    pub fn new(status: StatusCode, public_message: impl Into<String>, report: ErrorReport) -> Self {
        Self {
            status,
            public_message: public_message.into(),
            report,
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse::new(self.public_message));
        let mut response = (self.status, body).into_response();
        self.report.attach(&mut response);
        response
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error(transparent)]
    Publish(PublishError),
    #[error("project {id} not found")]
    ProjectNotFound { id: String },
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl From<PublishError> for AppError {
    fn from(error: PublishError) -> Self {
        match error {
            PublishError::Domain(err) => AppError::Domain(err),
            other => AppError::Publish(other),
        }
    }
}

impl AppError {
    pub fn project_not_found(id: impl ToString) -> Self {
        Self::ProjectNotFound { id: id.to_string() }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ProjectNotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Domain(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Repo(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Publish(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Infra(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn presentation_message(&self) -> String {
        match self {
            AppError::ProjectNotFound { .. } => "Project not found".to_string(),
            AppError::Domain(err) => err.to_string(),
            AppError::Validation(message) => message.clone(),
            AppError::Publish(err) => err.to_string(),
            AppError::Repo(_) => "Project store unavailable".to_string(),
            AppError::Infra(InfraError::Configuration { .. }) => {
                "Service misconfigured".to_string()
            }
            AppError::Infra(_) | AppError::Unexpected(_) => {
                "Unexpected error occurred".to_string()
            }
        }
    }

    fn failed_key(&self) -> Option<&str> {
        match self {
            AppError::Publish(PublishError::Artifact { key, .. }) => Some(key.as_str()),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let report = ErrorReport::from_error("application::error::AppError", status, &self)
            .with_failed_key(self.failed_key());
        HttpError::new(status, self.presentation_message(), report).into_response()
    }
}
