use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid project id `{value}`")]
    InvalidId { value: String },
    #[error("invalid username `{value}`: {reason}")]
    InvalidUsername { value: String, reason: &'static str },
    #[error("project data has no media entry to attribute")]
    MissingMediaAttribution,
    #[error("project data could not be decoded: {message}")]
    InvalidProjectData { message: String },
    #[error("public base url `{value}` cannot carry a path")]
    InvalidPublicBase { value: String },
}

impl DomainError {
    pub fn invalid_id(value: impl ToString) -> Self {
        Self::InvalidId {
            value: value.to_string(),
        }
    }

    pub fn invalid_username(value: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidUsername {
            value: value.into(),
            reason,
        }
    }

    pub fn invalid_project_data(message: impl Into<String>) -> Self {
        Self::InvalidProjectData {
            message: message.into(),
        }
    }
}
