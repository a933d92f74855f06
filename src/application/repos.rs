//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entities::ProjectRecord;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("stored record is corrupt: {message}")]
    Integrity { message: String },
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }

    pub fn integrity(message: impl Into<String>) -> Self {
        Self::Integrity {
            message: message.into(),
        }
    }
}

#[async_trait]
pub trait ProjectsRepo: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<ProjectRecord>, RepoError>;
}
