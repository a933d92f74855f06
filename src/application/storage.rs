//! Object-store port used by the publish pipeline.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// Status code the store answers a successful overwrite with.
pub const PUT_SUCCESS_STATUS: u16 = 200;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("object store returned HTTP {status}")]
    Status { status: u16 },
    #[error("object store request failed: {message}")]
    Transport { message: String },
}

impl StorageError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            StorageError::Status { status } => Some(*status),
            StorageError::Transport { .. } => None,
        }
    }
}

/// Map a raw response status onto the upload outcome. Only the exact
/// success code counts; other 2xx answers are treated as failures.
pub fn classify_status(status: u16) -> Result<(), StorageError> {
    if status == PUT_SUCCESS_STATUS {
        Ok(())
    } else {
        Err(StorageError::Status { status })
    }
}

/// Publicly readable key/blob store with overwrite semantics.
///
/// Implementations issue exactly one request per call: no retries, and the
/// object is always written with a public-read ACL and a `Content-Length`
/// equal to `payload.len()`.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put_object(
        &self,
        key: &str,
        payload: Bytes,
        content_type: &str,
    ) -> Result<(), StorageError>;
}
