//! Wire types for the valet publish API.
//!
//! Field names follow the JSON contract consumed by the editor front-end, so
//! they are camelCase on the wire.

use serde::{Deserialize, Serialize};

/// Marker value carried in the `error` field of successful responses.
pub const OKAY: &str = "okay";

/// Body of `POST /api/publish/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishRequestBody {
    pub username: String,
}

/// Successful publish outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishResponse {
    pub error: String,
    pub public_shell_url: String,
    pub public_embed_url: String,
}

impl PublishResponse {
    pub fn new(public_shell_url: impl Into<String>, public_embed_url: impl Into<String>) -> Self {
        Self {
            error: OKAY.to_string(),
            public_shell_url: public_shell_url.into(),
            public_embed_url: public_embed_url.into(),
        }
    }
}

/// Failure body; `error` is a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub http: String,
    pub version: String,
}

impl HealthResponse {
    pub fn okay(version: impl Into<String>) -> Self {
        Self {
            http: OKAY.to_string(),
            version: version.into(),
        }
    }
}
