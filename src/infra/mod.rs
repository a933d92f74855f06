//! Infrastructure adapters and runtime bootstrap.

pub mod error;
pub mod http;
pub mod projects;
pub mod storage;
pub mod telemetry;
