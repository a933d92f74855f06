//! Publishes interactive projects as static embed artifacts.
//!
//! A publish renders six HTML documents from one project record, writes
//! them to an object store under keys derived from the author and the
//! project id, and returns the public shell and embed URLs.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
pub mod presentation;
pub mod util;
