//! Application services layer.

pub mod artifacts;
pub mod error;
pub mod popcorn;
pub mod publish;
pub mod repos;
pub mod storage;
