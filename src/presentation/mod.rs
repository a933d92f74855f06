//! Askama views for the published artifacts.

pub mod views;
