//! MTA ridership recovery dashboard
//!
//! Loads the daily ridership file, derives recovery metrics from it and
//! serves them as Plotly figures behind a small axum app.

pub mod api;
pub mod charts;
pub mod config;
pub mod error;
pub mod format;
pub mod loader;
pub mod metrics;
pub mod models;
