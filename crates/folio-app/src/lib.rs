//! NGX portfolio dashboard application.
//!
//! Loads configuration, builds the NGX and spreadsheet clients and serves
//! the dashboard with market-hours auto-refresh.

pub mod app;
pub mod config;
pub mod error;

pub use app::Application;
pub use config::AppConfig;
pub use error::{AppError, AppResult};
