//! Terminal dashboard for the EasyStonks crypto backend: market rankings,
//! quotes and price / 24h-change alerts.

pub mod api;
pub mod commands;
pub mod config;
pub mod engine;
pub mod error;
pub mod feed;
pub mod format;
pub mod ui;

pub use error::{Result, StonksError};
