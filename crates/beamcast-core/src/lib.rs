//! Shared foundations for the beamcast realtime server.
//!
//! Provides:
//! - Configuration schemas loaded from TOML files and environment variables
//! - The unified [`error::AppError`] type used across all crates

pub mod config;
pub mod error;
