//! # Achievagrad Common Library
//!
//! Shared code for the proxy and the client:
//! - Game catalog model (`GameSummary`)
//! - Error taxonomy shared across the HTTP boundary
//! - TOML configuration loading and root folder resolution
//! - Logging bootstrap for the binaries

pub mod config;
pub mod error;
pub mod logging;
pub mod models;

pub use error::{Error, Result};
pub use models::{Cover, GameSummary, Genre};
