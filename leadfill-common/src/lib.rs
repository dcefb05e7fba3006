//! # Leadfill Common Library
//!
//! Shared code for Leadfill services including:
//! - Error types
//! - Configuration file discovery and loading
//! - API key resolution (environment and TOML)
//! - Logging configuration

pub mod config;
pub mod error;

pub use error::{Error, Result};
