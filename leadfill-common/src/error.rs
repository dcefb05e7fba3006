//! Shared error type for Leadfill crates

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Startup failures shared by Leadfill services
///
/// Request-time errors belong to each service's own error type; this one
/// only covers configuration that a service cannot start with.
#[derive(Error, Debug)]
pub enum Error {
    /// Config file unreadable or invalid, or a required setting unusable
    #[error("Configuration error: {0}")]
    Config(String),
}
