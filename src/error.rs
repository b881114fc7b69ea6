// src/error.rs

//! Unified error handling for the reporting core.

use std::fmt;

use thiserror::Error;

/// Result type alias for archive operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// No authenticated session; the caller redirects to login
    #[error("No authenticated session")]
    Unauthenticated,

    /// Role lookup errored or returned no row
    #[error("Role resolution failed for user '{user}': {message}")]
    RoleResolutionFailed { user: String, message: String },

    /// Role resolved but not acceptable for the requested view
    #[error("Access denied for role '{role}'")]
    AccessDenied { role: String },

    /// Underlying data query failed
    #[error("Fetch failed for {context}: {message}")]
    FetchFailed { context: String, message: String },

    /// A fetch completed after a newer one was started
    #[error("Stale fetch discarded (generation {stale}, latest {latest})")]
    StaleGeneration { stale: u64, latest: u64 },

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[cfg(feature = "rest")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing failed
    #[cfg(feature = "rest")]
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    /// Create a role resolution error.
    pub fn role_resolution(user: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::RoleResolutionFailed {
            user: user.into(),
            message: message.to_string(),
        }
    }

    /// Create an access denial for a resolved role label.
    pub fn access_denied(role: impl Into<String>) -> Self {
        Self::AccessDenied { role: role.into() }
    }

    /// Create a fetch error with context.
    pub fn fetch(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::FetchFailed {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Whether this error blocks the view for authorization reasons.
    ///
    /// A failed role lookup counts as a denial: the gate never fails open.
    pub fn is_denial(&self) -> bool {
        matches!(
            self,
            Self::AccessDenied { .. } | Self::RoleResolutionFailed { .. }
        )
    }
}
