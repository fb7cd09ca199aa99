//! Error handling for the sensor session engine
//!
//! This module defines the engine-wide error type and a Result alias used
//! throughout the crate.

use thiserror::Error;

/// Main error type for engine operations
#[derive(Error, Debug)]
pub enum EngineError {
    /// A protocol payload failed to decode into its typed record
    #[error("Decode error: {0}")]
    Decode(String),

    /// A protocol request (GET/subscribe) returned a non-success status
    #[error("Request error on {path}: {message}")]
    Request { path: String, message: String },

    /// Errors raised by the transport/discovery collaborator
    #[error("Transport error: {0}")]
    Transport(String),

    /// Errors from the durable session store
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<EngineError>,
    },
}

impl EngineError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        EngineError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Create a decode error from a serde_json error
    pub fn from_json_error(err: serde_json::Error) -> Self {
        EngineError::Decode(err.to_string())
    }
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}
