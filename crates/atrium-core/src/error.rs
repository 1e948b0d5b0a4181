//! Core error types.

/// Errors from core domain operations.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The plugin name is malformed.
    #[error("invalid plugin name: {0}")]
    InvalidPluginName(String),

    /// The plugin identifier is malformed.
    #[error("invalid plugin id: {0}")]
    InvalidPluginId(String),
}

/// Result type for core domain operations.
pub type CoreResult<T> = Result<T, CoreError>;
