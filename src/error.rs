//! Error types for the sync engine.

/// Errors that can occur while resolving, decoding or configuring a sync run.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Invalid sound source: neither url nor fallback url is set")]
    InvalidSoundSource,
    #[error("Failed to decode audio: {0}")]
    Decode(String),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for sync engine operations
pub type Result<T, E = SyncError> = std::result::Result<T, E>;
