//! Error types shared across the catalog, admin, chat and upload layers

use thiserror::Error;

/// Failures of the durable key-value store.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage backend error: {0}")]
    Backend(#[from] rusqlite::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Location(String),
}

/// Rejections raised by the admin editor before anything reaches the store.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("invalid category: {0}")]
    InvalidCategory(String),
    #[error("invalid stock status: {0}")]
    InvalidStatus(String),
    #[error("unsupported image type: {0}")]
    UnsupportedImageType(String),
    #[error("image is {size} bytes, limit is {limit} bytes")]
    ImageTooLarge { size: usize, limit: usize },
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AdminError {
    /// The access gate has not been passed, or the role is too low.
    #[error("unauthorized")]
    Unauthorized,
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("not found: {0}")]
    NotFound(String),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChatError {
    #[error("a request is already in flight")]
    Busy,
    #[error("message is empty")]
    EmptyInput,
    #[error("assistant is not configured: {0}")]
    NotConfigured(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },
    #[error("failed to decode response: {0}")]
    Decode(String),
}

/// Error codes reported by a speech-to-text capability.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SpeechError {
    #[error("microphone permission denied")]
    PermissionDenied,
    #[error("recognition aborted")]
    Aborted,
    #[error("no speech recognized")]
    NoMatch,
    #[error("speech recognition is unavailable")]
    Unavailable,
    #[error("transcription failed: {0}")]
    Transport(String),
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("image upload is not configured")]
    NotConfigured,
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("upload request failed: {0}")]
    Transport(String),
    #[error("upload rejected: {0}")]
    Rejected(String),
    #[error("failed to read image: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read or write config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{0}")]
    Location(String),
}
