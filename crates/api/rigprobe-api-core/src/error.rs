use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// A mode byte outside `ModifyMode`'s variants reached a consumer.
    #[error("invalid modify mode {0}; expected 0 (none), 1 (scale), 2 (rotation) or 3 (position)")]
    InvalidMode(u8),

    #[error("invalid bone path '{path}': {reason}")]
    InvalidPath { path: String, reason: &'static str },
}
