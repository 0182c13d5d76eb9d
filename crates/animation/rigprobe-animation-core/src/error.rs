use thiserror::Error;

use crate::ids::{BoneId, GraphId, PlayableId};
use rigprobe_api_core::ApiError;

/// Errors raised while building or evaluating a playable graph.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// Value-level failure, including `ApiError::InvalidMode` raised by jobs.
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("stream handle for bone {bone:?} was bound on {bound} but used on {used}")]
    InvalidHandle {
        bone: BoneId,
        bound: GraphId,
        used: GraphId,
    },

    #[error("bone '{0}' not found in skeleton")]
    BoneNotFound(String),

    #[error("playable {0:?} not found")]
    UnknownPlayable(PlayableId),

    #[error("playable {0:?} cannot take inputs")]
    NotAScript(PlayableId),

    #[error("connecting {upstream:?} into {downstream:?} would create a cycle")]
    Cycle {
        upstream: PlayableId,
        downstream: PlayableId,
    },

    #[error("graph has no output source")]
    NoOutput,

    #[error("graph '{0}' has been destroyed")]
    Destroyed(String),

    #[error("invalid clip '{name}': {reason}")]
    InvalidClip { name: String, reason: String },

    #[error("invalid skeleton '{name}': {reason}")]
    InvalidSkeleton { name: String, reason: String },
}

impl EvalError {
    /// The offending byte when this error is an invalid mode.
    pub fn invalid_mode(&self) -> Option<u8> {
        match self {
            EvalError::Api(ApiError::InvalidMode(raw)) => Some(*raw),
            _ => None,
        }
    }
}
