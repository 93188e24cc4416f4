//! Error types shared across the runtime.

use std::io;
use thiserror::Error;

/// Errors produced by the runtime core.
#[derive(Debug, Error)]
pub enum Error {
    /// An image could not be loaded by the renderer.
    #[error("failed to load image {path:?}: {reason}")]
    ImageLoad {
        /// Asset path that was requested.
        path: String,
        /// Backend-specific reason.
        reason: String,
    },

    /// Text could not be rendered to a texture.
    #[error("failed to render text {text:?}: {reason}")]
    TextRender {
        /// The string that was being rendered.
        text: String,
        /// Backend-specific reason.
        reason: String,
    },

    /// A sprite referenced a template key that is not in the library.
    #[error("unknown sprite template {0:?}")]
    UnknownTemplate(String),

    /// A draw call failed. Frames are not retried.
    #[error("draw failed: {0}")]
    Draw(String),

    /// The OS refused to spawn an actor thread.
    #[error("failed to spawn actor thread {name}: {source}")]
    Spawn {
        /// Thread name of the actor.
        name: String,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },

    /// Terminal or other I/O failure.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Convenience result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Failure reported by a button action. Logged, never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ActionError(pub String);

impl ActionError {
    /// Create an action error from any message.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}
