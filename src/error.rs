//! Error types for engine construction and frame handoff.
//!
//! Nothing on the audio thread returns these: the render path degrades to
//! silence or the last good frame instead. Errors surface where things are
//! built (chains, channels, producers, synths).

use std::sync::Arc;

use thiserror::Error;

use crate::shape::Frame;

/// Result type for engine construction.
pub type Result<T> = std::result::Result<T, ScopeError>;

#[derive(Debug, Error)]
pub enum ScopeError {
    /// Parameter declared with an empty or inverted range.
    #[error("invalid range for parameter '{id}': min {min} must be below max {max}")]
    InvalidRange {
        /// Parameter id.
        id: String,
        min: f32,
        max: f32,
    },

    /// Two effects in one chain share an id.
    #[error("effect '{0}' is already in the chain")]
    DuplicateEffect(String),

    /// Two effects in one chain would share a precedence.
    #[error("effect '{id}' cannot take precedence {precedence}: already used by '{existing}'")]
    DuplicatePrecedence {
        id: String,
        existing: String,
        precedence: i32,
    },

    #[error("no effect with id '{0}'")]
    UnknownEffect(String),

    #[error("frame channel capacity must be at least 1")]
    ZeroCapacity,

    #[error("invalid sample rate: {0} Hz")]
    InvalidSampleRate(f32),

    #[error("unsupported channel count {0}: expected 2 (XY) or 3 (XYZ)")]
    UnsupportedChannels(usize),

    #[error("voice count must be at least 1")]
    NoVoices,

    /// The frame producer thread could not be started.
    #[error("failed to spawn frame producer thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// A frame the channel refused, handed back to the caller.
#[derive(Debug, Error)]
pub enum PublishError {
    /// Every slot holds a frame the consumer has not taken yet.
    #[error("frame channel is full")]
    Full(Arc<Frame>),

    /// The channel was shut down or the consumer went away.
    #[error("frame channel is closed")]
    Closed(Arc<Frame>),
}

impl PublishError {
    /// Recover the frame that was not published.
    pub fn into_frame(self) -> Arc<Frame> {
        match self {
            PublishError::Full(frame) | PublishError::Closed(frame) => frame,
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, PublishError::Closed(_))
    }
}
