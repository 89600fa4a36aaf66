//! Error types for vidkit-player
//!
//! The four playback failures all collapse into `PlaybackState::Failed`; the
//! variant is only surfaced as the payload of `on_playback_error`.

use crate::types::AssetKey;
use thiserror::Error;

/// Main error type for vidkit-player
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlayerError {
    /// A required descriptive key failed to resolve
    #[error("asset key '{key}' failed to load: {reason}")]
    AssetKeyLoadFailure { key: AssetKey, reason: String },

    /// Asset resolved but cannot be played
    #[error("asset is not playable")]
    AssetNotPlayable,

    /// Engine reported the item as failed (or could not create it)
    #[error("player item failed: {0}")]
    EngineItemFailure(String),

    /// Engine could not play the item to its end
    #[error("failed to play to end: {0}")]
    EndOfMediaFailure(String),

    /// The coordination task is gone
    #[error("player coordinator has shut down")]
    CoordinatorClosed,

    /// Shared infrastructure error (configuration etc.)
    #[error("{0}")]
    Common(String),
}

impl From<vidkit_common::Error> for PlayerError {
    fn from(err: vidkit_common::Error) -> Self {
        PlayerError::Common(err.to_string())
    }
}

impl PlayerError {
    /// True for the failures that move playback into `Failed`
    pub fn is_playback_failure(&self) -> bool {
        matches!(
            self,
            PlayerError::AssetKeyLoadFailure { .. }
                | PlayerError::AssetNotPlayable
                | PlayerError::EngineItemFailure(_)
                | PlayerError::EndOfMediaFailure(_)
        )
    }
}

/// Convenience Result type using PlayerError
pub type Result<T> = std::result::Result<T, PlayerError>;
