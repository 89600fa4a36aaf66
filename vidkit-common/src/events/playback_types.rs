//! Playback-related type definitions
//!
//! Supporting types for the playback and buffering state machines.

use serde::{Deserialize, Serialize};

/// Playback state enumeration
///
/// Exactly one value holds at any instant. `Failed` is terminal until new
/// media is loaded.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
    Paused,
    Failed,
}

impl PlaybackState {
    pub fn is_playing(&self) -> bool {
        matches!(self, PlaybackState::Playing)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, PlaybackState::Failed)
    }
}

impl std::fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackState::Stopped => write!(f, "stopped"),
            PlaybackState::Playing => write!(f, "playing"),
            PlaybackState::Paused => write!(f, "paused"),
            PlaybackState::Failed => write!(f, "failed"),
        }
    }
}

/// Buffering state of the current media
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BufferingState {
    /// Nothing known yet (initial, and after every load)
    #[default]
    Unknown,
    /// Enough media buffered to keep up with playback
    Ready,
    /// Playback buffer ran empty
    Delayed,
}

impl std::fmt::Display for BufferingState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BufferingState::Unknown => write!(f, "unknown"),
            BufferingState::Ready => write!(f, "ready"),
            BufferingState::Delayed => write!(f, "delayed"),
        }
    }
}

/// How video is laid out within the surface bounds
///
/// Display configuration only; has no effect on the state machines.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FillMode {
    /// Stretch to fill the bounds, ignoring aspect ratio
    Stretch,
    /// Preserve aspect ratio and fill the bounds (crops)
    AspectFill,
    /// Preserve aspect ratio and fit within the bounds
    #[default]
    AspectFit,
}

impl std::fmt::Display for FillMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FillMode::Stretch => write!(f, "stretch"),
            FillMode::AspectFill => write!(f, "aspect_fill"),
            FillMode::AspectFit => write!(f, "aspect_fit"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_states() {
        assert_eq!(PlaybackState::default(), PlaybackState::Stopped);
        assert_eq!(BufferingState::default(), BufferingState::Unknown);
        assert_eq!(FillMode::default(), FillMode::AspectFit);
    }

    #[test]
    fn test_display_matches_serde_names() {
        for state in [
            PlaybackState::Stopped,
            PlaybackState::Playing,
            PlaybackState::Paused,
            PlaybackState::Failed,
        ] {
            let json = serde_json::to_string(&state).unwrap();
            assert_eq!(json, format!("\"{}\"", state));
        }

        let json = serde_json::to_string(&FillMode::AspectFill).unwrap();
        assert_eq!(json, "\"aspect_fill\"");
    }

    #[test]
    fn test_state_predicates() {
        assert!(PlaybackState::Playing.is_playing());
        assert!(!PlaybackState::Paused.is_playing());
        assert!(PlaybackState::Failed.is_failed());
        assert!(!PlaybackState::Stopped.is_failed());
    }
}
