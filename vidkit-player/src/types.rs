//! Playback types shared across modules

use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Location of a piece of media (file path or URL)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaLocator(String);

impl MediaLocator {
    pub fn new(locator: impl Into<String>) -> Self {
        Self(locator.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MediaLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MediaLocator {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Opaque engine-side asset handle
///
/// Issued by a `MediaEngine`; only meaningful to the engine that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetHandle(pub u64);

/// What to load: a locator, or an asset the host already built
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaSource {
    Locator(MediaLocator),
    Asset(AssetHandle),
}

impl std::fmt::Display for MediaSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaSource::Locator(locator) => write!(f, "{}", locator),
            MediaSource::Asset(handle) => write!(f, "asset#{}", handle.0),
        }
    }
}

/// Identifier of an engine Player Item (the loaded, seekable unit)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemId(pub Uuid);

impl ItemId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle of one registered observation
///
/// Returned by the `observe_*` calls; passing it back to `remove_observer`
/// ends the observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(pub u64);

/// Descriptive asset keys resolved before an item is created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKey {
    Tracks,
    Playable,
    Duration,
    PreferredRate,
}

impl AssetKey {
    /// Keys that must resolve before a Player Item is created
    pub const REQUIRED: [AssetKey; 4] = [
        AssetKey::Tracks,
        AssetKey::Playable,
        AssetKey::Duration,
        AssetKey::PreferredRate,
    ];
}

impl std::fmt::Display for AssetKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetKey::Tracks => write!(f, "tracks"),
            AssetKey::Playable => write!(f, "playable"),
            AssetKey::Duration => write!(f, "duration"),
            AssetKey::PreferredRate => write!(f, "preferredRate"),
        }
    }
}

/// Outcome of resolving one asset key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyStatus {
    Loaded,
    Failed(String),
    Cancelled,
}

/// Readiness of a Player Item as reported by the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemStatus {
    Unknown,
    ReadyToPlay,
    Failed(String),
}

/// What the engine does by itself when an item plays to its end
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ActionAtItemEnd {
    /// Keep the item, do nothing (used while looping)
    None,
    /// Pause on the last frame
    #[default]
    Pause,
}

/// A contiguous span of media time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: Duration,
    pub duration: Duration,
}

impl TimeRange {
    pub fn new(start: Duration, duration: Duration) -> Self {
        Self { start, duration }
    }

    /// First instant after the range
    pub fn end(&self) -> Duration {
        self.start + self.duration
    }
}

/// Pixel dimensions of the video track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NaturalSize {
    pub width: u32,
    pub height: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_range_end() {
        let range = TimeRange::new(Duration::from_secs(2), Duration::from_millis(1500));
        assert_eq!(range.end(), Duration::from_millis(3500));
    }

    #[test]
    fn test_item_ids_are_unique() {
        assert_ne!(ItemId::new(), ItemId::new());
    }

    #[test]
    fn test_media_source_display() {
        let source = MediaSource::Locator(MediaLocator::new("file:///clip.mp4"));
        assert_eq!(source.to_string(), "file:///clip.mp4");
        assert_eq!(MediaSource::Asset(AssetHandle(7)).to_string(), "asset#7");
    }
}
