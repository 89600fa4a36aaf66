//! Media Engine boundary
//!
//! The decode/render/transport engine is an external collaborator. The player
//! drives it through `MediaEngine` and hears back only through messages:
//! asset completions via `LoadReply`, seek completions via `SeekReply`, and
//! observations posted to the `InputSender` given to each `observe_*` call.
//!
//! Engines must not deliver observations for an `ObserverId` after
//! `remove_observer` returns. Messages already queued may still arrive; the
//! player drops anything tagged with an id it no longer holds.

pub mod sim;

use std::time::Duration;

use crate::error::Result;
use crate::events::{InputSender, LoadReply, SeekReply};
use crate::types::{
    ActionAtItemEnd, AssetHandle, AssetKey, ItemId, KeyStatus, MediaSource, NaturalSize,
    ObserverId,
};

/// Result of resolving an asset's descriptive keys
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedAsset {
    pub handle: AssetHandle,
    /// Status of every requested key
    pub keys: Vec<(AssetKey, KeyStatus)>,
    pub playable: bool,
    pub duration: Option<Duration>,
    pub preferred_rate: f32,
}

impl ResolvedAsset {
    /// A fully resolved, playable asset
    pub fn playable(handle: AssetHandle, duration: Duration) -> Self {
        Self {
            handle,
            keys: AssetKey::REQUIRED
                .iter()
                .map(|key| (*key, KeyStatus::Loaded))
                .collect(),
            playable: true,
            duration: Some(duration),
            preferred_rate: 1.0,
        }
    }

    /// First key whose resolution failed, with the engine's reason
    pub fn first_failed_key(&self) -> Option<(AssetKey, &str)> {
        self.keys.iter().find_map(|(key, status)| match status {
            KeyStatus::Failed(reason) => Some((*key, reason.as_str())),
            _ => None,
        })
    }
}

/// Operations the player needs from a media engine
///
/// Calls never block: loads, seeks and play/pause are fire-and-forget and
/// complete through the coordination channel.
pub trait MediaEngine: Send {
    // -- assets and items --

    /// Start resolving `keys` for `source` off-thread; answer through `reply`
    fn load_asset(&mut self, source: &MediaSource, keys: &[AssetKey], reply: LoadReply);

    /// Build a Player Item from a resolved asset
    fn create_item(&mut self, asset: AssetHandle) -> Result<ItemId>;

    /// Make `item` the engine's current item, releasing the previous one
    fn replace_current_item(&mut self, item: Option<ItemId>);

    fn current_item(&self) -> Option<ItemId>;

    fn set_action_at_item_end(&mut self, action: ActionAtItemEnd);

    // -- transport --

    fn play(&mut self);

    fn pause(&mut self);

    fn rate(&self) -> f32;

    /// Seek the engine's current item
    fn seek(&mut self, to: Duration, reply: Option<SeekReply>);

    /// Seek a specific item, optionally within a tolerance window
    /// `(before, after)`
    fn seek_item(
        &mut self,
        item: ItemId,
        to: Duration,
        tolerance: Option<(Duration, Duration)>,
        reply: Option<SeekReply>,
    );

    // -- timing --

    fn current_time(&self) -> Option<Duration>;

    fn duration(&self) -> Option<Duration>;

    fn natural_size(&self) -> Option<NaturalSize>;

    // -- audio --

    fn is_muted(&self) -> bool;

    fn set_muted(&mut self, muted: bool);

    fn volume(&self) -> f32;

    fn set_volume(&mut self, volume: f32);

    // -- observation --

    /// Observe status, buffer and end-of-item signals of `item`
    fn observe_item(&mut self, item: ItemId, sink: InputSender) -> ObserverId;

    /// Receive the current time every `interval` while an item is current
    fn add_periodic_time_observer(&mut self, interval: Duration, sink: InputSender)
        -> ObserverId;

    fn observe_rate(&mut self, sink: InputSender) -> ObserverId;

    fn remove_observer(&mut self, id: ObserverId);
}
