//! Asset loading bookkeeping
//!
//! Each `load` gets a generation number. Completions carry it back, and only
//! the completion of the newest load is accepted; anything older was
//! superseded and is dropped.

use tracing::debug;

use crate::engine::ResolvedAsset;
use crate::error::PlayerError;
use crate::events::{InputSender, LoadReply};
use crate::types::MediaSource;

#[derive(Debug, Default)]
pub(crate) struct AssetLoader {
    generation: u64,
    in_flight: bool,
    source: Option<MediaSource>,
}

impl AssetLoader {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Start a new load, superseding any in flight
    pub(crate) fn begin(&mut self, source: MediaSource, sink: &InputSender) -> LoadReply {
        self.generation += 1;
        if self.in_flight {
            debug!(
                "Load {} supersedes unfinished load of {:?}",
                self.generation, self.source
            );
        }
        self.in_flight = true;
        self.source = Some(source);
        LoadReply::new(self.generation, sink.clone())
    }

    /// Accept a completion; false when it is stale or a duplicate
    pub(crate) fn accept(&mut self, generation: u64) -> bool {
        if generation != self.generation || !self.in_flight {
            return false;
        }
        self.in_flight = false;
        true
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn is_loading(&self) -> bool {
        self.in_flight
    }

    pub(crate) fn source(&self) -> Option<&MediaSource> {
        self.source.as_ref()
    }

    /// Check a resolved asset can back a Player Item
    pub(crate) fn validate(asset: &ResolvedAsset) -> Result<(), PlayerError> {
        if let Some((key, reason)) = asset.first_failed_key() {
            return Err(PlayerError::AssetKeyLoadFailure {
                key,
                reason: reason.to_string(),
            });
        }
        if !asset.playable {
            return Err(PlayerError::AssetNotPlayable);
        }
        Ok(())
    }
}
