//! Coordination channel messages
//!
//! Everything that can change player state arrives as a `PlayerInput` on one
//! unbounded channel drained by the coordination task:
//! - host commands (from `PlayerHandle`)
//! - asset resolution completions (from engine worker threads)
//! - item, engine and surface observations
//! - application lifecycle edges
//!
//! Collaborators never get a reference to the player. They hold an
//! `InputSender` (or a one-shot `LoadReply` / `SeekReply`), so any work done
//! off-thread can only post a message; it cannot touch player state.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tracing::trace;
use vidkit_common::{FillMode, PlayerSettings};

use crate::engine::ResolvedAsset;
use crate::lifecycle::LifecycleEvent;
use crate::player::PlayerSnapshot;
use crate::types::{ItemId, ItemStatus, MediaSource, ObserverId, TimeRange};

/// Observation on a Player Item
#[derive(Debug, Clone, PartialEq)]
pub enum ItemSignal {
    StatusChanged(ItemStatus),
    BufferEmpty(bool),
    LikelyToKeepUp(bool),
    LoadedTimeRanges(Vec<TimeRange>),
    PlayedToEnd,
    FailedToPlayToEnd(String),
}

/// What to do once a seek completes
#[derive(Debug)]
pub enum SeekCompletion {
    /// Stop playback after the end-of-media rewind of this item
    StopPlayback(ItemId),
    /// Report the seek result to a waiting caller
    Notify(oneshot::Sender<bool>),
}

/// Host commands accepted by the coordination task
#[derive(Debug)]
pub enum Command {
    Load(MediaSource),
    PlayFromBeginning,
    PlayFromCurrentTime,
    Pause,
    Stop,
    Seek {
        to: Duration,
        completion: Option<SeekCompletion>,
    },
    SeekToSecond {
        second: u64,
        completion: Option<SeekCompletion>,
    },
    SeekWithTolerance {
        to: Duration,
        before: Duration,
        after: Duration,
        completion: Option<SeekCompletion>,
    },
    SetMuted(bool),
    SetVolume(f32),
    SetFillMode(FillMode),
    SetPlaybackLoops(bool),
    UpdateSettings(PlayerSettings),
    HostDidDisappear,
    Snapshot(oneshot::Sender<PlayerSnapshot>),
    Shutdown(oneshot::Sender<()>),
}

/// Every message the coordination task processes
#[derive(Debug)]
pub enum PlayerInput {
    Command(Command),

    /// Asset key resolution finished for load number `generation`
    AssetLoaded {
        generation: u64,
        asset: ResolvedAsset,
    },

    /// Observation on item `item`
    Item { item: ItemId, signal: ItemSignal },

    /// Periodic time observer fired
    TimeTick { observer: ObserverId, time: Duration },

    /// Engine playback rate changed
    RateChanged { observer: ObserverId, rate: f32 },

    /// A seek issued with a completion finished
    SeekFinished {
        completion: SeekCompletion,
        finished: bool,
    },

    /// Surface readiness-for-display changed
    SurfaceReadiness { observer: ObserverId, ready: bool },

    Lifecycle(LifecycleEvent),
}

/// Receiving end of the coordination channel
pub type InputReceiver = mpsc::UnboundedReceiver<PlayerInput>;

/// Sending end of the coordination channel, handed to collaborators
#[derive(Debug, Clone)]
pub struct InputSender {
    tx: mpsc::UnboundedSender<PlayerInput>,
}

/// Create the coordination channel
pub fn input_channel() -> (InputSender, InputReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (InputSender { tx }, rx)
}

impl InputSender {
    /// Post a message; dropped silently once the player is gone
    pub fn send(&self, input: PlayerInput) {
        if let Err(err) = self.tx.send(input) {
            trace!("Player input dropped, coordinator closed: {:?}", err.0);
        }
    }

    /// Post a message, reporting whether the coordinator is still running
    pub fn try_send(&self, input: PlayerInput) -> bool {
        self.tx.send(input).is_ok()
    }

    pub fn item(&self, item: ItemId, signal: ItemSignal) {
        self.send(PlayerInput::Item { item, signal });
    }

    pub fn command(&self, command: Command) {
        self.send(PlayerInput::Command(command));
    }

    pub fn lifecycle(&self, event: LifecycleEvent) {
        self.send(PlayerInput::Lifecycle(event));
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// One-shot reply slot for an asset resolution
///
/// Consumed by `complete`, so each load answers at most once.
#[derive(Debug)]
pub struct LoadReply {
    generation: u64,
    sink: InputSender,
}

impl LoadReply {
    pub(crate) fn new(generation: u64, sink: InputSender) -> Self {
        Self { generation, sink }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn complete(self, asset: ResolvedAsset) {
        self.sink.send(PlayerInput::AssetLoaded {
            generation: self.generation,
            asset,
        });
    }
}

/// One-shot reply slot for a seek issued with a completion
#[derive(Debug)]
pub struct SeekReply {
    completion: SeekCompletion,
    sink: InputSender,
}

impl SeekReply {
    pub(crate) fn new(completion: SeekCompletion, sink: InputSender) -> Self {
        Self { completion, sink }
    }

    pub fn finish(self, finished: bool) {
        self.sink.send(PlayerInput::SeekFinished {
            completion: self.completion,
            finished,
        });
    }
}
