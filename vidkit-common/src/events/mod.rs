//! Event types for the vidkit event system
//!
//! Provides the serializable `PlayerEvent` enum and the `EventBus` that fans
//! events out to any number of listeners.

mod playback_types;

pub use playback_types::{BufferingState, FillMode, PlaybackState};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Player event types
///
/// One variant per delegate notification. Events are broadcast via
/// `EventBus` and serialize with a `type` tag so they can be logged or
/// forwarded as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PlayerEvent {
    /// Surface is ready to display video
    Ready { timestamp: DateTime<Utc> },

    /// Playback state written
    ///
    /// With edge triggering disabled this may repeat the previous state.
    PlaybackStateChanged {
        new_state: PlaybackState,
        timestamp: DateTime<Utc>,
    },

    /// Buffering state written
    BufferingStateChanged {
        new_state: BufferingState,
        timestamp: DateTime<Utc>,
    },

    /// Buffered horizon moved
    BufferTimeChanged {
        /// End of the first loaded range, in seconds
        buffered_secs: f64,
        timestamp: DateTime<Utc>,
    },

    /// Periodic playback position update
    CurrentTimeChanged {
        position_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// Playback is about to restart from time zero
    WillStartFromBeginning { timestamp: DateTime<Utc> },

    /// Playback stopped (explicitly or at end of media)
    PlaybackDidEnd { timestamp: DateTime<Utc> },

    /// End of media reached with looping enabled
    WillLoop { timestamp: DateTime<Utc> },

    /// Playback failed
    PlaybackError {
        /// Human readable cause, if known
        message: Option<String>,
        timestamp: DateTime<Utc>,
    },
}

impl PlayerEvent {
    /// Short name of the variant, matching the serialized `type` tag
    pub fn kind(&self) -> &'static str {
        match self {
            PlayerEvent::Ready { .. } => "Ready",
            PlayerEvent::PlaybackStateChanged { .. } => "PlaybackStateChanged",
            PlayerEvent::BufferingStateChanged { .. } => "BufferingStateChanged",
            PlayerEvent::BufferTimeChanged { .. } => "BufferTimeChanged",
            PlayerEvent::CurrentTimeChanged { .. } => "CurrentTimeChanged",
            PlayerEvent::WillStartFromBeginning { .. } => "WillStartFromBeginning",
            PlayerEvent::PlaybackDidEnd { .. } => "PlaybackDidEnd",
            PlayerEvent::WillLoop { .. } => "WillLoop",
            PlayerEvent::PlaybackError { .. } => "PlaybackError",
        }
    }

    /// True for events that end a playback session (did end or error)
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PlayerEvent::PlaybackDidEnd { .. } | PlayerEvent::PlaybackError { .. }
        )
    }
}

// ========================================
// EventBus Implementation
// ========================================

/// Central event distribution bus for player events
///
/// The EventBus uses tokio::broadcast internally, providing:
/// - Non-blocking publish (slow subscribers don't block the player)
/// - Multiple concurrent subscribers
/// - Lagged message detection for slow subscribers
///
/// # Examples
///
/// ```
/// use vidkit_common::events::{EventBus, PlayerEvent, PlaybackState};
///
/// let event_bus = EventBus::new(100);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit_lossy(PlayerEvent::PlaybackStateChanged {
///     new_state: PlaybackState::Playing,
///     timestamp: chrono::Utc::now(),
/// });
///
/// assert!(rx.try_recv().is_ok());
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<PlayerEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// `capacity` is the number of events buffered per subscriber before the
    /// oldest are dropped. Periodic time updates arrive at up to 100/s, so
    /// interactive listeners want a few hundred.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists,
    /// `Err` if nobody is listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: PlayerEvent,
    ) -> std::result::Result<usize, broadcast::error::SendError<PlayerEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: PlayerEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
