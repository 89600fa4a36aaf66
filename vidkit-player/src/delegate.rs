//! Host notification interface
//!
//! The host implements whichever `PlayerDelegate` methods it cares about;
//! all of them default to doing nothing. Callbacks run on the coordination
//! task, in the order the underlying transitions happen.

use std::time::Duration;

use chrono::Utc;
use vidkit_common::{BufferingState, EventBus, PlaybackState, PlayerEvent};

use crate::error::PlayerError;

/// Player notifications
pub trait PlayerDelegate: Send + Sync {
    /// The surface became ready to display video
    fn on_ready(&self) {}

    fn on_playback_state_changed(&self, _state: PlaybackState) {}

    fn on_buffering_state_changed(&self, _state: BufferingState) {}

    /// End of the first loaded range, in seconds
    fn on_buffer_time_changed(&self, _buffered_secs: f64) {}

    fn on_current_time_changed(&self, _time: Duration) {}

    fn on_will_start_from_beginning(&self) {}

    fn on_playback_did_end(&self) {}

    fn on_will_loop(&self) {}

    fn on_playback_error(&self, _error: Option<&PlayerError>) {}
}

/// Delegate that republishes every notification on an `EventBus`
pub struct EventBusDelegate {
    bus: EventBus,
}

impl EventBusDelegate {
    pub fn new(bus: EventBus) -> Self {
        Self { bus }
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }
}

impl PlayerDelegate for EventBusDelegate {
    fn on_ready(&self) {
        self.bus.emit_lossy(PlayerEvent::Ready {
            timestamp: Utc::now(),
        });
    }

    fn on_playback_state_changed(&self, state: PlaybackState) {
        self.bus.emit_lossy(PlayerEvent::PlaybackStateChanged {
            new_state: state,
            timestamp: Utc::now(),
        });
    }

    fn on_buffering_state_changed(&self, state: BufferingState) {
        self.bus.emit_lossy(PlayerEvent::BufferingStateChanged {
            new_state: state,
            timestamp: Utc::now(),
        });
    }

    fn on_buffer_time_changed(&self, buffered_secs: f64) {
        self.bus.emit_lossy(PlayerEvent::BufferTimeChanged {
            buffered_secs,
            timestamp: Utc::now(),
        });
    }

    fn on_current_time_changed(&self, time: Duration) {
        self.bus.emit_lossy(PlayerEvent::CurrentTimeChanged {
            position_ms: u64::try_from(time.as_millis()).unwrap_or(u64::MAX),
            timestamp: Utc::now(),
        });
    }

    fn on_will_start_from_beginning(&self) {
        self.bus.emit_lossy(PlayerEvent::WillStartFromBeginning {
            timestamp: Utc::now(),
        });
    }

    fn on_playback_did_end(&self) {
        self.bus.emit_lossy(PlayerEvent::PlaybackDidEnd {
            timestamp: Utc::now(),
        });
    }

    fn on_will_loop(&self) {
        self.bus.emit_lossy(PlayerEvent::WillLoop {
            timestamp: Utc::now(),
        });
    }

    fn on_playback_error(&self, error: Option<&PlayerError>) {
        self.bus.emit_lossy(PlayerEvent::PlaybackError {
            message: error.map(|e| e.to_string()),
            timestamp: Utc::now(),
        });
    }
}
