//! Buffering monitor
//!
//! Tracks the coarse `BufferingState` and the buffered horizon (end of the
//! first loaded range). The monitor decides what changed; the player turns
//! those decisions into delegate calls and engine nudges.

use std::time::Duration;

use tracing::trace;
use vidkit_common::BufferingState;

use crate::types::TimeRange;

/// Outcome of a loaded-time-ranges update
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct RangeUpdate {
    /// New buffered horizon in seconds, when it moved
    pub buffer_time_changed: Option<f64>,
    /// Enough is buffered that a stalled engine should be told to play
    pub should_resume: bool,
}

#[derive(Debug, Default)]
pub(crate) struct BufferingMonitor {
    state: BufferingState,
    buffer_time: Duration,
}

impl BufferingMonitor {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn state(&self) -> BufferingState {
        self.state
    }

    pub(crate) fn buffer_time(&self) -> Duration {
        self.buffer_time
    }

    /// Forget everything about the previous media
    pub(crate) fn reset(&mut self, edge_triggered: bool) -> Option<BufferingState> {
        self.buffer_time = Duration::ZERO;
        self.write(BufferingState::Unknown, edge_triggered)
    }

    /// Record a state; returns the state to notify, if any
    pub(crate) fn write(
        &mut self,
        state: BufferingState,
        edge_triggered: bool,
    ) -> Option<BufferingState> {
        let changed = self.state != state;
        self.state = state;
        if changed || !edge_triggered {
            Some(state)
        } else {
            None
        }
    }

    pub(crate) fn on_loaded_ranges(
        &mut self,
        ranges: &[TimeRange],
        current_time: Option<Duration>,
        duration: Option<Duration>,
        buffer_size: Duration,
    ) -> RangeUpdate {
        let mut update = RangeUpdate::default();

        if let Some(first) = ranges.first() {
            let horizon = first.end();
            if horizon != self.buffer_time {
                self.buffer_time = horizon;
                update.buffer_time_changed = Some(horizon.as_secs_f64());
            }
        }

        let backlog = self
            .buffer_time
            .saturating_sub(current_time.unwrap_or(Duration::ZERO));
        update.should_resume = backlog >= buffer_size
            || duration == Some(self.buffer_time)
            || ranges.is_empty();

        trace!(
            "Loaded ranges: horizon={:?} backlog={:?} resume={}",
            self.buffer_time,
            backlog,
            update.should_resume
        );
        update
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(start: u64, len: u64) -> TimeRange {
        TimeRange::new(Duration::from_secs(start), Duration::from_secs(len))
    }

    #[test]
    fn test_edge_triggered_write() {
        let mut monitor = BufferingMonitor::new();
        assert_eq!(monitor.write(BufferingState::Ready, true), Some(BufferingState::Ready));
        assert_eq!(monitor.write(BufferingState::Ready, true), None);
        assert_eq!(monitor.write(BufferingState::Ready, false), Some(BufferingState::Ready));
    }

    #[test]
    fn test_reset_clears_horizon() {
        let mut monitor = BufferingMonitor::new();
        monitor.write(BufferingState::Delayed, true);
        monitor.on_loaded_ranges(&[range(0, 4)], None, None, Duration::from_secs(10));

        assert_eq!(monitor.reset(true), Some(BufferingState::Unknown));
        assert_eq!(monitor.buffer_time(), Duration::ZERO);
        assert_eq!(monitor.state(), BufferingState::Unknown);
    }

    #[test]
    fn test_horizon_change_reported_once() {
        let mut monitor = BufferingMonitor::new();
        let size = Duration::from_secs(10);

        let update = monitor.on_loaded_ranges(&[range(0, 4)], None, None, size);
        assert_eq!(update.buffer_time_changed, Some(4.0));

        let update = monitor.on_loaded_ranges(&[range(0, 4)], None, None, size);
        assert_eq!(update.buffer_time_changed, None);
    }

    #[test]
    fn test_only_first_range_counts() {
        let mut monitor = BufferingMonitor::new();
        let update = monitor.on_loaded_ranges(
            &[range(0, 3), range(20, 5)],
            None,
            None,
            Duration::from_secs(10),
        );
        assert_eq!(update.buffer_time_changed, Some(3.0));
    }

    #[test]
    fn test_resume_when_backlog_reaches_buffer_size() {
        let mut monitor = BufferingMonitor::new();
        let size = Duration::from_secs(10);
        let duration = Some(Duration::from_secs(60));

        let update = monitor.on_loaded_ranges(&[range(0, 14)], Some(Duration::from_secs(5)), duration, size);
        assert!(!update.should_resume);

        let update = monitor.on_loaded_ranges(&[range(0, 15)], Some(Duration::from_secs(5)), duration, size);
        assert!(update.should_resume);
    }

    #[test]
    fn test_resume_when_fully_buffered() {
        let mut monitor = BufferingMonitor::new();
        let update = monitor.on_loaded_ranges(
            &[range(0, 8)],
            Some(Duration::from_secs(7)),
            Some(Duration::from_secs(8)),
            Duration::from_secs(10),
        );
        assert!(update.should_resume);
    }

    #[test]
    fn test_resume_when_no_ranges() {
        let mut monitor = BufferingMonitor::new();
        let update = monitor.on_loaded_ranges(&[], None, None, Duration::from_secs(10));
        assert!(update.should_resume);
        assert_eq!(update.buffer_time_changed, None);
    }
}
