//! Lifecycle coordination
//!
//! Two concerns live here:
//! - mapping application lifecycle edges to pause/resume, per the four
//!   policy flags in `PlayerSettings`
//! - owning every observation the player registers, so each one is removed
//!   exactly once (on item swap or teardown)

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;
use vidkit_common::{PlaybackState, PlayerSettings};

use crate::engine::MediaEngine;
use crate::events::InputSender;
use crate::surface::VideoSurface;
use crate::types::{ItemId, ObserverId};

/// Application lifecycle edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleEvent {
    WillResignActive,
    DidBecomeActive,
    DidEnterBackground,
    WillEnterForeground,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LifecycleAction {
    Pause,
    Resume,
}

/// Decide how a lifecycle edge affects playback
pub(crate) fn lifecycle_action(
    event: LifecycleEvent,
    state: PlaybackState,
    settings: &PlayerSettings,
) -> Option<LifecycleAction> {
    match event {
        LifecycleEvent::WillResignActive
            if state.is_playing() && settings.pauses_when_resigning_active =>
        {
            Some(LifecycleAction::Pause)
        }
        LifecycleEvent::DidEnterBackground
            if state.is_playing() && settings.pauses_when_backgrounded =>
        {
            Some(LifecycleAction::Pause)
        }
        LifecycleEvent::DidBecomeActive
            if !state.is_playing() && settings.resumes_when_became_active =>
        {
            Some(LifecycleAction::Resume)
        }
        LifecycleEvent::WillEnterForeground
            if !state.is_playing() && settings.resumes_when_entering_foreground =>
        {
            Some(LifecycleAction::Resume)
        }
        _ => None,
    }
}

/// Observations tied to one Player Item
#[derive(Debug, Clone, Copy)]
struct ItemObservation {
    item: ItemId,
    signals: ObserverId,
    time: ObserverId,
}

/// Every observation the player currently holds
#[derive(Debug, Default)]
pub(crate) struct Observations {
    rate: Option<ObserverId>,
    surface: Option<ObserverId>,
    item: Option<ItemObservation>,
}

impl Observations {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Register the engine-wide and surface observations
    pub(crate) fn attach(
        &mut self,
        engine: &mut dyn MediaEngine,
        surface: &mut dyn VideoSurface,
        sink: &InputSender,
    ) {
        if self.rate.is_none() {
            self.rate = Some(engine.observe_rate(sink.clone()));
        }
        if self.surface.is_none() {
            self.surface = Some(surface.observe_readiness(sink.clone()));
        }
    }

    /// Start observing `item` and the playback clock while it is current
    pub(crate) fn observe_item(
        &mut self,
        engine: &mut dyn MediaEngine,
        item: ItemId,
        sink: &InputSender,
        interval: Duration,
    ) {
        if let Some(previous) = self.item {
            debug!("Item {} still observed; releasing first", previous.item);
            self.release_item(engine);
        }
        let signals = engine.observe_item(item, sink.clone());
        let time = engine.add_periodic_time_observer(interval, sink.clone());
        self.item = Some(ItemObservation {
            item,
            signals,
            time,
        });
    }

    /// Remove the current item's observations, if any
    pub(crate) fn release_item(&mut self, engine: &mut dyn MediaEngine) {
        if let Some(observed) = self.item.take() {
            engine.remove_observer(observed.signals);
            engine.remove_observer(observed.time);
        }
    }

    /// Remove everything
    pub(crate) fn detach(&mut self, engine: &mut dyn MediaEngine, surface: &mut dyn VideoSurface) {
        self.release_item(engine);
        if let Some(rate) = self.rate.take() {
            engine.remove_observer(rate);
        }
        if let Some(readiness) = self.surface.take() {
            surface.remove_observer(readiness);
        }
    }

    pub(crate) fn current_item(&self) -> Option<ItemId> {
        self.item.map(|observed| observed.item)
    }

    pub(crate) fn is_current_item(&self, item: ItemId) -> bool {
        self.current_item() == Some(item)
    }

    pub(crate) fn is_time_observer(&self, id: ObserverId) -> bool {
        self.item.is_some_and(|observed| observed.time == id)
    }

    pub(crate) fn is_rate_observer(&self, id: ObserverId) -> bool {
        self.rate == Some(id)
    }

    pub(crate) fn is_surface_observer(&self, id: ObserverId) -> bool {
        self.surface == Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pause_edges_only_while_playing() {
        let settings = PlayerSettings::default();
        assert_eq!(
            lifecycle_action(LifecycleEvent::WillResignActive, PlaybackState::Playing, &settings),
            Some(LifecycleAction::Pause)
        );
        assert_eq!(
            lifecycle_action(LifecycleEvent::DidEnterBackground, PlaybackState::Paused, &settings),
            None
        );
    }

    #[test]
    fn test_resume_edges_only_while_not_playing() {
        let settings = PlayerSettings::default();
        assert_eq!(
            lifecycle_action(LifecycleEvent::DidBecomeActive, PlaybackState::Paused, &settings),
            Some(LifecycleAction::Resume)
        );
        assert_eq!(
            lifecycle_action(LifecycleEvent::WillEnterForeground, PlaybackState::Playing, &settings),
            None
        );
    }

    #[test]
    fn test_flags_disable_each_edge() {
        let settings = PlayerSettings {
            pauses_when_resigning_active: false,
            pauses_when_backgrounded: false,
            resumes_when_became_active: false,
            resumes_when_entering_foreground: false,
            ..PlayerSettings::default()
        };
        for event in [
            LifecycleEvent::WillResignActive,
            LifecycleEvent::DidEnterBackground,
        ] {
            assert_eq!(lifecycle_action(event, PlaybackState::Playing, &settings), None);
        }
        for event in [
            LifecycleEvent::DidBecomeActive,
            LifecycleEvent::WillEnterForeground,
        ] {
            assert_eq!(lifecycle_action(event, PlaybackState::Stopped, &settings), None);
        }
    }

    #[test]
    fn test_lifecycle_event_serde() {
        let json = serde_json::to_string(&LifecycleEvent::DidEnterBackground).unwrap();
        assert_eq!(json, "\"did_enter_background\"");
    }
}
