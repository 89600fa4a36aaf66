//! Playback state machine
//!
//! `Player` owns the engine, the surface and every piece of playback state.
//! It is driven exclusively through `handle(PlayerInput)` (normally by the
//! coordination task) plus the direct methods below, which the task calls on
//! behalf of `Command`s. Nothing here blocks or awaits.
//!
//! **State Machine:**
//! ```text
//! Stopped ──play──▶ Playing ──pause──▶ Paused
//!    ▲                 │                  │
//!    └──────stop───────┴──────stop────────┘
//!
//! any ──load failure / item failure──▶ Failed ──load──▶ Stopped
//! ```

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, trace, warn};
use vidkit_common::{BufferingState, FillMode, PlaybackState, PlayerSettings};

use crate::asset::AssetLoader;
use crate::buffering::BufferingMonitor;
use crate::delegate::PlayerDelegate;
use crate::engine::{MediaEngine, ResolvedAsset};
use crate::error::PlayerError;
use crate::events::{
    Command, InputSender, ItemSignal, PlayerInput, SeekCompletion, SeekReply,
};
use crate::lifecycle::{lifecycle_action, LifecycleAction, LifecycleEvent, Observations};
use crate::surface::VideoSurface;
use crate::types::{
    ActionAtItemEnd, AssetKey, ItemId, ItemStatus, MediaSource, NaturalSize, TimeRange,
};

/// Point-in-time view of the player, for hosts and diagnostics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerSnapshot {
    pub playback_state: PlaybackState,
    pub buffering_state: BufferingState,
    pub source: Option<String>,
    pub load_generation: u64,
    pub loading: bool,
    pub item: Option<ItemId>,
    pub current_time: Option<Duration>,
    pub maximum_duration: Option<Duration>,
    pub buffered_time: Duration,
    pub pending_seek: Option<Duration>,
    pub muted: bool,
    pub volume: f32,
    pub fill_mode: FillMode,
    pub last_error: Option<String>,
}

pub struct Player {
    engine: Box<dyn MediaEngine>,
    surface: Box<dyn VideoSurface>,
    delegate: Option<Arc<dyn PlayerDelegate>>,
    settings: PlayerSettings,
    sink: InputSender,

    playback_state: PlaybackState,
    buffering: BufferingMonitor,
    loader: AssetLoader,
    observations: Observations,

    /// Seek requested before a Player Item existed
    pending_seek: Option<Duration>,
    /// Set by an explicit play while autoplay is off
    autoplay_activated: bool,
    /// A load asked to start playback once the new item is ready
    autoplay_armed: bool,
    /// Item whose end-of-media rewind will stop playback when it completes
    end_rewind: Option<ItemId>,
    last_error: Option<PlayerError>,
    torn_down: bool,
}

impl Player {
    /// Build a player; `sink` must feed the channel this player is driven from
    pub fn new(
        mut engine: Box<dyn MediaEngine>,
        mut surface: Box<dyn VideoSurface>,
        settings: PlayerSettings,
        sink: InputSender,
    ) -> Self {
        surface.set_fill_mode(settings.fill_mode);
        engine.set_action_at_item_end(action_at_item_end(&settings));

        Self {
            engine,
            surface,
            delegate: None,
            settings,
            sink,
            playback_state: PlaybackState::Stopped,
            buffering: BufferingMonitor::new(),
            loader: AssetLoader::new(),
            observations: Observations::new(),
            pending_seek: None,
            autoplay_activated: false,
            autoplay_armed: false,
            end_rewind: None,
            last_error: None,
            torn_down: false,
        }
    }

    pub fn set_delegate(&mut self, delegate: Option<Arc<dyn PlayerDelegate>>) {
        self.delegate = delegate;
    }

    /// Sender feeding this player's input channel
    pub fn sink(&self) -> InputSender {
        self.sink.clone()
    }

    /// Register engine rate and surface readiness observations
    pub fn attach(&mut self) {
        if self.torn_down {
            return;
        }
        self.observations
            .attach(self.engine.as_mut(), self.surface.as_mut(), &self.sink);
    }

    /// Process one message from the coordination channel
    pub fn handle(&mut self, input: PlayerInput) {
        if self.torn_down {
            match input {
                PlayerInput::Command(Command::Shutdown(done)) => {
                    let _ = done.send(());
                }
                PlayerInput::Command(Command::Snapshot(reply)) => {
                    let _ = reply.send(self.snapshot());
                }
                other => trace!("Player torn down; dropping {:?}", other),
            }
            return;
        }

        match input {
            PlayerInput::Command(command) => self.handle_command(command),
            PlayerInput::AssetLoaded { generation, asset } => {
                self.on_asset_loaded(generation, asset)
            }
            PlayerInput::Item { item, signal } => {
                if self.observations.is_current_item(item) {
                    self.on_item_signal(signal);
                } else {
                    debug!("Dropping {:?} from stale item {}", signal, item);
                }
            }
            PlayerInput::TimeTick { observer, time } => {
                if self.observations.is_time_observer(observer) {
                    self.notify(|d| d.on_current_time_changed(time));
                } else {
                    trace!("Dropping tick from stale observer {:?}", observer);
                }
            }
            PlayerInput::RateChanged { observer, rate } => {
                if self.observations.is_rate_observer(observer) {
                    debug!("Engine rate changed to {}", rate);
                }
            }
            PlayerInput::SeekFinished {
                completion,
                finished,
            } => self.on_seek_finished(completion, finished),
            PlayerInput::SurfaceReadiness { observer, ready } => {
                if self.observations.is_surface_observer(observer) && ready {
                    info!("Surface ready for display");
                    self.notify(|d| d.on_ready());
                }
            }
            PlayerInput::Lifecycle(event) => self.on_lifecycle(event),
        }
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Load(source) => self.load(source),
            Command::PlayFromBeginning => self.play_from_beginning(),
            Command::PlayFromCurrentTime => self.play_from_current_time(),
            Command::Pause => self.pause(),
            Command::Stop => self.stop(),
            Command::Seek { to, completion } => self.seek(to, completion),
            Command::SeekToSecond { second, completion } => {
                self.seek_to_second(second, completion)
            }
            Command::SeekWithTolerance {
                to,
                before,
                after,
                completion,
            } => self.seek_with_tolerance(to, before, after, completion),
            Command::SetMuted(muted) => self.set_muted(muted),
            Command::SetVolume(volume) => self.set_volume(volume),
            Command::SetFillMode(mode) => self.set_fill_mode(mode),
            Command::SetPlaybackLoops(loops) => self.set_playback_loops(loops),
            Command::UpdateSettings(settings) => {
                if let Err(e) = self.update_settings(settings) {
                    warn!("Rejected settings update: {}", e);
                }
            }
            Command::HostDidDisappear => self.host_did_disappear(),
            Command::Snapshot(reply) => {
                let _ = reply.send(self.snapshot());
            }
            Command::Shutdown(done) => {
                self.teardown();
                let _ = done.send(());
            }
        }
    }

    // ========================================
    // Asset loading
    // ========================================

    /// Replace the current media
    pub fn load(&mut self, source: MediaSource) {
        info!("Loading {}", source);

        if self.playback_state.is_playing() {
            self.pause();
        }
        self.autoplay_activated = false;
        self.setup_player_item(None);
        if let Some(discarded) = self.pending_seek.take() {
            debug!("Discarding pending seek to {:?}", discarded);
        }
        self.last_error = None;

        // Leaving paused or failed for the new media
        self.write_playback_state(PlaybackState::Stopped);
        let reset = self.buffering.reset(self.settings.playback_edge_triggered);
        self.notify_buffering(reset);

        self.autoplay_armed = self.settings.autoplay;
        let reply = self.loader.begin(source.clone(), &self.sink);
        self.engine.load_asset(&source, &AssetKey::REQUIRED, reply);
    }

    fn on_asset_loaded(&mut self, generation: u64, asset: ResolvedAsset) {
        if !self.loader.accept(generation) {
            debug!(
                "Ignoring stale asset completion {} (current load {})",
                generation,
                self.loader.generation()
            );
            return;
        }

        if let Err(e) = AssetLoader::validate(&asset) {
            self.fail(e);
            return;
        }

        match self.engine.create_item(asset.handle) {
            Ok(item) => {
                info!(
                    "Asset ready: duration={:?} rate={}",
                    asset.duration, asset.preferred_rate
                );
                self.setup_player_item(Some(item));
            }
            Err(e) => self.fail(e),
        }
    }

    /// Swap the engine's item, moving observations along with it
    fn setup_player_item(&mut self, item: Option<ItemId>) {
        self.end_rewind = None;
        self.observations.release_item(self.engine.as_mut());
        // Readiness goes false here so the next ReadyToPlay reports it again
        self.surface.set_hidden(true);
        self.surface.detach_output();
        self.engine.replace_current_item(item);

        if let Some(item) = item {
            if let Some(to) = self.pending_seek.take() {
                debug!("Applying pending seek to {:?}", to);
                self.engine.seek_item(item, to, None, None);
            }
            let interval = self.settings.time_observer_interval();
            self.observations
                .observe_item(self.engine.as_mut(), item, &self.sink, interval);
            self.engine
                .set_action_at_item_end(action_at_item_end(&self.settings));
        }
    }

    // ========================================
    // Item signals
    // ========================================

    fn on_item_signal(&mut self, signal: ItemSignal) {
        trace!("Item signal {:?}", signal);
        match signal {
            ItemSignal::StatusChanged(ItemStatus::ReadyToPlay) => {
                self.surface.attach_output();
                self.surface.set_hidden(false);
                self.fire_autoplay();
            }
            ItemSignal::StatusChanged(ItemStatus::Failed(reason)) => {
                self.fail(PlayerError::EngineItemFailure(reason));
            }
            ItemSignal::StatusChanged(ItemStatus::Unknown) => {}
            ItemSignal::BufferEmpty(true) => {
                self.write_buffering_state(BufferingState::Delayed);
            }
            ItemSignal::LikelyToKeepUp(true) => {
                self.write_buffering_state(BufferingState::Ready);
                if self.autoplay_armed {
                    self.fire_autoplay();
                } else if self.playback_state.is_playing() {
                    self.play();
                }
            }
            ItemSignal::BufferEmpty(false) | ItemSignal::LikelyToKeepUp(false) => {}
            ItemSignal::LoadedTimeRanges(ranges) => self.on_loaded_ranges(&ranges),
            ItemSignal::PlayedToEnd => self.on_played_to_end(),
            ItemSignal::FailedToPlayToEnd(reason) => {
                self.fail(PlayerError::EndOfMediaFailure(reason));
            }
        }
    }

    fn on_loaded_ranges(&mut self, ranges: &[TimeRange]) {
        let update = self.buffering.on_loaded_ranges(
            ranges,
            self.engine.current_time(),
            self.engine.duration(),
            self.settings.buffer_size(),
        );
        if let Some(secs) = update.buffer_time_changed {
            self.notify(|d| d.on_buffer_time_changed(secs));
        }
        if update.should_resume && self.playback_state.is_playing() {
            self.play();
        }
    }

    fn on_played_to_end(&mut self) {
        if self.settings.playback_loops {
            info!("End of media; looping");
            self.notify(|d| d.on_will_loop());
            self.engine.seek(Duration::ZERO, None);
        } else if self.settings.playback_freezes_at_end {
            info!("End of media; freezing on last frame");
            self.stop();
        } else {
            info!("End of media; rewinding");
            let Some(item) = self.observations.current_item() else {
                self.stop();
                return;
            };
            self.end_rewind = Some(item);
            let reply = SeekReply::new(SeekCompletion::StopPlayback(item), self.sink.clone());
            self.engine.seek(Duration::ZERO, Some(reply));
        }
    }

    fn on_seek_finished(&mut self, completion: SeekCompletion, finished: bool) {
        match completion {
            SeekCompletion::StopPlayback(item) => {
                if self.end_rewind == Some(item) && self.observations.is_current_item(item) {
                    self.end_rewind = None;
                    self.stop();
                } else {
                    debug!("Rewind of {} superseded; not stopping", item);
                }
            }
            SeekCompletion::Notify(reply) => {
                let _ = reply.send(finished);
            }
        }
    }

    fn on_lifecycle(&mut self, event: LifecycleEvent) {
        match lifecycle_action(event, self.playback_state, &self.settings) {
            Some(LifecycleAction::Pause) => {
                debug!("{:?}: pausing", event);
                self.pause();
            }
            Some(LifecycleAction::Resume) => {
                debug!("{:?}: resuming", event);
                self.play();
            }
            None => trace!("{:?}: no action", event),
        }
    }

    // ========================================
    // Transport
    // ========================================

    /// Restart from time zero
    pub fn play_from_beginning(&mut self) {
        if self.playback_state.is_failed() {
            debug!("Play from beginning ignored while failed");
            return;
        }
        self.notify(|d| d.on_will_start_from_beginning());
        self.engine.seek(Duration::ZERO, None);
        self.play_from_current_time();
    }

    /// Explicit play request
    pub fn play_from_current_time(&mut self) {
        if self.playback_state.is_failed() {
            debug!("Play ignored while failed");
            return;
        }
        if !self.settings.autoplay {
            self.autoplay_activated = true;
        }
        self.autoplay_armed = false;
        self.end_rewind = None;
        self.play();
    }

    /// Guarded play used by explicit requests and automatic triggers
    fn play(&mut self) {
        if self.playback_state.is_failed() {
            return;
        }
        if !(self.settings.autoplay || self.autoplay_activated) {
            debug!("Play suppressed until an explicit play request");
            return;
        }
        self.engine.play();
        self.write_playback_state(PlaybackState::Playing);
    }

    fn fire_autoplay(&mut self) {
        if self.autoplay_armed {
            self.autoplay_armed = false;
            debug!("Autoplay starting playback");
            self.play();
        }
    }

    pub fn pause(&mut self) {
        self.autoplay_armed = false;
        self.end_rewind = None;
        if !self.playback_state.is_playing() {
            return;
        }
        self.engine.pause();
        self.write_playback_state(PlaybackState::Paused);
    }

    pub fn stop(&mut self) {
        self.autoplay_armed = false;
        self.end_rewind = None;
        if matches!(
            self.playback_state,
            PlaybackState::Stopped | PlaybackState::Failed
        ) {
            return;
        }
        self.engine.pause();
        self.write_playback_state(PlaybackState::Stopped);
        self.notify(|d| d.on_playback_did_end());
    }

    /// Seek the current item, or remember the target until one exists
    pub fn seek(&mut self, to: Duration, completion: Option<SeekCompletion>) {
        match self.observations.current_item() {
            Some(item) => {
                let reply = completion.map(|c| SeekReply::new(c, self.sink.clone()));
                self.engine.seek_item(item, to, None, reply);
            }
            None => {
                debug!("No item yet; recording pending seek to {:?}", to);
                self.pending_seek = Some(to);
                answer_unfinished(completion);
            }
        }
    }

    /// Engine-level seek to a whole second
    pub fn seek_to_second(&mut self, second: u64, completion: Option<SeekCompletion>) {
        let reply = completion.map(|c| SeekReply::new(c, self.sink.clone()));
        self.engine.seek(Duration::from_secs(second), reply);
    }

    /// Seek within `before`/`after` of `to`; only with a current item
    pub fn seek_with_tolerance(
        &mut self,
        to: Duration,
        before: Duration,
        after: Duration,
        completion: Option<SeekCompletion>,
    ) {
        match self.observations.current_item() {
            Some(item) => {
                let reply = completion.map(|c| SeekReply::new(c, self.sink.clone()));
                self.engine.seek_item(item, to, Some((before, after)), reply);
            }
            None => {
                debug!("Tolerant seek ignored without an item");
                answer_unfinished(completion);
            }
        }
    }

    /// The hosting view went away
    pub fn host_did_disappear(&mut self) {
        if self.playback_state.is_playing() {
            self.pause();
        }
    }

    // ========================================
    // Settings and passthroughs
    // ========================================

    pub fn settings(&self) -> &PlayerSettings {
        &self.settings
    }

    /// Replace all settings, re-syncing the engine and surface
    pub fn update_settings(&mut self, settings: PlayerSettings) -> crate::error::Result<()> {
        settings.validate()?;
        self.settings = settings;
        self.surface.set_fill_mode(self.settings.fill_mode);
        self.engine
            .set_action_at_item_end(action_at_item_end(&self.settings));
        Ok(())
    }

    pub fn set_playback_loops(&mut self, loops: bool) {
        self.settings.playback_loops = loops;
        self.engine
            .set_action_at_item_end(action_at_item_end(&self.settings));
    }

    pub fn set_fill_mode(&mut self, mode: FillMode) {
        self.settings.fill_mode = mode;
        self.surface.set_fill_mode(mode);
    }

    pub fn fill_mode(&self) -> FillMode {
        self.surface.fill_mode()
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.engine.set_muted(muted);
    }

    pub fn is_muted(&self) -> bool {
        self.engine.is_muted()
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.engine.set_volume(volume.clamp(0.0, 1.0));
    }

    pub fn volume(&self) -> f32 {
        self.engine.volume()
    }

    // ========================================
    // Queries
    // ========================================

    pub fn playback_state(&self) -> PlaybackState {
        self.playback_state
    }

    pub fn buffering_state(&self) -> BufferingState {
        self.buffering.state()
    }

    pub fn is_playing(&self) -> bool {
        self.playback_state.is_playing()
    }

    pub fn current_item(&self) -> Option<ItemId> {
        self.observations.current_item()
    }

    pub fn pending_seek(&self) -> Option<Duration> {
        self.pending_seek
    }

    pub fn last_error(&self) -> Option<&PlayerError> {
        self.last_error.as_ref()
    }

    pub fn current_time(&self) -> Option<Duration> {
        self.current_item().and(self.engine.current_time())
    }

    pub fn maximum_duration(&self) -> Option<Duration> {
        self.current_item().and(self.engine.duration())
    }

    pub fn natural_size(&self) -> Option<NaturalSize> {
        self.current_item().and(self.engine.natural_size())
    }

    pub fn surface(&self) -> &dyn VideoSurface {
        self.surface.as_ref()
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            playback_state: self.playback_state,
            buffering_state: self.buffering.state(),
            source: self.loader.source().map(|s| s.to_string()),
            load_generation: self.loader.generation(),
            loading: self.loader.is_loading(),
            item: self.current_item(),
            current_time: self.current_time(),
            maximum_duration: self.maximum_duration(),
            buffered_time: self.buffering.buffer_time(),
            pending_seek: self.pending_seek,
            muted: self.is_muted(),
            volume: self.volume(),
            fill_mode: self.fill_mode(),
            last_error: self.last_error.as_ref().map(|e| e.to_string()),
        }
    }

    // ========================================
    // Teardown
    // ========================================

    /// Pause, release the item and remove every observation
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        info!("Tearing down player");
        self.engine.pause();
        self.setup_player_item(None);
        self.observations
            .detach(self.engine.as_mut(), self.surface.as_mut());
        self.surface.detach_output();
        self.delegate = None;
        self.torn_down = true;
    }

    // ========================================
    // State writes and notifications
    // ========================================

    fn fail(&mut self, error: PlayerError) {
        warn!("Playback failed: {}", error);
        self.autoplay_armed = false;
        if self.playback_state.is_playing() {
            self.engine.pause();
        }
        self.write_playback_state(PlaybackState::Failed);
        self.notify(|d| d.on_playback_error(Some(&error)));
        self.last_error = Some(error);
    }

    fn write_playback_state(&mut self, state: PlaybackState) {
        let previous = self.playback_state;
        self.playback_state = state;
        if previous != state {
            info!("Playback state: {} -> {}", previous, state);
        }
        if previous != state || !self.settings.playback_edge_triggered {
            self.notify(|d| d.on_playback_state_changed(state));
        }
    }

    fn write_buffering_state(&mut self, state: BufferingState) {
        let notify = self
            .buffering
            .write(state, self.settings.playback_edge_triggered);
        self.notify_buffering(notify);
    }

    fn notify_buffering(&self, state: Option<BufferingState>) {
        if let Some(state) = state {
            debug!("Buffering state: {:?}", state);
            self.notify(|d| d.on_buffering_state_changed(state));
        }
    }

    fn notify(&self, f: impl FnOnce(&dyn PlayerDelegate)) {
        if let Some(delegate) = &self.delegate {
            f(delegate.as_ref());
        }
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn action_at_item_end(settings: &PlayerSettings) -> ActionAtItemEnd {
    if settings.playback_loops {
        ActionAtItemEnd::None
    } else {
        ActionAtItemEnd::Pause
    }
}

fn answer_unfinished(completion: Option<SeekCompletion>) {
    if let Some(SeekCompletion::Notify(reply)) = completion {
        let _ = reply.send(false);
    }
}
