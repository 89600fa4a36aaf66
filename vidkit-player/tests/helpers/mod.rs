//! Test helpers for vidkit-player integration tests
//!
//! - `RecordingDelegate`: records every delegate callback in order
//! - `Harness`: a `Player` on the simulated engine, pumped synchronously

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use vidkit_common::{BufferingState, PlaybackState, PlayerSettings};
use vidkit_player::engine::sim::{EngineCall, SimController, SimEngine, SimMedia};
use vidkit_player::{
    input_channel, InputReceiver, LayerSurface, MediaSource, Player, PlayerDelegate, PlayerError,
};

pub const CLIP: &str = "clip.mp4";

/// One delegate callback
#[derive(Debug, Clone, PartialEq)]
pub enum Note {
    Ready,
    State(PlaybackState),
    Buffering(BufferingState),
    BufferTime(f64),
    Time(Duration),
    WillStartFromBeginning,
    DidEnd,
    WillLoop,
    Error(Option<PlayerError>),
}

#[derive(Debug, Default)]
pub struct RecordingDelegate {
    notes: Mutex<Vec<Note>>,
}

impl RecordingDelegate {
    fn push(&self, note: Note) {
        self.notes.lock().unwrap().push(note);
    }

    pub fn notes(&self) -> Vec<Note> {
        self.notes.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.notes.lock().unwrap().clear();
    }

    pub fn states(&self) -> Vec<PlaybackState> {
        self.notes()
            .into_iter()
            .filter_map(|note| match note {
                Note::State(state) => Some(state),
                _ => None,
            })
            .collect()
    }

    pub fn buffering(&self) -> Vec<BufferingState> {
        self.notes()
            .into_iter()
            .filter_map(|note| match note {
                Note::Buffering(state) => Some(state),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<Option<PlayerError>> {
        self.notes()
            .into_iter()
            .filter_map(|note| match note {
                Note::Error(error) => Some(error),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, wanted: &Note) -> usize {
        self.notes().iter().filter(|note| *note == wanted).count()
    }
}

impl PlayerDelegate for RecordingDelegate {
    fn on_ready(&self) {
        self.push(Note::Ready);
    }

    fn on_playback_state_changed(&self, state: PlaybackState) {
        self.push(Note::State(state));
    }

    fn on_buffering_state_changed(&self, state: BufferingState) {
        self.push(Note::Buffering(state));
    }

    fn on_buffer_time_changed(&self, buffered_secs: f64) {
        self.push(Note::BufferTime(buffered_secs));
    }

    fn on_current_time_changed(&self, time: Duration) {
        self.push(Note::Time(time));
    }

    fn on_will_start_from_beginning(&self) {
        self.push(Note::WillStartFromBeginning);
    }

    fn on_playback_did_end(&self) {
        self.push(Note::DidEnd);
    }

    fn on_will_loop(&self) {
        self.push(Note::WillLoop);
    }

    fn on_playback_error(&self, error: Option<&PlayerError>) {
        self.push(Note::Error(error.cloned()));
    }
}

/// Player wired to a simulated engine, driven without a runtime
pub struct Harness {
    pub player: Player,
    pub sim: SimController,
    pub inbox: InputReceiver,
    pub delegate: Arc<RecordingDelegate>,
}

impl Harness {
    /// Player with a 10 second clip registered at `CLIP`
    pub fn new(settings: PlayerSettings) -> Self {
        let engine = SimEngine::new();
        let sim = engine.controller();
        sim.register(CLIP, SimMedia::clip(Duration::from_secs(10)));

        let (sink, inbox) = input_channel();
        let mut player = Player::new(
            Box::new(engine),
            Box::new(LayerSurface::new()),
            settings,
            sink,
        );
        let delegate = Arc::new(RecordingDelegate::default());
        player.set_delegate(Some(delegate.clone()));
        player.attach();

        Self {
            player,
            sim,
            inbox,
            delegate,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(PlayerSettings::default())
    }

    /// Process every queued input
    pub fn pump(&mut self) {
        while let Ok(input) = self.inbox.try_recv() {
            self.player.handle(input);
        }
    }

    pub fn load(&mut self, locator: &str) {
        self.player.load(MediaSource::Locator(locator.into()));
        self.pump();
    }

    /// Advance simulated time in 100 ms steps, pumping after each
    pub fn run_for(&mut self, total: Duration) {
        let step = Duration::from_millis(100);
        let mut elapsed = Duration::ZERO;
        while elapsed < total {
            self.sim.advance(step);
            self.pump();
            elapsed += step;
        }
    }

    pub fn engine_calls(&self, wanted: &EngineCall) -> usize {
        self.sim.calls().iter().filter(|call| *call == wanted).count()
    }
}
