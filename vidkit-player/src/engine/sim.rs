//! Deterministic in-process media engine
//!
//! `SimEngine` implements `MediaEngine` against a catalog of simulated clips.
//! Time only moves when `SimController::advance` is called, which makes
//! playback scenarios reproducible in tests and in the `vidkit-sim` binary.
//!
//! The engine and its controller share state behind a mutex; the controller
//! is the test/driver side (advance the clock, inject signals, inspect the
//! call log and the live observer count).

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::{debug, trace};

use super::{MediaEngine, ResolvedAsset};
use crate::error::{PlayerError, Result};
use crate::events::{InputSender, ItemSignal, LoadReply, PlayerInput, SeekReply};
use crate::types::{
    ActionAtItemEnd, AssetHandle, AssetKey, ItemId, ItemStatus, KeyStatus, MediaSource,
    NaturalSize, ObserverId, TimeRange,
};

/// Description of one simulated clip
#[derive(Debug, Clone, PartialEq)]
pub struct SimMedia {
    pub duration: Duration,
    pub playable: bool,
    /// Key that fails to resolve, if any
    pub failing_key: Option<AssetKey>,
    pub natural_size: NaturalSize,
    /// Media seconds buffered per second of simulated time
    pub download_rate: f64,
    /// Media already buffered when the item is created
    pub initially_buffered: Duration,
}

impl SimMedia {
    pub fn clip(duration: Duration) -> Self {
        Self {
            duration,
            playable: true,
            failing_key: None,
            natural_size: NaturalSize {
                width: 1920,
                height: 1080,
            },
            download_rate: 4.0,
            initially_buffered: duration.min(Duration::from_secs(2)),
        }
    }

    pub fn unplayable(duration: Duration) -> Self {
        Self {
            playable: false,
            ..Self::clip(duration)
        }
    }

    pub fn with_failing_key(mut self, key: AssetKey) -> Self {
        self.failing_key = Some(key);
        self
    }

    pub fn with_download_rate(mut self, rate: f64) -> Self {
        self.download_rate = rate;
        self
    }

    pub fn with_initially_buffered(mut self, buffered: Duration) -> Self {
        self.initially_buffered = buffered.min(self.duration);
        self
    }

    fn resolve(&self, handle: AssetHandle) -> ResolvedAsset {
        ResolvedAsset {
            handle,
            keys: AssetKey::REQUIRED
                .iter()
                .map(|key| {
                    let status = if self.failing_key == Some(*key) {
                        KeyStatus::Failed(format!("simulated failure loading {}", key))
                    } else {
                        KeyStatus::Loaded
                    };
                    (*key, status)
                })
                .collect(),
            playable: self.playable,
            duration: Some(self.duration),
            preferred_rate: 1.0,
        }
    }
}

/// Engine call recorded for inspection
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    LoadAsset(MediaSource),
    CreateItem(ItemId),
    ReplaceItem(Option<ItemId>),
    Play,
    Pause,
    Seek(Duration),
    SeekItem(ItemId, Duration),
    SetActionAtItemEnd(ActionAtItemEnd),
}

#[derive(Debug)]
struct SimItem {
    media: SimMedia,
    position: Duration,
    buffered: Duration,
    ended: bool,
    stalled: bool,
}

impl SimItem {
    fn loaded_ranges(&self) -> Vec<TimeRange> {
        if self.buffered.is_zero() {
            Vec::new()
        } else {
            vec![TimeRange::new(Duration::ZERO, self.buffered)]
        }
    }

    fn seek_to(&mut self, to: Duration) {
        self.position = to.min(self.media.duration);
        self.ended = false;
        if self.buffered < self.position {
            self.buffered = self.position;
        }
    }
}

#[derive(Debug)]
enum ObserverKind {
    Item(ItemId),
    Time { interval: Duration, elapsed: Duration },
    Rate,
}

#[derive(Debug)]
struct SimObserver {
    kind: ObserverKind,
    sink: InputSender,
}

#[derive(Debug)]
struct SimInner {
    catalog: HashMap<String, SimMedia>,
    assets: HashMap<AssetHandle, SimMedia>,
    /// One asset per locator, reused across loads
    locator_assets: HashMap<String, AssetHandle>,
    next_asset: u64,
    items: HashMap<ItemId, SimItem>,
    current: Option<ItemId>,
    rate: f32,
    muted: bool,
    volume: f32,
    action_at_item_end: ActionAtItemEnd,
    observers: BTreeMap<ObserverId, SimObserver>,
    next_observer: u64,
    defer_loads: bool,
    pending_loads: VecDeque<(MediaSource, LoadReply)>,
    calls: Vec<EngineCall>,
}

impl SimInner {
    fn new() -> Self {
        Self {
            catalog: HashMap::new(),
            assets: HashMap::new(),
            locator_assets: HashMap::new(),
            next_asset: 1,
            items: HashMap::new(),
            current: None,
            rate: 0.0,
            muted: false,
            volume: 1.0,
            action_at_item_end: ActionAtItemEnd::default(),
            observers: BTreeMap::new(),
            next_observer: 1,
            defer_loads: false,
            pending_loads: VecDeque::new(),
            calls: Vec::new(),
        }
    }

    fn register_observer(&mut self, kind: ObserverKind, sink: InputSender) -> ObserverId {
        let id = ObserverId(self.next_observer);
        self.next_observer += 1;
        self.observers.insert(id, SimObserver { kind, sink });
        id
    }

    fn new_asset(&mut self, media: SimMedia) -> AssetHandle {
        let handle = AssetHandle(self.next_asset);
        self.next_asset += 1;
        self.assets.insert(handle, media);
        handle
    }

    fn locator_asset(&mut self, locator: &str, media: &SimMedia) -> AssetHandle {
        match self.locator_assets.get(locator) {
            Some(&handle) => {
                self.assets.insert(handle, media.clone());
                handle
            }
            None => {
                let handle = self.new_asset(media.clone());
                self.locator_assets.insert(locator.to_string(), handle);
                handle
            }
        }
    }

    fn resolve(&mut self, source: &MediaSource) -> ResolvedAsset {
        let media = match source {
            MediaSource::Locator(locator) => self.catalog.get(locator.as_str()).cloned(),
            MediaSource::Asset(handle) => self.assets.get(handle).cloned(),
        };

        match media {
            Some(media) => {
                let handle = match source {
                    MediaSource::Asset(handle) => *handle,
                    MediaSource::Locator(locator) => self.locator_asset(locator.as_str(), &media),
                };
                media.resolve(handle)
            }
            None => {
                let handle = AssetHandle(0);
                ResolvedAsset {
                    handle,
                    keys: AssetKey::REQUIRED
                        .iter()
                        .map(|key| (*key, KeyStatus::Failed(format!("no media at {}", source))))
                        .collect(),
                    playable: false,
                    duration: None,
                    preferred_rate: 0.0,
                }
            }
        }
    }

    fn item_signal(&self, item: ItemId, signal: ItemSignal) {
        for observer in self.observers.values() {
            if let ObserverKind::Item(observed) = observer.kind {
                if observed == item {
                    observer.sink.item(item, signal.clone());
                }
            }
        }
    }

    fn set_rate(&mut self, rate: f32) {
        if self.rate == rate {
            return;
        }
        self.rate = rate;
        for (id, observer) in &self.observers {
            if let ObserverKind::Rate = observer.kind {
                observer.sink.send(PlayerInput::RateChanged { observer: *id, rate });
            }
        }
    }

    fn seek_item(&mut self, item: ItemId, to: Duration) -> bool {
        match self.items.get_mut(&item) {
            Some(sim_item) => {
                sim_item.seek_to(to);
                true
            }
            None => false,
        }
    }

    fn advance(&mut self, dt: Duration) {
        let Some(current) = self.current else {
            return;
        };
        let rate = self.rate;
        let action = self.action_at_item_end;

        let mut signals = Vec::new();
        let mut pause_engine = false;
        let position = {
            let Some(item) = self.items.get_mut(&current) else {
                return;
            };

            let grown = item.buffered
                + Duration::from_secs_f64(dt.as_secs_f64() * item.media.download_rate.max(0.0));
            let grown = grown.min(item.media.duration);
            if grown != item.buffered {
                item.buffered = grown;
                signals.push(ItemSignal::LoadedTimeRanges(item.loaded_ranges()));
            }

            let recovered = item.buffered >= item.position + Duration::from_secs(1)
                || item.buffered == item.media.duration;
            if item.stalled && recovered {
                item.stalled = false;
                signals.push(ItemSignal::BufferEmpty(false));
                signals.push(ItemSignal::LikelyToKeepUp(true));
            }

            if rate > 0.0 && !item.ended && !item.stalled {
                item.position = (item.position + dt).min(item.buffered);
                if item.position >= item.media.duration {
                    item.position = item.media.duration;
                    item.ended = true;
                    signals.push(ItemSignal::PlayedToEnd);
                    pause_engine = action == ActionAtItemEnd::Pause;
                } else if item.position == item.buffered {
                    item.stalled = true;
                    signals.push(ItemSignal::LikelyToKeepUp(false));
                    signals.push(ItemSignal::BufferEmpty(true));
                    pause_engine = true;
                }
            }
            item.position
        };

        for (id, observer) in self.observers.iter_mut() {
            if let ObserverKind::Time { interval, elapsed } = &mut observer.kind {
                *elapsed += dt;
                if *elapsed >= *interval {
                    *elapsed = Duration::ZERO;
                    observer.sink.send(PlayerInput::TimeTick {
                        observer: *id,
                        time: position,
                    });
                }
            }
        }

        if pause_engine {
            self.set_rate(0.0);
        }
        for signal in signals {
            trace!("Sim item {} signal {:?}", current, signal);
            self.item_signal(current, signal);
        }
    }
}

/// Simulated media engine
#[derive(Debug)]
pub struct SimEngine {
    inner: Arc<Mutex<SimInner>>,
}

impl SimEngine {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(SimInner::new())),
        }
    }

    /// Driver handle sharing this engine's state
    pub fn controller(&self) -> SimController {
        SimController {
            inner: Arc::clone(&self.inner),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SimInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SimEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaEngine for SimEngine {
    fn load_asset(&mut self, source: &MediaSource, keys: &[AssetKey], reply: LoadReply) {
        let mut inner = self.lock();
        inner.calls.push(EngineCall::LoadAsset(source.clone()));
        debug!(
            "Sim loading {} ({} keys, generation {})",
            source,
            keys.len(),
            reply.generation()
        );
        if inner.defer_loads {
            inner.pending_loads.push_back((source.clone(), reply));
        } else {
            let asset = inner.resolve(source);
            reply.complete(asset);
        }
    }

    fn create_item(&mut self, asset: AssetHandle) -> Result<ItemId> {
        let mut inner = self.lock();
        let media = inner.assets.get(&asset).cloned().ok_or_else(|| {
            PlayerError::EngineItemFailure(format!("unknown asset handle {}", asset.0))
        })?;
        let id = ItemId::new();
        let buffered = media.initially_buffered;
        inner.items.insert(
            id,
            SimItem {
                media,
                position: Duration::ZERO,
                buffered,
                ended: false,
                stalled: false,
            },
        );
        inner.calls.push(EngineCall::CreateItem(id));
        Ok(id)
    }

    fn replace_current_item(&mut self, item: Option<ItemId>) {
        let mut inner = self.lock();
        inner.calls.push(EngineCall::ReplaceItem(item));
        if let Some(previous) = inner.current.take() {
            if Some(previous) != item {
                inner.items.remove(&previous);
            }
        }
        inner.current = item;
    }

    fn current_item(&self) -> Option<ItemId> {
        self.lock().current
    }

    fn set_action_at_item_end(&mut self, action: ActionAtItemEnd) {
        let mut inner = self.lock();
        if inner.action_at_item_end != action {
            inner.calls.push(EngineCall::SetActionAtItemEnd(action));
            inner.action_at_item_end = action;
        }
    }

    fn play(&mut self) {
        let mut inner = self.lock();
        inner.calls.push(EngineCall::Play);
        inner.set_rate(1.0);
    }

    fn pause(&mut self) {
        let mut inner = self.lock();
        inner.calls.push(EngineCall::Pause);
        inner.set_rate(0.0);
    }

    fn rate(&self) -> f32 {
        self.lock().rate
    }

    fn seek(&mut self, to: Duration, reply: Option<SeekReply>) {
        let mut inner = self.lock();
        inner.calls.push(EngineCall::Seek(to));
        let finished = match inner.current {
            Some(current) => inner.seek_item(current, to),
            None => false,
        };
        if let Some(reply) = reply {
            reply.finish(finished);
        }
    }

    fn seek_item(
        &mut self,
        item: ItemId,
        to: Duration,
        _tolerance: Option<(Duration, Duration)>,
        reply: Option<SeekReply>,
    ) {
        let mut inner = self.lock();
        inner.calls.push(EngineCall::SeekItem(item, to));
        let finished = inner.seek_item(item, to);
        if let Some(reply) = reply {
            reply.finish(finished);
        }
    }

    fn current_time(&self) -> Option<Duration> {
        let inner = self.lock();
        inner
            .current
            .and_then(|id| inner.items.get(&id))
            .map(|item| item.position)
    }

    fn duration(&self) -> Option<Duration> {
        let inner = self.lock();
        inner
            .current
            .and_then(|id| inner.items.get(&id))
            .map(|item| item.media.duration)
    }

    fn natural_size(&self) -> Option<NaturalSize> {
        let inner = self.lock();
        inner
            .current
            .and_then(|id| inner.items.get(&id))
            .map(|item| item.media.natural_size)
    }

    fn is_muted(&self) -> bool {
        self.lock().muted
    }

    fn set_muted(&mut self, muted: bool) {
        self.lock().muted = muted;
    }

    fn volume(&self) -> f32 {
        self.lock().volume
    }

    fn set_volume(&mut self, volume: f32) {
        self.lock().volume = volume;
    }

    fn observe_item(&mut self, item: ItemId, sink: InputSender) -> ObserverId {
        let mut inner = self.lock();
        let id = inner.register_observer(ObserverKind::Item(item), sink.clone());

        // Initial values, as a key-value observer would report them
        if let Some(sim_item) = inner.items.get(&item) {
            sink.item(item, ItemSignal::StatusChanged(ItemStatus::ReadyToPlay));
            sink.item(item, ItemSignal::LoadedTimeRanges(sim_item.loaded_ranges()));
            if !sim_item.buffered.is_zero() {
                sink.item(item, ItemSignal::LikelyToKeepUp(true));
            }
        }
        id
    }

    fn add_periodic_time_observer(
        &mut self,
        interval: Duration,
        sink: InputSender,
    ) -> ObserverId {
        self.lock().register_observer(
            ObserverKind::Time {
                interval,
                elapsed: Duration::ZERO,
            },
            sink,
        )
    }

    fn observe_rate(&mut self, sink: InputSender) -> ObserverId {
        self.lock().register_observer(ObserverKind::Rate, sink)
    }

    fn remove_observer(&mut self, id: ObserverId) {
        if self.lock().observers.remove(&id).is_none() {
            debug!("Sim asked to remove unknown observer {:?}", id);
        }
    }
}

/// Driver side of a `SimEngine`
#[derive(Debug, Clone)]
pub struct SimController {
    inner: Arc<Mutex<SimInner>>,
}

impl SimController {
    fn lock(&self) -> MutexGuard<'_, SimInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make `media` loadable at `locator`
    pub fn register(&self, locator: impl Into<String>, media: SimMedia) {
        self.lock().catalog.insert(locator.into(), media);
    }

    /// Build an asset ahead of time, for loading via `MediaSource::Asset`
    pub fn prebuild_asset(&self, media: SimMedia) -> AssetHandle {
        self.lock().new_asset(media)
    }

    /// Hold asset loads until `complete_next_load` / `complete_pending_loads`
    pub fn set_defer_loads(&self, defer: bool) {
        self.lock().defer_loads = defer;
    }

    pub fn pending_load_count(&self) -> usize {
        self.lock().pending_loads.len()
    }

    /// Complete the oldest deferred load; false when none is pending
    pub fn complete_next_load(&self) -> bool {
        let mut inner = self.lock();
        match inner.pending_loads.pop_front() {
            Some((source, reply)) => {
                let asset = inner.resolve(&source);
                reply.complete(asset);
                true
            }
            None => false,
        }
    }

    /// Complete the newest deferred load first, then the rest
    pub fn complete_pending_loads_reversed(&self) -> usize {
        let mut completed = 0;
        loop {
            let mut inner = self.lock();
            let Some((source, reply)) = inner.pending_loads.pop_back() else {
                break;
            };
            let asset = inner.resolve(&source);
            reply.complete(asset);
            completed += 1;
        }
        completed
    }

    pub fn complete_pending_loads(&self) -> usize {
        let mut completed = 0;
        while self.complete_next_load() {
            completed += 1;
        }
        completed
    }

    /// Move simulated time forward
    pub fn advance(&self, dt: Duration) {
        self.lock().advance(dt);
    }

    /// Deliver `signal` to observers of the current item
    pub fn emit_item_signal(&self, signal: ItemSignal) -> bool {
        let inner = self.lock();
        match inner.current {
            Some(current) => {
                inner.item_signal(current, signal);
                true
            }
            None => false,
        }
    }

    /// Deliver `signal` to observers of `item`, current or not
    pub fn emit_signal_for(&self, item: ItemId, signal: ItemSignal) {
        self.lock().item_signal(item, signal);
    }

    pub fn current_item(&self) -> Option<ItemId> {
        self.lock().current
    }

    /// Assets held by the engine, locator-backed and prebuilt
    pub fn asset_count(&self) -> usize {
        self.lock().assets.len()
    }

    pub fn position(&self) -> Option<Duration> {
        let inner = self.lock();
        inner
            .current
            .and_then(|id| inner.items.get(&id))
            .map(|item| item.position)
    }

    pub fn rate(&self) -> f32 {
        self.lock().rate
    }

    pub fn action_at_item_end(&self) -> ActionAtItemEnd {
        self.lock().action_at_item_end
    }

    pub fn live_item_count(&self) -> usize {
        self.lock().items.len()
    }

    pub fn observer_count(&self) -> usize {
        self.lock().observers.len()
    }

    /// Observers registered on `item`
    pub fn item_observer_count(&self, item: ItemId) -> usize {
        self.lock()
            .observers
            .values()
            .filter(|observer| matches!(observer.kind, ObserverKind::Item(id) if id == item))
            .count()
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{input_channel, InputReceiver};

    fn drain(rx: &mut InputReceiver) -> Vec<PlayerInput> {
        let mut inputs = Vec::new();
        while let Ok(input) = rx.try_recv() {
            inputs.push(input);
        }
        inputs
    }

    fn engine_with_clip(locator: &str, media: SimMedia) -> (SimEngine, SimController) {
        let engine = SimEngine::new();
        let controller = engine.controller();
        controller.register(locator, media);
        (engine, controller)
    }

    fn load_item(engine: &mut SimEngine, locator: &str) -> ItemId {
        let (sink, mut rx) = input_channel();
        engine.load_asset(
            &MediaSource::Locator(locator.into()),
            &AssetKey::REQUIRED,
            LoadReply::new(1, sink),
        );
        let asset = match drain(&mut rx).pop() {
            Some(PlayerInput::AssetLoaded { asset, .. }) => asset,
            other => panic!("expected asset, got {:?}", other),
        };
        let item = engine.create_item(asset.handle).unwrap();
        engine.replace_current_item(Some(item));
        item
    }

    #[test]
    fn test_unknown_locator_fails_every_key() {
        let mut engine = SimEngine::new();
        let (sink, mut rx) = input_channel();
        engine.load_asset(
            &MediaSource::Locator("missing.mp4".into()),
            &AssetKey::REQUIRED,
            LoadReply::new(1, sink),
        );

        match drain(&mut rx).pop() {
            Some(PlayerInput::AssetLoaded { asset, .. }) => {
                assert!(!asset.playable);
                assert!(asset.first_failed_key().is_some());
            }
            other => panic!("expected asset, got {:?}", other),
        }
    }

    #[test]
    fn test_failing_key_reported() {
        let (mut engine, _controller) = engine_with_clip(
            "a.mp4",
            SimMedia::clip(Duration::from_secs(5)).with_failing_key(AssetKey::Tracks),
        );
        let (sink, mut rx) = input_channel();
        engine.load_asset(
            &MediaSource::Locator("a.mp4".into()),
            &AssetKey::REQUIRED,
            LoadReply::new(1, sink),
        );

        match drain(&mut rx).pop() {
            Some(PlayerInput::AssetLoaded { asset, .. }) => {
                assert_eq!(asset.first_failed_key().map(|(k, _)| k), Some(AssetKey::Tracks));
            }
            other => panic!("expected asset, got {:?}", other),
        }
    }

    #[test]
    fn test_deferred_loads_complete_on_demand() {
        let (mut engine, controller) =
            engine_with_clip("a.mp4", SimMedia::clip(Duration::from_secs(5)));
        controller.set_defer_loads(true);

        let (sink, mut rx) = input_channel();
        engine.load_asset(
            &MediaSource::Locator("a.mp4".into()),
            &AssetKey::REQUIRED,
            LoadReply::new(4, sink),
        );
        assert!(drain(&mut rx).is_empty());
        assert_eq!(controller.pending_load_count(), 1);

        assert_eq!(controller.complete_pending_loads(), 1);
        assert!(matches!(
            drain(&mut rx).pop(),
            Some(PlayerInput::AssetLoaded { generation: 4, .. })
        ));
    }

    #[test]
    fn test_playback_reaches_end_and_pauses() {
        let (mut engine, controller) = engine_with_clip(
            "a.mp4",
            SimMedia::clip(Duration::from_secs(2)).with_initially_buffered(Duration::from_secs(2)),
        );
        let item = load_item(&mut engine, "a.mp4");
        let (sink, mut rx) = input_channel();
        engine.observe_item(item, sink);
        drain(&mut rx);

        engine.play();
        controller.advance(Duration::from_secs(3));

        assert_eq!(controller.position(), Some(Duration::from_secs(2)));
        assert_eq!(controller.rate(), 0.0);
        let inputs = drain(&mut rx);
        assert!(inputs.iter().any(|input| matches!(
            input,
            PlayerInput::Item { signal: ItemSignal::PlayedToEnd, .. }
        )));
    }

    #[test]
    fn test_stall_and_recovery() {
        let (mut engine, controller) = engine_with_clip(
            "a.mp4",
            SimMedia::clip(Duration::from_secs(30))
                .with_initially_buffered(Duration::from_secs(1))
                .with_download_rate(0.5),
        );
        let item = load_item(&mut engine, "a.mp4");
        let (sink, mut rx) = input_channel();
        engine.observe_item(item, sink);
        drain(&mut rx);

        engine.play();
        for _ in 0..4 {
            controller.advance(Duration::from_millis(500));
        }
        let signals: Vec<ItemSignal> = drain(&mut rx)
            .into_iter()
            .filter_map(|input| match input {
                PlayerInput::Item { signal, .. } => Some(signal),
                _ => None,
            })
            .collect();
        assert!(signals.contains(&ItemSignal::BufferEmpty(true)));
        assert_eq!(controller.rate(), 0.0);

        for _ in 0..8 {
            controller.advance(Duration::from_millis(500));
        }
        let signals: Vec<ItemSignal> = drain(&mut rx)
            .into_iter()
            .filter_map(|input| match input {
                PlayerInput::Item { signal, .. } => Some(signal),
                _ => None,
            })
            .collect();
        assert!(signals.contains(&ItemSignal::LikelyToKeepUp(true)));
    }

    #[test]
    fn test_removed_observer_gets_nothing() {
        let (mut engine, controller) =
            engine_with_clip("a.mp4", SimMedia::clip(Duration::from_secs(5)));
        load_item(&mut engine, "a.mp4");
        let (sink, mut rx) = input_channel();
        let id = engine.add_periodic_time_observer(Duration::from_millis(10), sink);
        engine.remove_observer(id);

        engine.play();
        controller.advance(Duration::from_millis(100));
        assert!(drain(&mut rx).is_empty());
        assert_eq!(controller.observer_count(), 0);
    }

    #[test]
    fn test_replace_releases_previous_item() {
        let (mut engine, controller) =
            engine_with_clip("a.mp4", SimMedia::clip(Duration::from_secs(5)));
        load_item(&mut engine, "a.mp4");
        load_item(&mut engine, "a.mp4");
        assert_eq!(controller.live_item_count(), 1);

        engine.replace_current_item(None);
        assert_eq!(controller.live_item_count(), 0);
    }

    #[test]
    fn test_repeated_locator_loads_share_one_asset() {
        let (mut engine, controller) =
            engine_with_clip("a.mp4", SimMedia::clip(Duration::from_secs(5)));
        for _ in 0..5 {
            load_item(&mut engine, "a.mp4");
        }
        assert_eq!(controller.asset_count(), 1);
        assert_eq!(controller.live_item_count(), 1);

        // Re-registering swaps the media behind the same handle
        controller.register("a.mp4", SimMedia::clip(Duration::from_secs(8)));
        load_item(&mut engine, "a.mp4");
        assert_eq!(controller.asset_count(), 1);
        assert_eq!(engine.duration(), Some(Duration::from_secs(8)));
    }

    #[test]
    fn test_engine_seek_without_item_is_unfinished() {
        let mut engine = SimEngine::new();
        let (sink, mut rx) = input_channel();
        engine.seek(
            Duration::from_secs(1),
            Some(SeekReply::new(
                crate::events::SeekCompletion::StopPlayback(ItemId::new()),
                sink,
            )),
        );
        assert!(matches!(
            drain(&mut rx).pop(),
            Some(PlayerInput::SeekFinished { finished: false, .. })
        ));
    }
}
