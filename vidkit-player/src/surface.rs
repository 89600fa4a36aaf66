//! Video surface abstraction
//!
//! A surface presents the engine's output. Two backends exist:
//! - `LayerSurface`: a bare render layer, hidden until playback is ready
//! - `ControlsSurface`: a surface wrapped in system transport controls
//!
//! Both report readiness-for-display through an observer, which the player
//! turns into the `on_ready` delegate callback.

use tracing::debug;
use vidkit_common::FillMode;

use crate::events::{InputSender, PlayerInput};
use crate::types::ObserverId;

/// Presentation target for the engine's video output
pub trait VideoSurface: Send {
    /// Connect the engine's output to this surface
    fn attach_output(&mut self);

    fn detach_output(&mut self);

    fn is_output_attached(&self) -> bool;

    fn set_hidden(&mut self, hidden: bool);

    fn is_hidden(&self) -> bool;

    fn fill_mode(&self) -> FillMode;

    fn set_fill_mode(&mut self, mode: FillMode);

    /// True once the first frame can be shown
    fn is_ready_for_display(&self) -> bool;

    fn observe_readiness(&mut self, sink: InputSender) -> ObserverId;

    fn remove_observer(&mut self, id: ObserverId);
}

/// Readiness observers shared by both backends
#[derive(Debug, Default)]
struct ReadinessObservers {
    next_id: u64,
    observers: Vec<(ObserverId, InputSender)>,
    ready: bool,
}

impl ReadinessObservers {
    fn add(&mut self, sink: InputSender) -> ObserverId {
        self.next_id += 1;
        let id = ObserverId(self.next_id);
        self.observers.push((id, sink));
        id
    }

    fn remove(&mut self, id: ObserverId) {
        self.observers.retain(|(observer, _)| *observer != id);
    }

    fn update(&mut self, ready: bool) {
        if self.ready == ready {
            return;
        }
        self.ready = ready;
        for (observer, sink) in &self.observers {
            sink.send(PlayerInput::SurfaceReadiness {
                observer: *observer,
                ready,
            });
        }
    }

    fn len(&self) -> usize {
        self.observers.len()
    }
}

/// Bare render layer
///
/// Starts hidden. Ready for display once output is attached and the layer
/// is visible.
#[derive(Debug)]
pub struct LayerSurface {
    attached: bool,
    hidden: bool,
    fill_mode: FillMode,
    readiness: ReadinessObservers,
}

impl LayerSurface {
    pub fn new() -> Self {
        Self {
            attached: false,
            hidden: true,
            fill_mode: FillMode::default(),
            readiness: ReadinessObservers::default(),
        }
    }

    pub fn observer_count(&self) -> usize {
        self.readiness.len()
    }

    fn refresh(&mut self) {
        let ready = self.is_ready_for_display();
        self.readiness.update(ready);
    }
}

impl Default for LayerSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoSurface for LayerSurface {
    fn attach_output(&mut self) {
        self.attached = true;
        self.refresh();
    }

    fn detach_output(&mut self) {
        self.attached = false;
        self.refresh();
    }

    fn is_output_attached(&self) -> bool {
        self.attached
    }

    fn set_hidden(&mut self, hidden: bool) {
        self.hidden = hidden;
        self.refresh();
    }

    fn is_hidden(&self) -> bool {
        self.hidden
    }

    fn fill_mode(&self) -> FillMode {
        self.fill_mode
    }

    fn set_fill_mode(&mut self, mode: FillMode) {
        self.fill_mode = mode;
    }

    fn is_ready_for_display(&self) -> bool {
        self.attached && !self.hidden
    }

    fn observe_readiness(&mut self, sink: InputSender) -> ObserverId {
        self.readiness.add(sink)
    }

    fn remove_observer(&mut self, id: ObserverId) {
        self.readiness.remove(id);
    }
}

/// Style of the system transport controls
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ControlsStyle {
    None,
    #[default]
    Inline,
    Minimal,
    Floating,
}

/// Surface wrapped in system transport controls
///
/// The controls chrome is always visible; readiness follows attachment.
#[derive(Debug)]
pub struct ControlsSurface {
    attached: bool,
    fill_mode: FillMode,
    style: ControlsStyle,
    readiness: ReadinessObservers,
}

impl ControlsSurface {
    pub fn new(style: ControlsStyle) -> Self {
        Self {
            attached: false,
            fill_mode: FillMode::default(),
            style,
            readiness: ReadinessObservers::default(),
        }
    }

    pub fn style(&self) -> ControlsStyle {
        self.style
    }

    pub fn set_style(&mut self, style: ControlsStyle) {
        self.style = style;
    }
}

impl VideoSurface for ControlsSurface {
    fn attach_output(&mut self) {
        self.attached = true;
        self.readiness.update(true);
    }

    fn detach_output(&mut self) {
        self.attached = false;
        self.readiness.update(false);
    }

    fn is_output_attached(&self) -> bool {
        self.attached
    }

    fn set_hidden(&mut self, hidden: bool) {
        if hidden {
            debug!("Controls surface cannot be hidden; ignoring");
        }
    }

    fn is_hidden(&self) -> bool {
        false
    }

    fn fill_mode(&self) -> FillMode {
        self.fill_mode
    }

    fn set_fill_mode(&mut self, mode: FillMode) {
        self.fill_mode = mode;
    }

    fn is_ready_for_display(&self) -> bool {
        self.attached
    }

    fn observe_readiness(&mut self, sink: InputSender) -> ObserverId {
        self.readiness.add(sink)
    }

    fn remove_observer(&mut self, id: ObserverId) {
        self.readiness.remove(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::input_channel;

    #[test]
    fn test_layer_hidden_until_revealed() {
        let (sink, mut rx) = input_channel();
        let mut layer = LayerSurface::new();
        let id = layer.observe_readiness(sink);

        layer.attach_output();
        assert!(!layer.is_ready_for_display());
        assert!(rx.try_recv().is_err());

        layer.set_hidden(false);
        assert!(layer.is_ready_for_display());
        match rx.try_recv().unwrap() {
            PlayerInput::SurfaceReadiness { observer, ready } => {
                assert_eq!(observer, id);
                assert!(ready);
            }
            other => panic!("unexpected input {:?}", other),
        }
    }

    #[test]
    fn test_readiness_reported_once_per_change() {
        let (sink, mut rx) = input_channel();
        let mut layer = LayerSurface::new();
        layer.observe_readiness(sink);

        layer.set_hidden(false);
        layer.attach_output();
        layer.attach_output();
        layer.set_hidden(false);

        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_removed_observer_silent() {
        let (sink, mut rx) = input_channel();
        let mut layer = LayerSurface::new();
        let id = layer.observe_readiness(sink);
        layer.remove_observer(id);
        assert_eq!(layer.observer_count(), 0);

        layer.set_hidden(false);
        layer.attach_output();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_controls_ready_on_attach() {
        let (sink, mut rx) = input_channel();
        let mut controls = ControlsSurface::new(ControlsStyle::Floating);
        controls.observe_readiness(sink);

        controls.set_hidden(true);
        assert!(!controls.is_hidden());

        controls.attach_output();
        assert!(controls.is_ready_for_display());
        assert!(matches!(
            rx.try_recv().unwrap(),
            PlayerInput::SurfaceReadiness { ready: true, .. }
        ));
    }

    #[test]
    fn test_fill_mode_default_and_change() {
        let mut layer = LayerSurface::new();
        assert_eq!(layer.fill_mode(), FillMode::AspectFit);
        layer.set_fill_mode(FillMode::Stretch);
        assert_eq!(layer.fill_mode(), FillMode::Stretch);
    }
}
