//! # vidkit player library (vidkit-player)
//!
//! Playback controller core for a video player.
//!
//! **Purpose:** Load media through an abstract media engine, track buffering,
//! run the play/pause/stop state machine and tie observations to the
//! lifetime of the current item and of the host.
//!
//! **Architecture:** One coordination task owns the `Player`; engine,
//! surface and lifecycle collaborators only ever post `PlayerInput`
//! messages onto its channel.
//!
//! ```text
//! host ──PlayerHandle──┐
//! engine observers ────┼──▶ mpsc ──▶ coordinator task ──▶ Player ──▶ PlayerDelegate
//! surface / lifecycle ─┘                                        └──▶ MediaEngine / VideoSurface
//! ```

mod asset;
mod buffering;
pub mod coordinator;
pub mod delegate;
pub mod engine;
pub mod error;
pub mod events;
pub mod lifecycle;
pub mod player;
pub mod surface;
pub mod types;

pub use coordinator::{spawn, PlayerHandle};
pub use delegate::{EventBusDelegate, PlayerDelegate};
pub use engine::{MediaEngine, ResolvedAsset};
pub use error::{PlayerError, Result};
pub use events::{input_channel, InputReceiver, InputSender, ItemSignal, PlayerInput};
pub use lifecycle::LifecycleEvent;
pub use player::{Player, PlayerSnapshot};
pub use surface::{ControlsStyle, ControlsSurface, LayerSurface, VideoSurface};
pub use types::{MediaLocator, MediaSource};
