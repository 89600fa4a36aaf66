//! # vidkit common library
//!
//! Shared code for the vidkit crates:
//! - Playback and buffering state enums
//! - Event types (`PlayerEvent`) and the `EventBus`
//! - TOML configuration loading and resolution
//! - Common error type

pub mod config;
pub mod error;
pub mod events;

pub use config::{ConfigResolver, LoggingConfig, PlayerSettings, TomlConfig};
pub use error::{Error, Result};
pub use events::{BufferingState, EventBus, FillMode, PlaybackState, PlayerEvent};
