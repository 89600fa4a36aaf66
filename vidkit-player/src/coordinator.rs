//! Coordination task
//!
//! `spawn` moves a `Player` onto a tokio task that drains its input channel.
//! That task is the only place player state is touched. Hosts talk to it
//! through a cloneable `PlayerHandle`.

use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use vidkit_common::{FillMode, PlayerSettings};

use crate::error::{PlayerError, Result};
use crate::events::{Command, InputReceiver, InputSender, PlayerInput, SeekCompletion};
use crate::lifecycle::LifecycleEvent;
use crate::player::{Player, PlayerSnapshot};
use crate::types::MediaSource;

/// Start the coordination task for `player`
///
/// `inbox` must be the receiving end of the channel `player` was built with.
/// The task runs until `PlayerHandle::shutdown`.
pub fn spawn(player: Player, inbox: InputReceiver) -> (PlayerHandle, JoinHandle<()>) {
    let handle = PlayerHandle {
        sink: player.sink(),
    };
    let task = tokio::spawn(run(player, inbox));
    (handle, task)
}

async fn run(mut player: Player, mut inbox: InputReceiver) {
    player.attach();
    info!("Player coordinator started");

    while let Some(input) = inbox.recv().await {
        player.handle(input);
        if player.is_torn_down() {
            break;
        }
    }

    player.teardown();
    info!("Player coordinator stopped");
}

/// Command surface of a running player
#[derive(Debug, Clone)]
pub struct PlayerHandle {
    sink: InputSender,
}

impl PlayerHandle {
    fn command(&self, command: Command) -> Result<()> {
        if self.sink.try_send(PlayerInput::Command(command)) {
            Ok(())
        } else {
            Err(PlayerError::CoordinatorClosed)
        }
    }

    pub fn load(&self, source: MediaSource) -> Result<()> {
        self.command(Command::Load(source))
    }

    pub fn play_from_beginning(&self) -> Result<()> {
        self.command(Command::PlayFromBeginning)
    }

    pub fn play_from_current_time(&self) -> Result<()> {
        self.command(Command::PlayFromCurrentTime)
    }

    pub fn pause(&self) -> Result<()> {
        self.command(Command::Pause)
    }

    pub fn stop(&self) -> Result<()> {
        self.command(Command::Stop)
    }

    /// Seek and wait for the engine's answer
    ///
    /// Resolves to `false` when the seek was interrupted or recorded as a
    /// pending seek because nothing is loaded yet.
    pub async fn seek(&self, to: Duration) -> Result<bool> {
        let (tx, rx) = oneshot::channel();
        self.command(Command::Seek {
            to,
            completion: Some(SeekCompletion::Notify(tx)),
        })?;
        rx.await.map_err(|_| PlayerError::CoordinatorClosed)
    }

    /// Seek without waiting for completion
    pub fn seek_detached(&self, to: Duration) -> Result<()> {
        self.command(Command::Seek {
            to,
            completion: None,
        })
    }

    pub async fn seek_to_second(&self, second: u64) -> Result<bool> {
        let (tx, rx) = oneshot::channel();
        self.command(Command::SeekToSecond {
            second,
            completion: Some(SeekCompletion::Notify(tx)),
        })?;
        rx.await.map_err(|_| PlayerError::CoordinatorClosed)
    }

    pub async fn seek_with_tolerance(
        &self,
        to: Duration,
        before: Duration,
        after: Duration,
    ) -> Result<bool> {
        let (tx, rx) = oneshot::channel();
        self.command(Command::SeekWithTolerance {
            to,
            before,
            after,
            completion: Some(SeekCompletion::Notify(tx)),
        })?;
        rx.await.map_err(|_| PlayerError::CoordinatorClosed)
    }

    pub fn set_muted(&self, muted: bool) -> Result<()> {
        self.command(Command::SetMuted(muted))
    }

    pub fn set_volume(&self, volume: f32) -> Result<()> {
        self.command(Command::SetVolume(volume))
    }

    pub fn set_fill_mode(&self, mode: FillMode) -> Result<()> {
        self.command(Command::SetFillMode(mode))
    }

    pub fn set_playback_loops(&self, loops: bool) -> Result<()> {
        self.command(Command::SetPlaybackLoops(loops))
    }

    pub fn update_settings(&self, settings: PlayerSettings) -> Result<()> {
        self.command(Command::UpdateSettings(settings))
    }

    pub fn host_did_disappear(&self) -> Result<()> {
        self.command(Command::HostDidDisappear)
    }

    /// Forward an application lifecycle edge
    pub fn lifecycle(&self, event: LifecycleEvent) -> Result<()> {
        if self.sink.try_send(PlayerInput::Lifecycle(event)) {
            Ok(())
        } else {
            Err(PlayerError::CoordinatorClosed)
        }
    }

    pub async fn snapshot(&self) -> Result<PlayerSnapshot> {
        let (tx, rx) = oneshot::channel();
        self.command(Command::Snapshot(tx))?;
        rx.await.map_err(|_| PlayerError::CoordinatorClosed)
    }

    /// Tear the player down and stop the coordination task
    pub async fn shutdown(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.command(Command::Shutdown(tx))?;
        rx.await.map_err(|_| PlayerError::CoordinatorClosed)?;
        debug!("Player shutdown acknowledged");
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.sink.is_closed()
    }
}
