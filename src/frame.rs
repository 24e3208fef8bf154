use std::time::Duration;

use log::info;

use crate::game::Game;
use crate::scene::SceneObject;
use crate::status::GameStatus;

/// Whether the host should keep scheduling frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Stopped,
}

/// Per-frame driver shared by every host.
///
/// A frame fires due timers, stops for good once the game is over, and
/// otherwise renders before it moves the player.
#[derive(Debug)]
pub struct FrameLoop {
    state: LoopState,
    frames: u64,
}

impl Default for FrameLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameLoop {
    pub fn new() -> Self {
        Self {
            state: LoopState::Running,
            frames: 0,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Frames rendered so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn step<F, E>(&mut self, game: &mut Game, now: Duration, render: F) -> Result<LoopState, E>
    where
        F: FnOnce(&[SceneObject]) -> Result<(), E>,
    {
        if self.state == LoopState::Stopped {
            return Ok(LoopState::Stopped);
        }
        game.advance(now);
        if game.status() == GameStatus::Over {
            info!("render loop stopped after {} frame(s)", self.frames);
            self.state = LoopState::Stopped;
            return Ok(LoopState::Stopped);
        }
        game.sync_visuals(now);
        render(&game.objects())?;
        self.frames += 1;
        game.update_player(now);
        Ok(LoopState::Running)
    }
}
