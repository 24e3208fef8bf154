use std::fmt;

use thiserror::Error;

/// Lifecycle of a single play session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameStatus {
    Loading,
    Started,
    Over,
}

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Win,
    Lose,
    Timeout,
    /// The doll model could not be loaded.
    Fault,
}

impl Outcome {
    pub fn banner(self) -> Banner {
        match self {
            Outcome::Win => Banner::Win,
            Outcome::Lose => Banner::Lose,
            Outcome::Timeout => Banner::Timeout,
            Outcome::Fault => Banner::LoadFailed,
        }
    }
}

/// Text shown in the single banner element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Banner {
    StartingIn(u8),
    Go,
    Timeout,
    Win,
    Lose,
    LoadFailed,
}

impl fmt::Display for Banner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Banner::StartingIn(count) => write!(f, "Starting in {count}"),
            Banner::Go => f.write_str("Go!"),
            Banner::Timeout => f.write_str("Timeout!"),
            Banner::Win => f.write_str("You win!"),
            Banner::Lose => f.write_str("You lose!"),
            Banner::LoadFailed => f.write_str("Failed to load the doll model"),
        }
    }
}

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("game has already started")]
    AlreadyStarted,
    #[error("game is already over ({0:?})")]
    AlreadyOver(Outcome),
}

/// Owner of the session status. Every status change goes through a transition method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    status: GameStatus,
    outcome: Option<Outcome>,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl GameState {
    pub fn new() -> Self {
        Self {
            status: GameStatus::Loading,
            outcome: None,
        }
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    pub fn is_started(&self) -> bool {
        self.status == GameStatus::Started
    }

    pub fn is_over(&self) -> bool {
        self.status == GameStatus::Over
    }

    /// `Loading -> Started`.
    pub fn start(&mut self) -> Result<(), TransitionError> {
        match self.status {
            GameStatus::Loading => {
                self.status = GameStatus::Started;
                Ok(())
            }
            GameStatus::Started => Err(TransitionError::AlreadyStarted),
            GameStatus::Over => Err(self.already_over()),
        }
    }

    /// `Loading | Started -> Over`. The first outcome recorded sticks.
    pub fn finish(&mut self, outcome: Outcome) -> Result<(), TransitionError> {
        if self.status == GameStatus::Over {
            return Err(self.already_over());
        }
        self.status = GameStatus::Over;
        self.outcome = Some(outcome);
        Ok(())
    }

    fn already_over(&self) -> TransitionError {
        TransitionError::AlreadyOver(self.outcome.unwrap_or(Outcome::Fault))
    }
}
