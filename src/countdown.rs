use std::time::Duration;

use crate::schedule::{millis, Scheduler};
use crate::status::Banner;

/// Timer fired for countdown step `index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownTimer(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownStep {
    /// Delay after the previous step.
    pub delay: Duration,
    pub banner: Banner,
}

/// What a fired countdown step asks of the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownTick {
    Show(Banner),
    /// Show "Go!" and start the game.
    Go,
}

/// "Starting in N" banners followed by "Go!".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    steps: Vec<CountdownStep>,
}

impl Countdown {
    /// Every delay but the last announces a number; the last one precedes "Go!".
    pub fn from_delays(delays_ms: &[u64]) -> Self {
        let numbered = delays_ms.len().saturating_sub(1);
        let steps = delays_ms
            .iter()
            .enumerate()
            .map(|(index, &delay)| CountdownStep {
                delay: millis(delay),
                banner: if index < numbered {
                    Banner::StartingIn((numbered - index) as u8)
                } else {
                    Banner::Go
                },
            })
            .collect();
        Self { steps }
    }

    pub fn steps(&self) -> &[CountdownStep] {
        &self.steps
    }

    /// Sum of every delay: how long after boot the game starts.
    pub fn total(&self) -> Duration {
        self.steps.iter().map(|step| step.delay).sum()
    }

    /// Arms one timer per step, offset from `now`.
    pub fn schedule<T>(&self, now: Duration, timers: &mut Scheduler<T>)
    where
        T: From<CountdownTimer>,
    {
        let mut at = now;
        for (index, step) in self.steps.iter().enumerate() {
            at += step.delay;
            timers.schedule_at(at, CountdownTimer(index).into());
        }
    }

    pub fn tick(&self, timer: CountdownTimer) -> Option<CountdownTick> {
        let step = self.steps.get(timer.0)?;
        Some(match step.banner {
            Banner::Go => CountdownTick::Go,
            banner => CountdownTick::Show(banner),
        })
    }
}
