//! Fixed-step session driver.
//!
//! The core exposes one deterministic step function and leaves pacing to
//! the caller. `TickPacer` converts elapsed wall time into a due-tick
//! count: leftover time carries across calls, so no tick is skipped, and a
//! speed change only swaps the interval going forward, so no tick fires
//! twice. `SessionDriver` wires a pacer to a [`Game`] for headless runs.

use crate::game::{Game, GamePhase};
use pennylab_core::SessionConfig;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("unsupported speed multiplier: {0}")]
    UnsupportedSpeed(f64),
}

/// Converts elapsed real time into due simulation ticks.
#[derive(Debug, Clone)]
pub struct TickPacer {
    base_interval: Duration,
    multiplier: f64,
    carry: Duration,
    paused: bool,
}

impl TickPacer {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            base_interval: Duration::from_millis(config.base_tick_interval_ms),
            multiplier: 1.0,
            carry: Duration::ZERO,
            paused: false,
        }
    }

    /// Real time between ticks at the current speed.
    pub fn tick_interval(&self) -> Duration {
        self.base_interval.div_f64(self.multiplier)
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    /// Switch speed. The accumulated remainder is kept, so the change
    /// neither drops a pending tick nor double-fires one.
    pub fn set_speed(&mut self, config: &SessionConfig, multiplier: f64) -> Result<(), DriverError> {
        if !config.speed_multipliers.contains(&multiplier) {
            return Err(DriverError::UnsupportedSpeed(multiplier));
        }
        self.multiplier = multiplier;
        Ok(())
    }

    /// Stop accruing ticks. Elapsed time reported while paused is dropped.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// How many ticks the elapsed time has earned.
    pub fn ticks_due(&mut self, elapsed: Duration) -> u32 {
        if self.paused {
            return 0;
        }
        self.carry += elapsed;
        let interval = self.tick_interval();
        if interval.is_zero() {
            return 0;
        }
        let due = (self.carry.as_nanos() / interval.as_nanos()) as u32;
        self.carry -= interval.saturating_mul(due);
        due
    }
}

/// Drives a game session with a pacer. Purely pull-based: the caller
/// reports elapsed time (or steps manually) and the driver advances the
/// game; no thread or timer is owned here.
pub struct SessionDriver {
    pacer: TickPacer,
}

impl SessionDriver {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            pacer: TickPacer::new(config),
        }
    }

    pub fn pacer(&self) -> &TickPacer {
        &self.pacer
    }

    pub fn pacer_mut(&mut self) -> &mut TickPacer {
        &mut self.pacer
    }

    /// Pause both pacing and the engine, preserving all state.
    pub fn pause(&mut self, game: &mut Game) {
        self.pacer.pause();
        game.pause();
    }

    pub fn resume(&mut self, game: &mut Game) {
        self.pacer.resume();
        game.resume();
    }

    /// Advance the game by whatever `elapsed` has earned. Returns the
    /// number of ticks stepped.
    pub fn advance(&mut self, game: &mut Game, elapsed: Duration) -> u32 {
        let due = self.pacer.ticks_due(elapsed);
        let mut stepped = 0;
        for _ in 0..due {
            let result = game.step();
            stepped += 1;
            if result.session_complete {
                break;
            }
        }
        stepped
    }

    /// Step the session to completion without pacing (tests, fast-forward).
    /// Returns the final tick count.
    pub fn run_to_completion(&mut self, game: &mut Game) -> u64 {
        while game.phase() == GamePhase::Trading {
            let result = game.step();
            if result.session_complete {
                return result.tick;
            }
        }
        game.engine().current_tick()
    }
}
