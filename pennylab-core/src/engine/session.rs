//! The tick engine: session state machine and per-tick transition.
//!
//! One `MarketEngine` owns all mutable market state for a session (stocks,
//! event log, cooldown table, RNG). Every mutation goes through this owner,
//! so a caller that serializes access to the engine gets single-writer
//! semantics for free. The engine never reads a clock and never blocks; the
//! caller decides when to call `tick` (timer, fixed-step loop, or manual
//! stepping in tests).

use crate::config::SessionConfig;
use crate::domain::{IdGen, MarketEvent, OrderBook, Stock, StockId};
use crate::engine::{book, events, price};
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Ticks in one full trading session (6.5 hours of simulated minutes).
pub const SESSION_LENGTH_TICKS: u64 = 390;

/// Lifecycle of one session.
///
/// Idle -> Running on start; Running <-> Paused preserves every bit of
/// state; Running -> SessionComplete when the tick counter reaches the
/// session length; reset returns to Idle from anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    Idle,
    Running,
    Paused,
    SessionComplete,
}

/// Snapshot handed back from one tick.
#[derive(Debug, Clone)]
pub struct TickResult {
    pub stocks: Vec<Stock>,
    pub new_events: Vec<MarketEvent>,
    pub tick: u64,
    pub session_complete: bool,
}

/// The market engine for one session.
pub struct MarketEngine {
    config: SessionConfig,
    phase: SessionPhase,
    tick: u64,
    stocks: Vec<Stock>,
    events: Vec<MarketEvent>,
    last_event_ticks: HashMap<StockId, u64>,
    id_gen: IdGen,
    rng: StdRng,
}

impl MarketEngine {
    /// Engine seeded directly from a master seed.
    pub fn new(stocks: Vec<Stock>, config: SessionConfig, seed: u64) -> Self {
        Self::with_rng(stocks, config, StdRng::seed_from_u64(seed))
    }

    /// Engine using a caller-derived RNG (see [`crate::rng::SessionSeed`]).
    pub fn with_rng(stocks: Vec<Stock>, config: SessionConfig, rng: StdRng) -> Self {
        Self {
            config,
            phase: SessionPhase::Idle,
            tick: 0,
            stocks,
            events: Vec::new(),
            last_event_ticks: HashMap::new(),
            id_gen: IdGen::new(),
            rng,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    pub fn stocks(&self) -> &[Stock] {
        &self.stocks
    }

    pub fn stock(&self, id: StockId) -> Option<&Stock> {
        self.stocks.iter().find(|s| s.id == id)
    }

    /// The append-only session event log.
    pub fn events(&self) -> &[MarketEvent] {
        &self.events
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Current mark price per instrument.
    pub fn marks(&self) -> HashMap<StockId, f64> {
        self.stocks.iter().map(|s| (s.id, s.price)).collect()
    }

    /// Idle -> Running. A no-op in any other phase.
    pub fn start(&mut self) {
        if self.phase == SessionPhase::Idle {
            self.phase = SessionPhase::Running;
        }
    }

    /// Running -> Paused. State is preserved exactly, not reset.
    pub fn pause(&mut self) {
        if self.phase == SessionPhase::Running {
            self.phase = SessionPhase::Paused;
        }
    }

    /// Paused -> Running, continuing from the exact saved state.
    pub fn resume(&mut self) {
        if self.phase == SessionPhase::Paused {
            self.phase = SessionPhase::Running;
        }
    }

    /// Return to Idle with a fresh instrument set for a new round.
    ///
    /// The RNG stream continues; reseed by constructing a new engine when a
    /// round must be independently reproducible.
    pub fn reset(&mut self, stocks: Vec<Stock>) {
        self.phase = SessionPhase::Idle;
        self.tick = 0;
        self.stocks = stocks;
        self.events.clear();
        self.last_event_ticks.clear();
    }

    /// Advance the session one tick, stamping events with the current time.
    pub fn tick(&mut self) -> TickResult {
        self.tick_at(Utc::now())
    }

    /// Advance the session one tick.
    ///
    /// Total: never fails, regardless of input state. Outside Running this
    /// is a no-op that reports the current state.
    pub fn tick_at(&mut self, now: DateTime<Utc>) -> TickResult {
        if self.phase != SessionPhase::Running {
            return TickResult {
                stocks: self.stocks.clone(),
                new_events: Vec::new(),
                tick: self.tick,
                session_complete: self.phase == SessionPhase::SessionComplete,
            };
        }

        self.tick += 1;
        let tick = self.tick;

        // At most one new event per tick
        let mut new_events = Vec::new();
        if let Some(event) = events::maybe_generate(
            &self.stocks,
            tick,
            &self.last_event_ticks,
            &mut self.id_gen,
            now,
            &mut self.rng,
        ) {
            new_events.push(event);
        }

        for stock in &mut self.stocks {
            // Halt countdown first: a stock that just un-halts trades this tick
            if stock.halted {
                stock.halt_ticks_remaining = stock.halt_ticks_remaining.saturating_sub(1);
                if stock.halt_ticks_remaining == 0 {
                    stock.halted = false;
                } else {
                    stock.order_book = OrderBook::empty();
                    continue;
                }
            }

            // Apply any new event effects to this stock
            let mut halted_by_event = false;
            for event in &new_events {
                if event.affects(stock.id) {
                    stock.catalyst_multiplier = event.price_impact;
                    stock.catalyst_decay = if event.duration > 0 {
                        1.0 / event.duration as f64
                    } else {
                        1.0
                    };

                    if events::is_halt_type(event.event_type) {
                        stock.halted = true;
                        stock.halt_ticks_remaining =
                            events::halt_duration(event.event_type, &mut self.rng);
                        stock.order_book = OrderBook::empty();
                        halted_by_event = true;
                    }
                }
            }
            if halted_by_event {
                continue;
            }

            let update = price::next_tick(stock, tick, &mut self.rng);
            price::apply_update(stock, &update);

            let fresh_book = book::generate(stock, &mut self.rng);
            stock.order_book = book::skew(fresh_book, stock.momentum);
        }

        // Cooldown bookkeeping and the append-only event log
        for event in &new_events {
            for stock_id in &event.affected_stock_ids {
                self.last_event_ticks.insert(*stock_id, tick);
            }
        }
        self.events.extend(new_events.iter().cloned());

        let session_complete = tick >= self.config.session_length_ticks;
        if session_complete {
            self.phase = SessionPhase::SessionComplete;
        }

        TickResult {
            stocks: self.stocks.clone(),
            new_events,
            tick,
            session_complete,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{default_catalog, init_session};

    fn test_engine(seed: u64) -> MarketEngine {
        let mut id_gen = IdGen::new();
        let stocks = init_session(&default_catalog(), &mut id_gen);
        MarketEngine::new(stocks, SessionConfig::default(), seed)
    }

    #[test]
    fn phases_follow_the_lifecycle() {
        let mut engine = test_engine(1);
        assert_eq!(engine.phase(), SessionPhase::Idle);

        engine.start();
        assert_eq!(engine.phase(), SessionPhase::Running);

        engine.pause();
        assert_eq!(engine.phase(), SessionPhase::Paused);

        engine.resume();
        assert_eq!(engine.phase(), SessionPhase::Running);

        let mut id_gen = IdGen::new();
        engine.reset(init_session(&default_catalog(), &mut id_gen));
        assert_eq!(engine.phase(), SessionPhase::Idle);
        assert_eq!(engine.current_tick(), 0);
        assert!(engine.events().is_empty());
    }

    #[test]
    fn ticking_while_idle_or_paused_changes_nothing() {
        let mut engine = test_engine(2);
        let now = Utc::now();

        let result = engine.tick_at(now);
        assert_eq!(result.tick, 0);
        assert!(!result.session_complete);
        assert_eq!(engine.current_tick(), 0);

        engine.start();
        engine.tick_at(now);
        let before: Vec<f64> = engine.stocks().iter().map(|s| s.price).collect();

        engine.pause();
        engine.tick_at(now);
        let after: Vec<f64> = engine.stocks().iter().map(|s| s.price).collect();
        assert_eq!(before, after);
        assert_eq!(engine.current_tick(), 1);
    }

    #[test]
    fn pause_resume_continues_from_exact_state() {
        let now = Utc::now();
        let mut continuous = test_engine(42);
        continuous.start();
        for _ in 0..100 {
            continuous.tick_at(now);
        }

        let mut interrupted = test_engine(42);
        interrupted.start();
        for _ in 0..40 {
            interrupted.tick_at(now);
        }
        interrupted.pause();
        for _ in 0..10 {
            interrupted.tick_at(now); // no-ops
        }
        interrupted.resume();
        for _ in 0..60 {
            interrupted.tick_at(now);
        }

        assert_eq!(continuous.current_tick(), interrupted.current_tick());
        let a: Vec<f64> = continuous.stocks().iter().map(|s| s.price).collect();
        let b: Vec<f64> = interrupted.stocks().iter().map(|s| s.price).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn session_completes_exactly_at_session_length() {
        let mut engine = test_engine(3);
        engine.start();
        let now = Utc::now();
        for expected_tick in 1..SESSION_LENGTH_TICKS {
            let result = engine.tick_at(now);
            assert_eq!(result.tick, expected_tick);
            assert!(!result.session_complete, "completed early at {expected_tick}");
        }
        let last = engine.tick_at(now);
        assert_eq!(last.tick, SESSION_LENGTH_TICKS);
        assert!(last.session_complete);
        assert_eq!(engine.phase(), SessionPhase::SessionComplete);

        // Further ticks are no-ops that keep reporting completion
        let after = engine.tick_at(now);
        assert_eq!(after.tick, SESSION_LENGTH_TICKS);
        assert!(after.session_complete);
    }

    #[test]
    fn same_seed_reproduces_the_whole_session() {
        let now = Utc::now();
        let mut a = test_engine(1234);
        let mut b = test_engine(1234);
        a.start();
        b.start();

        for _ in 0..SESSION_LENGTH_TICKS {
            let ra = a.tick_at(now);
            let rb = b.tick_at(now);
            assert_eq!(ra.stocks, rb.stocks);
            assert_eq!(ra.new_events, rb.new_events);
        }
        assert_eq!(a.events().len(), b.events().len());
    }

    #[test]
    fn halted_stocks_freeze_until_the_counter_runs_out() {
        let mut engine = test_engine(4);
        engine.start();
        let now = Utc::now();
        engine.tick_at(now);

        // Force a halt by hand: the engine treats it exactly like an
        // event-triggered one
        let stock_id = engine.stocks[0].id;
        engine.stocks[0].halted = true;
        engine.stocks[0].halt_ticks_remaining = 5;
        engine.stocks[0].order_book = OrderBook::empty();
        let frozen_price = engine.stocks[0].price;
        let frozen_history_len = engine.stocks[0].price_history.len();

        for _ in 0..4 {
            engine.tick_at(now);
            let stock = engine.stock(stock_id).unwrap();
            assert!(stock.halted);
            assert!(stock.order_book.is_empty());
            assert_eq!(stock.price, frozen_price);
            assert_eq!(stock.price_history.len(), frozen_history_len);
        }

        // Fifth tick clears the halt and trading resumes immediately
        engine.tick_at(now);
        let stock = engine.stock(stock_id).unwrap();
        assert!(!stock.halted);
        assert!(!stock.order_book.is_empty());
        assert_eq!(stock.price_history.len(), frozen_history_len + 1);
    }

    #[test]
    fn event_log_is_append_only_and_cooldowns_recorded() {
        let mut engine = test_engine(5);
        engine.start();
        let now = Utc::now();

        let mut log_len = 0;
        for _ in 0..SESSION_LENGTH_TICKS {
            let result = engine.tick_at(now);
            assert!(engine.events().len() >= log_len);
            log_len = engine.events().len();
            for event in &result.new_events {
                for stock_id in &event.affected_stock_ids {
                    assert_eq!(engine.last_event_ticks[stock_id], result.tick);
                }
            }
        }
    }

    #[test]
    fn short_sessions_honor_configured_length() {
        let mut id_gen = IdGen::new();
        let stocks = init_session(&default_catalog(), &mut id_gen);
        let config = SessionConfig {
            session_length_ticks: 10,
            ..SessionConfig::default()
        };
        let mut engine = MarketEngine::new(stocks, config, 8);
        engine.start();
        let now = Utc::now();
        for _ in 0..9 {
            assert!(!engine.tick_at(now).session_complete);
        }
        assert!(engine.tick_at(now).session_complete);
    }
}
