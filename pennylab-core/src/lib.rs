//! PennyLab Core — a tick-driven simulation of a small, illiquid equities
//! market, built as the engine beneath a trading game.
//!
//! - Domain types (stocks, books, events, trades, players)
//! - Stochastic price/momentum dynamics with a penny floor
//! - Synthetic depth-of-book generation with momentum skew
//! - Randomized catalyst injection with halt semantics
//! - The per-tick session state machine
//! - Trade execution with FIFO cost-basis accounting
//! - Scoring, badge, and challenge evaluators
//!
//! The crate performs no I/O and owns no timers. Every stochastic path
//! draws from a seedable RNG, so a session replays exactly given the same
//! seed and call sequence; the surrounding application decides when to call
//! [`engine::MarketEngine::tick`].

pub mod catalog;
pub mod challenges;
pub mod config;
pub mod domain;
pub mod engine;
pub mod ledger;
pub mod rng;
pub mod scoring;

pub use catalog::{default_catalog, init_session, StockSeed};
pub use challenges::{
    evaluate_challenges, total_challenge_bonus, ChallengeId, ChallengeProgress,
};
pub use config::{ConfigError, SessionConfig};
pub use domain::{
    BookLevel, IdGen, MarketEvent, MarketEventType, OrderBook, Player, PlayerId, Sector, Stock,
    StockId, Trade, TradeAction, TradeId,
};
pub use engine::{MarketEngine, SessionPhase, TickResult, SESSION_LENGTH_TICKS};
pub use ledger::{closed_trades, ClosedTrade, FifoLedger, TradeLedger, TradeRejection};
pub use rng::{session_fingerprint, SessionSeed};
pub use scoring::{compute_score, max_drawdown, BadgeId, LevelConfig, PlayerScore};
