//! The tick-driven market engine.
//!
//! - `price`: per-tick price/momentum/volume dynamics
//! - `book`: synthetic depth generation and momentum skew
//! - `events`: randomized catalyst injection with halt semantics
//! - `session`: the state machine that composes the above per tick

pub mod book;
pub mod events;
pub mod price;
pub mod session;

pub use price::{PriceUpdate, MIN_PRICE, MOMENTUM_BOUND};
pub use session::{MarketEngine, SessionPhase, TickResult, SESSION_LENGTH_TICKS};
