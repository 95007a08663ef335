//! Instrument state: price, dynamics, liquidity, volume profile, halt.

use super::book::OrderBook;
use super::ids::StockId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum retained price-history length.
pub const PRICE_HISTORY_CAP: usize = 500;
/// Maximum retained volume-history length.
pub const VOLUME_HISTORY_CAP: usize = 60;

/// Market sector of an instrument. Event templates can bias toward sectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sector {
    Technology,
    Finance,
    Energy,
    Healthcare,
    Consumer,
}

impl Sector {
    pub fn all() -> &'static [Sector] {
        &[
            Sector::Technology,
            Sector::Finance,
            Sector::Energy,
            Sector::Healthcare,
            Sector::Consumer,
        ]
    }
}

impl fmt::Display for Sector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Sector::Technology => "Technology",
            Sector::Finance => "Finance",
            Sector::Energy => "Energy",
            Sector::Healthcare => "Healthcare",
            Sector::Consumer => "Consumer",
        };
        write!(f, "{s}")
    }
}

/// Share structure and session turnover of an instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloatProfile {
    pub total_shares: u64,
    /// Freely tradeable shares.
    pub float_shares: u64,
    /// Shares currently sold short.
    pub short_interest: u64,
    /// Cumulative volume this session.
    pub day_volume: u64,
    /// day_volume / float_shares.
    pub float_rotation: f64,
}

impl FloatProfile {
    /// Short interest as a fraction of float (0 when the float is empty).
    pub fn short_interest_ratio(&self) -> f64 {
        if self.float_shares == 0 {
            return 0.0;
        }
        self.short_interest as f64 / self.float_shares as f64
    }
}

/// Per-tick volume statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeProfile {
    /// Volume this tick.
    pub current: u64,
    /// Rolling average volume per tick.
    pub average: f64,
    /// Recent tick volumes, capped at [`VOLUME_HISTORY_CAP`].
    pub history: Vec<u64>,
    /// Current vs average (RVOL). Defaults to 1 when the average is zero.
    pub relative_volume: f64,
}

impl VolumeProfile {
    pub fn empty() -> Self {
        Self {
            current: 0,
            average: 0.0,
            history: Vec::new(),
            relative_volume: 1.0,
        }
    }
}

/// One tradable instrument.
///
/// Invariants maintained by the engine:
/// - `price >= MIN_PRICE`
/// - `momentum` in [-0.5, 0.5]
/// - `price_history.len() <= PRICE_HISTORY_CAP`
/// - `volume.history.len() <= VOLUME_HISTORY_CAP`
/// - while `halted`, the book is empty and price/volume are frozen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stock {
    pub id: StockId,
    pub ticker: String,
    pub name: String,
    pub sector: Sector,

    pub price: f64,
    pub previous_close: f64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub price_history: Vec<f64>,

    /// Per-tick return scale of the random walk.
    pub volatility: f64,
    /// Smoothed directional pressure, bounded to [-0.5, 0.5].
    pub momentum: f64,
    /// Active event price multiplier; exactly 1 when no catalyst is live.
    pub catalyst_multiplier: f64,
    /// Fraction of the residual catalyst effect shed per tick.
    pub catalyst_decay: f64,

    pub float: FloatProfile,
    pub volume: VolumeProfile,
    pub order_book: OrderBook,

    pub halted: bool,
    pub halt_ticks_remaining: u64,
}

impl Stock {
    /// The trailing `n` prices, oldest first. Shorter when history is short.
    pub fn trailing_prices(&self, n: usize) -> &[f64] {
        let len = self.price_history.len();
        &self.price_history[len.saturating_sub(n)..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_interest_ratio_guards_zero_float() {
        let float = FloatProfile {
            total_shares: 1_000,
            float_shares: 0,
            short_interest: 100,
            day_volume: 0,
            float_rotation: 0.0,
        };
        assert_eq!(float.short_interest_ratio(), 0.0);
    }

    #[test]
    fn trailing_prices_clips_to_history() {
        let mut stock = test_stock();
        stock.price_history = vec![1.0, 2.0, 3.0];
        assert_eq!(stock.trailing_prices(5), &[1.0, 2.0, 3.0]);
        assert_eq!(stock.trailing_prices(2), &[2.0, 3.0]);
    }

    fn test_stock() -> Stock {
        Stock {
            id: StockId(1),
            ticker: "TEST".into(),
            name: "Test Corp".into(),
            sector: Sector::Technology,
            price: 5.0,
            previous_close: 5.0,
            open: 5.0,
            high: 5.0,
            low: 5.0,
            price_history: vec![5.0],
            volatility: 0.05,
            momentum: 0.0,
            catalyst_multiplier: 1.0,
            catalyst_decay: 0.0,
            float: FloatProfile {
                total_shares: 10_000_000,
                float_shares: 5_000_000,
                short_interest: 1_000_000,
                day_volume: 0,
                float_rotation: 0.0,
            },
            volume: VolumeProfile::empty(),
            order_book: OrderBook::empty(),
            halted: false,
            halt_ticks_remaining: 0,
        }
    }
}
