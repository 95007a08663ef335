//! Trade records: the ledger's append-only history entries.

use super::ids::{PlayerId, StockId, TradeId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Direction of a trade.
///
/// Buy/Sell operate the long side of a position, Short/Cover the short
/// side. Aggressive orders cross the spread: Buy and Cover lift the ask,
/// Sell and Short hit the bid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeAction {
    Buy,
    Sell,
    Short,
    Cover,
}

impl TradeAction {
    /// Whether the fill price comes from the ask side of the book.
    pub fn uses_ask(self) -> bool {
        matches!(self, TradeAction::Buy | TradeAction::Cover)
    }

    /// Whether this action opens new exposure (vs closing existing).
    pub fn opens_position(self) -> bool {
        matches!(self, TradeAction::Buy | TradeAction::Short)
    }
}

/// One executed trade. Created only by the ledger; immutable afterwards.
///
/// The per-player trade history is the sole source of truth for cost
/// basis, realized PnL, and challenge/badge evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: TradeId,
    pub player_id: PlayerId,
    pub stock_id: StockId,
    pub action: TradeAction,
    pub quantity: u32,
    pub price: f64,
    pub timestamp: DateTime<Utc>,
}

impl Trade {
    /// Cash moved by this trade (always positive).
    pub fn notional(&self) -> f64 {
        self.price * self.quantity as f64
    }
}
