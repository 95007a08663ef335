use serde::{Deserialize, Serialize};
use std::fmt;

/// Instrument ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StockId(pub u64);

/// Player ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub u64);

/// Trade ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TradeId(pub u64);

/// Market event ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(pub u64);

impl fmt::Display for StockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{}", self.0)
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

impl fmt::Display for TradeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.0)
    }
}

/// Monotonic ID generator for one session.
///
/// Each ID family has its own counter, so IDs are dense per family and
/// reproducible across runs with the same call sequence.
#[derive(Debug, Clone, Default)]
pub struct IdGen {
    next_stock: u64,
    next_player: u64,
    next_trade: u64,
    next_event: u64,
}

impl IdGen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stock_id(&mut self) -> StockId {
        self.next_stock += 1;
        StockId(self.next_stock)
    }

    pub fn player_id(&mut self) -> PlayerId {
        self.next_player += 1;
        PlayerId(self.next_player)
    }

    pub fn trade_id(&mut self) -> TradeId {
        self.next_trade += 1;
        TradeId(self.next_trade)
    }

    pub fn event_id(&mut self) -> EventId {
        self.next_event += 1;
        EventId(self.next_event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_dense_per_family() {
        let mut gen = IdGen::new();
        assert_eq!(gen.stock_id(), StockId(1));
        assert_eq!(gen.stock_id(), StockId(2));
        assert_eq!(gen.trade_id(), TradeId(1));
        assert_eq!(gen.player_id(), PlayerId(1));
        assert_eq!(gen.stock_id(), StockId(3));
    }

    #[test]
    fn display_is_prefixed() {
        assert_eq!(StockId(7).to_string(), "S7");
        assert_eq!(TradeId(12).to_string(), "T12");
    }
}
