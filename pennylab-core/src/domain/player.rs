//! Player account: cash, positions, and trade history.

use super::ids::{PlayerId, StockId};
use super::trade::Trade;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One player's account.
///
/// Mutated only through the ledger's execute path. `portfolio` maps stock
/// id to a signed share quantity (negative = short); an entry is removed
/// the moment its quantity reaches zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub cash: f64,
    pub portfolio: HashMap<StockId, i64>,
    /// cash + mark-to-market of open positions, at last recompute.
    pub total_value: f64,
    pub trade_history: Vec<Trade>,
}

impl Player {
    pub fn new(id: PlayerId, name: impl Into<String>, starting_cash: f64) -> Self {
        Self {
            id,
            name: name.into(),
            cash: starting_cash,
            portfolio: HashMap::new(),
            total_value: starting_cash,
            trade_history: Vec::new(),
        }
    }

    /// Signed position quantity for a stock (0 when flat).
    pub fn position(&self, stock_id: StockId) -> i64 {
        self.portfolio.get(&stock_id).copied().unwrap_or(0)
    }

    /// cash + sum of signed position quantities marked at `prices`.
    ///
    /// A stock missing from `prices` contributes nothing, matching the
    /// engine's rule that only live instruments carry a mark.
    pub fn total_value_at(&self, prices: &HashMap<StockId, f64>) -> f64 {
        let position_value: f64 = self
            .portfolio
            .iter()
            .map(|(stock_id, qty)| {
                let price = prices.get(stock_id).copied().unwrap_or(0.0);
                *qty as f64 * price
            })
            .sum();
        self.cash + position_value
    }

    /// Reset to a fresh account for a new round, keeping identity.
    pub fn reset(&mut self, starting_cash: f64) {
        self.cash = starting_cash;
        self.portfolio.clear();
        self.total_value = starting_cash;
        self.trade_history.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_player_is_flat() {
        let player = Player::new(PlayerId(1), "Ann", 10_000.0);
        assert_eq!(player.cash, 10_000.0);
        assert_eq!(player.total_value, 10_000.0);
        assert!(player.portfolio.is_empty());
        assert_eq!(player.position(StockId(1)), 0);
    }

    #[test]
    fn total_value_marks_signed_positions() {
        let mut player = Player::new(PlayerId(1), "Ann", 10_000.0);
        player.cash = 9_500.0;
        player.portfolio.insert(StockId(1), 100);
        player.portfolio.insert(StockId(2), -50);

        let mut prices = HashMap::new();
        prices.insert(StockId(1), 6.0);
        prices.insert(StockId(2), 2.0);

        // 9_500 + 100 * 6 - 50 * 2 = 10_000
        assert_eq!(player.total_value_at(&prices), 10_000.0);
    }

    #[test]
    fn reset_clears_state_but_keeps_identity() {
        let mut player = Player::new(PlayerId(3), "Bo", 10_000.0);
        player.cash = 1.0;
        player.portfolio.insert(StockId(1), 5);
        player.reset(10_000.0);
        assert_eq!(player.id, PlayerId(3));
        assert_eq!(player.name, "Bo");
        assert_eq!(player.cash, 10_000.0);
        assert!(player.portfolio.is_empty());
        assert!(player.trade_history.is_empty());
    }
}
