//! FIFO cost-basis matching over a trade history.
//!
//! One pass over a player's trades, oldest first, maintaining a lot queue
//! per instrument and side. Closing trades consume lots oldest-first; each
//! matched chunk becomes a [`ClosedTrade`]. Scoring and challenge
//! evaluation both read the same matcher, so win/loss bookkeeping can never
//! diverge between them.

use crate::domain::{StockId, Trade, TradeAction};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

/// One still-open lot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Lot {
    pub price: f64,
    pub remaining: u32,
}

/// One matched chunk of a closing trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosedTrade {
    pub stock_id: StockId,
    /// Fill price of the opening lot.
    pub entry_price: f64,
    /// Fill price of the closing trade.
    pub exit_price: f64,
    pub quantity: u32,
    pub profitable: bool,
    /// True when the round trip was short-side (Short then Cover).
    pub short: bool,
}

impl ClosedTrade {
    /// Realized PnL for this chunk.
    pub fn pnl(&self) -> f64 {
        let per_share = if self.short {
            self.entry_price - self.exit_price
        } else {
            self.exit_price - self.entry_price
        };
        per_share * self.quantity as f64
    }
}

/// The result of FIFO-matching a trade history.
#[derive(Debug, Clone, Default)]
pub struct FifoLedger {
    closed: Vec<ClosedTrade>,
    open_long: HashMap<StockId, VecDeque<Lot>>,
    open_short: HashMap<StockId, VecDeque<Lot>>,
}

impl FifoLedger {
    /// Match a trade history. Trades are processed in timestamp order;
    /// equal timestamps keep their insertion order.
    pub fn analyze(trades: &[Trade]) -> Self {
        let mut sorted: Vec<&Trade> = trades.iter().collect();
        sorted.sort_by_key(|t| t.timestamp);

        let mut ledger = FifoLedger::default();
        for trade in sorted {
            let lot = Lot {
                price: trade.price,
                remaining: trade.quantity,
            };
            match trade.action {
                TradeAction::Buy => {
                    ledger
                        .open_long
                        .entry(trade.stock_id)
                        .or_default()
                        .push_back(lot);
                }
                TradeAction::Short => {
                    ledger
                        .open_short
                        .entry(trade.stock_id)
                        .or_default()
                        .push_back(lot);
                }
                TradeAction::Sell => ledger.close(trade, false),
                TradeAction::Cover => ledger.close(trade, true),
            }
        }
        ledger
    }

    fn close(&mut self, trade: &Trade, short: bool) {
        let queues = if short {
            &mut self.open_short
        } else {
            &mut self.open_long
        };
        let queue = queues.entry(trade.stock_id).or_default();

        let mut remaining = trade.quantity;
        while remaining > 0 {
            let Some(front) = queue.front_mut() else {
                break;
            };
            let matched = remaining.min(front.remaining);
            let profitable = if short {
                front.price > trade.price
            } else {
                trade.price > front.price
            };

            self.closed.push(ClosedTrade {
                stock_id: trade.stock_id,
                entry_price: front.price,
                exit_price: trade.price,
                quantity: matched,
                profitable,
                short,
            });

            front.remaining -= matched;
            remaining -= matched;
            if front.remaining == 0 {
                queue.pop_front();
            }
        }
    }

    /// All closed round-trip chunks, oldest first.
    pub fn closed(&self) -> &[ClosedTrade] {
        &self.closed
    }

    pub fn into_closed(self) -> Vec<ClosedTrade> {
        self.closed
    }

    /// Open lots for a stock, oldest first. Long and short books are
    /// mutually exclusive per instrument under ledger rules, so at most one
    /// of the two is non-empty.
    pub fn open_lots(&self, stock_id: StockId) -> Vec<Lot> {
        if let Some(queue) = self.open_long.get(&stock_id) {
            if !queue.is_empty() {
                return queue.iter().copied().collect();
            }
        }
        if let Some(queue) = self.open_short.get(&stock_id) {
            if !queue.is_empty() {
                return queue.iter().copied().collect();
            }
        }
        Vec::new()
    }

    /// FIFO-weighted average cost of the still-open quantity.
    pub fn average_cost(&self, stock_id: StockId) -> Option<f64> {
        let lots = self.open_lots(stock_id);
        let total_qty: u32 = lots.iter().map(|l| l.remaining).sum();
        if total_qty == 0 {
            return None;
        }
        let weighted: f64 = lots.iter().map(|l| l.price * l.remaining as f64).sum();
        Some(weighted / total_qty as f64)
    }

    /// Unrealized PnL of the open quantity at `mark`.
    pub fn unrealized_pnl(&self, stock_id: StockId, mark: f64) -> f64 {
        let long: f64 = self
            .open_long
            .get(&stock_id)
            .map(|q| {
                q.iter()
                    .map(|l| (mark - l.price) * l.remaining as f64)
                    .sum()
            })
            .unwrap_or(0.0);
        let short: f64 = self
            .open_short
            .get(&stock_id)
            .map(|q| {
                q.iter()
                    .map(|l| (l.price - mark) * l.remaining as f64)
                    .sum()
            })
            .unwrap_or(0.0);
        long + short
    }

    /// Total realized PnL across all closed chunks.
    pub fn realized_pnl(&self) -> f64 {
        self.closed.iter().map(|c| c.pnl()).sum()
    }
}

/// Convenience wrapper: just the closed chunks of a history.
pub fn closed_trades(trades: &[Trade]) -> Vec<ClosedTrade> {
    FifoLedger::analyze(trades).into_closed()
}
