//! Trade execution against the synthesized book.
//!
//! `TradeLedger::execute` is the only path that mutates a player: it checks
//! every rejection condition before touching anything, so a rejected trade
//! leaves the account byte-identical. Fills take the best opposing book
//! level and fall back to the last print when that side is empty.

pub mod fifo;

pub use fifo::{closed_trades, ClosedTrade, FifoLedger, Lot};

use crate::domain::{IdGen, Player, Stock, StockId, Trade, TradeAction};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use thiserror::Error;

/// Why a trade did not execute. Rejections are outcomes, not faults.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TradeRejection {
    #[error("instrument is halted")]
    Halted,

    #[error("quantity must be a positive number of shares")]
    ZeroQuantity,

    #[error("insufficient cash: need {needed:.2}, have {available:.2}")]
    InsufficientCash { needed: f64, available: f64 },

    #[error("insufficient held shares: requested {requested}, held {held}")]
    InsufficientShares { requested: u32, held: i64 },

    #[error("insufficient short position: requested {requested}, short {short}")]
    InsufficientShortPosition { requested: u32, short: i64 },

    #[error("a position is open on the opposite side; close it first")]
    OppositeSideOpen,
}

/// Executes trades and allocates trade IDs.
#[derive(Debug, Default)]
pub struct TradeLedger {
    id_gen: IdGen,
}

impl TradeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fill price a trade would get right now.
    pub fn quote(stock: &Stock, action: TradeAction) -> f64 {
        let side = if action.uses_ask() {
            stock.order_book.best_ask()
        } else {
            stock.order_book.best_bid()
        };
        side.unwrap_or(stock.price)
    }

    /// Execute one trade for `player` against `stock`'s current book.
    ///
    /// `marks` prices every open position for the total-value recompute.
    /// The operation is atomic: every rejection is checked before the first
    /// mutation.
    pub fn execute(
        &mut self,
        player: &mut Player,
        stock: &Stock,
        action: TradeAction,
        quantity: u32,
        marks: &HashMap<StockId, f64>,
        now: DateTime<Utc>,
    ) -> Result<Trade, TradeRejection> {
        if stock.halted {
            return Err(TradeRejection::Halted);
        }
        if quantity == 0 {
            return Err(TradeRejection::ZeroQuantity);
        }

        let fill_price = Self::quote(stock, action);
        let notional = fill_price * quantity as f64;
        let held = player.position(stock.id);

        match action {
            TradeAction::Buy => {
                if held < 0 {
                    return Err(TradeRejection::OppositeSideOpen);
                }
                if player.cash < notional {
                    return Err(TradeRejection::InsufficientCash {
                        needed: notional,
                        available: player.cash,
                    });
                }
            }
            TradeAction::Sell => {
                if held < quantity as i64 {
                    return Err(TradeRejection::InsufficientShares {
                        requested: quantity,
                        held,
                    });
                }
            }
            TradeAction::Short => {
                if held > 0 {
                    return Err(TradeRejection::OppositeSideOpen);
                }
                if player.cash < notional {
                    return Err(TradeRejection::InsufficientCash {
                        needed: notional,
                        available: player.cash,
                    });
                }
            }
            TradeAction::Cover => {
                let short = (-held).max(0);
                if short < quantity as i64 {
                    return Err(TradeRejection::InsufficientShortPosition {
                        requested: quantity,
                        short,
                    });
                }
            }
        }

        // All checks passed; apply the whole mutation
        match action {
            TradeAction::Buy | TradeAction::Cover => player.cash -= notional,
            TradeAction::Sell | TradeAction::Short => player.cash += notional,
        }

        let delta = match action {
            TradeAction::Buy | TradeAction::Cover => quantity as i64,
            TradeAction::Sell | TradeAction::Short => -(quantity as i64),
        };
        let new_position = held + delta;
        if new_position == 0 {
            player.portfolio.remove(&stock.id);
        } else {
            player.portfolio.insert(stock.id, new_position);
        }

        player.total_value = player.total_value_at(marks);

        let trade = Trade {
            id: self.id_gen.trade_id(),
            player_id: player.id,
            stock_id: stock.id,
            action,
            quantity,
            price: fill_price,
            timestamp: now,
        };
        player.trade_history.push(trade.clone());

        Ok(trade)
    }
}
