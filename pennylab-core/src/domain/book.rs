//! Synthetic depth-of-book snapshot.

use serde::{Deserialize, Serialize};

/// One price level of the book.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BookLevel {
    pub price: f64,
    pub size: u64,
}

/// Depth snapshot for one instrument.
///
/// Bids are sorted descending by price, asks ascending. A halted instrument
/// carries an empty book on both sides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBook {
    pub bids: Vec<BookLevel>,
    pub asks: Vec<BookLevel>,
    pub spread: f64,
    pub spread_percent: f64,
}

impl OrderBook {
    pub fn empty() -> Self {
        Self {
            bids: Vec::new(),
            asks: Vec::new(),
            spread: 0.0,
            spread_percent: 0.0,
        }
    }

    /// Best (highest) bid price, if any depth exists.
    pub fn best_bid(&self) -> Option<f64> {
        self.bids.first().map(|l| l.price)
    }

    /// Best (lowest) ask price, if any depth exists.
    pub fn best_ask(&self) -> Option<f64> {
        self.asks.first().map(|l| l.price)
    }

    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }
}

impl Default for OrderBook {
    fn default() -> Self {
        Self::empty()
    }
}
