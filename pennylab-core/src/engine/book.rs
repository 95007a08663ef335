//! Synthetic order-book generation.
//!
//! Micro-cap books are thin, with wide spreads and lumpy size. `generate`
//! derives a fresh depth snapshot from the instrument's price and
//! volatility; `skew` then thins the side being consumed by momentum.

use crate::domain::{BookLevel, OrderBook, Stock};
use rand::Rng;

/// Depth levels per side.
const BOOK_DEPTH: usize = 8;
/// Base level size as a fraction of float.
const BASE_SIZE_FRACTION: f64 = 0.0005;
/// How much volatility widens the spread.
const SPREAD_VOLATILITY_FACTOR: f64 = 0.3;
/// Chance of a large passive seller sitting on an ask level.
const WALL_PROBABILITY: f64 = 0.12;
/// |momentum| below this leaves the book unskewed.
const SKEW_MOMENTUM_THRESHOLD: f64 = 0.02;
/// Thinning is capped at 80% of level size.
const MAX_SKEW: f64 = 0.8;
/// Skewed levels never shrink below this many shares.
const MIN_LEVEL_SIZE: u64 = 100;

/// Generate a depth snapshot for one instrument.
///
/// Level prices step outward from the best bid/ask by one to four ticks
/// each, so bids are strictly decreasing and asks strictly increasing.
pub fn generate(stock: &Stock, rng: &mut impl Rng) -> OrderBook {
    let price = stock.price;
    if price <= 0.0 {
        return OrderBook::empty();
    }

    // Wider spreads for more volatile and lower-priced names
    let base_spread = if price < 1.0 { 0.005 } else { 0.01 };
    let volatility_spread = stock.volatility * SPREAD_VOLATILITY_FACTOR * price;
    let half_spread = (base_spread + volatility_spread) / 2.0;

    let tick_size = if price >= 1.0 { 0.01 } else { 0.0001 };

    let best_bid = round_to_tick(price - half_spread, tick_size);
    let best_ask = round_to_tick(price + half_spread, tick_size);

    let base_size = (stock.float.float_shares as f64 * BASE_SIZE_FRACTION).floor();

    // Bid levels, walking down from the best bid
    let mut bids = Vec::with_capacity(BOOK_DEPTH);
    let mut level_price = best_bid;
    for i in 0..BOOK_DEPTH {
        if i > 0 {
            let step = rng.gen_range(1..=4) as f64;
            level_price = round_to_tick(level_price - tick_size * step, tick_size);
        }
        if level_price <= 0.0 {
            break;
        }

        // Thicker support away from the spread, with lumpy randomness
        let depth_multiplier = 1.0 + i as f64 * 0.3;
        let size = (base_size * depth_multiplier * (0.3 + rng.gen::<f64>() * 1.4)).floor() as u64;
        bids.push(BookLevel {
            price: level_price,
            size,
        });
    }

    // Ask levels, walking up from the best ask
    let mut asks = Vec::with_capacity(BOOK_DEPTH);
    let mut level_price = best_ask;
    for i in 0..BOOK_DEPTH {
        if i > 0 {
            let step = rng.gen_range(1..=4) as f64;
            level_price = round_to_tick(level_price + tick_size * step, tick_size);
        }

        // Resistance walls: an occasional big seller on the ask
        let is_wall = rng.gen::<f64>() < WALL_PROBABILITY;
        let depth_multiplier = 1.0 + i as f64 * 0.25;
        let wall_multiplier = if is_wall {
            3.0 + rng.gen::<f64>() * 5.0
        } else {
            1.0
        };
        let size = (base_size * depth_multiplier * wall_multiplier * (0.3 + rng.gen::<f64>() * 1.4))
            .floor() as u64;
        asks.push(BookLevel {
            price: level_price,
            size,
        });
    }

    let spread = best_ask - best_bid;
    let spread_percent = spread / price * 100.0;

    OrderBook {
        bids,
        asks,
        spread: (spread * 10_000.0).round() / 10_000.0,
        spread_percent: (spread_percent * 100.0).round() / 100.0,
    }
}

/// Thin the side being eaten by aggressive flow and thicken the other.
///
/// Positive momentum consumes the asks (bullish tape), negative momentum
/// the bids. Thinned levels are floored at [`MIN_LEVEL_SIZE`] shares.
pub fn skew(book: OrderBook, momentum: f64) -> OrderBook {
    if momentum.abs() < SKEW_MOMENTUM_THRESHOLD {
        return book;
    }

    let bullish = momentum > 0.0;
    let skew_factor = (momentum.abs() * 3.0).min(MAX_SKEW);

    let thin = |levels: Vec<BookLevel>| -> Vec<BookLevel> {
        levels
            .into_iter()
            .map(|level| BookLevel {
                price: level.price,
                size: (((level.size as f64) * (1.0 - skew_factor)).floor() as u64)
                    .max(MIN_LEVEL_SIZE),
            })
            .collect()
    };

    let thicken = |levels: Vec<BookLevel>| -> Vec<BookLevel> {
        levels
            .into_iter()
            .map(|level| BookLevel {
                price: level.price,
                size: ((level.size as f64) * (1.0 + skew_factor * 0.5)).floor() as u64,
            })
            .collect()
    };

    let (bids, asks) = if bullish {
        (thicken(book.bids), thin(book.asks))
    } else {
        (thin(book.bids), thicken(book.asks))
    };

    OrderBook {
        bids,
        asks,
        spread: book.spread,
        spread_percent: book.spread_percent,
    }
}

fn round_to_tick(value: f64, tick_size: f64) -> f64 {
    (value / tick_size).round() * tick_size
}
