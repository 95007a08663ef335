//! Per-tick price, momentum, and volume dynamics for one instrument.
//!
//! `next_tick` is a pure function of the input stock and the RNG: given the
//! same draws it always produces the same update. The engine applies the
//! update with `apply_update`, which maintains the bounded histories and
//! derived volume statistics.

use crate::domain::{Stock, PRICE_HISTORY_CAP, VOLUME_HISTORY_CAP};
use rand::Rng;

/// Penny floor. No price ever drops below this.
pub const MIN_PRICE: f64 = 0.01;
/// Momentum is clamped to [-MOMENTUM_BOUND, MOMENTUM_BOUND].
pub const MOMENTUM_BOUND: f64 = 0.5;

/// Fraction of momentum carried over per tick.
const MOMENTUM_DECAY: f64 = 0.92;
/// How much a new return feeds into momentum.
const MOMENTUM_SENSITIVITY: f64 = 0.4;
/// Weight of momentum in the total return.
const MOMENTUM_RETURN_WEIGHT: f64 = 0.3;
/// Pull strength toward the rolling anchor price.
const MEAN_REVERSION_STRENGTH: f64 = 0.002;
/// Ticks used to compute the anchor.
const MEAN_REVERSION_WINDOW: usize = 60;

/// |momentum| level that marks a move parabolic.
const PARABOLIC_THRESHOLD: f64 = 0.15;
/// Volatility expansion while parabolic.
const PARABOLIC_VOLATILITY_MULT: f64 = 2.5;
/// Base chance of a violent reversal per tick.
const CRASH_PROBABILITY_BASE: f64 = 0.003;
/// How much momentum raises the crash odds.
const CRASH_MOMENTUM_FACTOR: f64 = 8.0;

/// Baseline tick volume as a fraction of float.
const BASE_VOLUME_FLOAT_FRACTION: f64 = 0.002;
/// Residual catalyst effect below this snaps the multiplier back to 1.
const CATALYST_SNAP_TOLERANCE: f64 = 0.001;

/// Ticks in one simulated trading day; the volume curve repeats over it.
const SESSION_TICKS: u64 = 390;

/// Output of one price-model step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceUpdate {
    pub price: f64,
    pub momentum: f64,
    pub catalyst_multiplier: f64,
    pub catalyst_decay: f64,
    pub volume: u64,
}

/// Draw a standard normal via the Box-Muller transform.
pub fn standard_normal(rng: &mut impl Rng) -> f64 {
    let mut u: f64 = 0.0;
    while u == 0.0 {
        u = rng.gen();
    }
    let v: f64 = rng.gen();
    (-2.0 * u.ln()).sqrt() * (2.0 * std::f64::consts::PI * v).cos()
}

/// Compute the next price/momentum/volume state for one instrument.
///
/// Halted instruments print zero volume and hold every other field.
pub fn next_tick(stock: &Stock, tick: u64, rng: &mut impl Rng) -> PriceUpdate {
    if stock.halted {
        return PriceUpdate {
            price: stock.price,
            momentum: stock.momentum,
            catalyst_multiplier: stock.catalyst_multiplier,
            catalyst_decay: stock.catalyst_decay,
            volume: 0,
        };
    }

    // Decay the catalyst effect toward neutral
    let mut catalyst_mult = stock.catalyst_multiplier;
    let mut catalyst_decay = stock.catalyst_decay;
    if catalyst_mult != 1.0 {
        catalyst_mult = 1.0 + (catalyst_mult - 1.0) * (1.0 - catalyst_decay);
        if (catalyst_mult - 1.0).abs() < CATALYST_SNAP_TOLERANCE {
            catalyst_mult = 1.0;
            catalyst_decay = 0.0;
        }
    }

    // Base random walk
    let base_return = standard_normal(rng) * stock.volatility;

    // Momentum component
    let mut momentum = stock.momentum * MOMENTUM_DECAY + base_return * MOMENTUM_SENSITIVITY;

    let is_parabolic = momentum.abs() > PARABOLIC_THRESHOLD;
    let vol_multiplier = if is_parabolic {
        PARABOLIC_VOLATILITY_MULT
    } else {
        1.0
    };

    // Sudden reversal check (failed squeeze, micro-cap blow-off)
    let crash_odds =
        CRASH_PROBABILITY_BASE + momentum.abs() * CRASH_MOMENTUM_FACTOR * CRASH_PROBABILITY_BASE;
    if is_parabolic && rng.gen::<f64>() < crash_odds {
        momentum = -momentum * (0.6 + rng.gen::<f64>() * 0.4);
    }

    // Mean reversion toward the recent anchor
    let anchor = anchor_price(&stock.price_history);
    let reversion_pull = if stock.price > 0.0 {
        (anchor - stock.price) / stock.price * MEAN_REVERSION_STRENGTH
    } else {
        0.0
    };

    let total_return =
        base_return * vol_multiplier * catalyst_mult + momentum * MOMENTUM_RETURN_WEIGHT
            + reversion_pull;

    // Apply to price, floor, and round (cents at >= $1, sub-penny below)
    let mut new_price = (stock.price * (1.0 + total_return)).max(MIN_PRICE);
    new_price = if new_price >= 1.0 {
        (new_price * 100.0).round() / 100.0
    } else {
        (new_price * 10_000.0).round() / 10_000.0
    };

    // Simulated volume: higher on big moves, parabolic runs, live catalysts
    let base_volume = stock.float.float_shares as f64 * BASE_VOLUME_FLOAT_FRACTION;
    let vol_factor = 1.0 + total_return.abs() * 40.0;
    let parabolic_boost = if is_parabolic { 3.0 } else { 1.0 };
    let catalyst_boost = if catalyst_mult != 1.0 { 2.0 } else { 1.0 };
    let tick_volume =
        (base_volume * vol_factor * parabolic_boost * catalyst_boost * (0.5 + rng.gen::<f64>()))
            .floor();

    momentum = momentum.clamp(-MOMENTUM_BOUND, MOMENTUM_BOUND);

    let volume = (tick_volume * time_of_day_multiplier(tick)).floor().max(0.0) as u64;

    PriceUpdate {
        price: new_price,
        momentum,
        catalyst_multiplier: catalyst_mult,
        catalyst_decay,
        volume,
    }
}

/// Mean of the trailing reversion window; 0 when history is empty.
fn anchor_price(price_history: &[f64]) -> f64 {
    let start = price_history.len().saturating_sub(MEAN_REVERSION_WINDOW);
    let window = &price_history[start..];
    if window.is_empty() {
        return 0.0;
    }
    window.iter().sum::<f64>() / window.len() as f64
}

/// U-shaped intraday volume curve: busy at the open and close, quiet midday.
///
/// Scaled to [0.5, 1.5] over the 390-tick session.
fn time_of_day_multiplier(tick: u64) -> f64 {
    let session_tick = tick % SESSION_TICKS;
    let normalized = session_tick as f64 / (SESSION_TICKS - 1) as f64;
    0.5 + 4.0 * (normalized - 0.5).powi(2)
}

/// Fold a price update into the instrument, maintaining the bounded
/// histories, high/low marks, volume profile, and float rotation.
pub fn apply_update(stock: &mut Stock, update: &PriceUpdate) {
    stock.price_history.push(update.price);
    if stock.price_history.len() > PRICE_HISTORY_CAP {
        stock.price_history.remove(0);
    }

    stock.volume.history.push(update.volume);
    if stock.volume.history.len() > VOLUME_HISTORY_CAP {
        stock.volume.history.remove(0);
    }
    let average = if stock.volume.history.is_empty() {
        update.volume as f64
    } else {
        stock.volume.history.iter().sum::<u64>() as f64 / stock.volume.history.len() as f64
    };

    stock.price = update.price;
    stock.high = stock.high.max(update.price);
    stock.low = stock.low.min(update.price);
    stock.momentum = update.momentum;
    stock.catalyst_multiplier = update.catalyst_multiplier;
    stock.catalyst_decay = update.catalyst_decay;

    stock.volume.current = update.volume;
    stock.volume.average = average;
    stock.volume.relative_volume = if average > 0.0 {
        update.volume as f64 / average
    } else {
        1.0
    };

    stock.float.day_volume += update.volume;
    stock.float.float_rotation = if stock.float.float_shares > 0 {
        stock.float.day_volume as f64 / stock.float.float_shares as f64
    } else {
        0.0
    };
}
