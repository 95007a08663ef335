//! Static instrument seed data and session bootstrap.

use crate::domain::{
    FloatProfile, IdGen, OrderBook, Sector, Stock, VolumeProfile,
};

/// Seed values for one instrument.
#[derive(Debug, Clone)]
pub struct StockSeed {
    pub ticker: &'static str,
    pub name: &'static str,
    pub price: f64,
    pub volatility: f64,
    pub sector: Sector,
    pub float_shares: u64,
    pub total_shares: u64,
    /// Short interest as a fraction of float.
    pub short_interest_pct: f64,
}

/// The default catalog: five thinly-traded micro-caps across sectors.
pub fn default_catalog() -> Vec<StockSeed> {
    vec![
        StockSeed {
            ticker: "NXRA",
            name: "Nexara Therapeutics",
            price: 3.42,
            volatility: 0.06,
            sector: Sector::Healthcare,
            float_shares: 8_500_000,
            total_shares: 24_000_000,
            short_interest_pct: 0.32,
        },
        StockSeed {
            ticker: "VLTX",
            name: "VoltX Energy Corp",
            price: 1.87,
            volatility: 0.08,
            sector: Sector::Energy,
            float_shares: 5_200_000,
            total_shares: 18_000_000,
            short_interest_pct: 0.18,
        },
        StockSeed {
            ticker: "CRDL",
            name: "Cordell AI Systems",
            price: 7.15,
            volatility: 0.05,
            sector: Sector::Technology,
            float_shares: 12_000_000,
            total_shares: 35_000_000,
            short_interest_pct: 0.22,
        },
        StockSeed {
            ticker: "MBRA",
            name: "Mombra Financial",
            price: 0.84,
            volatility: 0.10,
            sector: Sector::Finance,
            float_shares: 3_800_000,
            total_shares: 15_000_000,
            short_interest_pct: 0.41,
        },
        StockSeed {
            ticker: "PLSR",
            name: "Pulsar Brands Inc",
            price: 4.58,
            volatility: 0.04,
            sector: Sector::Consumer,
            float_shares: 6_700_000,
            total_shares: 20_000_000,
            short_interest_pct: 0.14,
        },
    ]
}

/// Build the initial instrument set for a fresh session.
///
/// History starts with the opening print; open/high/low/previous close all
/// sit at the seed price until the first tick moves them.
pub fn init_session(seeds: &[StockSeed], id_gen: &mut IdGen) -> Vec<Stock> {
    seeds
        .iter()
        .map(|seed| Stock {
            id: id_gen.stock_id(),
            ticker: seed.ticker.to_string(),
            name: seed.name.to_string(),
            sector: seed.sector,
            price: seed.price,
            previous_close: seed.price,
            open: seed.price,
            high: seed.price,
            low: seed.price,
            price_history: vec![seed.price],
            volatility: seed.volatility,
            momentum: 0.0,
            catalyst_multiplier: 1.0,
            catalyst_decay: 0.0,
            float: FloatProfile {
                total_shares: seed.total_shares,
                float_shares: seed.float_shares,
                short_interest: (seed.float_shares as f64 * seed.short_interest_pct) as u64,
                day_volume: 0,
                float_rotation: 0.0,
            },
            volume: VolumeProfile::empty(),
            order_book: OrderBook::empty(),
            halted: false,
            halt_ticks_remaining: 0,
        })
        .collect()
}
