//! Property tests for engine and ledger invariants.
//!
//! Uses proptest to verify:
//! 1. Price floor and momentum bounds hold for any seed
//! 2. History caps hold for any seed and tick count
//! 3. The ledger cash law holds for arbitrary valid trade sequences
//! 4. FIFO matching conserves quantity (closed + open == opened)

use chrono::Utc;
use pennylab_core::engine::{MIN_PRICE, MOMENTUM_BOUND};
use pennylab_core::{
    default_catalog, init_session, BookLevel, FifoLedger, IdGen, MarketEngine, OrderBook,
    Player, PlayerId, SessionConfig, Stock, StockId, TradeAction, TradeLedger,
};
use proptest::prelude::*;
use std::collections::HashMap;

fn fresh_engine(seed: u64) -> MarketEngine {
    let mut id_gen = IdGen::new();
    let stocks = init_session(&default_catalog(), &mut id_gen);
    MarketEngine::new(stocks, SessionConfig::default(), seed)
}

fn liquid_stock() -> Stock {
    let mut id_gen = IdGen::new();
    let mut stock = init_session(&default_catalog(), &mut id_gen).remove(0);
    stock.price = 5.0;
    stock.order_book = OrderBook {
        bids: vec![BookLevel { price: 4.99, size: 1_000_000 }],
        asks: vec![BookLevel { price: 5.01, size: 1_000_000 }],
        spread: 0.02,
        spread_percent: 0.4,
    };
    stock
}

proptest! {
    /// For any seed, a few hundred ticks never break the numeric bounds.
    #[test]
    fn bounds_hold_for_any_seed(seed in any::<u64>()) {
        let mut engine = fresh_engine(seed);
        engine.start();
        let now = Utc::now();
        for _ in 0..200 {
            let result = engine.tick_at(now);
            for stock in &result.stocks {
                prop_assert!(stock.price >= MIN_PRICE);
                prop_assert!(stock.momentum.abs() <= MOMENTUM_BOUND);
                prop_assert!(stock.price_history.len() <= 500);
                prop_assert!(stock.volume.history.len() <= 60);
            }
        }
    }

    /// Cash always equals starting cash minus buys plus sells, and the
    /// position always equals net opens minus closes, no matter what mix
    /// of accepted and rejected orders arrives.
    #[test]
    fn ledger_cash_law(
        seed in any::<u64>(),
        orders in prop::collection::vec((0u8..4, 1u32..200), 1..40),
    ) {
        let _ = seed;
        let stock = liquid_stock();
        let marks: HashMap<StockId, f64> = HashMap::from([(stock.id, stock.price)]);
        let mut player = Player::new(PlayerId(1), "P", 10_000.0);
        let mut ledger = TradeLedger::new();
        let now = Utc::now();

        let mut expected_cash = 10_000.0;
        let mut expected_position = 0i64;

        for (kind, quantity) in orders {
            let action = match kind {
                0 => TradeAction::Buy,
                1 => TradeAction::Sell,
                2 => TradeAction::Short,
                _ => TradeAction::Cover,
            };
            match ledger.execute(&mut player, &stock, action, quantity, &marks, now) {
                Ok(trade) => {
                    match action {
                        TradeAction::Buy | TradeAction::Cover => {
                            expected_cash -= trade.notional();
                            expected_position += quantity as i64;
                        }
                        TradeAction::Sell | TradeAction::Short => {
                            expected_cash += trade.notional();
                            expected_position -= quantity as i64;
                        }
                    }
                }
                Err(_) => {
                    // A rejection must not move anything
                }
            }
            prop_assert!((player.cash - expected_cash).abs() < 1e-6);
            prop_assert_eq!(player.position(stock.id), expected_position);
            prop_assert_eq!(
                player.portfolio.contains_key(&stock.id),
                expected_position != 0
            );
        }
    }

    /// Quantity is conserved through FIFO matching: every opened share is
    /// either in a closed chunk or in an open lot.
    #[test]
    fn fifo_conserves_quantity(orders in prop::collection::vec((0u8..4, 1u32..200), 1..40)) {
        let stock = liquid_stock();
        let marks: HashMap<StockId, f64> = HashMap::from([(stock.id, stock.price)]);
        let mut player = Player::new(PlayerId(1), "P", 1_000_000.0);
        let mut ledger = TradeLedger::new();
        let now = Utc::now();

        let mut opened: u64 = 0;
        for (kind, quantity) in orders {
            let action = match kind {
                0 => TradeAction::Buy,
                1 => TradeAction::Sell,
                2 => TradeAction::Short,
                _ => TradeAction::Cover,
            };
            if let Ok(trade) = ledger.execute(&mut player, &stock, action, quantity, &marks, now) {
                if trade.action.opens_position() {
                    opened += quantity as u64;
                }
            }
        }

        let fifo = FifoLedger::analyze(&player.trade_history);
        let closed_qty: u64 = fifo.closed().iter().map(|c| c.quantity as u64).sum();
        let open_qty: u64 = fifo
            .open_lots(stock.id)
            .iter()
            .map(|l| l.remaining as u64)
            .sum();
        prop_assert_eq!(closed_qty + open_qty, opened);
    }

    /// Two engines with the same seed agree tick for tick.
    #[test]
    fn determinism_for_any_seed(seed in any::<u64>()) {
        let now = Utc::now();
        let mut a = fresh_engine(seed);
        let mut b = fresh_engine(seed);
        a.start();
        b.start();
        for _ in 0..60 {
            let ra = a.tick_at(now);
            let rb = b.tick_at(now);
            prop_assert_eq!(ra.stocks, rb.stocks);
            prop_assert_eq!(ra.new_events, rb.new_events);
        }
    }
}
