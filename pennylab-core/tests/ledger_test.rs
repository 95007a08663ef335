//! Ledger integration tests: the cash/position round-trip law and the
//! end-to-end scenario from account open to realized PnL and score.

use chrono::Utc;
use pennylab_core::{
    compute_score, default_catalog, evaluate_challenges, init_session, BookLevel, FifoLedger,
    IdGen, OrderBook, Player, PlayerId, Stock, StockId, TradeAction, TradeLedger,
};
use std::collections::HashMap;

fn stock_with_book(price: f64, bid: f64, ask: f64) -> Stock {
    let mut id_gen = IdGen::new();
    let mut stock = init_session(&default_catalog(), &mut id_gen).remove(0);
    stock.price = price;
    stock.order_book = OrderBook {
        bids: vec![BookLevel { price: bid, size: 10_000 }],
        asks: vec![BookLevel { price: ask, size: 10_000 }],
        spread: ask - bid,
        spread_percent: (ask - bid) / price * 100.0,
    };
    stock
}

fn marks(stock: &Stock) -> HashMap<StockId, f64> {
    HashMap::from([(stock.id, stock.price)])
}

#[test]
fn cash_and_position_follow_the_round_trip_law() {
    let stock = stock_with_book(5.0, 4.99, 5.01);
    let mut player = Player::new(PlayerId(1), "Ann", 10_000.0);
    let mut ledger = TradeLedger::new();
    let now = Utc::now();
    let m = marks(&stock);

    let plan = [
        (TradeAction::Buy, 100u32),
        (TradeAction::Buy, 50),
        (TradeAction::Sell, 30),
        (TradeAction::Buy, 10),
        (TradeAction::Sell, 130),
    ];

    let mut expected_cash = 10_000.0;
    let mut expected_position = 0i64;
    for (action, quantity) in plan {
        let trade = ledger
            .execute(&mut player, &stock, action, quantity, &m, now)
            .unwrap();
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
        assert!((player.cash - expected_cash).abs() < 1e-9);
        assert_eq!(player.position(stock.id), expected_position);
        // The entry exists exactly while the net is nonzero
        assert_eq!(player.portfolio.contains_key(&stock.id), expected_position != 0);
    }

    assert_eq!(expected_position, 0);
    assert!(player.portfolio.is_empty());
}

#[test]
fn rejected_trades_leave_the_account_untouched() {
    let stock = stock_with_book(5.0, 4.99, 5.01);
    let mut player = Player::new(PlayerId(1), "Ann", 100.0);
    let mut ledger = TradeLedger::new();
    let now = Utc::now();
    let m = marks(&stock);

    let before = player.clone();
    assert!(ledger
        .execute(&mut player, &stock, TradeAction::Buy, 1_000, &m, now)
        .is_err());
    assert!(ledger
        .execute(&mut player, &stock, TradeAction::Sell, 1, &m, now)
        .is_err());
    assert!(ledger
        .execute(&mut player, &stock, TradeAction::Cover, 1, &m, now)
        .is_err());
    assert_eq!(player, before);
}

/// The canonical scenario: $10,000 start, buy 100 at $5.00, mark to $6.00,
/// sell 100 at $6.00, and score the result.
#[test]
fn end_to_end_round_trip_with_scoring() {
    let mut stock = stock_with_book(5.0, 4.99, 5.00);
    let mut player = Player::new(PlayerId(1), "Ann", 10_000.0);
    let mut ledger = TradeLedger::new();
    let now = Utc::now();

    // Buy 100 at the $5.00 ask
    let buy = ledger
        .execute(&mut player, &stock, TradeAction::Buy, 100, &marks(&stock), now)
        .unwrap();
    assert_eq!(buy.price, 5.00);
    assert_eq!(player.cash, 9_500.0);
    assert_eq!(player.position(stock.id), 100);

    // Price climbs to $6.00: unrealized PnL is $100
    stock.price = 6.0;
    stock.order_book.bids[0].price = 6.00;
    stock.order_book.asks[0].price = 6.02;
    let fifo = FifoLedger::analyze(&player.trade_history);
    assert!((fifo.unrealized_pnl(stock.id, 6.0) - 100.0).abs() < 1e-9);
    assert!((player.total_value_at(&marks(&stock)) - 10_100.0).abs() < 1e-9);

    // Sell 100 at the $6.00 bid
    let sell = ledger
        .execute(&mut player, &stock, TradeAction::Sell, 100, &marks(&stock), now)
        .unwrap();
    assert_eq!(sell.price, 6.00);
    assert_eq!(player.cash, 10_100.0);
    assert!(player.portfolio.is_empty());
    assert!((player.total_value - 10_100.0).abs() < 1e-9);

    // Realized PnL is $100 and the PnL sub-score is 35
    let fifo = FifoLedger::analyze(&player.trade_history);
    assert!((fifo.realized_pnl() - 100.0).abs() < 1e-9);

    let stocks = vec![stock];
    let progresses = evaluate_challenges(&player, &stocks, now);
    let score = compute_score(&player, &stocks, 1, 10, &progresses, 10_000.0);
    assert!((score.pnl - 100.0).abs() < 1e-9);
    assert!((score.pnl_score - 35.0).abs() < 1e-9);
    assert_eq!(score.win_rate, 1.0);
}

#[test]
fn short_round_trip_mirrors_the_long_side() {
    let mut stock = stock_with_book(6.0, 6.00, 6.02);
    let mut player = Player::new(PlayerId(1), "Ann", 10_000.0);
    let mut ledger = TradeLedger::new();
    let now = Utc::now();

    // Short 100 at the $6.00 bid
    let short = ledger
        .execute(&mut player, &stock, TradeAction::Short, 100, &marks(&stock), now)
        .unwrap();
    assert_eq!(short.price, 6.00);
    assert_eq!(player.cash, 10_600.0);
    assert_eq!(player.position(stock.id), -100);

    // Price falls to $5.00; cover at the ask
    stock.price = 5.0;
    stock.order_book.bids[0].price = 4.99;
    stock.order_book.asks[0].price = 5.00;
    let cover = ledger
        .execute(&mut player, &stock, TradeAction::Cover, 100, &marks(&stock), now)
        .unwrap();
    assert_eq!(cover.price, 5.00);
    assert_eq!(player.cash, 10_100.0);
    assert!(player.portfolio.is_empty());

    let fifo = FifoLedger::analyze(&player.trade_history);
    assert!((fifo.realized_pnl() - 100.0).abs() < 1e-9);
    let closed = fifo.closed();
    assert_eq!(closed.len(), 1);
    assert!(closed[0].short);
    assert!(closed[0].profitable);
}
