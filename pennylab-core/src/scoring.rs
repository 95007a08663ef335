//! End-of-round scoring: PnL, risk, accuracy, speed, badges, levels.
//!
//! Everything here is a pure function of the player, the stock set, and
//! round metadata. Nothing is persisted; callers recompute on demand.

use crate::challenges::{total_challenge_bonus, ChallengeProgress};
use crate::domain::{Player, PlayerId, Sector, Stock, StockId, Trade, TradeAction};
use crate::ledger::{closed_trades, ClosedTrade};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Score per $100 of profit.
const PNL_SCALE: f64 = 35.0;
const RISK_WEIGHT: f64 = 25.0;
const ACCURACY_WEIGHT: f64 = 25.0;
const SPEED_WEIGHT: f64 = 15.0;

/// Highest reachable level.
pub const MAX_LEVEL: u32 = 6;
/// Score per level step.
const SCORE_PER_LEVEL: f64 = 500.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BadgeId {
    DiamondHands,
    PaperHands,
    TheBigShort,
    FirstBlood,
    Diversified,
    SpeedDemon,
}

#[derive(Debug, Clone)]
pub struct Badge {
    pub id: BadgeId,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
}

static ALL_BADGES: &[Badge] = &[
    Badge {
        id: BadgeId::DiamondHands,
        name: "Diamond Hands",
        description: "Held through 20%+ drawdown and recovered to profit",
        icon: "\u{1F48E}",
    },
    Badge {
        id: BadgeId::PaperHands,
        name: "Paper Hands",
        description: "Sold within 3% drawdown of buy price",
        icon: "\u{1F9FB}",
    },
    Badge {
        id: BadgeId::TheBigShort,
        name: "The Big Short",
        description: "50%+ of starting cash earned from short sells",
        icon: "\u{1F4C9}",
    },
    Badge {
        id: BadgeId::FirstBlood,
        name: "First Blood",
        description: "Completed first profitable trade",
        icon: "\u{1FA78}",
    },
    Badge {
        id: BadgeId::Diversified,
        name: "Diversified",
        description: "Held positions in 3+ sectors simultaneously",
        icon: "\u{1F310}",
    },
    Badge {
        id: BadgeId::SpeedDemon,
        name: "Speed Demon",
        description: "Finished in under half the max rounds",
        icon: "\u{26A1}",
    },
];

pub fn all_badges() -> &'static [Badge] {
    ALL_BADGES
}

/// Difficulty knobs carried by a level for the following round.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LevelConfig {
    pub level: u32,
    pub label: &'static str,
    pub volatility_multiplier: f64,
    pub tick_speed_multiplier: f64,
    pub black_swan_chance: f64,
}

static LEVEL_CONFIGS: &[LevelConfig] = &[
    LevelConfig { level: 1, label: "Intern", volatility_multiplier: 1.0, tick_speed_multiplier: 1.0, black_swan_chance: 0.0 },
    LevelConfig { level: 2, label: "Analyst", volatility_multiplier: 1.2, tick_speed_multiplier: 0.9, black_swan_chance: 0.05 },
    LevelConfig { level: 3, label: "Associate", volatility_multiplier: 1.4, tick_speed_multiplier: 0.8, black_swan_chance: 0.10 },
    LevelConfig { level: 4, label: "VP", volatility_multiplier: 1.7, tick_speed_multiplier: 0.7, black_swan_chance: 0.15 },
    LevelConfig { level: 5, label: "Director", volatility_multiplier: 2.0, tick_speed_multiplier: 0.6, black_swan_chance: 0.20 },
    LevelConfig { level: 6, label: "Managing Dir", volatility_multiplier: 2.5, tick_speed_multiplier: 0.5, black_swan_chance: 0.30 },
];

pub fn level_for_score(total_score: f64) -> u32 {
    (((total_score / SCORE_PER_LEVEL).floor() as u32) + 1).min(MAX_LEVEL)
}

pub fn level_config(level: u32) -> &'static LevelConfig {
    let idx = level.clamp(1, MAX_LEVEL) as usize - 1;
    &LEVEL_CONFIGS[idx]
}

/// The composite end-of-round score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerScore {
    pub player_id: PlayerId,
    pub pnl: f64,
    pub pnl_score: f64,
    pub max_drawdown: f64,
    pub risk_score: f64,
    pub win_rate: f64,
    pub accuracy_score: f64,
    pub rounds_used: u32,
    pub speed_score: f64,
    pub challenge_bonus: f64,
    pub total_score: f64,
    pub level: u32,
    pub badges: Vec<BadgeId>,
}

/// Largest peak-to-trough equity decline over the player's trade sequence.
///
/// Replays the trades in timestamp order, rebuilding cash and signed
/// holdings. Open holdings are valued at the most recent fill price seen
/// for that stock up to that point in the replay, the contemporaneous
/// observation the history actually carries.
pub fn max_drawdown(player: &Player, starting_cash: f64) -> f64 {
    let mut trades: Vec<&Trade> = player.trade_history.iter().collect();
    trades.sort_by_key(|t| t.timestamp);
    if trades.is_empty() {
        return 0.0;
    }

    let mut cash = starting_cash;
    let mut holdings: HashMap<StockId, i64> = HashMap::new();
    let mut last_fill: HashMap<StockId, f64> = HashMap::new();
    let mut peak = starting_cash;
    let mut max_dd: f64 = 0.0;

    for trade in trades {
        match trade.action {
            TradeAction::Buy | TradeAction::Cover => cash -= trade.notional(),
            TradeAction::Sell | TradeAction::Short => cash += trade.notional(),
        }
        let delta = match trade.action {
            TradeAction::Buy | TradeAction::Cover => trade.quantity as i64,
            TradeAction::Sell | TradeAction::Short => -(trade.quantity as i64),
        };
        let position = holdings.entry(trade.stock_id).or_insert(0);
        *position += delta;
        if *position == 0 {
            holdings.remove(&trade.stock_id);
        }
        last_fill.insert(trade.stock_id, trade.price);

        let equity: f64 = cash
            + holdings
                .iter()
                .map(|(stock_id, qty)| {
                    let mark = last_fill.get(stock_id).copied().unwrap_or(0.0);
                    *qty as f64 * mark
                })
                .sum::<f64>();

        if equity > peak {
            peak = equity;
        }
        let dd = if peak > 0.0 { (peak - equity) / peak } else { 0.0 };
        max_dd = max_dd.max(dd);
    }

    max_dd
}

fn pnl_score(pnl: f64) -> f64 {
    pnl / 100.0 * PNL_SCALE
}

fn risk_score(max_drawdown: f64) -> f64 {
    (100.0 - max_drawdown * 200.0).max(0.0) * (RISK_WEIGHT / 100.0)
}

fn accuracy_score(win_rate: f64) -> f64 {
    win_rate * 200.0 * (ACCURACY_WEIGHT / 100.0)
}

fn speed_score(rounds_used: u32, max_rounds: u32) -> f64 {
    if max_rounds <= 1 {
        return SPEED_WEIGHT * 2.0;
    }
    let ratio = 1.0 - (rounds_used as f64 - 1.0) / (max_rounds as f64 - 1.0);
    ratio * 200.0 * (SPEED_WEIGHT / 100.0)
}

fn evaluate_badges(
    player: &Player,
    stocks: &[Stock],
    closed: &[ClosedTrade],
    max_dd: f64,
    rounds_used: u32,
    max_rounds: u32,
    starting_cash: f64,
) -> Vec<BadgeId> {
    let mut badges = Vec::new();
    let by_id: HashMap<StockId, &Stock> = stocks.iter().map(|s| (s.id, s)).collect();

    if closed.iter().any(|t| t.profitable) {
        badges.push(BadgeId::FirstBlood);
    }

    if max_dd >= 0.20 && player.total_value > starting_cash {
        badges.push(BadgeId::DiamondHands);
    }

    // A long close cut quickly: loss of at most 3%
    if closed.iter().any(|t| {
        if t.short || t.entry_price <= 0.0 {
            return false;
        }
        let loss = (t.entry_price - t.exit_price) / t.entry_price;
        loss > 0.0 && loss <= 0.03
    }) {
        badges.push(BadgeId::PaperHands);
    }

    let short_profits: f64 = closed
        .iter()
        .filter(|t| t.short && t.profitable)
        .map(|t| t.pnl())
        .sum();
    if short_profits >= starting_cash * 0.5 {
        badges.push(BadgeId::TheBigShort);
    }

    let held_sectors: HashSet<Sector> = player
        .portfolio
        .iter()
        .filter(|(_, qty)| **qty != 0)
        .filter_map(|(stock_id, _)| by_id.get(stock_id).map(|s| s.sector))
        .collect();
    if held_sectors.len() >= 3 {
        badges.push(BadgeId::Diversified);
    }

    if rounds_used > 0 && (rounds_used as f64) < max_rounds as f64 / 2.0 {
        badges.push(BadgeId::SpeedDemon);
    }

    badges
}

/// Compute the full end-of-round score for one player.
pub fn compute_score(
    player: &Player,
    stocks: &[Stock],
    rounds_used: u32,
    max_rounds: u32,
    challenge_progresses: &[ChallengeProgress],
    starting_cash: f64,
) -> PlayerScore {
    let closed = closed_trades(&player.trade_history);
    let pnl = player.total_value - starting_cash;
    let max_dd = max_drawdown(player, starting_cash);

    let wins = closed.iter().filter(|t| t.profitable).count();
    let win_rate = if closed.is_empty() {
        0.0
    } else {
        wins as f64 / closed.len() as f64
    };

    let pnl_score = pnl_score(pnl);
    let risk_score = risk_score(max_dd);
    let accuracy_score = accuracy_score(win_rate);
    let speed_score = speed_score(rounds_used, max_rounds);
    let challenge_bonus = total_challenge_bonus(challenge_progresses);

    let total_score =
        (pnl_score + risk_score + accuracy_score + speed_score + challenge_bonus).max(0.0);
    let level = level_for_score(total_score);
    let badges = evaluate_badges(
        player,
        stocks,
        &closed,
        max_dd,
        rounds_used,
        max_rounds,
        starting_cash,
    );

    PlayerScore {
        player_id: player.id,
        pnl,
        pnl_score,
        max_drawdown: max_dd,
        risk_score,
        win_rate,
        accuracy_score,
        rounds_used,
        speed_score,
        challenge_bonus,
        total_score,
        level,
        badges,
    }
}
