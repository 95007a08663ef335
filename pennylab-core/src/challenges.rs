//! Session challenges: pattern-detection goals evaluated over a player's
//! trade history and the current tape.

use crate::domain::{Player, PlayerId, Stock, StockId, TradeAction};
use crate::ledger::{closed_trades, ClosedTrade};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A 30%+ rise over the trailing window counts as parabolic.
const PARABOLIC_RISE: f64 = 0.30;
/// A 25%+ drop over the trailing window counts as capitulation.
const CAPITULATION_DROP: f64 = 0.25;
/// Trailing window length in ticks.
const RECENT_TICKS: usize = 5;
/// Consecutive profitable closes needed for the scalp challenge.
pub const SCALP_STREAK_TARGET: u32 = 10;
/// How close to the window low a knife-catch buy must land.
const KNIFE_BOTTOM_TOLERANCE: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChallengeId {
    ShortTheTop,
    CatchTheKnife,
    ScalpMaster,
}

#[derive(Debug, Clone)]
pub struct ChallengeDefinition {
    pub id: ChallengeId,
    pub name: &'static str,
    pub description: &'static str,
    pub reward: f64,
}

static CHALLENGES: &[ChallengeDefinition] = &[
    ChallengeDefinition {
        id: ChallengeId::ShortTheTop,
        name: "Short the Top",
        description: "Sell a stock that has gone parabolic (30%+ rise in 5 ticks)",
        reward: 500.0,
    },
    ChallengeDefinition {
        id: ChallengeId::CatchTheKnife,
        name: "Catch the Knife",
        description: "Buy a capitulating stock near its bottom",
        reward: 500.0,
    },
    ChallengeDefinition {
        id: ChallengeId::ScalpMaster,
        name: "Scalp Master",
        description: "Complete 10 consecutive profitable trades",
        reward: 750.0,
    },
];

pub fn challenges() -> &'static [ChallengeDefinition] {
    CHALLENGES
}

pub fn challenge_by_id(id: ChallengeId) -> &'static ChallengeDefinition {
    CHALLENGES
        .iter()
        .find(|c| c.id == id)
        .expect("every challenge id has a definition")
}

/// Progress toward one challenge for one player. Recomputed on demand,
/// never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeProgress {
    pub challenge_id: ChallengeId,
    pub player_id: PlayerId,
    pub completed: bool,
    /// 0 to 1.
    pub progress: f64,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Evaluate every challenge for one player against the current tape.
pub fn evaluate_challenges(
    player: &Player,
    stocks: &[Stock],
    now: DateTime<Utc>,
) -> Vec<ChallengeProgress> {
    let by_id: HashMap<StockId, &Stock> = stocks.iter().map(|s| (s.id, s)).collect();
    let closed = closed_trades(&player.trade_history);

    let short_the_top = {
        let completed = player
            .trade_history
            .iter()
            .filter(|t| matches!(t.action, TradeAction::Sell | TradeAction::Short))
            .any(|t| by_id.get(&t.stock_id).is_some_and(|s| is_parabolic(s)));
        progress_flag(ChallengeId::ShortTheTop, player.id, completed, now)
    };

    let catch_the_knife = {
        let completed = player
            .trade_history
            .iter()
            .filter(|t| t.action == TradeAction::Buy)
            .any(|t| {
                by_id
                    .get(&t.stock_id)
                    .is_some_and(|s| is_capitulating(s) && near_bottom(t.price, s))
            });
        progress_flag(ChallengeId::CatchTheKnife, player.id, completed, now)
    };

    let scalp_master = {
        let streak = profitable_streak(&closed);
        let progress = (streak as f64 / SCALP_STREAK_TARGET as f64).min(1.0);
        let completed = streak >= SCALP_STREAK_TARGET;
        ChallengeProgress {
            challenge_id: ChallengeId::ScalpMaster,
            player_id: player.id,
            completed,
            progress,
            completed_at: completed.then_some(now),
        }
    };

    vec![short_the_top, catch_the_knife, scalp_master]
}

/// Sum of rewards for completed challenges.
pub fn total_challenge_bonus(progresses: &[ChallengeProgress]) -> f64 {
    progresses
        .iter()
        .filter(|p| p.completed)
        .map(|p| challenge_by_id(p.challenge_id).reward)
        .sum()
}

fn progress_flag(
    challenge_id: ChallengeId,
    player_id: PlayerId,
    completed: bool,
    now: DateTime<Utc>,
) -> ChallengeProgress {
    ChallengeProgress {
        challenge_id,
        player_id,
        completed,
        progress: if completed { 1.0 } else { 0.0 },
        completed_at: completed.then_some(now),
    }
}

fn is_parabolic(stock: &Stock) -> bool {
    let recent = stock.trailing_prices(RECENT_TICKS);
    let (Some(&start), Some(&end)) = (recent.first(), recent.last()) else {
        return false;
    };
    recent.len() >= 2 && start > 0.0 && (end - start) / start >= PARABOLIC_RISE
}

fn is_capitulating(stock: &Stock) -> bool {
    let recent = stock.trailing_prices(RECENT_TICKS);
    let (Some(&start), Some(&end)) = (recent.first(), recent.last()) else {
        return false;
    };
    recent.len() >= 2 && start > 0.0 && (start - end) / start >= CAPITULATION_DROP
}

fn near_bottom(buy_price: f64, stock: &Stock) -> bool {
    let recent = stock.trailing_prices(RECENT_TICKS);
    let Some(min) = recent.iter().copied().reduce(f64::min) else {
        return false;
    };
    min > 0.0 && (buy_price - min).abs() / min <= KNIFE_BOTTOM_TOLERANCE
}

/// Length of the trailing run of profitable closes.
fn profitable_streak(closed: &[ClosedTrade]) -> u32 {
    closed
        .iter()
        .rev()
        .take_while(|c| c.profitable)
        .count() as u32
}
