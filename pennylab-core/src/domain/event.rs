//! Market events: catalysts injected into the simulation.

use super::ids::{EventId, StockId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Catalyst category. Each variant maps to one generator template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketEventType {
    EarningsSurprise,
    EarningsMiss,
    SecHalt,
    Dilution,
    ShortSqueeze,
    InsiderBuying,
    FdaApproval,
    ContractWin,
    OfferingAnnounced,
    RedditMomentum,
}

/// One fired market event.
///
/// Immutable once created; the engine appends it to the session event log
/// and never edits it afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketEvent {
    pub id: EventId,
    pub event_type: MarketEventType,
    pub title: String,
    pub description: String,
    pub affected_stock_ids: Vec<StockId>,
    /// Price multiplier, e.g. 1.1 = +10%, 0.85 = -15%.
    pub price_impact: f64,
    /// Volume multiplier while the effect lasts.
    pub volume_impact: f64,
    /// Effect duration in ticks.
    pub duration: u64,
    /// Tick the event fired on.
    pub tick: u64,
    pub timestamp: DateTime<Utc>,
}

impl MarketEvent {
    pub fn affects(&self, stock_id: StockId) -> bool {
        self.affected_stock_ids.contains(&stock_id)
    }
}
