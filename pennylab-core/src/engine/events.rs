//! Randomized market-event injection.
//!
//! A fixed template catalog describes the catalysts the tape can produce:
//! impact ranges, duration ranges, halt behavior, selection weight, and
//! optional sector bias. At most one event fires per tick, gated by a base
//! probability tuned so something happens every 40 to 80 ticks.

use crate::domain::{IdGen, MarketEvent, MarketEventType, Sector, Stock, StockId};
use chrono::{DateTime, Utc};
use rand::Rng;
use std::collections::HashMap;

/// Chance any event fires on a given tick.
pub const BASE_EVENT_PROBABILITY: f64 = 0.018;
/// Minimum ticks between events on the same instrument.
pub const PER_STOCK_COOLDOWN: u64 = 25;
/// Chance a sector-biased template actually restricts to its sectors.
const SECTOR_BIAS_PROBABILITY: f64 = 0.7;

/// One entry of the catalyst catalog.
#[derive(Debug, Clone)]
pub struct EventTemplate {
    pub event_type: MarketEventType,
    pub titles: &'static [&'static str],
    pub descriptions: &'static [&'static str],
    /// Price multiplier range, e.g. (1.15, 1.60) = +15% to +60%.
    pub price_impact: (f64, f64),
    pub volume_impact: (f64, f64),
    /// Catalyst duration range in ticks.
    pub duration: (u64, u64),
    /// Whether this catalyst halts trading.
    pub halts: bool,
    /// Halt length range in ticks (only read when `halts`).
    pub halt_duration: (u64, u64),
    /// Relative selection weight.
    pub weight: u32,
    /// Sectors this catalyst gravitates toward (empty = none).
    pub sector_bias: &'static [Sector],
}

static TEMPLATES: &[EventTemplate] = &[
    EventTemplate {
        event_type: MarketEventType::EarningsSurprise,
        titles: &[
            "{ticker} Crushes Earnings Estimates",
            "{ticker} Reports Blowout Quarter",
            "{ticker} Revenue Beats by 40%",
        ],
        descriptions: &[
            "{name} reported EPS of $0.12 vs. consensus of -$0.05. Revenue up 120% YoY.",
            "{name} surprised Wall Street with its first profitable quarter. Short sellers scrambling.",
            "Massive beat on top and bottom line. Guidance raised for full year.",
        ],
        price_impact: (1.15, 1.60),
        volume_impact: (4.0, 12.0),
        duration: (20, 60),
        halts: false,
        halt_duration: (0, 0),
        weight: 10,
        sector_bias: &[],
    },
    EventTemplate {
        event_type: MarketEventType::EarningsMiss,
        titles: &[
            "{ticker} Misses Earnings Badly",
            "{ticker} Reports Wider-Than-Expected Loss",
            "{ticker} Revenue Falls Short",
        ],
        descriptions: &[
            "{name} posted a loss of -$0.22 vs. expected -$0.08. Cash burn accelerating.",
            "Disappointing results across the board. Management lowered guidance.",
            "{name} missed revenue estimates by 30%. Customer churn increasing.",
        ],
        price_impact: (0.55, 0.85),
        volume_impact: (3.0, 8.0),
        duration: (15, 45),
        halts: false,
        halt_duration: (0, 0),
        weight: 10,
        sector_bias: &[],
    },
    EventTemplate {
        event_type: MarketEventType::SecHalt,
        titles: &[
            "TRADING HALTED: {ticker} Pending News",
            "{ticker} Halted - Volatility Circuit Breaker",
            "LULD Halt on {ticker}",
        ],
        descriptions: &[
            "Trading in {name} has been halted pending a company announcement.",
            "Circuit breaker triggered on {ticker} after rapid price movement.",
            "Limit Up/Limit Down halt on {ticker}. Trading to resume shortly.",
        ],
        // Resumes could go either way
        price_impact: (0.70, 1.40),
        volume_impact: (8.0, 20.0),
        duration: (30, 90),
        halts: true,
        halt_duration: (10, 30),
        weight: 5,
        sector_bias: &[],
    },
    EventTemplate {
        event_type: MarketEventType::Dilution,
        titles: &[
            "{ticker} Announces Shelf Offering",
            "{ticker} Files ATM Offering - Dilution Alert",
            "{ticker} Prices Secondary Offering",
        ],
        descriptions: &[
            "{name} filed to sell up to $15M in shares at market prices. Dilution risk.",
            "Direct offering priced at 15% discount to market. Shares outstanding increase 20%.",
            "{name} registered 8M new shares for sale. Float expanding significantly.",
        ],
        price_impact: (0.60, 0.82),
        volume_impact: (5.0, 15.0),
        duration: (30, 80),
        halts: false,
        halt_duration: (0, 0),
        weight: 8,
        sector_bias: &[],
    },
    EventTemplate {
        event_type: MarketEventType::ShortSqueeze,
        titles: &[
            "{ticker} Short Squeeze Developing",
            "Shorts Trapped in {ticker} - Squeeze Alert",
            "{ticker} Borrow Rate Spikes to 300%",
        ],
        descriptions: &[
            "Short interest at {si}% of float. Borrow fees skyrocketing. Forced covering imminent.",
            "No shares available to borrow on {ticker}. Short sellers getting margin called.",
            "Massive buy volume on {ticker} as shorts scramble to cover. Float locked up.",
        ],
        price_impact: (1.25, 2.20),
        volume_impact: (10.0, 25.0),
        duration: (15, 50),
        halts: false,
        halt_duration: (0, 0),
        weight: 6,
        sector_bias: &[Sector::Healthcare, Sector::Technology],
    },
    EventTemplate {
        event_type: MarketEventType::InsiderBuying,
        titles: &[
            "{ticker} CEO Buys $500K in Open Market",
            "Insider Cluster Buying in {ticker}",
        ],
        descriptions: &[
            "{name} CEO purchased 150,000 shares at market price. First insider buy in 2 years.",
            "Three insiders at {name} bought shares this week. Total insider purchases: $1.2M.",
        ],
        price_impact: (1.08, 1.25),
        volume_impact: (2.0, 5.0),
        duration: (30, 60),
        halts: false,
        halt_duration: (0, 0),
        weight: 5,
        sector_bias: &[],
    },
    EventTemplate {
        event_type: MarketEventType::FdaApproval,
        titles: &[
            "{ticker} Receives FDA Fast Track Designation",
            "FDA Approves {ticker} Lead Candidate",
        ],
        descriptions: &[
            "{name} granted Fast Track for its lead compound. Phase 3 trial expected next quarter.",
            "FDA approval for {name}'s flagship drug. Addressable market estimated at $2B.",
        ],
        price_impact: (1.30, 2.50),
        volume_impact: (10.0, 30.0),
        duration: (20, 60),
        halts: false,
        halt_duration: (0, 0),
        weight: 4,
        sector_bias: &[Sector::Healthcare],
    },
    EventTemplate {
        event_type: MarketEventType::ContractWin,
        titles: &[
            "{ticker} Awarded $50M Government Contract",
            "{ticker} Lands Major Partnership Deal",
        ],
        descriptions: &[
            "{name} won a multi-year government contract worth $50M. Revenue visibility greatly improved.",
            "Strategic partnership announced between {name} and a Fortune 500 company.",
        ],
        price_impact: (1.12, 1.45),
        volume_impact: (3.0, 8.0),
        duration: (20, 50),
        halts: false,
        halt_duration: (0, 0),
        weight: 6,
        sector_bias: &[Sector::Technology, Sector::Energy],
    },
    EventTemplate {
        event_type: MarketEventType::OfferingAnnounced,
        titles: &[
            "{ticker} Announces Warrant Exercise",
            "{ticker} Converts Preferred Shares",
        ],
        descriptions: &[
            "Warrants exercised at $0.50 on {ticker}. 5M new shares entering the float.",
            "{name} converting preferred shares to common. Float expected to increase 25%.",
        ],
        price_impact: (0.70, 0.88),
        volume_impact: (4.0, 10.0),
        duration: (20, 50),
        halts: false,
        halt_duration: (0, 0),
        weight: 6,
        sector_bias: &[],
    },
    EventTemplate {
        event_type: MarketEventType::RedditMomentum,
        titles: &[
            "{ticker} Trending on Social Media",
            "{ticker} Going Viral - Retail Pile-In",
        ],
        descriptions: &[
            "{ticker} mentions up 500% on social media. Retail traders piling in.",
            "{name} trending #1 on stock forums. \"Diamond hands\" sentiment dominant.",
        ],
        price_impact: (1.10, 1.80),
        volume_impact: (8.0, 20.0),
        duration: (10, 40),
        halts: false,
        halt_duration: (0, 0),
        weight: 7,
        sector_bias: &[],
    },
];

/// The full template catalog.
pub fn templates() -> &'static [EventTemplate] {
    TEMPLATES
}

/// Roll for at most one event this tick.
///
/// Returns `None` when the base probability gate misses or when no stock is
/// eligible (all halted or cooling down).
pub fn maybe_generate(
    stocks: &[Stock],
    tick: u64,
    last_event_ticks: &HashMap<StockId, u64>,
    id_gen: &mut IdGen,
    now: DateTime<Utc>,
    rng: &mut impl Rng,
) -> Option<MarketEvent> {
    if rng.gen::<f64>() > BASE_EVENT_PROBABILITY {
        return None;
    }

    let template = pick_weighted_template(rng);

    // Eligible targets: not halted, outside the cooldown window, and
    // (usually) matching the template's sector bias
    let eligible: Vec<&Stock> = stocks
        .iter()
        .filter(|stock| {
            if stock.halted {
                return false;
            }
            if let Some(&last) = last_event_ticks.get(&stock.id) {
                if tick.saturating_sub(last) < PER_STOCK_COOLDOWN {
                    return false;
                }
            }
            if !template.sector_bias.is_empty()
                && rng.gen::<f64>() < SECTOR_BIAS_PROBABILITY
                && !template.sector_bias.contains(&stock.sector)
            {
                return false;
            }
            true
        })
        .collect();

    if eligible.is_empty() {
        return None;
    }

    let stock = eligible[rng.gen_range(0..eligible.len())];

    let (min_impact, max_impact) = template.price_impact;
    let price_impact = min_impact + rng.gen::<f64>() * (max_impact - min_impact);

    let (min_vol, max_vol) = template.volume_impact;
    let volume_impact = min_vol + rng.gen::<f64>() * (max_vol - min_vol);

    let (min_dur, max_dur) = template.duration;
    let duration = min_dur + (rng.gen::<f64>() * (max_dur - min_dur) as f64).floor() as u64;

    let si = format!("{:.0}", stock.float.short_interest_ratio() * 100.0);
    let title = substitute(pick(template.titles, rng), stock, &si);
    let description = substitute(pick(template.descriptions, rng), stock, &si);

    Some(MarketEvent {
        id: id_gen.event_id(),
        event_type: template.event_type,
        title,
        description,
        affected_stock_ids: vec![stock.id],
        price_impact,
        volume_impact,
        duration,
        tick,
        timestamp: now,
    })
}

/// Sample a halt length for a halting catalyst; 0 for everything else.
pub fn halt_duration(event_type: MarketEventType, rng: &mut impl Rng) -> u64 {
    let Some(template) = template_for(event_type) else {
        return 0;
    };
    if !template.halts {
        return 0;
    }
    let (min, max) = template.halt_duration;
    min + (rng.gen::<f64>() * (max - min) as f64).floor() as u64
}

/// Whether a catalyst category forces a trading halt.
pub fn is_halt_type(event_type: MarketEventType) -> bool {
    template_for(event_type).map(|t| t.halts).unwrap_or(false)
}

fn template_for(event_type: MarketEventType) -> Option<&'static EventTemplate> {
    TEMPLATES.iter().find(|t| t.event_type == event_type)
}

fn pick_weighted_template(rng: &mut impl Rng) -> &'static EventTemplate {
    let total_weight: u32 = TEMPLATES.iter().map(|t| t.weight).sum();
    let mut roll = rng.gen::<f64>() * total_weight as f64;
    for template in TEMPLATES {
        roll -= template.weight as f64;
        if roll <= 0.0 {
            return template;
        }
    }
    &TEMPLATES[0]
}

fn pick<'a>(options: &'a [&'a str], rng: &mut impl Rng) -> &'a str {
    options[rng.gen_range(0..options.len())]
}

fn substitute(text: &str, stock: &Stock, si: &str) -> String {
    text.replace("{ticker}", &stock.ticker)
        .replace("{name}", &stock.name)
        .replace("{si}", si)
}
