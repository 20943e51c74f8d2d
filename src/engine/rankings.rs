//! Score-based ranking of listed coins.
//!
//! The score mixes momentum (absolute 24h change), liquidity (24h volume)
//! and size (market cap):
//!
//! ```text
//! score = min(round(|change| * 2 + log10(volume + 1) + 0.5 * log10(cap + 1)), 100)
//! ```

use super::alerts::{AlertKind, TriggeredAlert};
use crate::api::types::Listing;
use crate::format::format_value;

pub const RANKING_CURRENCY: &str = "USD";
pub const MAX_SCORE: u32 = 100;
pub const TOP_RANKINGS: usize = 20;
const VOLATILITY_ALERTS: usize = 3;

const HIGH_MOVE_PCT: f64 = 8.0;
const MEDIUM_MOVE_PCT: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Volatility {
    Low,
    Medium,
    High,
}

impl Volatility {
    pub fn from_change(change: f64) -> Self {
        let magnitude = change.abs();
        if magnitude > HIGH_MOVE_PCT {
            Volatility::High
        } else if magnitude > MEDIUM_MOVE_PCT {
            Volatility::Medium
        } else {
            Volatility::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Volatility::Low => "low",
            Volatility::Medium => "medium",
            Volatility::High => "high",
        }
    }

    pub fn reason(&self) -> &'static str {
        match self {
            Volatility::High => "Strong momentum",
            Volatility::Medium => "Breakout watch",
            Volatility::Low => "Stable",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ranking {
    pub symbol: String,
    pub score: u32,
    pub volatility: Volatility,
    pub change_24h: f64,
    pub reason: &'static str,
}

pub fn score(change: f64, volume: f64, market_cap: f64) -> u32 {
    let raw = change.abs() * 2.0 + (volume + 1.0).log10() + (market_cap + 1.0).log10() * 0.5;
    if !raw.is_finite() || raw <= 0.0 {
        return 0;
    }
    // Inputs are non-negative here, so round() is round-half-up.
    (raw.round() as u32).min(MAX_SCORE)
}

/// Missing, negative-volume or non-numeric inputs count as zero.
fn finite_or_zero(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(0.0)
}

pub fn rank_listing(listing: &Listing) -> Ranking {
    let quote = listing.quote_in(RANKING_CURRENCY);
    let change = finite_or_zero(quote.and_then(|q| q.percent_change_24h));
    let market_cap = finite_or_zero(quote.and_then(|q| q.market_cap)).max(0.0);
    let volume = finite_or_zero(quote.and_then(|q| q.volume_24h)).max(0.0);
    let volatility = Volatility::from_change(change);

    Ranking {
        symbol: listing.symbol.clone(),
        score: score(change, volume, market_cap),
        volatility,
        change_24h: change,
        reason: volatility.reason(),
    }
}

/// Scores every listing and sorts by descending score. Ties keep the
/// listing order.
pub fn build_rankings(listings: &[Listing]) -> Vec<Ranking> {
    let mut rankings: Vec<Ranking> = listings.iter().map(rank_listing).collect();
    rankings.sort_by(|a, b| b.score.cmp(&a.score));
    rankings
}

/// Derived alerts for the top high-volatility movers. `time` is `HH:MM`.
pub fn volatility_alerts(rankings: &[Ranking], time: &str) -> Vec<TriggeredAlert> {
    rankings
        .iter()
        .filter(|r| r.volatility == Volatility::High)
        .take(VOLATILITY_ALERTS)
        .map(|r| TriggeredAlert {
            time: time.to_string(),
            symbol: r.symbol.clone(),
            kind: AlertKind::Volatility,
            message: format!(
                "High 24h move — score {}, {}",
                r.score,
                format_value(r.change_24h)
            ),
            current: Some(r.change_24h),
            op: None,
            value: None,
            id: None,
        })
        .collect()
}
