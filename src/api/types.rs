use crate::engine::alerts::TriggeredAlert;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Health {
    #[serde(default)]
    pub ok: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerInfo {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub currency_default: Option<String>,
    #[serde(default)]
    pub cors_origins: Vec<String>,
    #[serde(default)]
    pub has_cmc_key: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalMetrics {
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub btc_dominance: Option<f64>,
    #[serde(default)]
    pub eth_dominance: Option<f64>,
    #[serde(default)]
    pub total_market_cap: Option<f64>,
    #[serde(default)]
    pub total_volume_24h: Option<f64>,
    #[serde(default)]
    pub last_updated: Option<String>,
}

/// Per-currency figures of a listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingQuote {
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub percent_change_24h: Option<f64>,
    #[serde(default)]
    pub market_cap: Option<f64>,
    #[serde(default)]
    pub volume_24h: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub cmc_rank: Option<u32>,
    #[serde(default)]
    pub quote: HashMap<String, ListingQuote>,
}

impl Listing {
    pub fn quote_in(&self, currency: &str) -> Option<&ListingQuote> {
        self.quote.get(currency)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ListingsResponse {
    #[serde(default)]
    pub data: Option<Vec<Listing>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub percent_change_24h: Option<f64>,
    #[serde(default)]
    pub market_cap: Option<f64>,
    #[serde(default)]
    pub last_updated: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct QuotesResponse {
    #[serde(default)]
    pub data: Vec<Quote>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlertCheck {
    #[serde(default)]
    pub triggered: Vec<TriggeredAlert>,
    #[serde(default)]
    pub checked: usize,
    #[serde(default)]
    pub currency: Option<String>,
}
