use crate::error::{Result, StonksError};
use crate::format::{format_usd, format_value};
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

pub const MAX_SYMBOL_LEN: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertKind {
    #[serde(rename = "pct24")]
    Pct24,
    #[serde(rename = "price")]
    Price,
    /// Derived from the rankings, never stored on the backend.
    #[serde(rename = "volatility")]
    Volatility,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::Pct24 => "pct24",
            AlertKind::Price => "price",
            AlertKind::Volatility => "volatility",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AlertKind::Pct24 => "24h %",
            AlertKind::Price => "Price",
            AlertKind::Volatility => "Volatility",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "pct24" => Some(AlertKind::Pct24),
            "price" => Some(AlertKind::Price),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertOp {
    #[serde(rename = ">")]
    Above,
    #[serde(rename = "<")]
    Below,
}

impl AlertOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            AlertOp::Above => ">",
            AlertOp::Below => "<",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AlertOp::Above => "Above",
            AlertOp::Below => "Below",
        }
    }

    /// Accepts `>`/`<` as well as the words used on the command line.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            ">" | "above" => Some(AlertOp::Above),
            "<" | "below" => Some(AlertOp::Below),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Green,
    Red,
    Blue,
}

/// An alert rule as stored on the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRule {
    pub id: String,
    pub symbol: String,
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub op: AlertOp,
    pub value: f64,
}

impl AlertRule {
    pub fn tone(&self) -> Tone {
        match self.op {
            AlertOp::Above => Tone::Green,
            AlertOp::Below => Tone::Red,
        }
    }

    pub fn threshold(&self) -> String {
        format_threshold(self.kind, self.value)
    }
}

pub fn format_threshold(kind: AlertKind, value: f64) -> String {
    if !value.is_finite() {
        return format_value(value);
    }
    match kind {
        AlertKind::Price => format_usd(value, 2),
        _ => format!("{:.2}%", value),
    }
}

/// Stored rule before normalisation. Older rules used `type: "price_above"`
/// with no `op`, and values sometimes arrive as strings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawAlertRule {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub op: Option<String>,
    #[serde(default)]
    pub value: Option<Value>,
}

impl RawAlertRule {
    pub fn normalize(self) -> Option<AlertRule> {
        let symbol = self.symbol.as_deref().unwrap_or("").trim().to_uppercase();
        if symbol.is_empty() {
            return None;
        }

        let mut kind = self.kind.clone().unwrap_or_default();
        let mut op = self.op.clone();
        if op.is_none() {
            if let Some((base, direction)) = kind.rsplit_once('_') {
                if AlertKind::parse(base).is_some() && matches!(direction, "above" | "below") {
                    op = Some(direction.to_string());
                    kind = base.to_string();
                }
            }
        }

        let kind = AlertKind::parse(&kind)?;
        let op = match op.as_deref() {
            Some(">") => AlertOp::Above,
            Some("<") => AlertOp::Below,
            Some("above") => AlertOp::Above,
            Some("below") => AlertOp::Below,
            _ => return None,
        };
        let value = match self.value? {
            Value::Number(n) => n.as_f64()?,
            Value::String(s) => s.trim().parse::<f64>().ok()?,
            _ => return None,
        };

        let id = match self.id {
            Some(Value::String(s)) => s,
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };

        Some(AlertRule {
            id,
            symbol,
            kind,
            op,
            value,
        })
    }
}

/// Normalises a batch of stored rules, skipping the ones that can't be read.
pub fn normalize_rules(raw: Vec<RawAlertRule>) -> Vec<AlertRule> {
    raw.into_iter()
        .filter_map(|r| {
            let shown = format!("{:?}", r);
            let rule = r.normalize();
            if rule.is_none() {
                warn!("Skipping unreadable alert rule: {}", shown);
            }
            rule
        })
        .collect()
}

/// Alert creation form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewAlert {
    pub symbol: String,
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub op: AlertOp,
    pub value: f64,
}

impl Default for NewAlert {
    fn default() -> Self {
        Self {
            symbol: "BTC".to_string(),
            kind: AlertKind::Pct24,
            op: AlertOp::Above,
            value: 5.0,
        }
    }
}

impl NewAlert {
    /// Returns the payload actually sent to the backend.
    pub fn validate(&self) -> Result<NewAlert> {
        let symbol = self.symbol.trim().to_uppercase();
        if symbol.is_empty() {
            return Err(StonksError::InvalidInput("symbol is required".into()));
        }
        if symbol.chars().count() > MAX_SYMBOL_LEN {
            return Err(StonksError::InvalidInput(format!(
                "symbol must be at most {} characters",
                MAX_SYMBOL_LEN
            )));
        }
        if self.kind == AlertKind::Volatility {
            return Err(StonksError::InvalidInput(
                "alert type must be pct24 or price".into(),
            ));
        }
        if !self.value.is_finite() {
            return Err(StonksError::InvalidInput("threshold must be a number".into()));
        }
        Ok(NewAlert {
            symbol,
            kind: self.kind,
            op: self.op,
            value: self.value,
        })
    }
}

/// One entry of the backend alert check, or a locally derived volatility alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggeredAlert {
    #[serde(default)]
    pub time: String,
    pub symbol: String,
    #[serde(rename = "type")]
    pub kind: AlertKind,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub current: Option<f64>,
    #[serde(default)]
    pub op: Option<AlertOp>,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub id: Option<String>,
}

impl TriggeredAlert {
    /// Identity used for cooldowns and row highlighting. Falls back to the
    /// rule's content when the backend sent no id.
    pub fn stable_id(&self) -> String {
        match self.id.as_deref() {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => format!(
                "{}-{}-{}-{}",
                self.symbol,
                self.kind.as_str(),
                self.op.map(|o| o.symbol()).unwrap_or(""),
                self.value.map(|v| v.to_string()).unwrap_or_default()
            ),
        }
    }

    pub fn tone(&self) -> Tone {
        match self.op {
            Some(AlertOp::Above) => Tone::Green,
            Some(AlertOp::Below) => Tone::Red,
            None => Tone::Blue,
        }
    }

    /// Human readable reason, as shown in toasts.
    pub fn describe(&self) -> String {
        let symbol = if self.symbol.is_empty() { "—" } else { &self.symbol };
        let direction = self.op.map(|o| o.label().to_lowercase()).unwrap_or_default();
        let threshold = fixed2(self.value);
        let current = fixed2(self.current);

        match self.kind {
            AlertKind::Price => format!(
                "{} • Price {} {} (now {})",
                symbol, direction, threshold, current
            ),
            AlertKind::Pct24 => format!(
                "{} • 24h % {} {}% (now {}%)",
                symbol, direction, threshold, current
            ),
            AlertKind::Volatility => format!("{} • {}", symbol, self.message),
        }
    }
}

impl fmt::Display for TriggeredAlert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:<6} {:<10} {}",
            self.time,
            self.symbol,
            self.kind.label(),
            self.message
        )
    }
}

fn fixed2(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:.2}", v),
        Some(v) => format_value(v),
        None => "—".to_string(),
    }
}
