//! One-shot commands that print plain text instead of opening the dashboard.

use crate::api::ApiClient;
use crate::engine::alerts::{AlertKind, AlertOp, NewAlert};
use crate::engine::rankings::{build_rankings, TOP_RANKINGS};
use crate::error::{Result, StonksError};
use crate::format::{format_change, format_opt_usd, format_pct, format_timestamp};
use clap::Subcommand;
use std::io::Write;

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Open the interactive dashboard (default)
    Dashboard,
    /// Print the score rankings once
    Rankings {
        /// How many rows to show
        #[arg(long, default_value_t = TOP_RANKINGS)]
        top: usize,
    },
    /// Look up the latest quote for one or more symbols
    Quote {
        #[arg(required = true)]
        symbols: Vec<String>,
    },
    /// Manage alert rules
    #[command(subcommand)]
    Alerts(AlertsCommand),
    /// Show backend health and configuration
    Info,
}

#[derive(Debug, Clone, Subcommand)]
pub enum AlertsCommand {
    /// List stored rules
    List,
    /// Add a rule, e.g. `alerts add ETH price below 2500`
    Add {
        symbol: String,
        /// pct24 or price
        kind: String,
        /// above, below, > or <
        op: String,
        #[arg(allow_hyphen_values = true)]
        value: f64,
    },
    /// Delete a rule by id
    Delete { id: String },
    /// Run the alert check once
    Check,
}

pub async fn run(command: Command, client: &ApiClient, limit: usize, out: &mut impl Write) -> Result<()> {
    match command {
        Command::Dashboard => Err(StonksError::InvalidInput(
            "the dashboard runs interactively".into(),
        )),
        Command::Rankings { top } => {
            let listings = client.listings(limit).await?;
            let rankings = build_rankings(&listings);
            writeln!(out, "{:<10} {:>5} {:<10} {:>9}  Reason", "Symbol", "Score", "Volatility", "24h")?;
            for r in rankings.iter().take(top) {
                writeln!(
                    out,
                    "{:<10} {:>5} {:<10} {:>9}  {}",
                    r.symbol,
                    r.score,
                    r.volatility.as_str(),
                    format_change(r.change_24h),
                    r.reason
                )?;
            }
            Ok(())
        }
        Command::Quote { symbols } => {
            let quotes = client.quotes(&symbols).await?;
            if quotes.is_empty() {
                writeln!(out, "No quotes found")?;
            }
            for q in quotes {
                writeln!(
                    out,
                    "{} ({})  price {}  24h {}  cap {}",
                    q.name.as_deref().unwrap_or("—"),
                    q.symbol,
                    format_opt_usd(q.price, 2),
                    format_pct(q.percent_change_24h),
                    format_opt_usd(q.market_cap, 0)
                )?;
            }
            Ok(())
        }
        Command::Alerts(AlertsCommand::List) => {
            let rules = client.alerts().await?;
            if rules.is_empty() {
                writeln!(out, "No alert rules yet")?;
            }
            for r in rules {
                writeln!(
                    out,
                    "{:<12} {:<6} {:<6} {:<6} {}",
                    r.id,
                    r.symbol,
                    r.kind.label(),
                    r.op.label(),
                    r.threshold()
                )?;
            }
            Ok(())
        }
        Command::Alerts(AlertsCommand::Add { symbol, kind, op, value }) => {
            let alert = parse_new_alert(&symbol, &kind, &op, value)?;
            let rule = client.create_alert(&alert).await?;
            writeln!(out, "Created {} ({} {} {})", rule.id, rule.symbol, rule.op.label(), rule.threshold())?;
            Ok(())
        }
        Command::Alerts(AlertsCommand::Delete { id }) => {
            client.delete_alert(&id).await?;
            writeln!(out, "Deleted {}", id)?;
            Ok(())
        }
        Command::Alerts(AlertsCommand::Check) => {
            let check = client.check_alerts().await?;
            writeln!(out, "Checked {} rule(s), {} triggered", check.checked, check.triggered.len())?;
            for alert in check.triggered {
                writeln!(out, "{}", alert)?;
            }
            Ok(())
        }
        Command::Info => {
            let health = client.health().await?;
            let info = client.info().await?;
            let global = client.global_metrics().await;
            writeln!(out, "Backend:      {}", client.base_url())?;
            writeln!(out, "Healthy:      {}", health.ok)?;
            writeln!(out, "Currency:     {}", info.currency_default.as_deref().unwrap_or("—"))?;
            writeln!(out, "Market data:  {}", if info.has_cmc_key { "configured" } else { "missing API key" })?;
            match global {
                Ok(g) => writeln!(
                    out,
                    "BTC dom {}  ETH dom {}  cap {}  vol {}  (updated {})",
                    format_pct(g.btc_dominance),
                    format_pct(g.eth_dominance),
                    format_opt_usd(g.total_market_cap, 0),
                    format_opt_usd(g.total_volume_24h, 0),
                    format_timestamp(g.last_updated.as_deref())
                )?,
                Err(e) => writeln!(out, "Global metrics: {}", e)?,
            }
            Ok(())
        }
    }
}

fn parse_new_alert(symbol: &str, kind: &str, op: &str, value: f64) -> Result<NewAlert> {
    let kind = match kind.trim().to_ascii_lowercase().as_str() {
        "pct24" | "pct" | "24h" => AlertKind::Pct24,
        "price" => AlertKind::Price,
        other => {
            return Err(StonksError::InvalidInput(format!(
                "unknown alert type '{}' (use pct24 or price)",
                other
            )))
        }
    };
    let op = AlertOp::parse(op).ok_or_else(|| {
        StonksError::InvalidInput(format!("unknown direction '{}' (use above or below)", op))
    })?;
    NewAlert {
        symbol: symbol.to_string(),
        kind,
        op,
        value,
    }
    .validate()
}
