//! Background tasks that talk to the backend and report to the dashboard.

use crate::api::types::{AlertCheck, GlobalMetrics, Listing, Quote};
use crate::api::ApiClient;
use crate::engine::alerts::{AlertRule, NewAlert};
use log::{debug, info, warn};
use std::time::Duration;
use tokio::sync::mpsc::Sender;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

/// Results flowing back to the dashboard. Errors are already turned into the
/// message shown to the user.
#[derive(Debug, Clone)]
pub enum Update {
    Global(Result<GlobalMetrics, String>),
    Listings(Result<Vec<Listing>, String>),
    AlertCheck(Result<AlertCheck, String>),
    Rules(Result<Vec<AlertRule>, String>),
    RuleCreated(Result<AlertRule, String>),
    RuleDeleted { id: String, result: Result<(), String> },
    Quote { symbol: String, result: Result<Option<Quote>, String> },
}

fn flatten<T>(result: crate::error::Result<T>) -> Result<T, String> {
    result.map_err(|e| e.to_string())
}

/// Loads listings now and then every `every` until the dashboard goes away.
pub async fn poll_listings(client: ApiClient, limit: usize, every: Duration, tx: Sender<Update>) {
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        let result = client.listings(limit).await;
        match &result {
            Ok(listings) => debug!("Listings refreshed: {} coins", listings.len()),
            Err(e) => warn!("Listings refresh failed: {}", e),
        }
        if tx.send(Update::Listings(flatten(result))).await.is_err() {
            info!("Dashboard closed, stopping listings poller");
            break;
        }
    }
}

/// Runs the backend alert check now and then every `every`.
pub async fn poll_alert_check(client: ApiClient, every: Duration, tx: Sender<Update>) {
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        let result = client.check_alerts().await;
        match &result {
            Ok(check) => debug!(
                "Alert check: {} of {} rules triggered",
                check.triggered.len(),
                check.checked
            ),
            Err(e) => warn!("Alert check failed: {}", e),
        }
        if tx.send(Update::AlertCheck(flatten(result))).await.is_err() {
            info!("Dashboard closed, stopping alert poller");
            break;
        }
    }
}

pub fn fetch_global(client: ApiClient, tx: Sender<Update>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let result = client.global_metrics().await;
        if let Err(e) = &result {
            warn!("Global metrics failed: {}", e);
        }
        let _ = tx.send(Update::Global(flatten(result))).await;
    })
}

pub fn fetch_rules(client: ApiClient, tx: Sender<Update>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let result = client.alerts().await;
        let _ = tx.send(Update::Rules(flatten(result))).await;
    })
}

pub fn check_now(client: ApiClient, tx: Sender<Update>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let result = client.check_alerts().await;
        let _ = tx.send(Update::AlertCheck(flatten(result))).await;
    })
}

pub fn refresh_listings(client: ApiClient, limit: usize, tx: Sender<Update>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let result = client.listings(limit).await;
        let _ = tx.send(Update::Listings(flatten(result))).await;
    })
}

pub fn create_rule(client: ApiClient, alert: NewAlert, tx: Sender<Update>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let result = client.create_alert(&alert).await;
        let _ = tx.send(Update::RuleCreated(flatten(result))).await;
    })
}

pub fn delete_rule(client: ApiClient, id: String, tx: Sender<Update>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let result = client.delete_alert(&id).await;
        let _ = tx
            .send(Update::RuleDeleted {
                id,
                result: flatten(result),
            })
            .await;
    })
}

pub fn lookup_quote(client: ApiClient, symbol: String, tx: Sender<Update>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let result = client
            .quotes(&[symbol.clone()])
            .await
            .map(|quotes| quotes.into_iter().next());
        let _ = tx
            .send(Update::Quote {
                symbol,
                result: flatten(result),
            })
            .await;
    })
}
