use super::types::{
    AlertCheck, GlobalMetrics, Health, Listing, ListingsResponse, Quote, QuotesResponse,
    ServerInfo,
};
use crate::config::Config;
use crate::engine::alerts::{normalize_rules, AlertRule, NewAlert, RawAlertRule};
use crate::error::{Result, StonksError};
use log::{debug, info};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

/// Client for the EasyStonks backend.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    client: Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.api_base.clone(), config.request_timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, format!("{}{}", self.base_url, path))
    }

    /// Sends the request and reads the body, turning non-2xx answers into
    /// `StonksError::Api` with the backend's message.
    async fn send(&self, builder: RequestBuilder) -> Result<Value> {
        let response = builder.send().await?;
        let status = response.status();
        let url = response.url().path().to_string();
        let text = response.text().await?;

        let body = serde_json::from_str::<Value>(&text).ok();
        if !status.is_success() {
            let message = error_message(status.as_u16(), body.as_ref(), &text);
            debug!("{} failed with {}: {}", url, status, message);
            return Err(StonksError::Api {
                status: status.as_u16(),
                message,
            });
        }

        match body {
            Some(value) => Ok(value),
            None if text.trim().is_empty() => Ok(Value::Null),
            None => Err(StonksError::Api {
                status: status.as_u16(),
                message: format!("Unexpected non-JSON response from {}", url),
            }),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let value = self.send(builder).await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn health(&self) -> Result<Health> {
        self.get_json(self.request(Method::GET, "/api/health")).await
    }

    pub async fn info(&self) -> Result<ServerInfo> {
        self.get_json(self.request(Method::GET, "/api/info")).await
    }

    pub async fn global_metrics(&self) -> Result<GlobalMetrics> {
        self.get_json(self.request(Method::GET, "/api/global")).await
    }

    pub async fn listings(&self, limit: usize) -> Result<Vec<Listing>> {
        let response: ListingsResponse = self
            .get_json(
                self.request(Method::GET, "/api/listings")
                    .query(&[("limit", limit)]),
            )
            .await?;
        let listings = response.data.unwrap_or_default();
        debug!("Loaded {} listings", listings.len());
        Ok(listings)
    }

    pub async fn quotes(&self, symbols: &[String]) -> Result<Vec<Quote>> {
        let symbols = clean_symbols(symbols);
        if symbols.is_empty() {
            return Err(StonksError::InvalidInput("symbols is required".into()));
        }
        let response: QuotesResponse = self
            .get_json(
                self.request(Method::GET, "/api/quotes")
                    .query(&[("symbols", symbols.join(","))]),
            )
            .await?;
        Ok(response.data)
    }

    pub async fn alerts(&self) -> Result<Vec<AlertRule>> {
        let raw: Vec<RawAlertRule> = self.get_json(self.request(Method::GET, "/api/alerts")).await?;
        Ok(normalize_rules(raw))
    }

    pub async fn create_alert(&self, alert: &NewAlert) -> Result<AlertRule> {
        let payload = alert.validate()?;
        let raw: RawAlertRule = self
            .get_json(self.request(Method::POST, "/api/alerts").json(&payload))
            .await?;
        let rule = raw.normalize().ok_or_else(|| StonksError::Api {
            status: 200,
            message: "Backend returned an unreadable alert".into(),
        })?;
        info!(
            "Created alert {} ({} {} {})",
            rule.id,
            rule.symbol,
            rule.op.symbol(),
            rule.value
        );
        Ok(rule)
    }

    pub async fn delete_alert(&self, id: &str) -> Result<()> {
        let path = format!("/api/alerts/{}", id);
        self.send(self.request(Method::DELETE, &path)).await?;
        info!("Deleted alert {}", id);
        Ok(())
    }

    pub async fn check_alerts(&self) -> Result<AlertCheck> {
        self.get_json(self.request(Method::GET, "/api/alerts/check")).await
    }
}

/// Picks the message shown to the user for a failed request: the backend's
/// `detail`, else the raw body, else a generic line with the status.
fn error_message(status: u16, body: Option<&Value>, raw: &str) -> String {
    match body.and_then(|b| b.get("detail")) {
        Some(Value::String(detail)) if !detail.is_empty() => return detail.clone(),
        Some(Value::String(_)) | Some(Value::Null) | None => {}
        Some(other) => return other.to_string(),
    }
    if body.is_none() && !raw.trim().is_empty() {
        return raw.trim().to_string();
    }
    format!("Request failed ({})", status)
}

fn clean_symbols(symbols: &[String]) -> Vec<String> {
    symbols
        .iter()
        .flat_map(|s| s.split(','))
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn error_message_prefers_detail() {
        let body = json!({"detail": "Alert not found"});
        assert_eq!(error_message(404, Some(&body), ""), "Alert not found");
    }

    #[test]
    fn error_message_serializes_structured_detail() {
        let body = json!({"detail": [{"loc": ["body", "value"], "msg": "field required"}]});
        let message = error_message(422, Some(&body), "");
        assert!(message.contains("field required"));
    }

    #[test]
    fn error_message_falls_back_to_raw_then_status() {
        assert_eq!(error_message(502, None, "Bad Gateway"), "Bad Gateway");
        assert_eq!(error_message(500, Some(&json!({})), "{}"), "Request failed (500)");
        assert_eq!(error_message(503, None, "   "), "Request failed (503)");
    }

    #[test]
    fn empty_detail_counts_as_missing() {
        let body = json!({"detail": ""});
        assert_eq!(
            error_message(400, Some(&body), r#"{"detail":""}"#),
            "Request failed (400)"
        );
    }

    #[test]
    fn symbols_are_cleaned() {
        let cleaned = clean_symbols(&["btc, eth".into(), " ".into(), "sol".into()]);
        assert_eq!(cleaned, vec!["BTC", "ETH", "SOL"]);
    }
}
