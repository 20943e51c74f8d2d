//! Headless commands against a mock backend

use easystonks::api::ApiClient;
use easystonks::commands::{run, AlertsCommand, Command};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn output(server: &MockServer, command: Command) -> String {
    let client = ApiClient::new(server.uri(), Duration::from_secs(5)).unwrap();
    let mut out = Vec::new();
    run(command, &client, 50, &mut out).await.unwrap();
    String::from_utf8(out).unwrap()
}

async fn mount_health_and_info(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true, "currency_default": "USD", "has_cmc_key": true
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_info_prints_global_metrics() {
    let server = MockServer::start().await;
    mount_health_and_info(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/global"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "btc_dominance": 52.4, "eth_dominance": 17.1
        })))
        .mount(&server)
        .await;

    let text = output(&server, Command::Info).await;
    assert!(text.contains("Healthy:      true"));
    assert!(text.contains("Market data:  configured"));
    assert!(text.contains("BTC dom 52.40%  ETH dom 17.10%"));
}

#[tokio::test]
async fn test_info_reports_global_metrics_error() {
    let server = MockServer::start().await;
    mount_health_and_info(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/global"))
        .respond_with(ResponseTemplate::new(502).set_body_json(json!({"detail": "CMC unavailable"})))
        .mount(&server)
        .await;

    let text = output(&server, Command::Info).await;
    assert!(text.contains("Currency:     USD"));
    assert!(text.contains("Global metrics: CMC unavailable"));
}

#[tokio::test]
async fn test_rankings_print_top_rows() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/listings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"symbol": "CALM", "quote": {"USD": {"percent_change_24h": 0.2}}},
                {"symbol": "MOON", "quote": {"USD": {"percent_change_24h": 14.0}}}
            ]
        })))
        .mount(&server)
        .await;

    let text = output(&server, Command::Rankings { top: 1 }).await;
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[1].starts_with("MOON"));
    assert!(lines[1].ends_with("Strong momentum"));
}

#[tokio::test]
async fn test_alerts_check_prints_summary() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/alerts/check"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"triggered": [], "checked": 4})))
        .mount(&server)
        .await;

    let text = output(&server, Command::Alerts(AlertsCommand::Check)).await;
    assert_eq!(text.trim(), "Checked 4 rule(s), 0 triggered");
}
