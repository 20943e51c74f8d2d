//! Dashboard state and rendering
//!
//! Drives the dashboard through `apply` and `handle_key_input` the way the
//! event loop does, and renders into a `TestBackend`.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use easystonks::api::types::{AlertCheck, GlobalMetrics, Listing, Quote};
use easystonks::api::ApiClient;
use easystonks::config::Config;
use easystonks::engine::alerts::{AlertKind, AlertOp, AlertRule, TriggeredAlert};
use easystonks::engine::notice::{LocalStore, Notice};
use easystonks::engine::sound::{SoundPlayer, Tone};
use easystonks::feed::Update;
use easystonks::ui::{Dashboard, DashboardView, InputMode};
use easystonks::{Result, StonksError};
use ratatui::backend::TestBackend;
use ratatui::Terminal;
use serde_json::json;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tokio::sync::mpsc::{self, Receiver};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Default)]
struct Recorder {
    locked: AtomicBool,
    played: Mutex<Vec<u32>>,
}

impl SoundPlayer for Recorder {
    fn unlock(&self) -> Result<()> {
        if self.locked.load(Ordering::SeqCst) {
            Err(StonksError::Io(io::Error::new(io::ErrorKind::Unsupported, "no audio")))
        } else {
            Ok(())
        }
    }

    fn play(&self, tone: &Tone) {
        self.played.lock().unwrap().push(tone.freq_hz);
    }
}

struct Harness {
    dashboard: Dashboard,
    player: Arc<Recorder>,
    rx: Receiver<Update>,
    _dir: TempDir,
}

fn harness(base_url: &str, sound: bool) -> Harness {
    let dir = TempDir::new().unwrap();
    let config = Config {
        api_base: base_url.to_string(),
        sound,
        state_file: dir.path().join("state.json"),
        ..Config::default()
    };
    let client = ApiClient::new(base_url, Duration::from_secs(5)).unwrap();
    let (tx, rx) = mpsc::channel(16);
    let player = Arc::new(Recorder::default());
    let notice = Notice::load(LocalStore::new(config.state_file.clone()));
    let dashboard = Dashboard::new(&config, client, tx, player.clone(), notice);
    Harness {
        dashboard,
        player,
        rx,
        _dir: dir,
    }
}

fn price_alert(id: &str) -> TriggeredAlert {
    TriggeredAlert {
        time: "12:01".to_string(),
        symbol: "ETH".to_string(),
        kind: AlertKind::Price,
        message: "ETH below 2500".to_string(),
        current: Some(2400.0),
        op: Some(AlertOp::Below),
        value: Some(2500.0),
        id: Some(id.to_string()),
    }
}

fn check(alerts: Vec<TriggeredAlert>) -> Update {
    Update::AlertCheck(Ok(AlertCheck {
        checked: alerts.len(),
        triggered: alerts,
        currency: Some("USD".to_string()),
    }))
}

fn rule(id: &str) -> AlertRule {
    AlertRule {
        id: id.to_string(),
        symbol: "ETH".to_string(),
        kind: AlertKind::Price,
        op: AlertOp::Below,
        value: 2500.0,
    }
}

fn listing(symbol: &str, change: f64) -> Listing {
    serde_json::from_value(json!({
        "symbol": symbol,
        "quote": {"USD": {"percent_change_24h": change, "volume_24h": 1.0e9, "market_cap": 1.0e10}}
    }))
    .unwrap()
}

fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

fn render(dashboard: &Dashboard) -> Vec<String> {
    let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
    terminal.draw(|f| dashboard.draw(f)).unwrap();
    let buffer = terminal.backend().buffer().clone();
    let width = buffer.area.width as usize;
    buffer
        .content
        .chunks(width)
        .map(|row| row.iter().map(|c| c.symbol.as_str()).collect())
        .collect()
}

fn screen_contains(lines: &[String], needle: &str) -> bool {
    lines.iter().any(|line| line.contains(needle))
}

#[tokio::test(start_paused = true)]
async fn test_new_alerts_toast_flash_and_play_once() {
    let h = harness("http://127.0.0.1:9", true);
    let now = Instant::now();

    h.dashboard.apply(check(vec![price_alert("a1")]), now);
    {
        let state = h.dashboard.state.lock().unwrap();
        assert_eq!(state.triggered.len(), 1);
        assert_eq!(state.toasts.len(), 1);
        assert!(state.flashes.is_flashing("a1", now));
        assert!(!state.needs_audio_unlock);
    }

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(*h.player.played.lock().unwrap(), vec![680, 520]);

    // Same alert inside the cooldown: listed, but not announced again.
    h.dashboard.apply(check(vec![price_alert("a1")]), now + Duration::from_secs(60));
    tokio::time::sleep(Duration::from_secs(1)).await;
    let state = h.dashboard.state.lock().unwrap();
    assert_eq!(state.triggered.len(), 1);
    assert_eq!(state.toasts.len(), 1);
    assert_eq!(h.player.played.lock().unwrap().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_alerts_renotify_after_cooldown() {
    let h = harness("http://127.0.0.1:9", false);
    let now = Instant::now();

    h.dashboard.apply(check(vec![price_alert("a1")]), now);
    h.dashboard.apply(check(vec![price_alert("a1")]), now + Duration::from_secs(120));
    assert_eq!(h.dashboard.state.lock().unwrap().toasts.len(), 1);

    h.dashboard.apply(check(vec![price_alert("a1")]), now + Duration::from_secs(121));
    assert_eq!(h.dashboard.state.lock().unwrap().toasts.len(), 2);

    // muted dashboards still toast but stay silent
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(h.player.played.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_locked_audio_asks_for_unlock() {
    let h = harness("http://127.0.0.1:9", true);
    h.player.locked.store(true, Ordering::SeqCst);

    h.dashboard.apply(check(vec![price_alert("a1")]), Instant::now());
    let state = h.dashboard.state.lock().unwrap();
    assert!(state.needs_audio_unlock);
    assert_eq!(state.toasts.len(), 1);
}

#[tokio::test]
async fn test_failed_check_clears_triggered() {
    let h = harness("http://127.0.0.1:9", false);
    let now = Instant::now();
    h.dashboard.apply(check(vec![price_alert("a1")]), now);
    h.dashboard
        .apply(Update::AlertCheck(Err("Request failed (500)".to_string())), now);

    let state = h.dashboard.state.lock().unwrap();
    assert!(state.triggered.is_empty());
    assert_eq!(state.alerts_error.as_deref(), Some("Request failed (500)"));
}

#[tokio::test]
async fn test_listings_build_rankings() {
    let h = harness("http://127.0.0.1:9", false);
    h.dashboard.apply(
        Update::Listings(Ok(vec![listing("CALM", 0.5), listing("MOON", 12.0)])),
        Instant::now(),
    );

    let state = h.dashboard.state.lock().unwrap();
    assert_eq!(state.rankings[0].symbol, "MOON");
    assert_eq!(state.rankings[0].reason, "Strong momentum");
    assert!(state.listings_error.is_none());
    assert!(state.listings_updated.is_some());
}

#[tokio::test]
async fn test_created_rule_is_prepended_and_rechecked() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/alerts/check"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "triggered": [], "checked": 2, "currency": "USD"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut h = harness(&server.uri(), false);
    h.dashboard.apply(Update::Rules(Ok(vec![rule("old")])), Instant::now());
    h.dashboard
        .apply(Update::RuleCreated(Ok(rule("new"))), Instant::now());

    {
        let state = h.dashboard.state.lock().unwrap();
        assert_eq!(state.rules[0].id, "new");
        assert_eq!(state.rules.len(), 2);
        assert!(!state.busy);
    }

    let update = tokio::time::timeout(Duration::from_secs(5), h.rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(update, Update::AlertCheck(Ok(ref c)) if c.checked == 2));
}

#[tokio::test]
async fn test_deleted_rule_is_removed_and_forgotten() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/alerts/check"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"triggered": [], "checked": 0})))
        .mount(&server)
        .await;

    let h = harness(&server.uri(), false);
    let now = Instant::now();
    h.dashboard
        .apply(Update::Rules(Ok(vec![rule("a1"), rule("a2")])), now);
    h.dashboard.apply(check(vec![price_alert("a1")]), now);
    h.dashboard.apply(
        Update::RuleDeleted {
            id: "a1".to_string(),
            result: Ok(()),
        },
        now,
    );

    let state = h.dashboard.state.lock().unwrap();
    assert_eq!(state.rules.len(), 1);
    assert_eq!(state.rules[0].id, "a2");
    assert_eq!(state.monitor.tracked(), 0);
}

#[tokio::test]
async fn test_failed_delete_keeps_rule() {
    let h = harness("http://127.0.0.1:9", false);
    h.dashboard.apply(Update::Rules(Ok(vec![rule("a1")])), Instant::now());
    h.dashboard.apply(
        Update::RuleDeleted {
            id: "a1".to_string(),
            result: Err("Alert not found".to_string()),
        },
        Instant::now(),
    );

    let state = h.dashboard.state.lock().unwrap();
    assert_eq!(state.rules.len(), 1);
    assert_eq!(state.rules_error.as_deref(), Some("Alert not found"));
}

#[tokio::test]
async fn test_missing_quote_reports_symbol() {
    let h = harness("http://127.0.0.1:9", false);
    h.dashboard.apply(
        Update::Quote {
            symbol: "NOPE".to_string(),
            result: Ok(None),
        },
        Instant::now(),
    );
    let state = h.dashboard.state.lock().unwrap();
    assert!(state.quote.is_none());
    assert_eq!(state.quote_error.as_deref(), Some("No quote found for NOPE"));
}

#[tokio::test]
async fn test_keys_switch_views_and_quit() {
    let h = harness("http://127.0.0.1:9", true);

    h.dashboard.handle_key_input(key(KeyCode::Char('t')));
    assert_eq!(h.dashboard.state.lock().unwrap().view, DashboardView::Triggered);

    h.dashboard.handle_key_input(key(KeyCode::Char('m')));
    assert!(!h.dashboard.state.lock().unwrap().sound_on);

    h.dashboard.handle_key_input(key(KeyCode::Char('s')));
    h.dashboard.handle_key_input(key(KeyCode::Char('e')));
    h.dashboard.handle_key_input(key(KeyCode::Char('t')));
    h.dashboard.handle_key_input(key(KeyCode::Char('h')));
    {
        let state = h.dashboard.state.lock().unwrap();
        assert_eq!(state.input, InputMode::Quote);
        assert_eq!(state.quote_input, "ETH");
    }

    h.dashboard.handle_key_input(key(KeyCode::Esc));
    h.dashboard.handle_key_input(key(KeyCode::Char('q')));
    assert!(!h.dashboard.is_running());
}

#[tokio::test]
async fn test_form_submission_creates_rule() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/alerts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "r1", "symbol": "BTC", "type": "pct24", "op": ">", "value": 5.0
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut h = harness(&server.uri(), false);
    h.dashboard.handle_key_input(key(KeyCode::Char('a')));
    h.dashboard.handle_key_input(key(KeyCode::Char('n')));
    h.dashboard.handle_key_input(key(KeyCode::Enter));
    assert!(h.dashboard.state.lock().unwrap().busy);

    // a second Enter while the request is in flight is ignored
    h.dashboard.handle_key_input(key(KeyCode::Enter));

    let update = tokio::time::timeout(Duration::from_secs(5), h.rx.recv())
        .await
        .unwrap()
        .unwrap();
    match &update {
        Update::RuleCreated(Ok(rule)) => assert_eq!(rule.id, "r1"),
        other => panic!("unexpected update: {:?}", other),
    }
}

#[tokio::test]
async fn test_invalid_form_shows_error() {
    let h = harness("http://127.0.0.1:9", false);
    h.dashboard.handle_key_input(key(KeyCode::Char('a')));
    h.dashboard.handle_key_input(key(KeyCode::Char('n')));
    for _ in 0..3 {
        h.dashboard.handle_key_input(key(KeyCode::Backspace));
    }
    h.dashboard.handle_key_input(key(KeyCode::Enter));

    let state = h.dashboard.state.lock().unwrap();
    assert!(!state.busy);
    assert_eq!(state.rules_error.as_deref(), Some("symbol is required"));
}

#[tokio::test]
async fn test_render_header_notice_and_rankings() {
    let h = harness("http://127.0.0.1:9", false);
    let lines = render(&h.dashboard);
    assert!(screen_contains(&lines, "EASYSTONKS"));
    assert!(screen_contains(&lines, "Sounds: Off"));
    assert!(screen_contains(&lines, "Loading global metrics"));
    assert!(screen_contains(&lines, "Loading listings"));
    assert!(screen_contains(&lines, "free-tier cloud"));

    h.dashboard.apply(
        Update::Global(Ok(GlobalMetrics {
            btc_dominance: Some(52.4),
            ..GlobalMetrics::default()
        })),
        Instant::now(),
    );
    h.dashboard
        .apply(Update::Listings(Ok(vec![listing("MOON", 12.0)])), Instant::now());
    h.dashboard.handle_key_input(key(KeyCode::Char('g')));

    let lines = render(&h.dashboard);
    assert!(screen_contains(&lines, "52.40%"));
    assert!(screen_contains(&lines, "MOON"));
    assert!(screen_contains(&lines, "Strong momentum"));
    assert!(!screen_contains(&lines, "free-tier cloud"));
}

#[tokio::test]
async fn test_render_toast_and_errors() {
    let h = harness("http://127.0.0.1:9", false);
    h.dashboard.apply(check(vec![price_alert("a1")]), Instant::now());
    h.dashboard
        .apply(Update::Listings(Err("Bad Gateway".to_string())), Instant::now());

    let lines = render(&h.dashboard);
    assert!(screen_contains(&lines, "Alert triggered"));
    assert!(screen_contains(&lines, "ETH • Price below 2500.00 (now 2400.00)"));
    assert!(screen_contains(&lines, "Listings error: Bad Gateway"));
}

#[tokio::test]
async fn test_render_quote_view() {
    let h = harness("http://127.0.0.1:9", false);
    h.dashboard.handle_key_input(key(KeyCode::Char('s')));
    h.dashboard.apply(
        Update::Quote {
            symbol: "BTC".to_string(),
            result: Ok(Some(Quote {
                symbol: "BTC".to_string(),
                name: Some("Bitcoin".to_string()),
                price: Some(64000.0),
                percent_change_24h: Some(-1.5),
                ..Quote::default()
            })),
        },
        Instant::now(),
    );

    let lines = render(&h.dashboard);
    assert!(screen_contains(&lines, "Quote Lookup"));
    assert!(screen_contains(&lines, "Bitcoin (BTC)"));
    assert!(screen_contains(&lines, "Price: $64,000.00"));
    assert!(screen_contains(&lines, "-1.50%"));
}
