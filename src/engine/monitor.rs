use super::alerts::TriggeredAlert;
use log::debug;
use std::collections::HashMap;
use std::time::{Duration, Instant};

pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(2 * 60);

/// Decides which triggered alerts are new enough to notify about. An alert
/// keeps triggering on every check while its condition holds; this only lets
/// it through once per cooldown window.
#[derive(Debug, Clone)]
pub struct AlertMonitor {
    cooldown: Duration,
    last_notified: HashMap<String, Instant>,
}

impl AlertMonitor {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_notified: HashMap::new(),
        }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Returns the alerts that should notify now, in input order, and marks
    /// them as notified at `now`. Entries whose window has passed are dropped.
    pub fn admit(&mut self, triggered: &[TriggeredAlert], now: Instant) -> Vec<TriggeredAlert> {
        let cooldown = self.cooldown;
        self.last_notified
            .retain(|_, last| now.saturating_duration_since(*last) <= cooldown);

        let mut admitted = Vec::new();
        for alert in triggered {
            let id = alert.stable_id();
            let due = match self.last_notified.get(&id) {
                Some(last) => now.saturating_duration_since(*last) > self.cooldown,
                None => true,
            };
            if due {
                self.last_notified.insert(id, now);
                admitted.push(alert.clone());
            } else {
                debug!("Alert {} still cooling down", id);
            }
        }
        admitted
    }

    /// Drops the cooldown entry for a rule, e.g. after it was deleted.
    pub fn forget(&mut self, id: &str) {
        self.last_notified.remove(id);
    }

    pub fn tracked(&self) -> usize {
        self.last_notified.len()
    }
}

impl Default for AlertMonitor {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::alerts::{AlertKind, AlertOp};

    fn alert(id: Option<&str>, symbol: &str) -> TriggeredAlert {
        TriggeredAlert {
            time: "10:00".into(),
            symbol: symbol.into(),
            kind: AlertKind::Price,
            message: String::new(),
            current: Some(10.0),
            op: Some(AlertOp::Above),
            value: Some(5.0),
            id: id.map(String::from),
        }
    }

    #[test]
    fn first_sighting_is_admitted() {
        let mut monitor = AlertMonitor::default();
        let now = Instant::now();
        let admitted = monitor.admit(&[alert(Some("a"), "BTC"), alert(Some("b"), "ETH")], now);
        assert_eq!(admitted.len(), 2);
        assert_eq!(monitor.tracked(), 2);
    }

    #[test]
    fn repeats_are_suppressed_within_cooldown() {
        let mut monitor = AlertMonitor::new(Duration::from_secs(120));
        let start = Instant::now();
        let batch = [alert(Some("a"), "BTC")];

        assert_eq!(monitor.admit(&batch, start).len(), 1);
        assert!(monitor.admit(&batch, start + Duration::from_secs(60)).is_empty());
        // exactly at the boundary is still cooling down
        assert!(monitor.admit(&batch, start + Duration::from_secs(120)).is_empty());
        assert_eq!(
            monitor
                .admit(&batch, start + Duration::from_secs(120) + Duration::from_millis(1))
                .len(),
            1
        );
    }

    #[test]
    fn suppressed_checks_do_not_extend_the_window() {
        let mut monitor = AlertMonitor::new(Duration::from_secs(120));
        let start = Instant::now();
        let batch = [alert(Some("a"), "BTC")];

        monitor.admit(&batch, start);
        monitor.admit(&batch, start + Duration::from_secs(60));
        assert_eq!(monitor.admit(&batch, start + Duration::from_secs(121)).len(), 1);
    }

    #[test]
    fn duplicates_in_one_batch_notify_once() {
        let mut monitor = AlertMonitor::default();
        let admitted = monitor.admit(&[alert(None, "BTC"), alert(None, "BTC")], Instant::now());
        assert_eq!(admitted.len(), 1);
    }

    #[test]
    fn id_less_alerts_use_rule_content() {
        let mut monitor = AlertMonitor::default();
        let now = Instant::now();
        monitor.admit(&[alert(None, "BTC")], now);
        let admitted = monitor.admit(&[alert(None, "BTC"), alert(None, "ETH")], now);
        assert_eq!(admitted.len(), 1);
        assert_eq!(admitted[0].symbol, "ETH");
    }

    #[test]
    fn expired_entries_are_pruned() {
        let mut monitor = AlertMonitor::new(Duration::from_secs(120));
        let start = Instant::now();
        monitor.admit(&[alert(None, "BTC"), alert(None, "ETH")], start);
        assert_eq!(monitor.tracked(), 2);

        // still inside the window: kept
        monitor.admit(&[], start + Duration::from_secs(120));
        assert_eq!(monitor.tracked(), 2);

        monitor.admit(&[alert(None, "SOL")], start + Duration::from_secs(121));
        assert_eq!(monitor.tracked(), 1);
    }

    #[test]
    fn forget_allows_immediate_renotify() {
        let mut monitor = AlertMonitor::default();
        let now = Instant::now();
        let batch = [alert(Some("a"), "BTC")];
        monitor.admit(&batch, now);
        monitor.forget("a");
        assert_eq!(monitor.admit(&batch, now).len(), 1);
    }
}
