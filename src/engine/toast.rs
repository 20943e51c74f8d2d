use super::alerts::{Tone, TriggeredAlert};
use chrono::Local;
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

pub const MAX_TOASTS: usize = 5;
pub const TOAST_TTL: Duration = Duration::from_secs(6);
pub const FLASH_TTL: Duration = Duration::from_millis(2500);

const TOAST_TITLE: &str = "Alert triggered";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastState {
    /// Created but not drawn yet.
    Pushed,
    Visible,
    Expired,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub id: u64,
    pub tone: Tone,
    pub title: &'static str,
    pub text: String,
    /// Wall-clock `HH:MM:SS` at creation.
    pub time: String,
    created: Instant,
    shown: bool,
}

impl Toast {
    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.created) >= TOAST_TTL
    }
}

/// Newest-first stack of alert toasts.
#[derive(Debug, Default)]
pub struct ToastStack {
    toasts: VecDeque<Toast>,
    next_id: u64,
}

impl ToastStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, alert: &TriggeredAlert, now: Instant) -> u64 {
        self.next_id += 1;
        let id = self.next_id;
        self.toasts.push_front(Toast {
            id,
            tone: alert.tone(),
            title: TOAST_TITLE,
            text: alert.describe(),
            time: Local::now().format("%H:%M:%S").to_string(),
            created: now,
            shown: false,
        });
        self.toasts.truncate(MAX_TOASTS);
        id
    }

    pub fn prune(&mut self, now: Instant) {
        self.toasts.retain(|t| !t.is_expired(now));
    }

    /// Toasts to draw this frame. Marks them visible.
    pub fn visible(&mut self, now: Instant) -> Vec<Toast> {
        self.prune(now);
        for toast in self.toasts.iter_mut() {
            toast.shown = true;
        }
        self.toasts.iter().cloned().collect()
    }

    pub fn state(&self, id: u64, now: Instant) -> ToastState {
        match self.toasts.iter().find(|t| t.id == id) {
            Some(t) if t.is_expired(now) => ToastState::Expired,
            Some(t) if t.shown => ToastState::Visible,
            Some(_) => ToastState::Pushed,
            None => ToastState::Expired,
        }
    }

    pub fn len(&self) -> usize {
        self.toasts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }
}

/// Rows briefly highlighted after their alert fired, keyed by stable id.
#[derive(Debug, Default)]
pub struct FlashSet {
    until: HashMap<String, Instant>,
}

impl FlashSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn flash(&mut self, id: impl Into<String>, now: Instant) {
        self.until.insert(id.into(), now + FLASH_TTL);
    }

    pub fn is_flashing(&self, id: &str, now: Instant) -> bool {
        self.until.get(id).map_or(false, |until| now < *until)
    }

    pub fn prune(&mut self, now: Instant) {
        self.until.retain(|_, until| now < *until);
    }

    pub fn len(&self) -> usize {
        self.until.len()
    }

    pub fn is_empty(&self) -> bool {
        self.until.is_empty()
    }
}
