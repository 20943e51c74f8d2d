//! Audible alert feedback.
//!
//! Each kind/direction gets its own short two-tone pattern so alerts can be
//! told apart without looking. The terminal player can only ring the bell,
//! but the patterns keep their timing.

use super::alerts::{AlertKind, AlertOp, TriggeredAlert};
use crate::error::{Result, StonksError};
use crossterm::{execute, style::Print};
use log::{debug, warn};
use std::io::{self, IsTerminal};
use std::sync::Arc;
use std::time::Duration;

/// Gap between two tones of one pattern.
pub const TONE_GAP: Duration = Duration::from_millis(120);
/// Gap between the patterns of consecutive alerts.
pub const ALERT_STAGGER: Duration = Duration::from_millis(220);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Triangle,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub freq_hz: u32,
    pub duration_ms: u64,
    pub waveform: Waveform,
    pub gain: f32,
}

const fn tone(freq_hz: u32, duration_ms: u64, waveform: Waveform, gain: f32) -> Tone {
    Tone {
        freq_hz,
        duration_ms,
        waveform,
        gain,
    }
}

pub fn pattern_for(alert: &TriggeredAlert) -> Vec<Tone> {
    use Waveform::*;
    match (alert.kind, alert.op) {
        (AlertKind::Price, Some(AlertOp::Above)) => {
            vec![tone(740, 110, Triangle, 0.12), tone(920, 130, Triangle, 0.12)]
        }
        (AlertKind::Price, Some(AlertOp::Below)) => {
            vec![tone(680, 110, Triangle, 0.12), tone(520, 130, Triangle, 0.12)]
        }
        (AlertKind::Pct24, Some(AlertOp::Above)) => {
            vec![tone(980, 150, Sine, 0.10), tone(1220, 120, Sine, 0.09)]
        }
        (AlertKind::Pct24, Some(AlertOp::Below)) => {
            vec![tone(820, 150, Sine, 0.10), tone(640, 120, Sine, 0.09)]
        }
        _ => vec![tone(880, 160, Sine, 0.10)],
    }
}

pub trait SoundPlayer: Send + Sync {
    /// Prepares the output. Fails when nothing can be played.
    fn unlock(&self) -> Result<()>;
    fn play(&self, tone: &Tone);
}

/// Rings the terminal bell once per tone.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalBell;

impl SoundPlayer for TerminalBell {
    fn unlock(&self) -> Result<()> {
        if io::stdout().is_terminal() {
            Ok(())
        } else {
            Err(StonksError::Io(io::Error::new(
                io::ErrorKind::Unsupported,
                "stdout is not a terminal",
            )))
        }
    }

    fn play(&self, tone: &Tone) {
        debug!("bell {} Hz for {} ms", tone.freq_hz, tone.duration_ms);
        if let Err(e) = execute!(io::stdout(), Print('\x07')) {
            warn!("Failed to ring bell: {}", e);
        }
    }
}

/// Start offset of every tone for a batch of alerts, in play order.
pub fn timeline(alerts: &[TriggeredAlert]) -> Vec<(Duration, Tone)> {
    let mut out = Vec::new();
    for (i, alert) in alerts.iter().enumerate() {
        let start = ALERT_STAGGER * i as u32;
        for (j, tone) in pattern_for(alert).into_iter().enumerate() {
            out.push((start + TONE_GAP * j as u32, tone));
        }
    }
    out.sort_by_key(|(at, _)| *at);
    out
}

/// Plays the patterns for `alerts` on tokio timers, one alert every 220 ms.
pub fn schedule(player: Arc<dyn SoundPlayer>, alerts: &[TriggeredAlert]) -> tokio::task::JoinHandle<()> {
    let plan = timeline(alerts);
    tokio::spawn(async move {
        let started = tokio::time::Instant::now();
        for (at, tone) in plan {
            tokio::time::sleep_until(started + at).await;
            player.play(&tone);
        }
    })
}
