use std::time::Instant;
use crate::core::engine::clamp_rate;

/// Wall-clock based playback position.
///
/// Position while running is `anchor + elapsed * rate`; every transport
/// change re-anchors so rate changes never jump the position.
#[derive(Debug, Clone)]
pub struct PlaybackClock {
    anchor_ms: f64,
    started_at: Option<Instant>,
    rate: f64,
    duration_ms: Option<i64>,
}

impl PlaybackClock {
    pub fn new(duration_ms: Option<i64>) -> Self {
        Self {
            anchor_ms: 0.0,
            started_at: None,
            rate: 1.0,
            duration_ms: duration_ms.filter(|d| *d > 0),
        }
    }

    pub fn duration_ms(&self) -> Option<i64> {
        self.duration_ms
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn position_at(&self, now: Instant) -> i64 {
        let position = match self.started_at {
            Some(started) => {
                let elapsed = now.saturating_duration_since(started).as_secs_f64() * 1000.0;
                self.anchor_ms + elapsed * self.rate
            }
            None => self.anchor_ms,
        };
        let position = position.max(0.0).round() as i64;
        match self.duration_ms {
            Some(duration) => position.min(duration),
            None => position,
        }
    }

    pub fn start(&mut self, now: Instant) {
        if self.started_at.is_none() {
            self.started_at = Some(now);
        }
    }

    pub fn pause(&mut self, now: Instant) {
        if self.started_at.is_some() {
            self.anchor_ms = self.position_at(now) as f64;
            self.started_at = None;
        }
    }

    pub fn stop(&mut self) {
        self.anchor_ms = 0.0;
        self.started_at = None;
    }

    /// Move to `ms`, clamped to the known duration. Keeps running if it was.
    pub fn seek(&mut self, ms: i64, now: Instant) -> i64 {
        let mut target = ms.max(0);
        if let Some(duration) = self.duration_ms {
            target = target.min(duration);
        }
        self.anchor_ms = target as f64;
        if self.started_at.is_some() {
            self.started_at = Some(now);
        }
        target
    }

    /// Returns the applied rate, or `None` if `rate` was rejected.
    pub fn set_rate(&mut self, rate: f64, now: Instant) -> Option<f64> {
        let rate = clamp_rate(rate)?;
        if self.started_at.is_some() {
            self.anchor_ms = self.position_at(now) as f64;
            self.started_at = Some(now);
        }
        self.rate = rate;
        Some(rate)
    }

    pub fn reached_end(&self, now: Instant) -> bool {
        match self.duration_ms {
            Some(duration) => self.position_at(now) >= duration,
            None => false,
        }
    }
}
