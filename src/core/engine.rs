use std::fmt;
use crate::core::media::Media;

/// Slowest rate an engine accepts; lower requests are clamped.
pub const MIN_RATE: f64 = 1.0 / 32.0;
/// Fastest rate an engine accepts; higher requests are clamped.
pub const MAX_RATE: f64 = 32.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineState {
    /// Nothing loaded yet
    #[default]
    Idle,
    Stopped,
    Playing,
    Paused,
    Ended,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaRole {
    Video,
    Audio,
}

impl fmt::Display for MediaRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaRole::Video => write!(f, "video"),
            MediaRole::Audio => write!(f, "audio"),
        }
    }
}

/// Native drawable the video engine can render into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderSurface {
    /// X11 window id
    XWindow(u64),
    /// Win32 HWND
    Hwnd(isize),
    /// AppKit NSView pointer
    NsView(usize),
}

impl RenderSurface {
    pub fn as_raw_id(&self) -> i64 {
        match *self {
            RenderSurface::XWindow(id) => id as i64,
            RenderSurface::Hwnd(hwnd) => hwnd as i64,
            RenderSurface::NsView(view) => view as i64,
        }
    }
}

/// One opaque media player: decode, render and transport for a single stream.
///
/// Transport calls never fail. Backends absorb their own errors and report
/// them through [`EngineState::Error`].
pub trait PlaybackEngine {
    /// Bind media. Only the loader calls this, once, before playback starts.
    fn open(&mut self, media: &Media) -> anyhow::Result<()>;

    fn bind_surface(&mut self, surface: &RenderSurface);

    fn play(&mut self);
    fn pause(&mut self);
    fn stop(&mut self);

    /// Current position in milliseconds.
    fn time(&self) -> i64;
    /// Absolute seek in milliseconds; out of range targets are clamped.
    fn set_time(&mut self, ms: i64);

    fn rate(&self) -> f64;
    fn set_rate(&mut self, rate: f64);

    fn state(&self) -> EngineState;
}

/// Bring a requested rate into the range engines accept.
/// Returns `None` for values no engine should act on.
pub fn clamp_rate(rate: f64) -> Option<f64> {
    if rate.is_finite() && rate > 0.0 {
        Some(rate.clamp(MIN_RATE, MAX_RATE))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_rate() {
        assert_eq!(clamp_rate(1.0), Some(1.0));
        assert_eq!(clamp_rate(0.25), Some(0.25));
        assert_eq!(clamp_rate(1000.0), Some(MAX_RATE));
        assert_eq!(clamp_rate(1e-9), Some(MIN_RATE));
        assert_eq!(clamp_rate(0.0), None);
        assert_eq!(clamp_rate(-2.0), None);
        assert_eq!(clamp_rate(f64::NAN), None);
        assert_eq!(clamp_rate(f64::INFINITY), None);
    }

    #[test]
    fn test_default_state_is_idle() {
        assert_eq!(EngineState::default(), EngineState::Idle);
    }

    #[test]
    fn test_surface_raw_ids() {
        assert_eq!(RenderSurface::XWindow(0x3a00007).as_raw_id(), 0x3a00007);
        assert_eq!(RenderSurface::Hwnd(4242).as_raw_id(), 4242);
        assert_eq!(RenderSurface::NsView(0x7f00_1000).as_raw_id(), 0x7f00_1000);
    }
}
