// =============================================================================
// LIBMPV ENGINE
// =============================================================================
//
// One libmpv handle per stream. The video instance renders straight into the
// native window through `wid`; the audio instance runs with video disabled.
// Only built with the `mpv` feature.
//
// =============================================================================

use libmpv2::Mpv;

use crate::core::engine::{clamp_rate, EngineState, MediaRole, PlaybackEngine, RenderSurface};
use crate::core::media::Media;

/// mpv takes seek targets as seconds in a string argument.
pub fn seek_argument(ms: i64) -> String {
    format!("{:.3}", ms.max(0) as f64 / 1000.0)
}

pub struct MpvEngine {
    role: MediaRole,
    mpv: Mpv,
    media: Option<Media>,
    stopped: bool,
    failed: bool,
    rate: f64,
}

impl MpvEngine {
    pub fn new(role: MediaRole) -> anyhow::Result<Self> {
        let mpv = Mpv::new().map_err(|e| anyhow::anyhow!("Failed to create mpv instance: {}", e))?;

        mpv.set_property("keep-open", "yes").ok(); // report eof instead of unloading
        mpv.set_property("idle", "yes").ok();
        mpv.set_property("pause", true).ok();
        match role {
            MediaRole::Video => {
                mpv.set_property("aid", "no").ok();
            }
            MediaRole::Audio => {
                mpv.set_property("vid", "no").ok();
                mpv.set_property("vo", "null").ok();
            }
        }

        log::debug!("Created mpv {} engine", role);
        Ok(Self {
            role,
            mpv,
            media: None,
            stopped: true,
            failed: false,
            rate: 1.0,
        })
    }

    fn command(&mut self, name: &str, args: &[&str]) -> bool {
        match self.mpv.command(name, args) {
            Ok(()) => true,
            Err(e) => {
                log::error!("mpv {} engine: {} failed: {}", self.role, name, e);
                self.failed = true;
                false
            }
        }
    }

    fn set_paused(&mut self, paused: bool) {
        if let Err(e) = self.mpv.set_property("pause", paused) {
            log::warn!("mpv {} engine: could not set pause={}: {}", self.role, paused, e);
        }
    }
}

impl PlaybackEngine for MpvEngine {
    fn open(&mut self, media: &Media) -> anyhow::Result<()> {
        if media.path.to_str().is_none() {
            return Err(anyhow::anyhow!("path is not valid UTF-8: {}", media.path.display()));
        }
        self.media = Some(media.clone());
        self.stopped = true;
        self.failed = false;
        log::info!("mpv {} engine opened {}", self.role, media.path.display());
        Ok(())
    }

    fn bind_surface(&mut self, surface: &RenderSurface) {
        if self.role != MediaRole::Video {
            return;
        }
        if let Err(e) = self.mpv.set_property("wid", surface.as_raw_id()) {
            log::warn!("mpv could not bind to window {:?}: {}", surface, e);
        }
    }

    fn play(&mut self) {
        match self.state() {
            EngineState::Stopped => {
                let Some(path) = self
                    .media
                    .as_ref()
                    .and_then(|m| m.path.to_str())
                    .map(str::to_string)
                else {
                    return;
                };
                if self.command("loadfile", &[path.as_str(), "replace"]) {
                    self.stopped = false;
                    self.set_paused(false);
                }
            }
            EngineState::Paused => self.set_paused(false),
            _ => {}
        }
    }

    fn pause(&mut self) {
        if self.state() == EngineState::Playing {
            self.set_paused(true);
        }
    }

    fn stop(&mut self) {
        if self.media.is_none() {
            return;
        }
        self.command("stop", &[]);
        self.set_paused(true);
        self.stopped = true;
        // Leave Error behind; the next loadfile reports a fault that persists
        self.failed = false;
    }

    fn time(&self) -> i64 {
        if self.media.is_none() {
            return -1;
        }
        if self.stopped {
            return 0;
        }
        self.mpv
            .get_property::<f64>("time-pos")
            .map(|secs| (secs * 1000.0).round() as i64)
            .unwrap_or(0)
    }

    fn set_time(&mut self, ms: i64) {
        if !matches!(self.state(), EngineState::Playing | EngineState::Paused) {
            return;
        }
        let target = seek_argument(ms);
        self.command("seek", &[target.as_str(), "absolute"]);
    }

    fn rate(&self) -> f64 {
        self.rate
    }

    fn set_rate(&mut self, rate: f64) {
        let Some(rate) = clamp_rate(rate) else {
            log::warn!("mpv {} engine ignored invalid rate {}", self.role, rate);
            return;
        };
        match self.mpv.set_property("speed", rate) {
            Ok(()) => self.rate = rate,
            Err(e) => log::warn!("mpv {} engine could not set speed {}: {}", self.role, rate, e),
        }
    }

    fn state(&self) -> EngineState {
        if self.media.is_none() {
            return EngineState::Idle;
        }
        if self.failed {
            return EngineState::Error;
        }
        if self.stopped {
            return EngineState::Stopped;
        }
        if self.mpv.get_property::<bool>("eof-reached").unwrap_or(false) {
            return EngineState::Ended;
        }
        if self.mpv.get_property::<bool>("pause").unwrap_or(false) {
            EngineState::Paused
        } else {
            EngineState::Playing
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seek_argument() {
        assert_eq!(seek_argument(5000), "5.000");
        assert_eq!(seek_argument(1234), "1.234");
        assert_eq!(seek_argument(-20), "0.000");
    }

    #[test]
    fn test_stop_recovers_from_error() {
        let mut engine = MpvEngine::new(MediaRole::Audio).unwrap();
        engine.open(&Media::new("/clips/track.ogg")).unwrap();
        assert_eq!(engine.state(), EngineState::Stopped);

        engine.failed = true;
        assert_eq!(engine.state(), EngineState::Error);
        engine.play();
        assert_eq!(engine.state(), EngineState::Error);

        engine.stop();

        assert_eq!(engine.state(), EngineState::Stopped);
        assert_eq!(engine.time(), 0);
    }
}
