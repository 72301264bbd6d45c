use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::{Duration, Instant};
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};

use crate::audio::device_manager::OutputDeviceManager;
use crate::core::engine::{EngineState, PlaybackEngine, RenderSurface};
use crate::core::media::Media;
use crate::core::clock::PlaybackClock;

fn open_decoder(path: &Path) -> anyhow::Result<Decoder<BufReader<File>>> {
    let file = File::open(path)
        .map_err(|e| anyhow::anyhow!("Failed to open audio file '{}': {}", path.display(), e))?;
    Decoder::new(BufReader::new(file))
        .map_err(|e| anyhow::anyhow!("Failed to decode audio file '{}': {}", path.display(), e))
}

/// Decode the header of `path` and report its length, if the format knows it.
pub fn probe_duration(path: &Path) -> anyhow::Result<Option<i64>> {
    let decoder = open_decoder(path)?;
    Ok(decoder.total_duration().map(|d| d.as_millis() as i64))
}

/// Audio engine on a rodio sink. The clock, not the sink, is the time
/// authority; seeking rebuilds the sink from a fresh decoder.
pub struct RodioAudioEngine {
    device_name: Option<String>,
    output: Option<(OutputStream, OutputStreamHandle)>,
    sink: Option<Sink>,
    media: Option<Media>,
    clock: PlaybackClock,
    state: EngineState,
}

impl RodioAudioEngine {
    pub fn new(device_name: Option<String>) -> Self {
        Self {
            device_name,
            output: None,
            sink: None,
            media: None,
            clock: PlaybackClock::new(None),
            state: EngineState::Idle,
        }
    }

    fn open_output(&self) -> anyhow::Result<(OutputStream, OutputStreamHandle)> {
        let device = OutputDeviceManager::new().resolve(self.device_name.as_deref())?;
        OutputStream::try_from_device(&device)
            .map_err(|e| anyhow::anyhow!("Failed to create output stream: {}", e))
    }

    fn build_sink(&self, start_ms: i64) -> anyhow::Result<Sink> {
        let media = self
            .media
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("no audio media bound"))?;
        let (_, handle) = self
            .output
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("no audio output device"))?;

        let source = open_decoder(&media.path)?
            .skip_duration(Duration::from_millis(start_ms.max(0) as u64));
        let sink = Sink::try_new(handle)
            .map_err(|e| anyhow::anyhow!("Failed to create audio sink: {}", e))?;
        sink.pause();
        sink.set_speed(self.clock.rate() as f32);
        sink.append(source);
        Ok(sink)
    }

    fn fail(&mut self, e: anyhow::Error) {
        log::error!("Audio engine failed: {}", e);
        self.sink = None;
        self.state = EngineState::Error;
    }

    fn has_ended(&self) -> bool {
        let drained = self.sink.as_ref().map(|s| s.empty()).unwrap_or(false);
        drained || self.clock.reached_end(Instant::now())
    }
}

impl PlaybackEngine for RodioAudioEngine {
    fn open(&mut self, media: &Media) -> anyhow::Result<()> {
        let duration_ms = probe_duration(&media.path)?.or(media.info.duration_ms);
        self.sink = None;
        self.clock = PlaybackClock::new(duration_ms);
        self.media = Some(media.clone());

        if self.output.is_none() {
            match self.open_output() {
                Ok(output) => self.output = Some(output),
                Err(e) => {
                    // Playback continues without sound; the video still runs
                    log::error!("No audio output available: {}", e);
                    self.state = EngineState::Error;
                    return Ok(());
                }
            }
        }

        self.state = EngineState::Stopped;
        log::info!(
            "Audio engine opened {} (duration {:?}ms)",
            media.path.display(),
            duration_ms
        );
        Ok(())
    }

    fn bind_surface(&mut self, _surface: &RenderSurface) {}

    fn play(&mut self) {
        match self.state() {
            EngineState::Stopped => {
                let start = self.clock.position_at(Instant::now());
                match self.build_sink(start) {
                    Ok(sink) => {
                        sink.play();
                        self.sink = Some(sink);
                        self.clock.start(Instant::now());
                        self.state = EngineState::Playing;
                    }
                    Err(e) => self.fail(e),
                }
            }
            EngineState::Paused => {
                if let Some(sink) = &self.sink {
                    sink.play();
                }
                self.clock.start(Instant::now());
                self.state = EngineState::Playing;
            }
            _ => {}
        }
    }

    fn pause(&mut self) {
        if self.state() == EngineState::Playing {
            if let Some(sink) = &self.sink {
                sink.pause();
            }
            self.clock.pause(Instant::now());
            self.state = EngineState::Paused;
        }
    }

    fn stop(&mut self) {
        if self.media.is_none() {
            return;
        }
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
        self.clock.stop();
        // Also leaves Error; play reopens the device and decoder
        self.state = EngineState::Stopped;
    }

    fn time(&self) -> i64 {
        if self.media.is_none() {
            return -1;
        }
        self.clock.position_at(Instant::now())
    }

    fn set_time(&mut self, ms: i64) {
        let state = self.state();
        if !matches!(state, EngineState::Playing | EngineState::Paused) {
            return;
        }
        let target = self.clock.seek(ms, Instant::now());
        match self.build_sink(target) {
            Ok(sink) => {
                if state == EngineState::Playing {
                    sink.play();
                }
                if let Some(old) = self.sink.replace(sink) {
                    old.stop();
                }
                log::debug!("Audio engine seeked to {}ms", target);
            }
            Err(e) => self.fail(e),
        }
    }

    fn rate(&self) -> f64 {
        self.clock.rate()
    }

    fn set_rate(&mut self, rate: f64) {
        match self.clock.set_rate(rate, Instant::now()) {
            Some(applied) => {
                if let Some(sink) = &self.sink {
                    sink.set_speed(applied as f32);
                }
            }
            None => log::warn!("Audio engine ignored invalid rate {}", rate),
        }
    }

    fn state(&self) -> EngineState {
        if self.state == EngineState::Playing && self.has_ended() {
            return EngineState::Ended;
        }
        self.state
    }
}
