// =============================================================================
// FFMPEG VIDEO ENGINE
// =============================================================================
//
// Decodes the video stream with an ffmpeg child process writing raw RGBA
// frames to stdout. A reader thread paces those frames against the shared
// playback clock and drops anything that arrives late.
//
// - play/pause only start and stop the clock; the stream stays alive and
//   stalls on pipe backpressure while paused
// - seek and stop kill the stream; play or seek start a fresh one
// - frames reach the window through a FrameSlot, never through a channel
//
// =============================================================================

use std::ffi::OsString;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::core::engine::{EngineState, PlaybackEngine, RenderSurface};
use crate::core::media::{Media, VideoGeometry};
use crate::core::clock::PlaybackClock;
use crate::video::frame::{FrameSlot, VideoFrame};

pub const DEFAULT_OUTPUT_SIZE: (u32, u32) = (854, 480);
const DEFAULT_FRAME_RATE: f64 = 30.0;
const MAX_FRAME_RATE: f64 = 60.0;

/// Frames further behind the clock than this many frame periods are dropped.
const LATE_FRAME_PERIODS: f64 = 2.0;

type SharedClock = Arc<Mutex<PlaybackClock>>;

fn lock_clock(clock: &SharedClock) -> MutexGuard<'_, PlaybackClock> {
    clock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Decoded frame size for a source, at most `max_width` wide, aspect kept,
/// both dimensions even.
pub fn output_size(geometry: Option<&VideoGeometry>, max_width: u32) -> (u32, u32) {
    let Some(geometry) = geometry else {
        return DEFAULT_OUTPUT_SIZE;
    };
    if geometry.width == 0 || geometry.height == 0 {
        return DEFAULT_OUTPUT_SIZE;
    }

    let width = geometry.width.min(max_width.max(2));
    let height = (geometry.height as f64 * width as f64 / geometry.width as f64).round() as u32;
    let even = |v: u32| (v & !1).max(2);
    (even(width), even(height))
}

/// Arguments for a raw RGBA stream starting at `start_ms`.
pub fn stream_args(path: &Path, start_ms: i64, size: (u32, u32), frame_rate: f64) -> Vec<OsString> {
    let seek = format!("{:.3}", start_ms.max(0) as f64 / 1000.0);
    let scale = format!("scale={}:{}", size.0, size.1);
    let rate = format!("{:.3}", frame_rate);

    let mut args: Vec<OsString> = vec![
        "-ss".into(),
        seek.into(),
        "-i".into(),
        path.as_os_str().to_os_string(),
    ];
    args.extend(
        [
            "-map", "0:v:0",
            "-an",
            "-vf", scale.as_str(),
            "-r", rate.as_str(),
            "-f", "rawvideo",
            "-pix_fmt", "rgba",
            "-loglevel", "error",
            "-nostdin",
            "pipe:1",
        ]
        .into_iter()
        .map(OsString::from),
    );
    args
}

// =============================================================================
// FRAME STREAM
// =============================================================================

struct FrameStream {
    child: Child,
    stop_flag: Arc<AtomicBool>,
    reader: Option<JoinHandle<()>>,
}

struct ReaderContext {
    size: (u32, u32),
    frame_rate: f64,
    start_ms: i64,
    slot: FrameSlot,
    clock: SharedClock,
    stop_flag: Arc<AtomicBool>,
    finished: Arc<AtomicBool>,
}

impl FrameStream {
    fn spawn(
        ffmpeg: &Path,
        path: &Path,
        start_ms: i64,
        size: (u32, u32),
        frame_rate: f64,
        slot: FrameSlot,
        clock: SharedClock,
        finished: Arc<AtomicBool>,
    ) -> anyhow::Result<Self> {
        let mut child = Command::new(ffmpeg)
            .args(stream_args(path, start_ms, size, frame_rate))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| anyhow::anyhow!("Failed to spawn {}: {}", ffmpeg.display(), e))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow::anyhow!("ffmpeg stdout was not captured"))?;

        let stop_flag = Arc::new(AtomicBool::new(false));
        let context = ReaderContext {
            size,
            frame_rate,
            start_ms,
            slot,
            clock,
            stop_flag: stop_flag.clone(),
            finished,
        };

        let reader = thread::Builder::new()
            .name("ffmpeg-frame-reader".to_string())
            .spawn(move || read_frames(stdout, context))
            .map_err(|e| anyhow::anyhow!("Failed to start frame reader: {}", e))?;

        log::debug!(
            "Started video stream at {}ms ({}x{} @ {:.2} fps)",
            start_ms,
            size.0,
            size.1,
            frame_rate
        );

        Ok(Self {
            child,
            stop_flag,
            reader: Some(reader),
        })
    }

    fn shutdown(&mut self) {
        self.stop_flag.store(true, Ordering::SeqCst);
        let _ = self.child.kill();
        let _ = self.child.wait();
        if let Some(handle) = self.reader.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for FrameStream {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn read_frames(mut stdout: impl Read, context: ReaderContext) {
    let (width, height) = context.size;
    let frame_size = width as usize * height as usize * 4;
    let frame_period_ms = 1000.0 / context.frame_rate;
    let late_after_ms = frame_period_ms * LATE_FRAME_PERIODS;
    let mut buffer = vec![0u8; frame_size];
    let mut frame_index = 0u64;
    let mut dropped = 0u64;

    while !context.stop_flag.load(Ordering::Relaxed) {
        if let Err(e) = stdout.read_exact(&mut buffer) {
            if context.stop_flag.load(Ordering::Relaxed) {
                break;
            }
            if e.kind() != std::io::ErrorKind::UnexpectedEof {
                log::debug!("Video reader error: {}", e);
            }
            context.finished.store(true, Ordering::SeqCst);
            break;
        }

        let pts = context.start_ms + (frame_index as f64 * frame_period_ms).round() as i64;
        frame_index += 1;

        // Hold the frame until the clock reaches it
        loop {
            if context.stop_flag.load(Ordering::Relaxed) {
                return;
            }
            let position = lock_clock(&context.clock).position_at(Instant::now());
            if position >= pts {
                if (position - pts) as f64 > late_after_ms && frame_index > 1 {
                    dropped += 1;
                } else {
                    context.slot.publish(VideoFrame {
                        rgba: buffer.clone(),
                        width,
                        height,
                        pts,
                    });
                }
                break;
            }
            thread::sleep(Duration::from_millis(2));
        }
    }

    log::debug!("Video reader stopped ({} frames read, {} dropped)", frame_index, dropped);
}

// =============================================================================
// ENGINE
// =============================================================================

pub struct FfmpegVideoEngine {
    ffmpeg: PathBuf,
    max_width: u32,
    slot: FrameSlot,
    clock: SharedClock,
    media: Option<Media>,
    size: (u32, u32),
    frame_rate: f64,
    state: EngineState,
    stream: Option<FrameStream>,
    /// Set by the reader when the current stream hit end of file on its own.
    stream_finished: Arc<AtomicBool>,
}

impl FfmpegVideoEngine {
    pub fn new(ffmpeg: impl Into<PathBuf>, max_width: u32, slot: FrameSlot) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            max_width,
            slot,
            clock: Arc::new(Mutex::new(PlaybackClock::new(None))),
            media: None,
            size: DEFAULT_OUTPUT_SIZE,
            frame_rate: DEFAULT_FRAME_RATE,
            state: EngineState::Idle,
            stream: None,
            stream_finished: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn output_size(&self) -> (u32, u32) {
        self.size
    }

    fn drop_stream(&mut self) {
        // Joins the old reader before the flag is reused
        self.stream = None;
        self.stream_finished.store(false, Ordering::SeqCst);
    }

    fn restart_stream(&mut self, start_ms: i64) {
        self.drop_stream();
        let Some(media) = &self.media else {
            return;
        };

        match FrameStream::spawn(
            &self.ffmpeg,
            &media.path,
            start_ms,
            self.size,
            self.frame_rate,
            self.slot.clone(),
            self.clock.clone(),
            self.stream_finished.clone(),
        ) {
            Ok(stream) => self.stream = Some(stream),
            Err(e) => {
                log::error!("Video engine failed: {}", e);
                self.state = EngineState::Error;
                self.slot.clear();
            }
        }
    }

    fn has_ended(&self) -> bool {
        let clock = lock_clock(&self.clock);
        if clock.duration_ms().is_some() {
            return clock.reached_end(Instant::now());
        }
        self.stream_finished.load(Ordering::SeqCst)
    }
}

impl PlaybackEngine for FfmpegVideoEngine {
    fn open(&mut self, media: &Media) -> anyhow::Result<()> {
        self.drop_stream();
        self.size = output_size(media.info.video.as_ref(), self.max_width);
        self.frame_rate = media
            .info
            .video
            .map(|v| v.frame_rate)
            .unwrap_or(DEFAULT_FRAME_RATE)
            .clamp(1.0, MAX_FRAME_RATE);
        *lock_clock(&self.clock) = PlaybackClock::new(media.info.duration_ms);
        self.media = Some(media.clone());
        self.state = EngineState::Stopped;

        log::info!(
            "Video engine opened {} ({}x{} @ {:.2} fps, duration {:?}ms)",
            media.path.display(),
            self.size.0,
            self.size.1,
            self.frame_rate,
            media.info.duration_ms
        );
        Ok(())
    }

    fn bind_surface(&mut self, surface: &RenderSurface) {
        // Frames are presented as an egui texture inside that window
        log::debug!("Video engine presenting into window {:?}", surface);
    }

    fn play(&mut self) {
        match self.state() {
            EngineState::Stopped => {
                let start = lock_clock(&self.clock).position_at(Instant::now());
                self.state = EngineState::Playing;
                self.restart_stream(start);
                if self.state == EngineState::Playing {
                    lock_clock(&self.clock).start(Instant::now());
                }
            }
            EngineState::Paused => {
                if self.stream.is_none() {
                    let start = lock_clock(&self.clock).position_at(Instant::now());
                    self.restart_stream(start);
                }
                if self.state != EngineState::Error {
                    self.state = EngineState::Playing;
                    lock_clock(&self.clock).start(Instant::now());
                }
            }
            _ => {}
        }
    }

    fn pause(&mut self) {
        if self.state() == EngineState::Playing {
            lock_clock(&self.clock).pause(Instant::now());
            self.state = EngineState::Paused;
        }
    }

    fn stop(&mut self) {
        if self.media.is_none() {
            return;
        }
        self.drop_stream();
        lock_clock(&self.clock).stop();
        self.slot.clear();
        // Also leaves Error, so the next play retries the stream
        self.state = EngineState::Stopped;
    }

    fn time(&self) -> i64 {
        if self.media.is_none() {
            return -1;
        }
        lock_clock(&self.clock).position_at(Instant::now())
    }

    fn set_time(&mut self, ms: i64) {
        if !matches!(self.state(), EngineState::Playing | EngineState::Paused) {
            return;
        }
        let target = lock_clock(&self.clock).seek(ms, Instant::now());
        self.restart_stream(target);
    }

    fn rate(&self) -> f64 {
        lock_clock(&self.clock).rate()
    }

    fn set_rate(&mut self, rate: f64) {
        if lock_clock(&self.clock).set_rate(rate, Instant::now()).is_none() {
            log::warn!("Video engine ignored invalid rate {}", rate);
        }
    }

    fn state(&self) -> EngineState {
        if self.state == EngineState::Playing && self.has_ended() {
            return EngineState::Ended;
        }
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::media::MediaInfo;

    fn media_with(geometry: Option<VideoGeometry>, duration_ms: Option<i64>) -> Media {
        Media {
            path: PathBuf::from("/clips/scene.mp4"),
            info: MediaInfo {
                title: None,
                duration_ms,
                video: geometry,
            },
        }
    }

    fn missing_ffmpeg_engine() -> FfmpegVideoEngine {
        FfmpegVideoEngine::new("/nonexistent/bin/ffmpeg", 1280, FrameSlot::new())
    }

    #[test]
    fn test_output_size_keeps_aspect_and_even_dimensions() {
        let hd = VideoGeometry { width: 1920, height: 1080, frame_rate: 25.0 };
        assert_eq!(output_size(Some(&hd), 1280), (1280, 720));

        let small = VideoGeometry { width: 640, height: 360, frame_rate: 25.0 };
        assert_eq!(output_size(Some(&small), 1280), (640, 360));

        let odd = VideoGeometry { width: 1001, height: 563, frame_rate: 25.0 };
        let (w, h) = output_size(Some(&odd), 1280);
        assert_eq!((w % 2, h % 2), (0, 0));

        assert_eq!(output_size(None, 1280), DEFAULT_OUTPUT_SIZE);
    }

    #[test]
    fn test_stream_args() {
        let args = stream_args(Path::new("/clips/scene.mp4"), 2500, (640, 360), 25.0);
        let args: Vec<String> = args.iter().map(|a| a.to_string_lossy().into_owned()).collect();

        assert_eq!(&args[0..4], &["-ss", "2.500", "-i", "/clips/scene.mp4"]);
        assert!(args.windows(2).any(|w| w == ["-vf", "scale=640:360"]));
        assert!(args.windows(2).any(|w| w == ["-pix_fmt", "rgba"]));
        assert_eq!(args.last().map(String::as_str), Some("pipe:1"));
    }

    #[test]
    fn test_idle_engine_reports_negative_time() {
        let engine = missing_ffmpeg_engine();
        assert_eq!(engine.state(), EngineState::Idle);
        assert_eq!(engine.time(), -1);
    }

    #[test]
    fn test_open_sizes_output_and_stops() {
        let mut engine = missing_ffmpeg_engine();
        let geometry = VideoGeometry { width: 3840, height: 2160, frame_rate: 120.0 };

        engine.open(&media_with(Some(geometry), Some(10_000))).unwrap();

        assert_eq!(engine.state(), EngineState::Stopped);
        assert_eq!(engine.output_size(), (1280, 720));
        assert_eq!(engine.time(), 0);
    }

    #[test]
    fn test_seek_ignored_while_stopped() {
        let mut engine = missing_ffmpeg_engine();
        engine.open(&media_with(None, Some(10_000))).unwrap();

        engine.set_time(4000);

        assert_eq!(engine.time(), 0);
        assert_eq!(engine.state(), EngineState::Stopped);
    }

    #[test]
    fn test_missing_ffmpeg_reports_error_on_play() {
        let mut engine = missing_ffmpeg_engine();
        engine.open(&media_with(None, Some(10_000))).unwrap();

        engine.play();

        assert_eq!(engine.state(), EngineState::Error);
        engine.pause();
        assert_eq!(engine.state(), EngineState::Error);
    }

    #[test]
    fn test_stop_recovers_from_error() {
        let mut engine = missing_ffmpeg_engine();
        engine.open(&media_with(None, Some(10_000))).unwrap();
        engine.play();
        assert_eq!(engine.state(), EngineState::Error);

        engine.stop();

        assert_eq!(engine.state(), EngineState::Stopped);
        assert_eq!(engine.time(), 0);

        // ffmpeg is still missing, so the retry fails the same way
        engine.play();
        assert_eq!(engine.state(), EngineState::Error);
    }

    #[test]
    fn test_ended_when_clock_reaches_known_duration() {
        let mut engine = missing_ffmpeg_engine();
        engine.open(&media_with(None, Some(2_000))).unwrap();
        engine.state = EngineState::Playing;

        lock_clock(&engine.clock).seek(1_000, Instant::now());
        assert_eq!(engine.state(), EngineState::Playing);

        lock_clock(&engine.clock).seek(2_000, Instant::now());
        assert_eq!(engine.state(), EngineState::Ended);
    }

    #[test]
    fn test_ended_on_stream_eof_with_unknown_duration() {
        let mut engine = missing_ffmpeg_engine();
        engine.open(&media_with(None, None)).unwrap();
        engine.state = EngineState::Playing;
        lock_clock(&engine.clock).seek(60_000, Instant::now());
        assert_eq!(engine.state(), EngineState::Playing);

        engine.stream_finished.store(true, Ordering::SeqCst);
        assert_eq!(engine.state(), EngineState::Ended);

        engine.stop();
        assert_eq!(engine.state(), EngineState::Stopped);
        assert!(!engine.stream_finished.load(Ordering::SeqCst));
    }

    #[test]
    fn test_paused_engine_never_reports_ended() {
        let mut engine = missing_ffmpeg_engine();
        engine.open(&media_with(None, Some(2_000))).unwrap();
        engine.state = EngineState::Paused;
        lock_clock(&engine.clock).seek(2_000, Instant::now());

        assert_eq!(engine.state(), EngineState::Paused);
    }

    #[test]
    fn test_rate_is_clamped() {
        let mut engine = missing_ffmpeg_engine();
        engine.set_rate(0.001);
        assert_eq!(engine.rate(), crate::core::engine::MIN_RATE);
        engine.set_rate(-1.0);
        assert_eq!(engine.rate(), crate::core::engine::MIN_RATE);
    }

    #[test]
    fn test_reader_publishes_first_frame_immediately() {
        let size = (2u32, 2u32);
        let frame_bytes = vec![7u8; 2 * 2 * 4];
        let slot = FrameSlot::new();
        let clock = Arc::new(Mutex::new(PlaybackClock::new(None)));
        lock_clock(&clock).seek(1000, Instant::now());
        let finished = Arc::new(AtomicBool::new(false));

        read_frames(
            std::io::Cursor::new(frame_bytes.clone()),
            ReaderContext {
                size,
                frame_rate: 25.0,
                start_ms: 1000,
                slot: slot.clone(),
                clock,
                stop_flag: Arc::new(AtomicBool::new(false)),
                finished: finished.clone(),
            },
        );

        assert_eq!(
            slot.poll(),
            crate::video::frame::FrameUpdate::Show(VideoFrame {
                rgba: frame_bytes,
                width: 2,
                height: 2,
                pts: 1000,
            })
        );
        assert!(finished.load(Ordering::SeqCst));
    }
}
