use crate::core::command::TransportCommand;
use crate::core::engine::{EngineState, PlaybackEngine};

/// Which engines an end-of-stream pass restarted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Recovery {
    pub video: bool,
    pub audio: bool,
}

impl Recovery {
    pub fn any(&self) -> bool {
        self.video || self.audio
    }
}

/// What applying a single command did to the engines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Applied {
    Transport,
    Rate(f64),
    Seek(i64),
    /// Target equals the video position already; nothing was sent
    SeekSkipped(i64),
}

/// Both engines behind one transport. Every operation fans out to the video
/// and the audio engine so a command can never reach only one of them.
pub struct DualEngineTransport {
    video: Box<dyn PlaybackEngine>,
    audio: Box<dyn PlaybackEngine>,
}

impl DualEngineTransport {
    pub(crate) fn new(video: Box<dyn PlaybackEngine>, audio: Box<dyn PlaybackEngine>) -> Self {
        Self { video, audio }
    }

    pub fn play(&mut self) {
        self.video.play();
        self.audio.play();
    }

    pub fn pause(&mut self) {
        self.video.pause();
        self.audio.pause();
    }

    pub fn stop(&mut self) {
        self.video.stop();
        self.audio.stop();
    }

    /// Seek both engines unless the video engine already reports `ms`.
    /// Returns whether a seek was issued.
    pub fn seek(&mut self, ms: i64) -> bool {
        if ms == self.video.time() {
            return false;
        }
        self.video.set_time(ms);
        self.audio.set_time(ms);
        true
    }

    /// Multiply each engine's current rate by `factor`.
    ///
    /// If an engine clamped the result the audio engine follows the video
    /// engine, so both always report the same rate afterwards.
    pub fn scale_rate(&mut self, factor: f64) -> f64 {
        let video_target = self.video.rate() * factor;
        let audio_target = self.audio.rate() * factor;
        self.video.set_rate(video_target);
        self.audio.set_rate(audio_target);

        let video_rate = self.video.rate();
        let audio_rate = self.audio.rate();
        if (video_rate - audio_rate).abs() > f64::EPSILON {
            log::warn!(
                "Engine rates diverged (video {:.4}, audio {:.4}); aligning audio to video",
                video_rate,
                audio_rate
            );
            self.audio.set_rate(video_rate);
        }
        video_rate
    }

    /// Restart any engine that reached end of stream with stop then play.
    /// Each engine is checked on its own; they may loop independently.
    pub fn recover_ended(&mut self) -> Recovery {
        let mut recovery = Recovery::default();
        if self.video.state() == EngineState::Ended {
            self.video.stop();
            self.video.play();
            recovery.video = true;
        }
        if self.audio.state() == EngineState::Ended {
            self.audio.stop();
            self.audio.play();
            recovery.audio = true;
        }
        recovery
    }

    pub fn apply(&mut self, command: TransportCommand) -> Applied {
        match command {
            TransportCommand::SlowDown | TransportCommand::SpeedUp => {
                let factor = command.rate_factor().unwrap_or(1.0);
                Applied::Rate(self.scale_rate(factor))
            }
            TransportCommand::Play => {
                self.play();
                Applied::Transport
            }
            TransportCommand::Pause => {
                self.pause();
                Applied::Transport
            }
            TransportCommand::Stop => {
                self.stop();
                Applied::Transport
            }
            TransportCommand::SeekTo(ms) => {
                if self.seek(ms) {
                    Applied::Seek(ms)
                } else {
                    Applied::SeekSkipped(ms)
                }
            }
        }
    }

    /// Position of the video engine, the reference clock for the pair.
    pub fn time(&self) -> i64 {
        self.video.time()
    }

    pub fn rate(&self) -> f64 {
        self.video.rate()
    }

    pub fn video(&self) -> &dyn PlaybackEngine {
        self.video.as_ref()
    }

    pub fn audio(&self) -> &dyn PlaybackEngine {
        self.audio.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::mock_engine::{EngineCall, MockEngine};

    fn transport_at(time: i64) -> (DualEngineTransport, MockEngine, MockEngine) {
        let video = MockEngine::playing_at(time);
        let audio = MockEngine::playing_at(time);
        let transport = DualEngineTransport::new(video.boxed(), audio.boxed());
        (transport, video, audio)
    }

    #[test]
    fn test_transport_calls_reach_both_engines() {
        let (mut transport, video, audio) = transport_at(0);

        transport.pause();
        transport.play();
        transport.stop();

        let expected = vec![EngineCall::Pause, EngineCall::Play, EngineCall::Stop];
        assert_eq!(video.calls(), expected);
        assert_eq!(audio.calls(), expected);
    }

    #[test]
    fn test_seek_to_current_position_is_skipped() {
        let (mut transport, video, audio) = transport_at(3000);

        assert!(!transport.seek(3000));
        assert!(video.calls().is_empty());
        assert!(audio.calls().is_empty());
    }

    #[test]
    fn test_seek_sends_same_target_to_both() {
        let (mut transport, video, audio) = transport_at(3000);

        assert!(transport.seek(5000));
        assert_eq!(video.calls(), vec![EngineCall::SetTime(5000)]);
        assert_eq!(audio.calls(), vec![EngineCall::SetTime(5000)]);
        assert_eq!(video.time(), 5000);
        assert_eq!(audio.time(), 5000);
    }

    #[test]
    fn test_seek_guard_uses_video_position_only() {
        let (mut transport, video, audio) = transport_at(3000);
        audio.force_time(2900);

        assert!(!transport.seek(3000));
        assert!(audio.calls().is_empty());
        assert_eq!(video.time(), 3000);
    }

    #[test]
    fn test_slow_down_then_speed_up_restores_rate() {
        let (mut transport, video, audio) = transport_at(0);

        transport.apply(TransportCommand::SlowDown);
        assert!((video.rate() - 0.5).abs() < 1e-9);
        assert!((audio.rate() - 0.5).abs() < 1e-9);

        transport.apply(TransportCommand::SpeedUp);
        assert!((video.rate() - 1.0).abs() < 1e-9);
        assert!((audio.rate() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_rates_realigned_when_engines_diverge() {
        let (mut transport, video, audio) = transport_at(0);
        audio.force_rate(4.0);

        let applied = transport.apply(TransportCommand::SpeedUp);

        assert_eq!(applied, Applied::Rate(2.0));
        assert_eq!(video.rate(), 2.0);
        assert_eq!(audio.rate(), 2.0);
    }

    #[test]
    fn test_rate_clamped_by_engines_stays_equal() {
        let (mut transport, video, audio) = transport_at(0);
        for _ in 0..10 {
            transport.apply(TransportCommand::SpeedUp);
        }
        assert_eq!(video.rate(), audio.rate());
        assert_eq!(video.rate(), crate::core::engine::MAX_RATE);
    }

    #[test]
    fn test_recover_only_the_ended_engine() {
        let (mut transport, video, audio) = transport_at(1000);
        audio.force_state(EngineState::Ended);

        let recovery = transport.recover_ended();

        assert_eq!(recovery, Recovery { video: false, audio: true });
        assert!(video.calls().is_empty());
        assert_eq!(audio.calls(), vec![EngineCall::Stop, EngineCall::Play]);
        assert_eq!(audio.state(), EngineState::Playing);
    }

    #[test]
    fn test_recover_both_engines_independently() {
        let (mut transport, video, audio) = transport_at(1000);
        video.force_state(EngineState::Ended);
        audio.force_state(EngineState::Ended);

        let recovery = transport.recover_ended();

        assert!(recovery.video && recovery.audio);
        assert_eq!(video.state(), EngineState::Playing);
        assert_eq!(audio.state(), EngineState::Playing);
    }
}
