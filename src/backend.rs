use crate::audio::RodioAudioEngine;
use crate::core::{AppConfig, EngineBackend, PlaybackEngine};
use crate::video::{FfmpegVideoEngine, FrameSlot};

pub type EnginePair = (Box<dyn PlaybackEngine>, Box<dyn PlaybackEngine>);

/// Video and audio engines for the configured backend. Frames from the
/// ffmpeg backend are published into `frames`.
pub fn build_engines(config: &AppConfig, frames: FrameSlot) -> anyhow::Result<EnginePair> {
    match config.backend {
        EngineBackend::Ffmpeg => Ok(ffmpeg_pair(config, frames)),
        EngineBackend::Mpv => mpv_pair(config, frames),
    }
}

fn ffmpeg_pair(config: &AppConfig, frames: FrameSlot) -> EnginePair {
    log::info!("Using ffmpeg video and rodio audio engines");
    let video = FfmpegVideoEngine::new(config.ffmpeg_command(), config.max_video_width, frames);
    let audio = RodioAudioEngine::new(config.audio_output_device.clone());
    (Box::new(video), Box::new(audio))
}

#[cfg(feature = "mpv")]
fn mpv_pair(_config: &AppConfig, _frames: FrameSlot) -> anyhow::Result<EnginePair> {
    use crate::core::MediaRole;
    use crate::video::MpvEngine;

    log::info!("Using libmpv engines");
    let video = MpvEngine::new(MediaRole::Video)?;
    let audio = MpvEngine::new(MediaRole::Audio)?;
    Ok((Box::new(video), Box::new(audio)))
}

#[cfg(not(feature = "mpv"))]
fn mpv_pair(config: &AppConfig, frames: FrameSlot) -> anyhow::Result<EnginePair> {
    log::warn!("Built without the mpv feature, falling back to the ffmpeg backend");
    Ok(ffmpeg_pair(config, frames))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::EngineState;

    #[test]
    fn test_ffmpeg_backend_starts_idle() {
        let config = AppConfig::default();
        let (video, audio) = build_engines(&config, FrameSlot::new()).unwrap();

        assert_eq!(video.state(), EngineState::Idle);
        assert_eq!(audio.state(), EngineState::Idle);
        assert_eq!(video.rate(), 1.0);
    }

    #[cfg(not(feature = "mpv"))]
    #[test]
    fn test_mpv_request_falls_back_without_feature() {
        let mut config = AppConfig::default();
        config.backend = EngineBackend::Mpv;
        let (video, _audio) = build_engines(&config, FrameSlot::new()).unwrap();
        assert_eq!(video.time(), -1);
    }
}
