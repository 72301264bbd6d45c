use std::path::{Path, PathBuf};
use crate::core::engine::{MediaRole, PlaybackEngine, RenderSurface};
use crate::core::media::{Media, MetadataParser};
use crate::core::transport::DualEngineTransport;

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("media selection was cancelled")]
    UserCancelled,

    #[error("{role} file not found: {}", .path.display())]
    NotFound { role: MediaRole, path: PathBuf },

    #[error("{role} engine could not open {}: {reason}", .path.display())]
    Engine {
        role: MediaRole,
        path: PathBuf,
        reason: String,
    },
}

/// Source of file paths, normally a native open dialog.
pub trait FileSelector {
    /// `None` means the user dismissed the selection.
    fn pick(&mut self, role: MediaRole, start_dir: Option<&Path>) -> Option<PathBuf>;
}

/// The window the session plays in, as far as loading is concerned.
pub trait PlayerWindow {
    fn set_title(&mut self, title: &str);
    /// Native surface for the video engine, if the platform exposes one.
    fn render_surface(&self) -> Option<RenderSurface>;
}

/// Paths chosen for one open operation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaSelection {
    pub video: Option<PathBuf>,
    pub audio: Option<PathBuf>,
}

impl MediaSelection {
    pub fn new(video: Option<PathBuf>, audio: Option<PathBuf>) -> Self {
        Self { video, audio }
    }

    /// Fill in missing paths through `selector`, video first.
    ///
    /// The audio selection is never offered once the video selection has
    /// been dismissed. Empty paths count as dismissed.
    pub fn prompt(
        selector: &mut dyn FileSelector,
        video: Option<PathBuf>,
        audio: Option<PathBuf>,
        video_dir: Option<&Path>,
        audio_dir: Option<&Path>,
    ) -> Self {
        let video = video.or_else(|| selector.pick(MediaRole::Video, video_dir));
        let video = video.filter(|p| !p.as_os_str().is_empty());
        if video.is_none() {
            return Self::default();
        }

        let audio = audio.or_else(|| selector.pick(MediaRole::Audio, audio_dir));
        let audio = audio.filter(|p| !p.as_os_str().is_empty());
        Self { video, audio }
    }

    fn into_paths(self) -> Result<(PathBuf, PathBuf), LoadError> {
        match (self.video, self.audio) {
            (Some(video), Some(audio)) => Ok((video, audio)),
            _ => Err(LoadError::UserCancelled),
        }
    }
}

/// Both engines with media bound and playback started. The only way to
/// obtain one is a successful [`MediaLoader::load`], so a session can never
/// see a half-loaded pair.
pub struct LoadedMedia {
    pub(crate) transport: DualEngineTransport,
    pub video: Media,
    pub audio: Media,
    pub title: String,
}

pub struct MediaLoader<'a> {
    parser: &'a dyn MetadataParser,
}

impl<'a> MediaLoader<'a> {
    pub fn new(parser: &'a dyn MetadataParser) -> Self {
        Self { parser }
    }

    /// One-shot open of the video and audio pair.
    ///
    /// Nothing touches either engine until both paths are known and exist.
    pub fn load(
        &self,
        selection: MediaSelection,
        mut video: Box<dyn PlaybackEngine>,
        mut audio: Box<dyn PlaybackEngine>,
        window: &mut dyn PlayerWindow,
    ) -> Result<LoadedMedia, LoadError> {
        let (video_path, audio_path) = selection.into_paths()?;

        for (role, path) in [(MediaRole::Video, &video_path), (MediaRole::Audio, &audio_path)] {
            if !path.exists() {
                return Err(LoadError::NotFound {
                    role,
                    path: path.clone(),
                });
            }
        }

        let mut video_media = Media::new(video_path);
        let audio_media = Media::new(audio_path);

        if let Err(e) = video_media.parse(self.parser) {
            log::warn!(
                "Could not parse metadata for {}: {}",
                video_media.path.display(),
                e
            );
        }

        open_engine(video.as_mut(), MediaRole::Video, &video_media)?;
        open_engine(audio.as_mut(), MediaRole::Audio, &audio_media)?;

        let title = video_media.display_title();
        window.set_title(&title);

        match window.render_surface() {
            Some(surface) => {
                log::info!("Binding video output to {:?}", surface);
                video.bind_surface(&surface);
            }
            None => log::warn!("No native render surface available on this platform"),
        }

        video.play();
        audio.play();
        log::info!(
            "Loaded \"{}\" (video {}, audio {})",
            title,
            video_media.path.display(),
            audio_media.path.display()
        );

        Ok(LoadedMedia {
            transport: DualEngineTransport::new(video, audio),
            video: video_media,
            audio: audio_media,
            title,
        })
    }
}

fn open_engine(
    engine: &mut dyn PlaybackEngine,
    role: MediaRole,
    media: &Media,
) -> Result<(), LoadError> {
    engine.open(media).map_err(|e| {
        log::error!("Failed to open {} {}: {}", role, media.path.display(), e);
        LoadError::Engine {
            role,
            path: media.path.clone(),
            reason: e.to_string(),
        }
    })
}
