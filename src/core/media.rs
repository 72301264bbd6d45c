use std::path::{Path, PathBuf};
use std::process::Command;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoGeometry {
    pub width: u32,
    pub height: u32,
    pub frame_rate: f64,
}

/// Metadata parsed from a media file. Every field is optional; engines cope
/// with whatever the probe could find.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaInfo {
    pub title: Option<String>,
    pub duration_ms: Option<i64>,
    pub video: Option<VideoGeometry>,
}

/// A source file plus whatever metadata has been parsed for it.
#[derive(Debug, Clone, PartialEq)]
pub struct Media {
    pub path: PathBuf,
    pub info: MediaInfo,
}

impl Media {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            info: MediaInfo::default(),
        }
    }

    /// Parse metadata in place. Failures leave the previous info untouched.
    pub fn parse(&mut self, parser: &dyn MetadataParser) -> anyhow::Result<()> {
        self.info = parser.parse(&self.path)?;
        Ok(())
    }

    /// Title tag if present, file name otherwise.
    pub fn display_title(&self) -> String {
        match &self.info.title {
            Some(title) if !title.trim().is_empty() => title.clone(),
            _ => self
                .path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| self.path.display().to_string()),
        }
    }
}

pub trait MetadataParser {
    fn parse(&self, path: &Path) -> anyhow::Result<MediaInfo>;
}

/// Reads container and stream metadata through `ffprobe`.
pub struct FfprobeParser {
    ffprobe: PathBuf,
}

impl FfprobeParser {
    pub fn new(ffprobe: impl Into<PathBuf>) -> Self {
        Self { ffprobe: ffprobe.into() }
    }

    pub fn from_json(json: &serde_json::Value) -> MediaInfo {
        let format = &json["format"];

        let duration_ms = format["duration"]
            .as_str()
            .and_then(|s| s.parse::<f64>().ok())
            .filter(|secs| secs.is_finite() && *secs >= 0.0)
            .map(|secs| (secs * 1000.0).round() as i64);

        // Tag keys are case sensitive and muxers disagree on case
        let title = format["tags"]
            .as_object()
            .and_then(|tags| {
                tags.iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case("title"))
                    .and_then(|(_, value)| value.as_str())
            })
            .map(|s| s.to_string());

        let empty_vec = vec![];
        let streams = json["streams"].as_array().unwrap_or(&empty_vec);
        let video = streams
            .iter()
            .find(|stream| stream["codec_type"].as_str() == Some("video"))
            .and_then(|stream| {
                let width = stream["width"].as_u64()? as u32;
                let height = stream["height"].as_u64()? as u32;
                if width == 0 || height == 0 {
                    return None;
                }
                let frame_rate = stream["avg_frame_rate"]
                    .as_str()
                    .and_then(parse_frame_rate)
                    .or_else(|| stream["r_frame_rate"].as_str().and_then(parse_frame_rate))
                    .unwrap_or(30.0);
                Some(VideoGeometry {
                    width,
                    height,
                    frame_rate,
                })
            });

        MediaInfo {
            title,
            duration_ms,
            video,
        }
    }
}

impl MetadataParser for FfprobeParser {
    fn parse(&self, path: &Path) -> anyhow::Result<MediaInfo> {
        let output = Command::new(&self.ffprobe)
            .arg("-v").arg("quiet")
            .arg("-print_format").arg("json")
            .arg("-show_format")
            .arg("-show_streams")
            .arg(path)
            .output()
            .map_err(|e| anyhow::anyhow!("Failed to run {}: {}", self.ffprobe.display(), e))?;

        if !output.status.success() {
            return Err(anyhow::anyhow!("ffprobe failed for {}", path.display()));
        }

        let json_str = String::from_utf8(output.stdout)?;
        let json: serde_json::Value = serde_json::from_str(&json_str)?;
        let info = Self::from_json(&json);
        log::debug!("Parsed {}: {:?}", path.display(), info);
        Ok(info)
    }
}

/// Parse an ffprobe rate such as `30000/1001` or `25`.
fn parse_frame_rate(raw: &str) -> Option<f64> {
    let fps = match raw.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => raw.trim().parse().ok()?,
    };
    if fps.is_finite() && fps > 0.0 {
        Some(fps.clamp(1.0, 1000.0))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_full_probe_output() {
        let probe = json!({
            "streams": [
                { "codec_type": "audio", "sample_rate": "48000" },
                { "codec_type": "video", "width": 1920, "height": 1080,
                  "avg_frame_rate": "30000/1001", "r_frame_rate": "30000/1001" }
            ],
            "format": { "duration": "12.345000", "tags": { "title": "Rehearsal Take 3" } }
        });

        let info = FfprobeParser::from_json(&probe);
        assert_eq!(info.title.as_deref(), Some("Rehearsal Take 3"));
        assert_eq!(info.duration_ms, Some(12_345));
        let video = info.video.unwrap();
        assert_eq!((video.width, video.height), (1920, 1080));
        assert!((video.frame_rate - 29.97).abs() < 0.01);
    }

    #[test]
    fn test_parse_uppercase_title_and_fallback_rate() {
        let probe = json!({
            "streams": [
                { "codec_type": "video", "width": 640, "height": 360,
                  "avg_frame_rate": "0/0", "r_frame_rate": "25/1" }
            ],
            "format": { "duration": "1.0", "tags": { "TITLE": "Upper" } }
        });

        let info = FfprobeParser::from_json(&probe);
        assert_eq!(info.title.as_deref(), Some("Upper"));
        assert_eq!(info.video.unwrap().frame_rate, 25.0);
    }

    #[test]
    fn test_parse_audio_only_without_tags() {
        let probe = json!({
            "streams": [{ "codec_type": "audio" }],
            "format": { "duration": "N/A" }
        });

        let info = FfprobeParser::from_json(&probe);
        assert_eq!(info, MediaInfo::default());
    }

    #[test]
    fn test_display_title_falls_back_to_file_name() {
        let mut media = Media::new("/clips/rehearsal.mp4");
        assert_eq!(media.display_title(), "rehearsal.mp4");

        media.info.title = Some("   ".to_string());
        assert_eq!(media.display_title(), "rehearsal.mp4");

        media.info.title = Some("Opening Night".to_string());
        assert_eq!(media.display_title(), "Opening Night");
    }

    #[test]
    fn test_frame_rate_parsing() {
        assert_eq!(parse_frame_rate("25"), Some(25.0));
        assert_eq!(parse_frame_rate("60/1"), Some(60.0));
        assert_eq!(parse_frame_rate("0/0"), None);
        assert_eq!(parse_frame_rate("garbage"), None);
        assert_eq!(parse_frame_rate("90000/1"), Some(1000.0));
    }
}
