pub mod ffmpeg_engine;
pub mod frame;
#[cfg(feature = "mpv")]
pub mod mpv_engine;

pub use ffmpeg_engine::FfmpegVideoEngine;
pub use frame::*;
#[cfg(feature = "mpv")]
pub use mpv_engine::MpvEngine;
