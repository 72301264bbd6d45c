use clap::Parser;
use std::path::PathBuf;
use crate::core::{AppConfig, EngineBackend};

/// Play a video file and a separate audio file in lockstep, driven by
/// transport commands from stdin, TCP or global hotkeys
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Video file to play (skips the video file dialog)
    #[arg(long = "video", value_name = "FILE")]
    pub video: Option<PathBuf>,

    /// Audio file to play (skips the audio file dialog)
    #[arg(long = "audio", value_name = "FILE")]
    pub audio: Option<PathBuf>,

    /// Accept newline separated transport commands on this TCP address
    #[arg(long = "listen", value_name = "ADDR")]
    pub listen: Option<String>,

    /// Do not read transport commands from standard input
    #[arg(long = "no-stdin")]
    pub no_stdin: bool,

    /// Register the global transport hotkeys from the config file
    #[arg(long = "hotkeys")]
    pub hotkeys: bool,

    /// Playback engines to use
    #[arg(long = "backend", value_enum, value_name = "BACKEND")]
    pub backend: Option<EngineBackend>,

    /// Sync loop period in milliseconds
    #[arg(long = "tick-ms", value_name = "N")]
    pub tick_ms: Option<u64>,

    /// Use this config file instead of the platform default
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print the available audio output devices and exit
    #[arg(long = "list-audio-devices")]
    pub list_audio_devices: bool,
}

impl Args {
    /// Layer command line overrides on top of the loaded config.
    pub fn apply_to(&self, config: &mut AppConfig) {
        if let Some(listen) = &self.listen {
            config.listen_address = Some(listen.clone());
        }
        if self.no_stdin {
            config.stdin_commands = false;
        }
        if self.hotkeys {
            config.hotkeys_enabled = true;
        }
        if let Some(backend) = self.backend {
            config.backend = backend;
        }
        if let Some(tick_ms) = self.tick_ms {
            config.tick_interval_ms = tick_ms.max(1);
        }
    }
}
