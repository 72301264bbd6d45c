use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use global_hotkey::hotkey::{Code, Modifiers};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotkeyConfig {
    pub modifiers: String, // "Ctrl", "Alt", "Shift", "Ctrl+Alt", etc.
    pub key: String,       // "Numpad5", "F1", "Space", etc.
}

impl Default for HotkeyConfig {
    fn default() -> Self {
        Self {
            modifiers: "Ctrl".to_string(),
            key: "Numpad5".to_string(),
        }
    }
}

impl HotkeyConfig {
    pub fn new(modifiers: &str, key: &str) -> Self {
        Self {
            modifiers: modifiers.to_string(),
            key: key.to_string(),
        }
    }

    pub fn to_global_hotkey(&self) -> anyhow::Result<(Option<Modifiers>, Code)> {
        let modifiers = self.parse_modifiers()?;
        let code = self.parse_code()?;
        Ok((modifiers, code))
    }

    fn parse_modifiers(&self) -> anyhow::Result<Option<Modifiers>> {
        let mut result = Modifiers::empty();

        for part in self.modifiers.split('+') {
            match part.trim() {
                "Ctrl" | "Control" => result |= Modifiers::CONTROL,
                "Alt" => result |= Modifiers::ALT,
                "Shift" => result |= Modifiers::SHIFT,
                "Super" | "Win" | "Cmd" => result |= Modifiers::SUPER,
                "" => {} // no modifiers
                other => return Err(anyhow::anyhow!("Unknown modifier: {}", other)),
            }
        }

        if result.is_empty() {
            Ok(None)
        } else {
            Ok(Some(result))
        }
    }

    fn parse_code(&self) -> anyhow::Result<Code> {
        match self.key.trim() {
            // Numpad keys
            "Numpad0" => Ok(Code::Numpad0),
            "Numpad1" => Ok(Code::Numpad1),
            "Numpad2" => Ok(Code::Numpad2),
            "Numpad3" => Ok(Code::Numpad3),
            "Numpad4" => Ok(Code::Numpad4),
            "Numpad5" => Ok(Code::Numpad5),
            "Numpad6" => Ok(Code::Numpad6),
            "Numpad7" => Ok(Code::Numpad7),
            "Numpad8" => Ok(Code::Numpad8),
            "Numpad9" => Ok(Code::Numpad9),
            "NumpadAdd" => Ok(Code::NumpadAdd),
            "NumpadSubtract" => Ok(Code::NumpadSubtract),
            // Function keys
            "F1" => Ok(Code::F1),
            "F2" => Ok(Code::F2),
            "F3" => Ok(Code::F3),
            "F4" => Ok(Code::F4),
            "F5" => Ok(Code::F5),
            "F6" => Ok(Code::F6),
            "F7" => Ok(Code::F7),
            "F8" => Ok(Code::F8),
            "F9" => Ok(Code::F9),
            "F10" => Ok(Code::F10),
            "F11" => Ok(Code::F11),
            "F12" => Ok(Code::F12),
            // Transport-style keys
            "Space" => Ok(Code::Space),
            "ArrowLeft" => Ok(Code::ArrowLeft),
            "ArrowRight" => Ok(Code::ArrowRight),
            "ArrowUp" => Ok(Code::ArrowUp),
            "ArrowDown" => Ok(Code::ArrowDown),
            "MediaPlayPause" => Ok(Code::MediaPlayPause),
            "MediaStop" => Ok(Code::MediaStop),
            _ => Err(anyhow::anyhow!("Unknown key code: {}", self.key)),
        }
    }
}

/// Which engine pair plays the media.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EngineBackend {
    /// ffmpeg frame decoding plus rodio audio output
    #[default]
    Ffmpeg,
    /// libmpv for both engines (needs the `mpv` feature)
    Mpv,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub tick_interval_ms: u64,
    pub window_size: [f32; 2],
    pub always_on_top: bool,
    pub backend: EngineBackend,
    pub ffmpeg_path: Option<PathBuf>,
    pub ffprobe_path: Option<PathBuf>,
    pub max_video_width: u32,
    pub audio_output_device: Option<String>,
    pub stdin_commands: bool,
    pub listen_address: Option<String>,
    pub hotkeys_enabled: bool,
    pub hotkeys: HashMap<String, HotkeyConfig>,
    pub last_video_directory: Option<PathBuf>,
    pub last_audio_directory: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let mut hotkeys = HashMap::new();

        // Default transport hotkeys on the numpad
        hotkeys.insert("slow_down".to_string(), HotkeyConfig::new("Ctrl", "Numpad4"));
        hotkeys.insert("speed_up".to_string(), HotkeyConfig::new("Ctrl", "Numpad6"));
        hotkeys.insert("play".to_string(), HotkeyConfig::new("Ctrl", "Numpad8"));
        hotkeys.insert("pause".to_string(), HotkeyConfig::new("Ctrl", "Numpad5"));
        hotkeys.insert("stop".to_string(), HotkeyConfig::new("Ctrl", "Numpad2"));

        Self {
            tick_interval_ms: 10,
            window_size: [720.0, 720.0],
            always_on_top: true,
            backend: EngineBackend::default(),
            ffmpeg_path: None,
            ffprobe_path: None,
            max_video_width: 1280,
            audio_output_device: None,
            stdin_commands: true,
            listen_address: None,
            hotkeys_enabled: false,
            hotkeys,
            last_video_directory: None,
            last_audio_directory: None,
        }
    }
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn load_from(config_path: &Path) -> anyhow::Result<Self> {
        if !config_path.exists() {
            log::info!("No config file found, creating default config");
            let config = Self::default();
            config
                .save_to(config_path)
                .map_err(|e| anyhow::anyhow!("Failed to save default config: {}", e))?;
            log::info!("Created new config file at {}", config_path.display());
            return Ok(config);
        }

        let parsed = std::fs::read_to_string(config_path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file at {}: {}", config_path.display(), e))
            .and_then(|content| {
                serde_json::from_str::<Self>(&content)
                    .map_err(|e| anyhow::anyhow!("Failed to parse config file: {}", e))
            });

        match parsed {
            Ok(config) => {
                log::info!("Loaded existing config from {}", config_path.display());
                Ok(config)
            }
            Err(e) => {
                log::warn!("Config file exists but has issues ({}), creating new one with defaults", e);
                let new_config = Self::default();
                new_config
                    .save_to(config_path)
                    .map_err(|save_err| anyhow::anyhow!("Failed to save new config: {}", save_err))?;
                log::info!("Created new config file at {}", config_path.display());
                Ok(new_config)
            }
        }
    }

    pub fn save_to(&self, config_path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        log::debug!("Saved config to {}", config_path.display());
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sync-player")
            .join("config.json")
    }

    pub fn tick_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.tick_interval_ms.max(1))
    }

    /// Record the parent directories of the chosen files for the next dialog.
    pub fn remember_directories(&mut self, video: &Path, audio: &Path) {
        if let Some(dir) = video.parent().filter(|d| !d.as_os_str().is_empty()) {
            self.last_video_directory = Some(dir.to_path_buf());
        }
        if let Some(dir) = audio.parent().filter(|d| !d.as_os_str().is_empty()) {
            self.last_audio_directory = Some(dir.to_path_buf());
        }
    }

    pub fn ffprobe_command(&self) -> PathBuf {
        self.ffprobe_path.clone().unwrap_or_else(|| PathBuf::from("ffprobe"))
    }

    pub fn ffmpeg_command(&self) -> PathBuf {
        self.ffmpeg_path.clone().unwrap_or_else(|| PathBuf::from("ffmpeg"))
    }
}
