use crate::core::command::TransportCommand;

/// Transport action reachable from a global hotkey.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportHotkey {
    SlowDown,
    SpeedUp,
    Play,
    Pause,
    Stop,
}

impl TransportHotkey {
    pub const ALL: [TransportHotkey; 5] = [
        TransportHotkey::SlowDown,
        TransportHotkey::SpeedUp,
        TransportHotkey::Play,
        TransportHotkey::Pause,
        TransportHotkey::Stop,
    ];

    /// Key of this action in the config hotkey table.
    pub fn config_key(self) -> &'static str {
        match self {
            TransportHotkey::SlowDown => "slow_down",
            TransportHotkey::SpeedUp => "speed_up",
            TransportHotkey::Play => "play",
            TransportHotkey::Pause => "pause",
            TransportHotkey::Stop => "stop",
        }
    }

    pub fn from_config_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|h| h.config_key() == key)
    }

    pub fn to_command(self) -> TransportCommand {
        match self {
            TransportHotkey::SlowDown => TransportCommand::SlowDown,
            TransportHotkey::SpeedUp => TransportCommand::SpeedUp,
            TransportHotkey::Play => TransportCommand::Play,
            TransportHotkey::Pause => TransportCommand::Pause,
            TransportHotkey::Stop => TransportCommand::Stop,
        }
    }
}
