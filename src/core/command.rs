use std::fmt;
use std::str::FromStr;

/// A transport instruction produced outside the UI thread.
///
/// Wire form is a single token per command: `<`, `>`, `P`, `p`, `S`, or a
/// base-10 millisecond position for an absolute seek.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportCommand {
    SlowDown,
    SpeedUp,
    Play,
    Pause,
    Stop,
    /// Absolute seek target in milliseconds
    SeekTo(i64),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("malformed transport token: {0:?}")]
    MalformedToken(String),
}

impl TransportCommand {
    pub const SLOW_DOWN_FACTOR: f64 = 0.5;
    pub const SPEED_UP_FACTOR: f64 = 2.0;

    /// Decode one channel token.
    ///
    /// Control characters must match exactly; anything else is read as an
    /// integer seek target, allowing surrounding whitespace and a sign.
    pub fn parse_token(token: &str) -> Result<Self, CommandError> {
        match token {
            "<" => Ok(TransportCommand::SlowDown),
            ">" => Ok(TransportCommand::SpeedUp),
            "P" => Ok(TransportCommand::Play),
            "p" => Ok(TransportCommand::Pause),
            "S" => Ok(TransportCommand::Stop),
            other => other
                .trim()
                .parse::<i64>()
                .map(TransportCommand::SeekTo)
                .map_err(|_| CommandError::MalformedToken(token.to_string())),
        }
    }

    /// Rate multiplier for the two rate commands.
    pub fn rate_factor(&self) -> Option<f64> {
        match self {
            TransportCommand::SlowDown => Some(Self::SLOW_DOWN_FACTOR),
            TransportCommand::SpeedUp => Some(Self::SPEED_UP_FACTOR),
            _ => None,
        }
    }
}

impl FromStr for TransportCommand {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_token(s)
    }
}

impl fmt::Display for TransportCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportCommand::SlowDown => write!(f, "<"),
            TransportCommand::SpeedUp => write!(f, ">"),
            TransportCommand::Play => write!(f, "P"),
            TransportCommand::Pause => write!(f, "p"),
            TransportCommand::Stop => write!(f, "S"),
            TransportCommand::SeekTo(ms) => write!(f, "{}", ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_tokens() {
        assert_eq!(TransportCommand::parse_token("<"), Ok(TransportCommand::SlowDown));
        assert_eq!(TransportCommand::parse_token(">"), Ok(TransportCommand::SpeedUp));
        assert_eq!(TransportCommand::parse_token("P"), Ok(TransportCommand::Play));
        assert_eq!(TransportCommand::parse_token("p"), Ok(TransportCommand::Pause));
        assert_eq!(TransportCommand::parse_token("S"), Ok(TransportCommand::Stop));
    }

    #[test]
    fn test_seek_tokens() {
        assert_eq!(TransportCommand::parse_token("5000"), Ok(TransportCommand::SeekTo(5000)));
        assert_eq!(TransportCommand::parse_token(" 42 "), Ok(TransportCommand::SeekTo(42)));
        assert_eq!(TransportCommand::parse_token("-1"), Ok(TransportCommand::SeekTo(-1)));
        assert_eq!(TransportCommand::parse_token("0"), Ok(TransportCommand::SeekTo(0)));
    }

    #[test]
    fn test_malformed_tokens() {
        for token in ["abc", "", "s", "PP", "12.5", " P"] {
            assert_eq!(
                TransportCommand::parse_token(token),
                Err(CommandError::MalformedToken(token.to_string())),
                "token {:?} should be rejected",
                token
            );
        }
    }

    #[test]
    fn test_display_matches_wire_tokens() {
        let commands = [
            TransportCommand::SlowDown,
            TransportCommand::SpeedUp,
            TransportCommand::Play,
            TransportCommand::Pause,
            TransportCommand::Stop,
            TransportCommand::SeekTo(123_456),
        ];
        for command in commands {
            assert_eq!(command.to_string().parse::<TransportCommand>(), Ok(command));
        }
    }

    #[test]
    fn test_rate_factors() {
        assert_eq!(TransportCommand::SlowDown.rate_factor(), Some(0.5));
        assert_eq!(TransportCommand::SpeedUp.rate_factor(), Some(2.0));
        assert_eq!(TransportCommand::Play.rate_factor(), None);
        assert_eq!(TransportCommand::SeekTo(10).rate_factor(), None);
    }
}
