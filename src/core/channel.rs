use std::sync::mpsc;
use crate::core::command::TransportCommand;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("transport command channel closed")]
pub struct ChannelClosed;

/// Create the transport command channel.
///
/// Tokens travel raw so that decoding, and dropping of malformed tokens,
/// happens on the consuming tick.
pub fn command_channel() -> (CommandSender, CommandReceiver) {
    let (tx, rx) = mpsc::channel();
    (
        CommandSender { tx },
        CommandReceiver {
            rx,
            disconnected: false,
        },
    )
}

/// Producer side. Cheap to clone; every feed gets its own copy.
#[derive(Debug, Clone)]
pub struct CommandSender {
    tx: mpsc::Sender<String>,
}

impl CommandSender {
    pub fn send_token(&self, token: impl Into<String>) -> Result<(), ChannelClosed> {
        self.tx.send(token.into()).map_err(|_| ChannelClosed)
    }

    pub fn send(&self, command: TransportCommand) -> Result<(), ChannelClosed> {
        self.send_token(command.to_string())
    }
}

/// Consumer side, owned by the session on the UI thread.
#[derive(Debug)]
pub struct CommandReceiver {
    rx: mpsc::Receiver<String>,
    disconnected: bool,
}

impl CommandReceiver {
    /// Pop the oldest pending token without blocking.
    pub fn try_next(&mut self) -> Option<String> {
        match self.rx.try_recv() {
            Ok(token) => Some(token),
            Err(mpsc::TryRecvError::Empty) => None,
            Err(mpsc::TryRecvError::Disconnected) => {
                if !self.disconnected {
                    log::debug!("All transport command producers have disconnected");
                    self.disconnected = true;
                }
                None
            }
        }
    }
}
