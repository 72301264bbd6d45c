use std::time::{Duration, Instant};
use crate::core::channel::CommandReceiver;
use crate::core::command::{CommandError, TransportCommand};
use crate::core::loader::LoadedMedia;
use crate::core::status::format_clock;
use crate::core::transport::{Applied, DualEngineTransport, Recovery};

pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(10);

/// What the command drain step of a tick did.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    /// Channel was empty
    Idle,
    Applied(TransportCommand),
    /// Seek target matched the current video position
    SeekSkipped(i64),
    Dropped(CommandError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub status: String,
    pub recovered: Recovery,
    pub outcome: CommandOutcome,
}

/// The playing pair of engines plus the consumer side of the command channel.
///
/// `tick()` is the whole sync loop; any scheduler can drive it.
pub struct Session {
    transport: DualEngineTransport,
    commands: CommandReceiver,
    title: String,
    status: String,
    shut_down: bool,
}

impl Session {
    pub fn start(loaded: LoadedMedia, commands: CommandReceiver) -> Self {
        log::info!("Session started for \"{}\"", loaded.title);
        let status = format_clock(loaded.transport.time());
        Self {
            transport: loaded.transport,
            commands,
            title: loaded.title,
            status,
            shut_down: false,
        }
    }

    /// One pass of the sync loop: status, end-of-stream recovery, then at
    /// most one command.
    pub fn tick(&mut self) -> TickReport {
        self.status = format_clock(self.transport.time());

        let recovered = self.transport.recover_ended();
        if recovered.any() {
            log::info!(
                "End of stream reached (video: {}, audio: {}); restarted",
                recovered.video,
                recovered.audio
            );
        }

        let outcome = match self.commands.try_next() {
            None => CommandOutcome::Idle,
            Some(token) => self.dispatch(&token),
        };

        TickReport {
            status: self.status.clone(),
            recovered,
            outcome,
        }
    }

    fn dispatch(&mut self, token: &str) -> CommandOutcome {
        let command = match TransportCommand::parse_token(token) {
            Ok(command) => command,
            Err(e) => {
                log::warn!("Dropping transport command: {}", e);
                return CommandOutcome::Dropped(e);
            }
        };

        match self.transport.apply(command) {
            Applied::SeekSkipped(ms) => {
                log::trace!("Seek to {} skipped, already there", ms);
                CommandOutcome::SeekSkipped(ms)
            }
            Applied::Rate(rate) => {
                log::debug!("Applied {:?}; rate now {:.4}", command, rate);
                CommandOutcome::Applied(command)
            }
            Applied::Seek(_) | Applied::Transport => {
                log::debug!("Applied {:?}", command);
                CommandOutcome::Applied(command)
            }
        }
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn transport(&self) -> &DualEngineTransport {
        &self.transport
    }

    /// Stop both engines. Called on window close; safe to call twice.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        log::info!("Stopping session for \"{}\"", self.title);
        self.transport.stop();
        self.shut_down = true;
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Fixed-period timer for the sync loop. Missed periods coalesce into one
/// due tick rather than a burst.
#[derive(Debug, Clone)]
pub struct TickTimer {
    interval: Duration,
    next_due: Instant,
}

impl TickTimer {
    pub fn new(interval: Duration, now: Instant) -> Self {
        let interval = interval.max(Duration::from_millis(1));
        Self {
            interval,
            next_due: now + interval,
        }
    }

    /// Returns true at most once per elapsed period.
    pub fn poll(&mut self, now: Instant) -> bool {
        if now < self.next_due {
            return false;
        }
        self.next_due += self.interval;
        if self.next_due <= now {
            self.next_due = now + self.interval;
        }
        true
    }

    pub fn until_next(&self, now: Instant) -> Duration {
        self.next_due.saturating_duration_since(now)
    }
}
