//! Producers for the transport command channel. Every feed runs on its own
//! thread and only ever writes tokens.

pub mod listener;
pub mod stdin;

pub use listener::spawn_tcp_feed;
pub use stdin::spawn_stdin_feed;

use crate::core::channel::CommandSender;

/// Forward one line of input as a token. Returns false once the channel has
/// closed and the feed should end.
pub(crate) fn forward_line(sender: &CommandSender, line: &str, source: &str) -> bool {
    let token = line.trim_end_matches(['\r', '\n']);
    if token.trim().is_empty() {
        return true;
    }
    log::trace!("{} token: {:?}", source, token);
    sender.send_token(token).is_ok()
}
