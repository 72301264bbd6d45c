use std::io::{self, BufRead};
use std::thread::{self, JoinHandle};
use crate::core::channel::CommandSender;
use crate::remote::forward_line;

/// Read tokens from any line source until EOF or until the channel closes.
pub fn pump_lines(reader: impl BufRead, sender: &CommandSender, source: &str) -> usize {
    let mut forwarded = 0;
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                log::warn!("{} feed read error: {}", source, e);
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        if !forward_line(sender, &line, source) {
            log::debug!("{} feed stopping, command channel closed", source);
            break;
        }
        forwarded += 1;
    }
    forwarded
}

pub fn spawn_stdin_feed(sender: CommandSender) -> anyhow::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("stdin-commands".to_string())
        .spawn(move || {
            log::info!("Reading transport commands from stdin");
            let forwarded = pump_lines(io::stdin().lock(), &sender, "stdin");
            log::info!("stdin closed after {} commands", forwarded);
        })
        .map_err(|e| anyhow::anyhow!("Failed to start stdin feed: {}", e))
}
