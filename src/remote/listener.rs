use std::thread::{self, JoinHandle};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::net::TcpListener;
use crate::core::channel::CommandSender;
use crate::remote::forward_line;

/// Read newline separated tokens from one connection. Returns false if the
/// command channel has closed.
async fn pump_connection<R>(stream: R, sender: &CommandSender, peer: &str) -> bool
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(stream).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if !forward_line(sender, &line, peer) {
                    return false;
                }
            }
            Ok(None) => return true,
            Err(e) => {
                log::warn!("Connection {} read error: {}", peer, e);
                return true;
            }
        }
    }
}

async fn serve(listener: TcpListener, sender: CommandSender) {
    loop {
        let (stream, addr) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                log::warn!("Failed to accept command connection: {}", e);
                continue;
            }
        };
        log::info!("Command connection from {}", addr);

        let sender = sender.clone();
        tokio::spawn(async move {
            let peer = addr.to_string();
            if pump_connection(stream, &sender, &peer).await {
                log::info!("Command connection {} closed", peer);
            } else {
                log::debug!("Command channel closed, dropping connection {}", peer);
            }
        });
    }
}

/// Bind `address` and feed every accepted connection into the channel.
/// Binding happens before this returns so a bad address fails fast.
pub fn spawn_tcp_feed(address: &str, sender: CommandSender) -> anyhow::Result<JoinHandle<()>> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_io()
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to create async runtime: {}", e))?;

    let listener = runtime
        .block_on(TcpListener::bind(address))
        .map_err(|e| anyhow::anyhow!("Failed to listen on {}: {}", address, e))?;
    if let Ok(local) = listener.local_addr() {
        log::info!("Listening for transport commands on {}", local);
    }

    thread::Builder::new()
        .name("tcp-commands".to_string())
        .spawn(move || runtime.block_on(serve(listener, sender)))
        .map_err(|e| anyhow::anyhow!("Failed to start TCP feed: {}", e))
}
