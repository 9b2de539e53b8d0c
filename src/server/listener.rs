use std::io;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::Config;
use crate::context::ServeContext;
use crate::http::connection::Connection;
use crate::process::Reaper;

pub async fn run(cfg: &Config, reaper: Reaper) -> anyhow::Result<()> {
    let addr = cfg.listen_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!("Listening on {}", listener.local_addr()?);

    serve(listener, ServeContext::new(cfg.clone(), reaper)).await
}

/// Accepts connections one at a time; each transaction finishes and its
/// socket is closed before the next `accept`.
pub async fn serve(listener: TcpListener, ctx: ServeContext) -> anyhow::Result<()> {
    loop {
        let (socket, peer) = listener.accept().await.context("accept failed")?;
        info!("Accepted connection from {}", peer);

        if let Err(e) = Connection::new(socket, ctx.clone()).run().await {
            if is_peer_error(&e) {
                tracing::warn!("Connection from {} dropped: {}", peer, e);
            } else {
                tracing::error!("Connection error from {}: {:#}", peer, e);
                return Err(e);
            }
        }
    }
}

/// Errors caused by the client going away mid-transaction.
pub fn is_peer_error(e: &anyhow::Error) -> bool {
    e.chain()
        .filter_map(|cause| cause.downcast_ref::<io::Error>())
        .any(|io| {
            matches!(
                io.kind(),
                io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::BrokenPipe
                    | io::ErrorKind::UnexpectedEof
            )
        })
}
