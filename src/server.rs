//! TCP Server
//!
//! Owns the listener and the scheduler task. Every accepted connection
//! gets its own [`ConnectionHandler`](crate::connection::ConnectionHandler)
//! task, and all of them feed the same request queue.

use crate::commands::CommandHandler;
use crate::connection::{handle_connection, ConnectionStats};
use crate::scheduler::{RequestQueue, Scheduler};
use anyhow::{Context, Result};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::select;
use tracing::{debug, error, info};

/// A bound linekv server, ready to accept clients.
pub struct Server {
    listener: TcpListener,
    handler: CommandHandler,
    stats: Arc<ConnectionStats>,
}

impl Server {
    /// Wraps an already bound listener with an empty store.
    pub fn new(listener: TcpListener) -> Self {
        Self {
            listener,
            handler: CommandHandler::new(),
            stats: Arc::new(ConnectionStats::new()),
        }
    }

    /// Binds a listener on `addr`.
    pub async fn bind(addr: &str) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind {addr}"))?;
        Ok(Self::new(listener))
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Shared connection statistics.
    pub fn stats(&self) -> Arc<ConnectionStats> {
        Arc::clone(&self.stats)
    }

    /// Accepts clients until `shutdown` resolves.
    ///
    /// Open connections are not interrupted; they keep their queue handle
    /// and finish on their own.
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send,
    {
        let Server {
            listener,
            handler,
            stats,
        } = self;

        let (queue, _scheduler) = Scheduler::spawn(handler);
        info!(addr = %listener.local_addr()?, "Listening");

        tokio::pin!(shutdown);

        loop {
            select! {
                _ = &mut shutdown => {
                    info!("Shutdown signal received, stopping server...");
                    break;
                }
                accept_result = listener.accept() => {
                    handle_accept_result(accept_result, &queue, &stats);
                }
            }
        }

        info!(
            accepted = stats.connections_accepted.load(Ordering::Relaxed),
            active = stats.active_connections.load(Ordering::Relaxed),
            requests = stats.requests_relayed.load(Ordering::Relaxed),
            bytes_read = stats.bytes_read.load(Ordering::Relaxed),
            bytes_written = stats.bytes_written.load(Ordering::Relaxed),
            "Server stopped"
        );

        Ok(())
    }

    /// Accepts clients until Ctrl+C.
    pub async fn run_until_ctrl_c(self) -> Result<()> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to install Ctrl+C handler");
            }
        })
        .await
    }
}

fn handle_accept_result(
    accept_result: std::io::Result<(TcpStream, SocketAddr)>,
    queue: &RequestQueue,
    stats: &Arc<ConnectionStats>,
) {
    match accept_result {
        Ok((stream, addr)) => {
            if let Err(e) = stream.set_nodelay(true) {
                debug!(client = %addr, error = %e, "Failed to set TCP_NODELAY");
            }
            tokio::spawn(handle_connection(
                stream,
                addr,
                queue.clone(),
                Arc::clone(stats),
            ));
        }
        Err(e) => {
            error!(error = %e, "Failed to accept connection");
        }
    }
}
