//! Connection Handler Module
//!
//! This module handles individual client connections to linekv.
//! Each client gets its own handler task that runs in a loop,
//! framing request lines and relaying them to the scheduler.
//!
//! ## Connection Lifecycle
//!
//! ```text
//! 1. Client connects (TCP handshake)
//!        │
//!        ▼
//! 2. ConnectionHandler spawned
//!        │
//!        ▼
//! 3. ┌──────────────────────────────┐
//!    │      Main Loop               │
//!    │                              │
//!    │  ┌─────────────────────────┐ │
//!    │  │ Read bytes from socket  │ │
//!    │  └───────────┬─────────────┘ │
//!    │              ▼               │
//!    │  ┌─────────────────────────┐ │
//!    │  │ Split off full lines    │ │
//!    │  └───────────┬─────────────┘ │
//!    │              ▼               │
//!    │  ┌─────────────────────────┐ │
//!    │  │ Enqueue, await response │ │
//!    │  └───────────┬─────────────┘ │
//!    │              ▼               │
//!    │  ┌─────────────────────────┐ │
//!    │  │ Write response line     │ │
//!    │  └───────────┬─────────────┘ │
//!    │              ▼               │
//!    │         [Loop back]          │
//!    └──────────────────────────────┘
//!        │
//!        ▼
//! 4. EOF / EXIT / error
//!        │
//!        ▼
//! 5. Stream shut down, handler task ends
//! ```
//!
//! ## Buffer Management
//!
//! We use a BytesMut buffer to accumulate incoming data. TCP is a stream
//! protocol, so one read may hold half a request or several requests.
//! Only complete `\n`-terminated lines are relayed; the rest waits for the
//! next read.
//!
//! A connection submits one request at a time and waits for its response
//! before relaying the next line, so responses always come back in the
//! order the client sent the requests.

use crate::protocol::{is_blank, next_frame, ParseError, Response};
use crate::scheduler::{RequestQueue, SchedulerClosed};
use bytes::{Bytes, BytesMut};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufWriter};
use tracing::{debug, info, trace, warn};

/// Initial buffer capacity
const INITIAL_BUFFER_SIZE: usize = 4096;

/// Statistics for connection handling
#[derive(Debug, Default)]
pub struct ConnectionStats {
    /// Total number of connections accepted
    pub connections_accepted: AtomicU64,
    /// Currently active connections
    pub active_connections: AtomicU64,
    /// Total requests handed to the scheduler
    pub requests_relayed: AtomicU64,
    /// Total bytes read
    pub bytes_read: AtomicU64,
    /// Total bytes written
    pub bytes_written: AtomicU64,
}

impl ConnectionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection_opened(&self) {
        self.connections_accepted.fetch_add(1, Ordering::Relaxed);
        self.active_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_closed(&self) {
        self.active_connections.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn request_relayed(&self) {
        self.requests_relayed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn bytes_read(&self, count: usize) {
        self.bytes_read.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn bytes_written(&self, count: usize) {
        self.bytes_written
            .fetch_add(count as u64, Ordering::Relaxed);
    }
}

/// Handles a single client connection.
///
/// This struct manages the read buffer, line framing and response
/// writing for one connected client. It is generic over the stream so it
/// can run over a `TcpStream` or an in-memory mock.
pub struct ConnectionHandler<S> {
    /// The stream for this connection
    stream: BufWriter<S>,

    /// Client's address (for logging)
    addr: SocketAddr,

    /// Buffer for incoming data
    buffer: BytesMut,

    /// Queue feeding the scheduler (shared across connections)
    queue: RequestQueue,

    /// Connection statistics (shared)
    stats: Arc<ConnectionStats>,
}

impl<S> ConnectionHandler<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Creates a new connection handler.
    ///
    /// # Arguments
    ///
    /// * `stream` - The byte stream for this connection
    /// * `addr` - The client's socket address
    /// * `queue` - Handle to the request scheduler
    /// * `stats` - Shared connection statistics
    pub fn new(
        stream: S,
        addr: SocketAddr,
        queue: RequestQueue,
        stats: Arc<ConnectionStats>,
    ) -> Self {
        stats.connection_opened();

        Self {
            stream: BufWriter::new(stream),
            addr,
            buffer: BytesMut::with_capacity(INITIAL_BUFFER_SIZE),
            queue,
            stats,
        }
    }

    /// Runs the main connection loop.
    ///
    /// Returns once the client closes its side, sends EXIT, or the
    /// connection fails. The stream is shut down in every case.
    pub async fn run(mut self) -> Result<(), ConnectionError> {
        info!(client = %self.addr, "Client connected");

        let result = self.main_loop().await;

        match &result {
            Ok(()) => info!(client = %self.addr, "Client disconnected"),
            Err(ConnectionError::Io(io_err))
                if io_err.kind() == std::io::ErrorKind::ConnectionReset =>
            {
                debug!(client = %self.addr, "Connection reset by client")
            }
            Err(e) => warn!(client = %self.addr, error = %e, "Connection error"),
        }

        if let Err(e) = self.stream.shutdown().await {
            trace!(client = %self.addr, error = %e, "Shutdown failed");
        }

        self.stats.connection_closed();
        result
    }

    /// The main read-relay-respond loop.
    async fn main_loop(&mut self) -> Result<(), ConnectionError> {
        loop {
            while let Some(line) = self.next_request().await? {
                if !self.relay(line).await? {
                    debug!(
                        client = %self.addr,
                        discarded = self.buffer.len(),
                        "Closing connection on EXIT"
                    );
                    return Ok(());
                }
            }

            if self.read_more_data().await? == 0 {
                // Client closed its write side; an unterminated tail is
                // still a request
                let tail = self.buffer.split().freeze();
                if !is_blank(&tail) {
                    self.relay(tail).await?;
                }
                return Ok(());
            }
        }
    }

    /// Pulls the next non-blank line from the buffer.
    async fn next_request(&mut self) -> Result<Option<Bytes>, ConnectionError> {
        loop {
            match next_frame(&mut self.buffer) {
                Ok(Some(line)) if is_blank(&line) => continue,
                Ok(Some(line)) => {
                    trace!(
                        client = %self.addr,
                        length = line.len(),
                        remaining = self.buffer.len(),
                        "Framed request"
                    );
                    return Ok(Some(line));
                }
                Ok(None) => return Ok(None),
                Err(e) => {
                    warn!(client = %self.addr, error = %e, "Framing error");
                    self.send_response(&Response::error(e.to_string())).await?;
                    return Err(ConnectionError::Parse(e));
                }
            }
        }
    }

    /// Hands one request to the scheduler and writes back its response.
    ///
    /// Returns false if the connection must be closed (EXIT).
    async fn relay(&mut self, line: Bytes) -> Result<bool, ConnectionError> {
        let response = self.queue.submit(self.addr, line).await?;
        self.stats.request_relayed();

        self.send_response(&response).await?;
        Ok(!response.close_connection)
    }

    /// Reads more data from the stream into the buffer.
    ///
    /// Returns the number of bytes read; zero means end of stream.
    async fn read_more_data(&mut self) -> Result<usize, ConnectionError> {
        // Ensure we have some capacity
        if self.buffer.capacity() - self.buffer.len() < 1024 {
            self.buffer.reserve(INITIAL_BUFFER_SIZE);
        }

        let n = self.stream.get_mut().read_buf(&mut self.buffer).await?;

        self.stats.bytes_read(n);
        trace!(client = %self.addr, bytes = n, "Read data");

        Ok(n)
    }

    /// Sends a response to the client.
    async fn send_response(&mut self, response: &Response) -> Result<(), ConnectionError> {
        let bytes = response.encode();
        self.stream.write_all(&bytes).await?;
        self.stream.flush().await?;
        self.stats.bytes_written(bytes.len());
        trace!(
            client = %self.addr,
            bytes = bytes.len(),
            "Sent response"
        );
        Ok(())
    }
}

/// Errors that can occur while handling a connection.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// I/O error (network issue)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Framing error (oversized line)
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// The scheduler stopped while the connection was open
    #[error("Scheduler closed")]
    SchedulerClosed(#[from] SchedulerClosed),
}

/// Handles a client connection.
///
/// This is a convenience function that creates a ConnectionHandler
/// and runs it to completion. Errors are already logged by the handler.
pub async fn handle_connection<S>(
    stream: S,
    addr: SocketAddr,
    queue: RequestQueue,
    stats: Arc<ConnectionStats>,
) where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let handler = ConnectionHandler::new(stream, addr, queue, stats);
    if let Err(e) = handler.run().await {
        debug!(client = %addr, error = %e, "Connection ended with error");
    }
}
