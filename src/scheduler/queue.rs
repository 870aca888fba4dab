//! Request Queue and Scheduler
//!
//! All connections feed one process-wide FIFO queue. A single scheduler
//! task drains it, running each request to completion before taking the
//! next one:
//!
//! ```text
//!  conn A ──┐
//!  conn B ──┼──> [ mpsc queue ] ──> Scheduler ──> CommandHandler
//!  conn C ──┘                          │
//!     ▲                                │
//!     └──────── oneshot response ──────┘
//! ```
//!
//! The scheduler is the only owner of the `CommandHandler`, so store
//! mutations happen in queue arrival order with no locking. Enqueueing is
//! a non-blocking send on an unbounded channel.

use crate::commands::CommandHandler;
use crate::protocol::Response;
use bytes::Bytes;
use std::net::SocketAddr;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// The scheduler task has stopped and no longer accepts requests.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("scheduler is not running")]
pub struct SchedulerClosed;

/// Receives the response for one enqueued request.
pub type PendingResponse = oneshot::Receiver<Response>;

/// One client message waiting to be executed.
#[derive(Debug)]
pub struct Request {
    /// The connection the request came from
    pub client: SocketAddr,

    /// The raw request line, without its terminator
    pub payload: Bytes,

    /// Where the response goes
    respond_to: oneshot::Sender<Response>,
}

/// Handle for submitting requests to the scheduler.
///
/// Cloning the handle is cheap; every connection holds its own clone.
#[derive(Debug, Clone)]
pub struct RequestQueue {
    tx: mpsc::UnboundedSender<Request>,
}

impl RequestQueue {
    /// Appends a request to the tail of the queue.
    ///
    /// Never blocks. The returned receiver resolves once the scheduler
    /// has executed the request.
    pub fn enqueue(
        &self,
        client: SocketAddr,
        payload: Bytes,
    ) -> Result<PendingResponse, SchedulerClosed> {
        let (respond_to, response_rx) = oneshot::channel();
        self.tx
            .send(Request {
                client,
                payload,
                respond_to,
            })
            .map_err(|_| SchedulerClosed)?;
        Ok(response_rx)
    }

    /// Enqueues a request and waits for its response.
    pub async fn submit(
        &self,
        client: SocketAddr,
        payload: Bytes,
    ) -> Result<Response, SchedulerClosed> {
        let pending = self.enqueue(client, payload)?;
        pending.await.map_err(|_| SchedulerClosed)
    }
}

/// The single consumer of the request queue.
pub struct Scheduler {
    rx: mpsc::UnboundedReceiver<Request>,
    handler: CommandHandler,
    processed: u64,
}

impl Scheduler {
    /// Creates a scheduler around `handler` and the queue that feeds it.
    pub fn new(handler: CommandHandler) -> (Self, RequestQueue) {
        let (tx, rx) = mpsc::unbounded_channel();
        let scheduler = Self {
            rx,
            handler,
            processed: 0,
        };
        (scheduler, RequestQueue { tx })
    }

    /// Creates a scheduler and runs it as a background task.
    ///
    /// The task ends once every `RequestQueue` clone has been dropped and
    /// the queue is drained; it then hands back the `CommandHandler`.
    pub fn spawn(handler: CommandHandler) -> (RequestQueue, JoinHandle<CommandHandler>) {
        let (scheduler, queue) = Self::new(handler);
        let task = tokio::spawn(scheduler.run());
        (queue, task)
    }

    /// Number of requests executed so far.
    pub fn processed(&self) -> u64 {
        self.processed
    }

    /// Drains the queue one request at a time.
    ///
    /// After each request the task yields, so connection I/O gets to run
    /// between executions. Execution itself is synchronous and never
    /// interleaves with another request.
    pub async fn run(mut self) -> CommandHandler {
        info!("Scheduler started");

        while let Some(request) = self.rx.recv().await {
            self.process(request);
            tokio::task::yield_now().await;
        }

        info!(processed = self.processed, "Scheduler stopped");
        self.handler
    }

    /// Executes one request and delivers its response.
    fn process(&mut self, request: Request) {
        let Request {
            client,
            payload,
            respond_to,
        } = request;

        let response = self.handler.handle(&payload);
        self.processed += 1;

        debug!(
            client = %client,
            success = response.success,
            seq = self.processed,
            "Request processed"
        );

        if respond_to.send(response).is_err() {
            debug!(client = %client, "Client gone before response was delivered");
        }
    }
}
