//! Request Scheduling Module
//!
//! This module serializes request execution across all connections.
//!
//! - [`RequestQueue`]: cloneable, non-blocking handle used by connections
//! - [`Scheduler`]: the single task that owns the `CommandHandler` and
//!   executes queued requests one at a time, in arrival order
//!
//! ## Example
//!
//! ```ignore
//! use linekv::commands::CommandHandler;
//! use linekv::scheduler::Scheduler;
//!
//! let (queue, _task) = Scheduler::spawn(CommandHandler::new());
//! let response = queue.submit(addr, Bytes::from("GETALL")).await?;
//! assert_eq!(response.output, "{}");
//! ```

pub mod queue;

pub use queue::{PendingResponse, Request, RequestQueue, Scheduler, SchedulerClosed};
