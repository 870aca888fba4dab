//! # linekv - An In-Memory Key-Value Store over a Line Protocol
//!
//! linekv keeps JSON values in memory and serves them to TCP clients
//! speaking a small `;`-separated, newline-terminated text protocol.
//!
//! ## Features
//!
//! - **Line Protocol**: `COMMAND;KEY;VALUE\n` requests, `success;output\n` replies
//! - **JSON Values**: Text, numbers, booleans, null, lists and objects
//! - **Serialized Execution**: One scheduler task applies every request in
//!   arrival order, so the store needs no locks
//! - **Async I/O**: Built on Tokio, one lightweight task per client
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                               linekv                                    │
//! │                                                                         │
//! │  ┌─────────────┐    ┌─────────────┐                                     │
//! │  │ TCP Server  │───>│ Connection  │──┐                                  │
//! │  │ (Listener)  │    │  Handler 1  │  │                                  │
//! │  └──────┬──────┘    └─────────────┘  │   ┌───────────┐   ┌───────────┐  │
//! │         │           ┌─────────────┐  ├──>│  Request  │──>│ Scheduler │  │
//! │         └──────────>│ Connection  │──┘   │   Queue   │   │   task    │  │
//! │                     │  Handler N  │<─────┴───────────┴───┤           │  │
//! │                     └─────────────┘   oneshot responses  └─────┬─────┘  │
//! │                                                                │        │
//! │                                                                ▼        │
//! │                                         ┌───────────────────────────┐   │
//! │                                         │ CommandHandler            │   │
//! │                                         │  Store + StatsRegistry    │   │
//! │                                         └───────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use linekv::Server;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let server = Server::bind("127.0.0.1:50505").await?;
//!     server.run_until_ctrl_c().await
//! }
//! ```
//!
//! ## Supported Commands
//!
//! - `PUT;key;value` / `PUTLIST;key;"a,b,c"`
//! - `GET;key` / `GETLIST;key` / `GETALL`
//! - `INCREMENT;key`
//! - `APPEND;key;value`
//! - `DELETE;key`
//! - `STATS`
//! - `EXIT`
//!
//! ## Module Overview
//!
//! - [`protocol`]: Line framing, request parsing and response encoding
//! - [`storage`]: The key-value store and per-command counters
//! - [`commands`]: Command execution against the store
//! - [`scheduler`]: The request queue and its single consumer
//! - [`connection`]: Client connection management
//! - [`server`]: Listener, accept loop and shutdown

pub mod commands;
pub mod connection;
pub mod protocol;
pub mod scheduler;
pub mod server;
pub mod storage;

// Re-export commonly used types for convenience
pub use commands::{CommandError, CommandHandler};
pub use connection::{handle_connection, ConnectionStats};
pub use protocol::{Command, CommandName, ParseError, Response};
pub use scheduler::{RequestQueue, Scheduler};
pub use server::Server;
pub use storage::{StatsRegistry, Store};

/// The default port linekv listens on
pub const DEFAULT_PORT: u16 = 50505;

/// The default host linekv binds to
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Version of linekv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
