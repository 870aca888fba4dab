//! Storage Module
//!
//! This module holds the state the request pipeline operates on:
//! the key-value `Store` and the per-command `StatsRegistry`.
//!
//! Neither type does any locking. Both are owned by the scheduler's
//! `CommandHandler`, which applies requests one at a time.
//!
//! ## Example
//!
//! ```
//! use linekv::storage::{Store, StatsRegistry};
//! use linekv::protocol::CommandName;
//! use serde_json::json;
//!
//! let mut store = Store::new();
//! store.set("name", json!("Ariz"));
//! assert_eq!(store.get("name"), Some(&json!("Ariz")));
//!
//! let mut stats = StatsRegistry::new();
//! stats.record(CommandName::Put, true);
//! assert_eq!(stats.get(CommandName::Put).unwrap().success, 1);
//! ```

pub mod engine;
pub mod stats;

// Re-export commonly used types
pub use engine::{render, Store};
pub use stats::{Counter, StatsRegistry};
