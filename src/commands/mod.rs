//! Command Handler Module
//!
//! This module implements the command execution layer for linekv.
//! It receives raw request lines, executes them against the store,
//! records their outcome and returns the response.
//!
//! ## Architecture
//!
//! ```text
//! Client Request
//!       │
//!       ▼
//! ┌─────────────────┐
//! │  Line Parser    │  (protocol module)
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ CommandHandler  │  (this module)
//! │                 │
//! │  - Validate     │
//! │  - Execute      │
//! │  - Count        │
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ Store / Stats   │  (storage module)
//! └─────────────────┘
//! ```
//!
//! ## Supported Commands
//!
//! - `PUT`, `PUTLIST`, `GET`, `GETLIST`, `GETALL`
//! - `INCREMENT`, `APPEND`, `DELETE`
//! - `STATS`, `EXIT`

pub mod handler;

// Re-export the main command handler
pub use handler::{CommandError, CommandHandler};
