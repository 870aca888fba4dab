//! Command Handler Module
//!
//! This module implements the ten linekv commands. It receives raw request
//! lines, parses them, executes them against the store and returns the
//! response to send back to the client.
//!
//! ## Supported Commands
//!
//! - `PUT;key;value` - Set a key (overwrites, any value type)
//! - `PUTLIST;key;"a,b,c"` - Split text on `,` and store the list
//! - `GET;key` - Get a key's value
//! - `GETLIST;key` - Get a key's value, which must be a list
//! - `GETALL` - Snapshot of the whole store as JSON
//! - `INCREMENT;key` - Add one to a numeric value
//! - `APPEND;key;value` - Push a value onto a stored list
//! - `DELETE;key` - Remove a key
//! - `STATS` - Snapshot of the per-command counters as JSON
//! - `EXIT` - Close the issuing connection
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     CommandHandler                          │
//! │                                                             │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐     │
//! │  │   parse()   │───>│  execute()  │───>│   record()  │     │
//! │  └─────────────┘    └─────────────┘    └─────────────┘     │
//! │                            │                  │             │
//! │                            ▼                  ▼             │
//! │                          Store          StatsRegistry       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! `handle()` is the single error boundary of the pipeline: parse errors
//! and command errors both become a `false` response and never escape.

use crate::protocol::{parse_bytes, Command, CommandName, Response};
use crate::storage::{render, StatsRegistry, Store};
use serde_json::{Number, Value};
use thiserror::Error;
use tracing::trace;

/// Output of a successful EXIT
const EXIT_MESSAGE: &str = "Connection closed";

/// Errors raised by command execution.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("ERROR: Key [{key}] not found.")]
    NotFound { key: String },

    #[error("ERROR: Key [{key}] not found and could not be deleted")]
    DeleteMissing { key: String },

    #[error("ERROR: Key [{key}] contains non-list value ([{value}])")]
    NotAList { key: String, value: String },

    #[error("ERROR: Key [{key}] contains non-numeric value ([{value}])")]
    NotNumeric { key: String, value: String },

    #[error("ERROR: PUTLIST value for key [{key}] must be text, got [{value}]")]
    NotText { key: String, value: String },

    #[error("ERROR: Key [{key}] value [{value}] cannot be incremented without overflow")]
    Overflow { key: String, value: String },

    #[error("ERROR: Failed to serialize snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),
}

/// Executes commands against the store it owns.
#[derive(Debug, Default)]
pub struct CommandHandler {
    /// The key-value data
    store: Store,
    /// Per-command outcome counters
    stats: StatsRegistry,
}

impl CommandHandler {
    /// Creates a handler with an empty store and zeroed stats.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn stats(&self) -> &StatsRegistry {
        &self.stats
    }

    /// Handles one raw request: parse, execute, count.
    ///
    /// Always produces a response. Protocol errors that name a known
    /// command are counted as errors for that command; unknown commands
    /// are not counted anywhere.
    pub fn handle(&mut self, payload: &[u8]) -> Response {
        match parse_bytes(payload) {
            Ok(command) => self.handle_command(command),
            Err(e) => {
                if let Some(name) = e.command() {
                    self.stats.record(name, false);
                }
                Response::error(e.to_string())
            }
        }
    }

    /// Executes an already parsed command and counts its outcome.
    pub fn handle_command(&mut self, command: Command) -> Response {
        let name = command.name();

        let response = match self.execute(command) {
            Ok(output) => Response::ok(output),
            Err(e) => Response::error(e.to_string()),
        };

        // EXIT has no counter, record() ignores it
        self.stats.record(name, response.success);
        trace!(command = %name, success = response.success, "Command executed");

        if name == CommandName::Exit {
            response.closing()
        } else {
            response
        }
    }

    /// Executes a command and returns its output text.
    pub fn execute(&mut self, command: Command) -> Result<String, CommandError> {
        match command {
            Command::Put { key, value } => Ok(self.cmd_put(key, value)),
            Command::PutList { key, value } => self.cmd_putlist(key, value),
            Command::Get { key } => self.cmd_get(key),
            Command::GetList { key } => self.cmd_getlist(key),
            Command::GetAll => self.cmd_getall(),
            Command::Increment { key } => self.cmd_increment(key),
            Command::Append { key, value } => self.cmd_append(key, value),
            Command::Delete { key } => self.cmd_delete(key),
            Command::Stats => self.cmd_stats(),
            Command::Exit => Ok(EXIT_MESSAGE.to_string()),
        }
    }

    // ========================================================================
    // Commands
    // ========================================================================

    /// PUT key value
    fn cmd_put(&mut self, key: String, value: Value) -> String {
        let message = format!("Key [{}] set to value [{}]", key, render(&value));
        self.store.set(key, value);
        message
    }

    /// PUTLIST key "a,b,c"
    fn cmd_putlist(&mut self, key: String, value: Value) -> Result<String, CommandError> {
        let text = match value {
            Value::String(text) => text,
            other => {
                return Err(CommandError::NotText {
                    key,
                    value: render(&other),
                })
            }
        };

        let items = text
            .split(',')
            .map(|item| Value::String(item.to_string()))
            .collect();

        Ok(self.cmd_put(key, Value::Array(items)))
    }

    /// GET key
    fn cmd_get(&self, key: String) -> Result<String, CommandError> {
        match self.store.get(&key) {
            Some(value) => Ok(render(value)),
            None => Err(CommandError::NotFound { key }),
        }
    }

    /// GETLIST key
    fn cmd_getlist(&self, key: String) -> Result<String, CommandError> {
        match self.store.get(&key) {
            Some(value) if value.is_array() => Ok(render(value)),
            Some(other) => Err(CommandError::NotAList {
                key,
                value: render(other),
            }),
            None => Err(CommandError::NotFound { key }),
        }
    }

    /// GETALL
    fn cmd_getall(&self) -> Result<String, CommandError> {
        Ok(self.store.snapshot()?)
    }

    /// INCREMENT key
    fn cmd_increment(&mut self, key: String) -> Result<String, CommandError> {
        let number = match self.store.get_mut(&key) {
            Some(Value::Number(number)) => number,
            Some(other) => {
                return Err(CommandError::NotNumeric {
                    key,
                    value: render(other),
                })
            }
            None => return Err(CommandError::NotFound { key }),
        };

        match incremented(number) {
            Some(next) => {
                *number = next;
                Ok(format!("Key [{}] incremented", key))
            }
            None => Err(CommandError::Overflow {
                value: number.to_string(),
                key,
            }),
        }
    }

    /// APPEND key value
    fn cmd_append(&mut self, key: String, value: Value) -> Result<String, CommandError> {
        match self.store.get_mut(&key) {
            Some(Value::Array(items)) => {
                let message = format!("Key [{}] had value [{}] appended", key, render(&value));
                items.push(value);
                Ok(message)
            }
            Some(other) => Err(CommandError::NotAList {
                key,
                value: render(other),
            }),
            None => Err(CommandError::NotFound { key }),
        }
    }

    /// DELETE key
    fn cmd_delete(&mut self, key: String) -> Result<String, CommandError> {
        match self.store.delete(&key) {
            Some(_) => Ok(format!("Key [{}] removed successfully.", key)),
            None => Err(CommandError::DeleteMissing { key }),
        }
    }

    /// STATS
    fn cmd_stats(&self) -> Result<String, CommandError> {
        Ok(self.stats.snapshot()?)
    }
}

/// Adds one to a JSON number, keeping integers integral.
///
/// Returns `None` on integer overflow or a non-finite float result.
fn incremented(number: &Number) -> Option<Number> {
    if let Some(u) = number.as_u64() {
        u.checked_add(1).map(Number::from)
    } else if let Some(i) = number.as_i64() {
        // Only negative integers land here
        Some(Number::from(i + 1))
    } else {
        number.as_f64().and_then(|f| Number::from_f64(f + 1.0))
    }
}
