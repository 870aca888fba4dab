//! Per-Command Outcome Counters
//!
//! Every completed request bumps exactly one counter: `success` or `error`
//! for the command it named. EXIT is not tracked.
//!
//! The registry is serialized for the STATS command as a JSON object in a
//! fixed command order:
//!
//! ```text
//! {"PUT":{"success":2,"error":0},"PUTLIST":{"success":0,"error":0},...}
//! ```

use crate::protocol::CommandName;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Success and error counts for one command.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Counter {
    pub success: u64,
    pub error: u64,
}

/// Counters for all tracked commands, initialized to zero.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StatsRegistry {
    counters: [Counter; CommandName::TRACKED.len()],
}

impl StatsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one outcome for `name`.
    ///
    /// Returns false (and records nothing) for untracked commands.
    pub fn record(&mut self, name: CommandName, success: bool) -> bool {
        let Some(counter) = self.slot_mut(name) else {
            return false;
        };

        if success {
            counter.success += 1;
        } else {
            counter.error += 1;
        }
        true
    }

    /// Returns the counters for `name`, or `None` if it is not tracked.
    pub fn get(&self, name: CommandName) -> Option<Counter> {
        Self::index_of(name).map(|i| self.counters[i])
    }

    /// Total number of recorded outcomes across all commands.
    pub fn total(&self) -> u64 {
        self.counters.iter().map(|c| c.success + c.error).sum()
    }

    /// Serializes the registry as a JSON object.
    pub fn snapshot(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    fn slot_mut(&mut self, name: CommandName) -> Option<&mut Counter> {
        let index = Self::index_of(name)?;
        Some(&mut self.counters[index])
    }

    fn index_of(name: CommandName) -> Option<usize> {
        CommandName::TRACKED.iter().position(|tracked| *tracked == name)
    }
}

impl Serialize for StatsRegistry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.counters.len()))?;
        for (name, counter) in CommandName::TRACKED.iter().zip(self.counters.iter()) {
            map.serialize_entry(name.as_str(), counter)?;
        }
        map.end()
    }
}
