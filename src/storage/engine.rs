//! Single-Owner Storage Engine
//!
//! This module implements the key-value store behind linekv.
//! Every key maps to a JSON value: text, a number, a list, or any other
//! value the request decoder accepts.
//!
//! ## Ownership Model
//!
//! ```text
//! ┌──────────────┐      ┌──────────────────────────────┐
//! │  Scheduler   │─────>│  CommandHandler              │
//! │ (one task)   │      │   ┌────────────────────────┐ │
//! └──────────────┘      │   │ Store                  │ │
//!                       │   │  BTreeMap<String,Value>│ │
//!                       │   └────────────────────────┘ │
//!                       └──────────────────────────────┘
//! ```
//!
//! The store has no interior locking. It is owned by exactly one
//! `CommandHandler`, which lives inside the scheduler task, so all
//! mutations are applied in queue order by a single writer.

use serde_json::Value;
use std::collections::BTreeMap;

/// The in-memory key-value store.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Store {
    /// Keys are kept ordered so snapshots are deterministic
    data: BTreeMap<String, Value>,
}

impl Store {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key` to `value`, returning the previous value if there was one.
    pub fn set(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.data.insert(key.into(), value)
    }

    /// Returns the value stored at `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Returns a mutable reference to the value stored at `key`.
    ///
    /// Used for in-place mutation (APPEND, INCREMENT).
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.data.get_mut(key)
    }

    /// Removes `key`, returning its value if it existed.
    pub fn delete(&mut self, key: &str) -> Option<Value> {
        self.data.remove(key)
    }

    /// Returns the number of keys.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the store holds no keys.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }


    /// Serializes the entire store as a JSON object.
    pub fn snapshot(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.data)
    }
}

/// Renders a value for human-readable output.
///
/// Text is returned as-is, everything else as compact JSON, so
/// `PUT;k;"hello"` reads back as `hello` and `PUT;k;[1,2]` as `[1,2]`.
/// Text holding a line break is rendered quoted and escaped, keeping the
/// output on a single line.
pub fn render(value: &Value) -> String {
    match value {
        Value::String(s) if !s.contains(['\n', '\r']) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_and_get() {
        let mut store = Store::new();

        assert_eq!(store.set("key", json!("value")), None);
        assert_eq!(store.get("key"), Some(&json!("value")));
    }

    #[test]
    fn test_set_overwrites_with_new_type() {
        let mut store = Store::new();

        store.set("key", json!(5));
        let old = store.set("key", json!(["a", "b"]));

        assert_eq!(old, Some(json!(5)));
        assert_eq!(store.get("key"), Some(&json!(["a", "b"])));
    }

    #[test]
    fn test_delete() {
        let mut store = Store::new();

        store.set("key", json!(1));
        assert_eq!(store.delete("key"), Some(json!(1)));
        assert_eq!(store.get("key"), None);
        assert_eq!(store.delete("key"), None);
    }

    #[test]
    fn test_get_mut_mutates_in_place() {
        let mut store = Store::new();
        store.set("list", json!([1, 2]));

        if let Some(Value::Array(items)) = store.get_mut("list") {
            items.push(json!(3));
        }

        assert_eq!(store.get("list"), Some(&json!([1, 2, 3])));
    }

    #[test]
    fn test_len_and_is_empty() {
        let mut store = Store::new();
        assert!(store.is_empty());

        store.set("a", json!(1));
        store.set("b", json!(2));
        assert_eq!(store.len(), 2);
        assert!(!store.is_empty());
    }

    #[test]
    fn test_snapshot_is_key_ordered() {
        let mut store = Store::new();
        store.set("zeta", json!("z"));
        store.set("alpha", json!([1, "two"]));
        store.set("mid", json!(3.5));

        assert_eq!(
            store.snapshot().unwrap(),
            r#"{"alpha":[1,"two"],"mid":3.5,"zeta":"z"}"#
        );
    }

    #[test]
    fn test_render() {
        assert_eq!(render(&json!("plain text")), "plain text");
        assert_eq!(render(&json!(42)), "42");
        assert_eq!(render(&json!(["a", 1])), r#"["a",1]"#);
        assert_eq!(render(&json!(null)), "null");
    }

    #[test]
    fn test_render_escapes_line_breaks() {
        assert_eq!(render(&json!("a\nfalse")), r#""a\nfalse""#);
        assert_eq!(render(&json!("a\rb")), r#""a\rb""#);
        assert_eq!(render(&json!(["x\ny"])), r#"["x\ny"]"#);
    }
}
