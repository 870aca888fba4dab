//! Line Protocol Implementation
//!
//! This module implements the text protocol spoken by linekv clients.
//!
//! ## Overview
//!
//! A request is a single `\n`-terminated line of `;`-separated fields:
//! `COMMAND[;KEY[;VALUE]]`. A response is a single line
//! `SUCCESS;OUTPUT`.
//!
//! ## Modules
//!
//! - `parser`: Line framing and request parsing into `Command`s
//! - `types`: The `Response` type and its wire encoding
//!
//! ## Example
//!
//! ```
//! use linekv::protocol::{parse_request, Command, Response};
//! use serde_json::json;
//!
//! let command = parse_request("PUT;name;\"Ariz\"").unwrap();
//! assert_eq!(command, Command::Put { key: "name".into(), value: json!("Ariz") });
//!
//! let bytes = Response::ok("done").encode();
//! assert_eq!(&bytes[..], b"true;done\n");
//! ```

pub mod parser;
pub mod types;

// Re-export commonly used types for convenience
pub use parser::{
    is_blank, next_frame, parse_bytes, parse_request, Command, CommandName, ParseError,
    ParseResult, MAX_LINE_LENGTH,
};
pub use types::Response;
