//! Wire Response Type
//!
//! Every request is answered with exactly one line:
//!
//! ```text
//! <success>;<output>\n
//! ```
//!
//! where `<success>` is the literal `true` or `false` and `<output>` is a
//! human-readable message, a rendered value, or a JSON snapshot
//! (GETALL, STATS).
//!
//! ## Examples
//!
//! ```text
//! true;Key [name] set to value [Ariz]
//! false;ERROR: Key [missing] not found.
//! true;{"name":"Ariz"}
//! ```

use bytes::{BufMut, Bytes, BytesMut};
use std::fmt;

/// The outcome of one request, as sent back to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Whether the command succeeded
    pub success: bool,

    /// Message, value or snapshot text
    pub output: String,

    /// Set by EXIT. The connection is closed once this response is flushed.
    /// Not part of the wire format.
    pub close_connection: bool,
}

impl Response {
    /// Creates a successful response.
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
            close_connection: false,
        }
    }

    /// Creates a failed response.
    pub fn error(output: impl Into<String>) -> Self {
        Self {
            success: false,
            output: output.into(),
            close_connection: false,
        }
    }

    /// Marks this response as the last one on its connection.
    pub fn closing(mut self) -> Self {
        self.close_connection = true;
        self
    }

    /// Serializes the response to its wire format.
    ///
    /// # Example
    /// ```
    /// use linekv::protocol::Response;
    /// assert_eq!(&Response::ok("done").encode()[..], b"true;done\n");
    /// ```
    pub fn encode(&self) -> Bytes {
        let success = if self.success { "true" } else { "false" };
        let mut buf = BytesMut::with_capacity(success.len() + self.output.len() + 2);
        buf.put_slice(success.as_bytes());
        buf.put_u8(b';');
        for &byte in self.output.as_bytes() {
            match byte {
                b'\n' => buf.put_slice(b"\\n"),
                b'\r' => buf.put_slice(b"\\r"),
                other => buf.put_u8(other),
            }
        }
        buf.put_u8(b'\n');
        buf.freeze()
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{};{}", self.success, self.output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_success() {
        let response = Response::ok("Key [a] set to value [1]");
        assert_eq!(&response.encode()[..], b"true;Key [a] set to value [1]\n");
    }

    #[test]
    fn test_encode_failure() {
        let response = Response::error("ERROR: Key [a] not found.");
        assert_eq!(&response.encode()[..], b"false;ERROR: Key [a] not found.\n");
    }

    #[test]
    fn test_encode_empty_output() {
        assert_eq!(&Response::ok("").encode()[..], b"true;\n");
    }

    #[test]
    fn test_closing_does_not_change_wire_format() {
        let response = Response::ok("Connection closed").closing();
        assert!(response.close_connection);
        assert_eq!(&response.encode()[..], b"true;Connection closed\n");
    }

    #[test]
    fn test_encode_stays_on_one_line() {
        let response = Response::error("ERROR: Key [a\rb] not found.\nfalse;forged");
        let wire = response.encode();

        assert_eq!(wire.iter().filter(|&&b| b == b'\n').count(), 1);
        assert_eq!(&wire[..], b"false;ERROR: Key [a\\rb] not found.\\nfalse;forged\n");
    }

    #[test]
    fn test_display() {
        assert_eq!(Response::error("nope").to_string(), "false;nope");
    }
}
