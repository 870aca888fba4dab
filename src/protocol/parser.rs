//! Request Line Parser
//!
//! This module turns raw request lines into validated [`Command`]s.
//!
//! ## Request Format
//!
//! ```text
//! COMMAND[;KEY[;VALUE]]\n
//! ```
//!
//! - The command name is case-insensitive and normalized to uppercase.
//! - `VALUE` is a JSON literal: `"text"`, `42`, `1.5`, `[1,"two"]`, ...
//! - Fields are separated by `;`, so a value cannot itself contain `;`.
//!
//! ## Framing
//!
//! Requests are newline-terminated. [`next_frame`] pulls one complete line
//! out of a connection's read buffer and leaves partial data in place, so
//! the caller can:
//! 1. Append incoming network data to a buffer
//! 2. Call `next_frame()` until it returns `Ok(None)`
//! 3. Parse each line with [`parse_bytes`]
//! 4. Read more data and repeat

use bytes::{Bytes, BytesMut};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Request field separator
pub const FIELD_SEPARATOR: char = ';';

/// Request line terminator
pub const LINE_TERMINATOR: u8 = b'\n';

/// Maximum length of a single request line (64 KB)
pub const MAX_LINE_LENGTH: usize = 64 * 1024;

/// Errors that can occur while framing or parsing a request.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    /// The command name is not one of the supported commands
    #[error("ERROR: Invalid command [{0}]")]
    CommandNotValid(String),

    /// The request has the wrong number of `;`-separated fields
    #[error("ERROR: Wrong number of arguments for {command} (expected {expected}, got {actual})")]
    WrongNumberOfArguments {
        command: CommandName,
        expected: usize,
        actual: usize,
    },

    /// The value field is not a valid JSON literal
    #[error("ERROR: Malformed value for {command}: {reason}")]
    InvalidValue { command: CommandName, reason: String },

    /// The request bytes are not UTF-8
    #[error("ERROR: Request is not valid UTF-8")]
    InvalidUtf8,

    /// A line exceeded the framing limit before its terminator arrived
    #[error("ERROR: Request too large: {size} bytes (max: {max})")]
    MessageTooLarge { size: usize, max: usize },
}

impl ParseError {
    /// The known command this error belongs to, if any.
    ///
    /// Used to charge protocol errors to the right stats counter.
    pub fn command(&self) -> Option<CommandName> {
        match self {
            ParseError::WrongNumberOfArguments { command, .. }
            | ParseError::InvalidValue { command, .. } => Some(*command),
            ParseError::CommandNotValid(_)
            | ParseError::InvalidUtf8
            | ParseError::MessageTooLarge { .. } => None,
        }
    }
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// The names of all supported commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandName {
    Put,
    PutList,
    Get,
    GetList,
    GetAll,
    Increment,
    Append,
    Delete,
    Stats,
    Exit,
}

impl CommandName {
    /// Every supported command.
    pub const ALL: [CommandName; 10] = [
        CommandName::Put,
        CommandName::PutList,
        CommandName::Get,
        CommandName::GetList,
        CommandName::GetAll,
        CommandName::Increment,
        CommandName::Append,
        CommandName::Delete,
        CommandName::Stats,
        CommandName::Exit,
    ];

    /// Commands with stats counters, in STATS output order.
    pub const TRACKED: [CommandName; 9] = [
        CommandName::Put,
        CommandName::PutList,
        CommandName::Get,
        CommandName::GetList,
        CommandName::GetAll,
        CommandName::Increment,
        CommandName::Append,
        CommandName::Delete,
        CommandName::Stats,
    ];

    /// The wire name of the command.
    pub fn as_str(self) -> &'static str {
        match self {
            CommandName::Put => "PUT",
            CommandName::PutList => "PUTLIST",
            CommandName::Get => "GET",
            CommandName::GetList => "GETLIST",
            CommandName::GetAll => "GETALL",
            CommandName::Increment => "INCREMENT",
            CommandName::Append => "APPEND",
            CommandName::Delete => "DELETE",
            CommandName::Stats => "STATS",
            CommandName::Exit => "EXIT",
        }
    }

    /// Looks up an uppercase wire name.
    pub fn lookup(name: &str) -> Option<CommandName> {
        CommandName::ALL
            .into_iter()
            .find(|command| command.as_str() == name)
    }

    /// Number of fields a request for this command must have,
    /// counting the command name itself.
    pub fn arity(self) -> usize {
        match self {
            CommandName::Stats | CommandName::GetAll | CommandName::Exit => 1,
            CommandName::Get
            | CommandName::GetList
            | CommandName::Increment
            | CommandName::Delete => 2,
            CommandName::Put | CommandName::PutList | CommandName::Append => 3,
        }
    }
}

impl fmt::Display for CommandName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated request.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Put { key: String, value: Value },
    PutList { key: String, value: Value },
    Get { key: String },
    GetList { key: String },
    GetAll,
    Increment { key: String },
    Append { key: String, value: Value },
    Delete { key: String },
    Stats,
    Exit,
}

impl Command {
    /// Returns the name of this command.
    pub fn name(&self) -> CommandName {
        match self {
            Command::Put { .. } => CommandName::Put,
            Command::PutList { .. } => CommandName::PutList,
            Command::Get { .. } => CommandName::Get,
            Command::GetList { .. } => CommandName::GetList,
            Command::GetAll => CommandName::GetAll,
            Command::Increment { .. } => CommandName::Increment,
            Command::Append { .. } => CommandName::Append,
            Command::Delete { .. } => CommandName::Delete,
            Command::Stats => CommandName::Stats,
            Command::Exit => CommandName::Exit,
        }
    }
}

/// Parses a raw request payload.
pub fn parse_bytes(payload: &[u8]) -> ParseResult<Command> {
    let line = std::str::from_utf8(payload).map_err(|_| ParseError::InvalidUtf8)?;
    parse_request(line)
}

/// Parses one request line into a [`Command`].
///
/// Surrounding whitespace is trimmed, the line is split on `;` and the
/// first field is uppercased as the command name. The arity is checked
/// before the value field is decoded.
pub fn parse_request(line: &str) -> ParseResult<Command> {
    let fields: Vec<&str> = line.trim().split(FIELD_SEPARATOR).collect();
    let raw_name = fields[0].to_uppercase();

    let name = CommandName::lookup(&raw_name).ok_or(ParseError::CommandNotValid(raw_name))?;

    if fields.len() != name.arity() {
        return Err(ParseError::WrongNumberOfArguments {
            command: name,
            expected: name.arity(),
            actual: fields.len(),
        });
    }

    let key = || fields[1].to_string();

    let command = match name {
        CommandName::Put => Command::Put {
            key: key(),
            value: decode_value(name, fields[2])?,
        },
        CommandName::PutList => Command::PutList {
            key: key(),
            value: decode_value(name, fields[2])?,
        },
        CommandName::Append => Command::Append {
            key: key(),
            value: decode_value(name, fields[2])?,
        },
        CommandName::Get => Command::Get { key: key() },
        CommandName::GetList => Command::GetList { key: key() },
        CommandName::Increment => Command::Increment { key: key() },
        CommandName::Delete => Command::Delete { key: key() },
        CommandName::GetAll => Command::GetAll,
        CommandName::Stats => Command::Stats,
        CommandName::Exit => Command::Exit,
    };

    Ok(command)
}

/// Decodes a JSON literal value field.
fn decode_value(command: CommandName, raw: &str) -> ParseResult<Value> {
    serde_json::from_str(raw).map_err(|e| ParseError::InvalidValue {
        command,
        reason: e.to_string(),
    })
}

/// Splits the next complete line off the front of `buf`.
///
/// # Returns
///
/// - `Ok(Some(line))` - A complete line, without its terminator
/// - `Ok(None)` - No terminator yet, need more bytes
/// - `Err(e)` - The buffered line exceeds [`MAX_LINE_LENGTH`]
pub fn next_frame(buf: &mut BytesMut) -> ParseResult<Option<Bytes>> {
    match buf.iter().position(|&b| b == LINE_TERMINATOR) {
        Some(pos) if pos > MAX_LINE_LENGTH => Err(ParseError::MessageTooLarge {
            size: pos,
            max: MAX_LINE_LENGTH,
        }),
        Some(pos) => {
            let line = buf.split_to(pos + 1).freeze();
            Ok(Some(line.slice(..pos)))
        }
        None if buf.len() > MAX_LINE_LENGTH => Err(ParseError::MessageTooLarge {
            size: buf.len(),
            max: MAX_LINE_LENGTH,
        }),
        None => Ok(None),
    }
}

/// Returns true if a line holds nothing but whitespace.
pub fn is_blank(line: &[u8]) -> bool {
    line.iter().all(u8::is_ascii_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_put() {
        let command = parse_request("PUT;name;\"Ariz\"").unwrap();
        assert_eq!(
            command,
            Command::Put {
                key: "name".to_string(),
                value: json!("Ariz"),
            }
        );
    }

    #[test]
    fn test_parse_decodes_numbers_and_lists() {
        let command = parse_request("PUT;n;5").unwrap();
        assert_eq!(
            command,
            Command::Put {
                key: "n".to_string(),
                value: json!(5),
            }
        );

        let command = parse_request("APPEND;list;[1, \"two\", [3]]").unwrap();
        assert_eq!(
            command,
            Command::Append {
                key: "list".to_string(),
                value: json!([1, "two", [3]]),
            }
        );
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(parse_request("stats").unwrap(), Command::Stats);
        assert_eq!(
            parse_request("getList;k").unwrap(),
            Command::GetList {
                key: "k".to_string()
            }
        );
    }

    #[test]
    fn test_parse_trims_surrounding_whitespace() {
        assert_eq!(parse_request("  GETALL \r\n").unwrap(), Command::GetAll);
        assert_eq!(
            parse_request("\tDELETE;k\r").unwrap(),
            Command::Delete {
                key: "k".to_string()
            }
        );
    }

    #[test]
    fn test_parse_key_only_commands() {
        assert_eq!(
            parse_request("INCREMENT;counter").unwrap(),
            Command::Increment {
                key: "counter".to_string()
            }
        );
        assert_eq!(
            parse_request("GET;a key").unwrap(),
            Command::Get {
                key: "a key".to_string()
            }
        );
    }

    #[test]
    fn test_parse_unknown_command() {
        let err = parse_request("FROB;k").unwrap_err();
        assert_eq!(err, ParseError::CommandNotValid("FROB".to_string()));
        assert_eq!(err.command(), None);
    }

    #[test]
    fn test_parse_wrong_number_of_arguments() {
        let err = parse_request("PUT;k").unwrap_err();
        assert_eq!(
            err,
            ParseError::WrongNumberOfArguments {
                command: CommandName::Put,
                expected: 3,
                actual: 2,
            }
        );
        assert_eq!(err.command(), Some(CommandName::Put));

        assert!(matches!(
            parse_request("STATS;extra"),
            Err(ParseError::WrongNumberOfArguments { .. })
        ));
        assert!(matches!(
            parse_request("GET"),
            Err(ParseError::WrongNumberOfArguments { .. })
        ));
        assert!(matches!(
            parse_request("EXIT;now"),
            Err(ParseError::WrongNumberOfArguments { .. })
        ));
    }

    #[test]
    fn test_arity_is_checked_before_decoding() {
        // The extra field wins over the malformed value
        assert!(matches!(
            parse_request("PUT;k;not json;more"),
            Err(ParseError::WrongNumberOfArguments { .. })
        ));
    }

    #[test]
    fn test_parse_malformed_value() {
        let err = parse_request("PUT;k;not json").unwrap_err();
        assert!(matches!(
            err,
            ParseError::InvalidValue {
                command: CommandName::Put,
                ..
            }
        ));
        assert_eq!(err.command(), Some(CommandName::Put));

        assert!(matches!(
            parse_request("APPEND;k;"),
            Err(ParseError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_parse_bytes_rejects_invalid_utf8() {
        assert_eq!(parse_bytes(b"GET;\xff\xfe"), Err(ParseError::InvalidUtf8));
        assert_eq!(parse_bytes(b"GETALL"), Ok(Command::GetAll));
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            parse_request("nope").unwrap_err().to_string(),
            "ERROR: Invalid command [NOPE]"
        );
        assert_eq!(
            parse_request("DELETE").unwrap_err().to_string(),
            "ERROR: Wrong number of arguments for DELETE (expected 2, got 1)"
        );
    }

    #[test]
    fn test_command_name_roundtrip() {
        for name in CommandName::ALL {
            assert_eq!(CommandName::lookup(name.as_str()), Some(name));
        }
        assert_eq!(CommandName::lookup("put"), None);
        assert!(!CommandName::TRACKED.contains(&CommandName::Exit));
    }

    #[test]
    fn test_next_frame_complete_lines() {
        let mut buf = BytesMut::from(&b"GET;a\nGET;b\r\nGET"[..]);

        assert_eq!(next_frame(&mut buf).unwrap(), Some(Bytes::from("GET;a")));
        assert_eq!(next_frame(&mut buf).unwrap(), Some(Bytes::from("GET;b\r")));
        assert_eq!(next_frame(&mut buf).unwrap(), None);
        assert_eq!(&buf[..], b"GET");
    }

    #[test]
    fn test_next_frame_incomplete() {
        let mut buf = BytesMut::from(&b"PUT;k;\"partial"[..]);
        assert_eq!(next_frame(&mut buf).unwrap(), None);

        buf.extend_from_slice(b" value\"\n");
        assert_eq!(
            next_frame(&mut buf).unwrap(),
            Some(Bytes::from("PUT;k;\"partial value\""))
        );
        assert!(buf.is_empty());
    }

    #[test]
    fn test_next_frame_too_large() {
        let mut buf = BytesMut::from(vec![b'a'; MAX_LINE_LENGTH + 1].as_slice());
        assert!(matches!(
            next_frame(&mut buf),
            Err(ParseError::MessageTooLarge { .. })
        ));
    }

    #[test]
    fn test_is_blank() {
        assert!(is_blank(b""));
        assert!(is_blank(b" \r\t"));
        assert!(!is_blank(b" STATS "));
    }
}
