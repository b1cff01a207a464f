use std::fmt;
use std::io;
use std::result;

use delim_core::{ConfigError, ParseError};
use thiserror::Error;

/// A type alias for `Result<T, delim::Error>`.
pub type Result<T> = result::Result<T, Error>;

/// An error that can occur when reading delimited data.
#[derive(Debug, Error)]
pub enum Error {
    /// An I/O error that occurred while reading data.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// The input is not valid UTF-8.
    #[error("invalid UTF-8 at byte {byte}")]
    Utf8 {
        /// The offset, from the start of the input, of the first byte that
        /// is not part of a valid UTF-8 sequence.
        byte: u64,
    },
    /// A record could not be parsed.
    ///
    /// This is the grammar mismatch that no alternative recovered from.
    #[error("parse error: {pos}: {err}")]
    Parse {
        /// The position at which the failed record starts.
        pos: Position,
        /// The underlying parse error.
        err: ParseError,
    },
    /// The parser could not be configured.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl Error {
    /// Return the position of the record this error refers to, if any.
    pub fn position(&self) -> Option<&Position> {
        match *self {
            Error::Parse { ref pos, .. } => Some(pos),
            _ => None,
        }
    }

    /// Returns true if this is an I/O error.
    pub fn is_io_error(&self) -> bool {
        match *self {
            Error::Io(_) => true,
            _ => false,
        }
    }
}

/// A position in delimited data.
///
/// A position records the byte offset, line number and record index of the
/// start of a record. Lines are counted with the reader's newline style and
/// start at `1`; records start at `0`.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Position {
    byte: u64,
    line: u64,
    record: u64,
}

impl Position {
    /// Returns a new position initialized to the start value.
    pub fn new() -> Position {
        Position { byte: 0, line: 1, record: 0 }
    }

    /// The byte offset, starting at `0`, of this position.
    pub fn byte(&self) -> u64 {
        self.byte
    }

    /// The line number, starting at `1`, of this position.
    pub fn line(&self) -> u64 {
        self.line
    }

    /// The record index, starting with the first record at `0`.
    pub fn record(&self) -> u64 {
        self.record
    }

    /// Move this position past one record spanning `bytes` bytes and
    /// `lines` linebreaks.
    pub(crate) fn advance(&mut self, bytes: usize, lines: usize) {
        self.byte += bytes as u64;
        self.line += lines as u64;
        self.record += 1;
    }
}

impl Default for Position {
    fn default() -> Position {
        Position::new()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "record {} (byte {}, line {})",
            self.record, self.byte, self.line
        )
    }
}
