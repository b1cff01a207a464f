use core::fmt;

use thiserror::Error;

use crate::debug::{Char, Text};
use crate::record::Record;

/// An error raised while configuring a parser.
///
/// Configuration errors are always fatal and always name the offending
/// option.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum ConfigError {
    /// A character option did not resolve to exactly one character.
    #[error(
        "{option} must be a single character or one of {{{names}}}, \
         got {value:?}"
    )]
    InvalidChar {
        /// The option being set, e.g. `delimiter`.
        option: &'static str,
        /// The rejected value, before name resolution.
        value: String,
        /// Every accepted symbolic name, comma separated.
        names: String,
    },
    /// The newline name was not recognized.
    #[error("newline must be one of UNIX, MAC or DOS, got {0:?}")]
    InvalidNewline(String),
    /// A record must have at least one field.
    #[error("field count must be positive")]
    InvalidFieldCount,
    /// A field must be allowed to hold at least one character.
    #[error("maximum field length must be positive")]
    InvalidMaxFieldLength,
    /// Two grammar characters collide, or one of them is a linebreak.
    #[error(
        "{first} and {second} must differ, both are '{}'",
        Char(Some(*.ch))
    )]
    Conflict {
        /// The first colliding option.
        first: &'static str,
        /// The second colliding option.
        second: &'static str,
        /// The character they share.
        ch: char,
    },
}

/// The ways in which input can fail to match the grammar.
///
/// While parsing, these double as backtracking signals: a production that
/// fails with one of these hands control to the next alternative. Only a
/// mismatch that no alternative recovers from is ever returned to callers.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Mismatch {
    /// A field failed validation, or closing it would leave the record with
    /// the wrong number of fields.
    CannotClose,
    /// A quoted field grew beyond the configured maximum length.
    FieldTooLong,
    /// The input ended where more characters were required.
    UnexpectedEndOfInput,
    /// A closing quote was followed by something other than a delimiter, a
    /// linebreak or (with doubled-quote escaping) another quote.
    DataAfterClosingQuote,
    /// A minimally quoted field held a delimiter, linebreak or escape.
    NonMinimalQuoting,
    /// A quote appeared in a field parsed as unclosed.
    QuoteInUnclosedField,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let msg = match *self {
            Mismatch::CannotClose => "can't close field",
            Mismatch::FieldTooLong => "field too long",
            Mismatch::UnexpectedEndOfInput => "unexpected end of input",
            Mismatch::DataAfterClosingQuote => "data after closing quote",
            Mismatch::NonMinimalQuoting => "non-minimal quoting",
            Mismatch::QuoteInUnclosedField => {
                "quote seen while parsing unclosed quoted field"
            }
        };
        f.write_str(msg)
    }
}

/// The number of characters of context kept on either side of a failure.
const CONTEXT: usize = 30;

/// The parse state at the point a signal was raised.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Snapshot {
    index: usize,
    record: Record,
    field: String,
    next: Option<char>,
    before: String,
    after: String,
}

impl Snapshot {
    pub(crate) fn new(
        buf: &str,
        index: usize,
        record: Record,
        field: &str,
    ) -> Snapshot {
        let (head, tail) = buf.split_at(index.min(buf.len()));
        let skip = head.chars().count().saturating_sub(CONTEXT);
        Snapshot {
            index,
            record,
            field: field.to_string(),
            next: tail.chars().next(),
            before: head.chars().skip(skip).collect(),
            after: tail.chars().take(5).collect(),
        }
    }

    /// The byte offset into the buffer at which the signal was raised.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The fields closed before the signal was raised.
    pub fn record(&self) -> &Record {
        &self.record
    }

    /// The text of the field in progress when the signal was raised.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// The character at the failure point, if the buffer held one.
    pub fn next_char(&self) -> Option<char> {
        self.next
    }

    /// Up to 30 characters of input preceding the failure point.
    pub fn before(&self) -> &str {
        &self.before
    }

    /// Up to 5 characters of input starting at the failure point.
    pub fn after(&self) -> &str {
        &self.after
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "({}+'{}': '{}') at byte {}: \"{}>>{}\"",
            self.record.len(),
            Text(&self.field),
            Char(self.next),
            self.index,
            Text(&self.before),
            Text(&self.after),
        )
    }
}

/// A signal that a parse did not produce a record.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum ParseError {
    /// The buffer is incomplete and ended before a record could be decided.
    ///
    /// The caller should append more input to the same buffer and parse
    /// again from the same start index. This is only ever returned when the
    /// buffer was not marked final.
    #[error("need more input {0}")]
    NeedMoreInput(Snapshot),
    /// The input does not match the grammar under any alternative.
    #[error("{kind} {snapshot}")]
    Mismatch {
        /// The last mismatch raised before every alternative ran out.
        kind: Mismatch,
        /// The parse state where that mismatch was raised.
        snapshot: Snapshot,
    },
}

impl ParseError {
    /// Returns true if and only if this asks for more input.
    pub fn is_need_more_input(&self) -> bool {
        match *self {
            ParseError::NeedMoreInput(_) => true,
            ParseError::Mismatch { .. } => false,
        }
    }

    /// The kind of grammar mismatch, if this is one.
    pub fn mismatch(&self) -> Option<Mismatch> {
        match *self {
            ParseError::NeedMoreInput(_) => None,
            ParseError::Mismatch { kind, .. } => Some(kind),
        }
    }

    /// The parse state at the failure point.
    pub fn snapshot(&self) -> &Snapshot {
        match *self {
            ParseError::NeedMoreInput(ref snapshot) => snapshot,
            ParseError::Mismatch { ref snapshot, .. } => snapshot,
        }
    }
}
