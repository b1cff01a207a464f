/*!
`delim-core` provides a backtracking parser for single records of delimited
text.

The parser is built for messy exports: data where delimiters and linebreaks
show up unquoted inside fields, where a quote is sometimes just a character,
or where a closing quote went missing. Every record is required to have a
fixed number of fields, and that requirement (together with optional per
field validation rules) is what lets the parser decide between the many
possible readings of an ambiguous line.

This crate does no I/O. It parses one record out of a string buffer that may
be incomplete, and tells the caller when it needs more input. The `delim`
crate wraps it in a streaming reader.

# Example

```
use delim_core::{Newline, ParserBuilder};

let parser = ParserBuilder::new(3)
    .delimiter(';')
    .newline(Newline::Unix)
    .allow_unquoted_delimiter(0)
    .build()
    .unwrap();

let (record, end) = parser.parse("a;b;cd;ef\n", 0, false).unwrap();
assert_eq!(record, vec![Some("a;b"), Some("cd"), Some("ef")]);
assert_eq!(end, 10);
```
*/

#![deny(missing_docs)]

pub use crate::config::{Newline, ParserBuilder, Rule, DEFAULT_MAX_FIELD_LENGTH};
pub use crate::error::{ConfigError, Mismatch, ParseError, Snapshot};
pub use crate::names::{char_names, resolve_char};
pub use crate::parser::Parser;
pub use crate::record::{Record, RecordIter, Value};

mod assembler;
mod config;
mod cursor;
mod debug;
mod error;
mod names;
mod parser;
mod record;
