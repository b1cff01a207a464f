/*!
The `delim` crate reads messy delimited text: exports whose fields hold
unescaped delimiters or linebreaks, whose quotes are only sometimes quotes,
or whose closing quotes went missing.

Every record must have a fixed number of fields. The parser tries the
possible readings of each record in a fixed order and keeps the first one
under which the whole record, including any per field validation rules,
parses. The grammar lives in the `delim-core` crate, which does no I/O. This
crate adds a streaming `Reader` on top of it.

# Example

```
use delim::{ParserBuilder, Reader};

let parser = ParserBuilder::new(3)
    .delimiter(';')
    .quote(Some('"'))
    .allow_unquoted_delimiter(2)
    .build()
    .unwrap();

let data = "\"a;b\";c;d\nx;y;z;w\n";
let mut rdr = Reader::from_reader(&parser, data.as_bytes());

let first = rdr.read_record().unwrap().unwrap();
assert_eq!(first, vec![Some("a;b"), Some("c"), Some("d")]);

let second = rdr.read_record().unwrap().unwrap();
assert_eq!(second, vec![Some("x"), Some("y"), Some("z;w")]);

assert!(rdr.read_record().unwrap().is_none());
```
*/

#![deny(missing_docs)]

pub use delim_core::{
    char_names, resolve_char, ConfigError, Mismatch, Newline, ParseError,
    Parser, ParserBuilder, Record, RecordIter, Rule, Snapshot, Value,
    DEFAULT_MAX_FIELD_LENGTH,
};

#[cfg(feature = "serde")]
pub use crate::dialect::Dialect;
pub use crate::error::{Error, Position, Result};
pub use crate::reader::{Reader, ReaderBuilder, RecordsIntoIter, RecordsIter};

#[cfg(feature = "serde")]
mod dialect;
mod error;
mod reader;
