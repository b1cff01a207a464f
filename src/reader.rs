use std::cmp;
use std::fs;
use std::io;
use std::mem;
use std::path::Path;
use std::str;

use delim_core::{Newline, ParseError, Parser, Record};
use log::debug;

use crate::error::{Error, Position, Result};

/// The default number of bytes requested from the underlying reader at a
/// time.
const DEFAULT_BUFFER_CAPACITY: usize = 8 * (1 << 10);

/// Builds a streaming reader with various configuration knobs.
///
/// The grammar itself is configured on a `Parser`. This builder only
/// controls how input is pulled from the underlying reader.
#[derive(Debug)]
pub struct ReaderBuilder {
    capacity: usize,
}

impl Default for ReaderBuilder {
    fn default() -> ReaderBuilder {
        ReaderBuilder { capacity: DEFAULT_BUFFER_CAPACITY }
    }
}

impl ReaderBuilder {
    /// Create a new builder.
    pub fn new() -> ReaderBuilder {
        ReaderBuilder::default()
    }

    /// Build a reader that parses records from `rdr` with `parser`.
    pub fn from_reader<R: io::Read>(
        &self,
        parser: &Parser,
        rdr: R,
    ) -> Reader<R> {
        Reader::new(self, parser.clone(), rdr)
    }

    /// Build a reader that parses records from the file at `path` with
    /// `parser`.
    ///
    /// # Errors
    ///
    /// This returns an error if `path` could not be opened.
    pub fn from_path<P: AsRef<Path>>(
        &self,
        parser: &Parser,
        path: P,
    ) -> Result<Reader<fs::File>> {
        Ok(self.from_reader(parser, fs::File::open(path)?))
    }

    /// Set the number of bytes requested from the underlying reader at a
    /// time.
    ///
    /// The buffer grows past this whenever a single record needs more room.
    /// A capacity of zero is treated as one.
    pub fn buffer_capacity(&mut self, capacity: usize) -> &mut ReaderBuilder {
        self.capacity = cmp::max(1, capacity);
        self
    }
}

/// A streaming reader of delimited records.
///
/// The reader keeps one growable text buffer. Each record is parsed from
/// the unconsumed tail of that buffer; when the parser asks for more input,
/// the reader reads more and parses the same record again from its start.
/// The amount read each time is at least the size of the unconsumed text,
/// so a long record costs time linear in its length.
///
/// Input must be UTF-8. A multi-byte sequence split between two reads is
/// carried over to the next read.
#[derive(Debug)]
pub struct Reader<R> {
    parser: Parser,
    rdr: R,
    capacity: usize,
    /// Decoded text. Everything before `start` has been parsed.
    buf: String,
    start: usize,
    /// The offset in the input of the first byte of `buf`.
    offset: u64,
    /// Bytes of an incomplete UTF-8 sequence at the end of the last read.
    partial: Vec<u8>,
    eof: bool,
    pos: Position,
}

impl<R: io::Read> Reader<R> {
    fn new(builder: &ReaderBuilder, parser: Parser, rdr: R) -> Reader<R> {
        Reader {
            parser,
            rdr,
            capacity: builder.capacity,
            buf: String::new(),
            start: 0,
            offset: 0,
            partial: vec![],
            eof: false,
            pos: Position::new(),
        }
    }

    /// Create a new reader with a default configuration.
    pub fn from_reader(parser: &Parser, rdr: R) -> Reader<R> {
        ReaderBuilder::new().from_reader(parser, rdr)
    }

    /// Read a single record.
    ///
    /// This returns `Ok(None)` once all input has been consumed.
    ///
    /// # Errors
    ///
    /// A record that cannot be parsed is returned as `Error::Parse`. The
    /// reader does not move past it, so reading again fails the same way.
    pub fn read_record(&mut self) -> Result<Option<Record>> {
        loop {
            if self.eof && self.start == self.buf.len() {
                return Ok(None);
            }
            match self.parser.parse(&self.buf, self.start, self.eof) {
                Ok((record, end)) => {
                    self.consume(end);
                    return Ok(Some(record));
                }
                Err(ParseError::NeedMoreInput(_)) => self.fill()?,
                Err(err) => {
                    return Err(Error::Parse { pos: self.pos.clone(), err });
                }
            }
        }
    }

    /// Returns a borrowed iterator over all records.
    ///
    /// Iteration stops after the first error.
    pub fn records(&mut self) -> RecordsIter<'_, R> {
        RecordsIter { rdr: self, errored: false }
    }

    /// Returns an owned iterator over all records.
    pub fn into_records(self) -> RecordsIntoIter<R> {
        RecordsIntoIter { rdr: self, errored: false }
    }

    /// Return the position of the next record.
    pub fn position(&self) -> &Position {
        &self.pos
    }

    /// Returns true if and only if every record has been read.
    pub fn is_done(&self) -> bool {
        self.eof && self.start == self.buf.len()
    }

    /// The parser used for every record.
    pub fn parser(&self) -> &Parser {
        &self.parser
    }

    /// Returns a reference to the underlying reader.
    pub fn get_ref(&self) -> &R {
        &self.rdr
    }

    /// Unwraps this reader, returning the underlying reader.
    ///
    /// Any buffered input that has not been parsed is lost.
    pub fn into_inner(self) -> R {
        self.rdr
    }

    fn consume(&mut self, end: usize) {
        let text = &self.buf[self.start..end];
        let lines = match self.parser.newline() {
            Newline::Unix => text.matches('\n').count(),
            Newline::Mac => text.matches('\r').count(),
            Newline::Dos => text.matches("\r\n").count(),
        };
        self.pos.advance(text.len(), lines);
        self.start = end;
    }

    /// Read at least as many bytes as are currently unconsumed (and never
    /// less than the configured capacity), or up to the end of input.
    fn fill(&mut self) -> Result<()> {
        if self.start > 0 {
            self.buf.drain(..self.start);
            self.offset += self.start as u64;
            self.start = 0;
        }
        let want = cmp::max(self.capacity, self.buf.len());
        let mut chunk = mem::take(&mut self.partial);
        let carried = chunk.len();
        chunk.resize(carried + want, 0);
        let mut filled = carried;
        while filled < chunk.len() {
            match self.rdr.read(&mut chunk[filled..]) {
                Ok(0) => {
                    self.eof = true;
                    break;
                }
                Ok(n) => filled += n,
                Err(ref err) if err.kind() == io::ErrorKind::Interrupted => {
                    continue
                }
                Err(err) => return Err(Error::Io(err)),
            }
        }
        chunk.truncate(filled);
        if !self.buf.is_empty() {
            debug!(
                "growing buffer holding {} unconsumed bytes by {}",
                self.buf.len(),
                filled,
            );
        }

        let valid = match str::from_utf8(&chunk) {
            Ok(text) => text.len(),
            Err(err) => {
                // A sequence cut off by the end of the read is completed by
                // the next one.
                if err.error_len().is_some() || self.eof {
                    let at = self.buf.len() + err.valid_up_to();
                    return Err(self.utf8_error(at));
                }
                err.valid_up_to()
            }
        };
        let text = str::from_utf8(&chunk[..valid]).map_err(|err| {
            self.utf8_error(self.buf.len() + err.valid_up_to())
        })?;
        self.buf.push_str(text);
        self.partial = chunk[valid..].to_vec();
        Ok(())
    }

    fn utf8_error(&self, at: usize) -> Error {
        Error::Utf8 { byte: self.offset + at as u64 }
    }
}

/// A borrowed iterator over records.
///
/// The lifetime parameter `'r` refers to the lifetime of the underlying
/// reader.
pub struct RecordsIter<'r, R: 'r> {
    rdr: &'r mut Reader<R>,
    errored: bool,
}

impl<'r, R: io::Read> Iterator for RecordsIter<'r, R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Result<Record>> {
        if self.errored {
            return None;
        }
        let res = self.rdr.read_record().transpose();
        if let Some(Err(_)) = res {
            self.errored = true;
        }
        res
    }
}

/// An owned iterator over records.
pub struct RecordsIntoIter<R> {
    rdr: Reader<R>,
    errored: bool,
}

impl<R> RecordsIntoIter<R> {
    /// Return a reference to the underlying reader.
    pub fn reader(&self) -> &Reader<R> {
        &self.rdr
    }

    /// Drop this iterator and return the underlying reader.
    pub fn into_reader(self) -> Reader<R> {
        self.rdr
    }
}

impl<R: io::Read> Iterator for RecordsIntoIter<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Result<Record>> {
        if self.errored {
            return None;
        }
        let res = self.rdr.read_record().transpose();
        if let Some(Err(_)) = res {
            self.errored = true;
        }
        res
    }
}
