use core::fmt;
use core::iter::FromIterator;
use core::ops;

/// A single closed field value.
///
/// Field text that matches a configured null string closes as `Null`. Field
/// text that matches a configured empty string closes as `Text("")`.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Value<'r> {
    /// The explicit "no value" marker.
    Null,
    /// Field text, with quotes and escapes already removed.
    Text(&'r str),
}

impl<'r> Value<'r> {
    /// Returns the text of this value, or `None` if it is the null marker.
    pub fn as_str(&self) -> Option<&'r str> {
        match *self {
            Value::Null => None,
            Value::Text(s) => Some(s),
        }
    }

    /// Returns true if and only if this is the null marker.
    pub fn is_null(&self) -> bool {
        *self == Value::Null
    }
}

/// How a field was closed.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Kind {
    Text,
    Null,
    Empty,
}

/// A single parsed record.
///
/// All field text is stored contiguously in one buffer. While parsing, the
/// same buffer holds the in-progress field after the last closed field, and
/// the parser rewinds it by truncation when it backtracks.
#[derive(Clone, Default)]
pub struct Record {
    /// All fields in this record, stored contiguously.
    text: String,
    /// The number of and location of each field in this record.
    bounds: Bounds,
}

impl Record {
    /// Create a new empty `Record`.
    pub fn new() -> Record {
        Record::default()
    }

    /// Create a new empty `Record` with room for `capacity` bytes of text.
    pub fn with_capacity(capacity: usize, fields: usize) -> Record {
        Record {
            text: String::with_capacity(capacity),
            bounds: Bounds { ends: Vec::with_capacity(fields) },
        }
    }

    /// Return the field at index `i`.
    ///
    /// If no field at index `i` exists, then this returns `None`.
    pub fn get(&self, i: usize) -> Option<Value> {
        let (range, kind) = self.bounds.get(i)?;
        Some(self.value(range, kind))
    }

    /// Returns true if and only if this record has no fields.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of fields in this record.
    pub fn len(&self) -> usize {
        self.bounds.len()
    }

    /// Returns an iterator over all fields in this record.
    pub fn iter(&self) -> RecordIter {
        RecordIter { r: self, start: 0, i: 0 }
    }

    /// Copy every field out of this record.
    pub fn to_vec(&self) -> Vec<Option<String>> {
        self.iter().map(|v| v.as_str().map(String::from)).collect()
    }

    /// Add a new text field.
    pub fn push_field(&mut self, field: &str) {
        self.truncate_text(self.bounds.end());
        self.text.push_str(field);
        self.close(Kind::Text);
    }

    /// Add a new null field.
    pub fn push_null(&mut self) {
        self.truncate_text(self.bounds.end());
        self.close(Kind::Null);
    }

    fn value(&self, range: ops::Range<usize>, kind: Kind) -> Value {
        match kind {
            Kind::Text => Value::Text(&self.text[range]),
            Kind::Null => Value::Null,
            Kind::Empty => Value::Text(""),
        }
    }

    /// The text accumulated after the last closed field.
    pub(crate) fn pending(&self) -> &str {
        &self.text[self.bounds.end()..]
    }

    /// The total length of stored text, including the pending field.
    pub(crate) fn text_len(&self) -> usize {
        self.text.len()
    }

    pub(crate) fn push_pending(&mut self, ch: char) {
        self.text.push(ch);
    }

    pub(crate) fn push_pending_str(&mut self, s: &str) {
        self.text.push_str(s);
    }

    /// Close the pending text as a new field of the given kind.
    pub(crate) fn close(&mut self, kind: Kind) {
        self.bounds.ends.push(End { pos: self.text.len(), kind });
    }

    /// Forget every field past `fields` and every byte of text past
    /// `text_len`.
    pub(crate) fn rewind(&mut self, fields: usize, text_len: usize) {
        self.bounds.ends.truncate(fields);
        self.truncate_text(text_len);
    }

    /// Return a copy holding only the closed fields.
    pub(crate) fn closed(&self) -> Record {
        let end = self.bounds.end();
        Record {
            text: self.text[..end].to_string(),
            bounds: self.bounds.clone(),
        }
    }

    fn truncate_text(&mut self, len: usize) {
        debug_assert!(len <= self.text.len());
        self.text.truncate(len);
    }
}

/// The bounds of fields in a single record.
#[derive(Clone, Debug, Default)]
struct Bounds {
    /// The ending index of each field, along with how it was closed.
    /// Guaranteed to fall on UTF-8 boundaries.
    ends: Vec<End>,
}

#[derive(Clone, Copy, Debug)]
struct End {
    pos: usize,
    kind: Kind,
}

impl Bounds {
    /// Returns the bounds of field `i`.
    fn get(&self, i: usize) -> Option<(ops::Range<usize>, Kind)> {
        let end = self.ends.get(i)?;
        let start = match i.checked_sub(1).and_then(|i| self.ends.get(i)) {
            None => 0,
            Some(start) => start.pos,
        };
        Some((start..end.pos, end.kind))
    }

    /// Return the last position of the last field.
    ///
    /// If there are no fields, this returns `0`.
    #[inline(always)]
    fn end(&self) -> usize {
        self.ends.last().map(|e| e.pos).unwrap_or(0)
    }

    fn len(&self) -> usize {
        self.ends.len()
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Record) -> bool {
        self.iter().eq(other.iter())
    }
}

impl Eq for Record {}

impl<'a> PartialEq<[Option<&'a str>]> for Record {
    fn eq(&self, other: &[Option<&'a str>]) -> bool {
        self.iter().map(|v| v.as_str()).eq(other.iter().cloned())
    }
}

impl<'a> PartialEq<Vec<Option<&'a str>>> for Record {
    fn eq(&self, other: &Vec<Option<&'a str>>) -> bool {
        self == &other[..]
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_list().entries(self.iter().map(|v| v.as_str())).finish()
    }
}

impl<T: AsRef<str>> FromIterator<Option<T>> for Record {
    fn from_iter<I: IntoIterator<Item = Option<T>>>(iter: I) -> Record {
        let mut record = Record::new();
        for field in iter {
            match field {
                None => record.push_null(),
                Some(text) => record.push_field(text.as_ref()),
            }
        }
        record
    }
}

impl<'a> IntoIterator for &'a Record {
    type IntoIter = RecordIter<'a>;
    type Item = Value<'a>;

    fn into_iter(self) -> RecordIter<'a> {
        self.iter()
    }
}

/// An iterator over the fields in a record.
pub struct RecordIter<'a> {
    r: &'a Record,
    start: usize,
    i: usize,
}

impl<'a> Iterator for RecordIter<'a> {
    type Item = Value<'a>;

    fn next(&mut self) -> Option<Value<'a>> {
        let end = *self.r.bounds.ends.get(self.i)?;
        let value = self.r.value(self.start..end.pos, end.kind);
        self.start = end.pos;
        self.i += 1;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.r.len() - self.i;
        (n, Some(n))
    }
}

impl<'a> ExactSizeIterator for RecordIter<'a> {}

#[cfg(feature = "serde")]
impl serde::Serialize for Record {
    fn serialize<S: serde::Serializer>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeSeq;

        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for value in self {
            seq.serialize_element(&value.as_str())?;
        }
        seq.end()
    }
}

#[cfg(test)]
mod tests {
    use super::{Kind, Record, Value};

    #[test]
    fn record_1() {
        let mut rec = Record::new();
        rec.push_field("foo");

        assert_eq!(rec.len(), 1);
        assert_eq!(rec.get(0), Some(Value::Text("foo")));
        assert_eq!(rec.get(1), None);
    }

    #[test]
    fn empty_record() {
        let rec = Record::new();

        assert!(rec.is_empty());
        assert_eq!(rec.get(0), None);
        assert_eq!(rec.iter().count(), 0);
    }

    #[test]
    fn empty_surround() {
        let rec: Record =
            vec![Some("foo"), Some(""), None, Some("quux")].into_iter().collect();

        assert_eq!(rec.len(), 4);
        assert_eq!(rec.get(0), Some(Value::Text("foo")));
        assert_eq!(rec.get(1), Some(Value::Text("")));
        assert_eq!(rec.get(2), Some(Value::Null));
        assert_eq!(rec.get(3), Some(Value::Text("quux")));
        assert_eq!(rec, vec![Some("foo"), Some(""), None, Some("quux")]);
    }

    #[test]
    fn mapped_kinds_hide_their_text() {
        let mut rec = Record::new();
        rec.push_pending_str("NULL");
        rec.close(Kind::Null);
        rec.push_pending_str("-");
        rec.close(Kind::Empty);
        rec.push_pending_str("x");
        rec.close(Kind::Text);

        assert_eq!(rec, vec![None, Some(""), Some("x")]);
        assert_eq!(rec.to_vec(), vec![None, Some(String::new()), Some("x".into())]);
    }

    #[test]
    fn rewind_restores_pending() {
        let mut rec = Record::new();
        rec.push_pending_str("ab");
        let (fields, text_len) = (rec.len(), rec.text_len());
        rec.push_pending(';');
        rec.push_pending_str("cd");
        rec.close(Kind::Text);
        assert_eq!(rec.pending(), "");

        rec.rewind(fields, text_len);
        assert_eq!(rec.len(), 0);
        assert_eq!(rec.pending(), "ab");
    }

    #[test]
    fn closed_drops_pending() {
        let mut rec = Record::new();
        rec.push_pending_str("a");
        rec.close(Kind::Text);
        rec.push_pending_str("partial");

        let closed = rec.closed();
        assert_eq!(closed, vec![Some("a")]);
        assert_eq!(closed.pending(), "");
    }
}
