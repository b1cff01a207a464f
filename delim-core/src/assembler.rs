use crate::config::Config;
use crate::cursor::{Cursor, Input, Signal};
use crate::error::{Mismatch, Snapshot};
use crate::record::{Kind, Record};

/// Accumulates field text and closes fields into the record.
///
/// The record doubles as an append-only arena: text is only ever pushed
/// onto it, and rewinding to an earlier cursor truncates it back. The
/// cursor handed to each method must describe the arena as it stands.
#[derive(Debug)]
pub(crate) struct Assembler<'c> {
    config: &'c Config,
    record: Record,
}

impl<'c> Assembler<'c> {
    pub(crate) fn new(config: &'c Config) -> Assembler<'c> {
        Assembler {
            config,
            record: Record::with_capacity(64, config.field_count),
        }
    }

    /// Append `ch` to the pending field, consuming `consumed` bytes of input.
    ///
    /// `consumed` differs from the length of `ch` when an escape character
    /// is dropped on the way.
    pub(crate) fn save(
        &mut self,
        cur: Cursor,
        ch: char,
        consumed: usize,
    ) -> Cursor {
        self.record.push_pending(ch);
        Cursor {
            pos: cur.pos + consumed,
            text_len: self.record.text_len(),
            field_chars: cur.field_chars + 1,
            ..cur
        }
    }

    /// Append `ch` where it stands in the input.
    pub(crate) fn save_char(&mut self, cur: Cursor, ch: char) -> Cursor {
        self.save(cur, ch, ch.len_utf8())
    }

    /// Append `s` where it stands in the input.
    pub(crate) fn save_str(&mut self, cur: Cursor, s: &str) -> Cursor {
        self.record.push_pending_str(s);
        Cursor {
            pos: cur.pos + s.len(),
            text_len: self.record.text_len(),
            field_chars: cur.field_chars + s.chars().count(),
            ..cur
        }
    }

    /// Append `ch`, which follows the escape character `escape`.
    pub(crate) fn save_escaped(
        &mut self,
        cur: Cursor,
        escape: char,
        ch: char,
    ) -> Cursor {
        self.save(cur, ch, escape.len_utf8() + ch.len_utf8())
    }

    /// Close the pending field and move it into the record.
    ///
    /// This fails if the field's validation rule rejects it, or if the
    /// record would not then hold exactly the configured number of fields
    /// (when `last` is true) or strictly fewer (when `last` is false).
    pub(crate) fn close_field(
        &mut self,
        cur: Cursor,
        last: bool,
    ) -> Result<Cursor, Signal> {
        if !self.can_close_field(cur, last) {
            return Err(Signal::Mismatch(Mismatch::CannotClose, cur));
        }
        let kind = {
            let field = self.record.pending();
            if self.config.null_strings.contains(field) {
                Kind::Null
            } else if self.config.empty_strings.contains(field) {
                Kind::Empty
            } else {
                Kind::Text
            }
        };
        self.record.close(kind);
        Ok(Cursor { fields: cur.fields + 1, field_chars: 0, ..cur })
    }

    fn can_close_field(&self, cur: Cursor, last: bool) -> bool {
        let valid = match self.config.rules.get(&cur.fields) {
            None => true,
            Some(rule) => rule(self.record.pending()),
        };
        let count = cur.fields + 1;
        if last {
            valid && count == self.config.field_count
        } else {
            valid && count < self.config.field_count
        }
    }

    /// Fail if the pending field is longer than the configured maximum.
    pub(crate) fn check_field_length(&self, cur: Cursor) -> Result<(), Signal> {
        if cur.field_chars > self.config.max_field_length {
            return Err(Signal::Mismatch(Mismatch::FieldTooLong, cur));
        }
        Ok(())
    }

    /// Put the record back the way it was when `cur` was taken.
    pub(crate) fn rewind(&mut self, cur: Cursor) {
        self.record.rewind(cur.fields, cur.text_len);
    }

    /// Capture the parse state at `cur` for diagnostics.
    pub(crate) fn snapshot(&self, input: &Input, cur: Cursor) -> Snapshot {
        let mut record = self.record.clone();
        record.rewind(cur.fields, cur.text_len);
        let field = record.pending().to_string();
        Snapshot::new(input.buf(), cur.pos, record.closed(), &field)
    }

    pub(crate) fn finish(self) -> Record {
        self.record
    }
}

#[cfg(test)]
mod tests {
    use super::Assembler;
    use crate::config::ParserBuilder;
    use crate::cursor::{Cursor, Signal};
    use crate::error::Mismatch;

    #[test]
    fn null_wins_over_empty() {
        let p = ParserBuilder::new(3)
            .null_string("NA")
            .empty_string("NA")
            .empty_string("-")
            .build()
            .unwrap();
        let mut asm = Assembler::new(p.config());
        let mut cur = Cursor::start(0);
        cur = asm.save_str(cur, "NA");
        cur = asm.close_field(cur, false).unwrap();
        cur = asm.save_str(cur, "-");
        cur = asm.close_field(cur, false).unwrap();
        cur = asm.save_str(cur, "x");
        cur = asm.close_field(cur, true).unwrap();

        assert_eq!(cur.fields, 3);
        assert_eq!(asm.finish(), vec![None, Some(""), Some("x")]);
    }

    #[test]
    fn close_respects_field_count() {
        let p = ParserBuilder::new(2).build().unwrap();
        let mut asm = Assembler::new(p.config());
        let cur = Cursor::start(0);
        assert_eq!(
            Err(Signal::Mismatch(Mismatch::CannotClose, cur)),
            asm.close_field(cur, true)
        );
        let cur = asm.close_field(cur, false).unwrap();
        assert_eq!(
            Err(Signal::Mismatch(Mismatch::CannotClose, cur)),
            asm.close_field(cur, false)
        );
        assert!(asm.close_field(cur, true).is_ok());
    }

    #[test]
    fn close_runs_rules() {
        let p = ParserBuilder::new(1)
            .validate(0, |s| s.chars().all(|c| c.is_ascii_digit()))
            .build()
            .unwrap();
        let mut asm = Assembler::new(p.config());
        let start = Cursor::start(0);
        let cur = asm.save_str(start, "12a");
        assert!(asm.close_field(cur, true).is_err());

        asm.rewind(start);
        let cur = asm.save_str(start, "123");
        assert!(asm.close_field(cur, true).is_ok());
    }

    #[test]
    fn escaped_saves_consume_both() {
        let p = ParserBuilder::new(1).build().unwrap();
        let mut asm = Assembler::new(p.config());
        let cur = asm.save_escaped(Cursor::start(0), '\\', ';');
        assert_eq!(cur.pos, 2);
        assert_eq!(cur.field_chars, 1);
        assert_eq!(cur.text_len, 1);
    }

    #[test]
    fn field_length_boundary() {
        let p = ParserBuilder::new(1).max_field_length(2).build().unwrap();
        let mut asm = Assembler::new(p.config());
        let cur = asm.save_str(Cursor::start(0), "ab");
        assert!(asm.check_field_length(cur).is_ok());
        let cur = asm.save_char(cur, 'c');
        assert_eq!(
            Err(Signal::Mismatch(Mismatch::FieldTooLong, cur)),
            asm.check_field_length(cur)
        );
    }
}
