use crate::error::Mismatch;

/// A failure raised by a transition.
///
/// `NeedMoreInput` is never caught inside the grammar: no alternative can be
/// decided while the input it depends on is still missing. A `Mismatch` is
/// caught by the most recent choice point, which resumes its next
/// alternative.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Signal {
    NeedMoreInput(Cursor),
    Mismatch(Mismatch, Cursor),
}

/// A position in a parse.
///
/// This is a plain value: every transition takes a cursor and produces a new
/// one. Besides the read position it records the shape of the record being
/// assembled, so that a saved cursor is all that is needed to rewind the
/// record to the moment the cursor was taken.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct Cursor {
    /// Byte offset of the next unread character.
    pub(crate) pos: usize,
    /// The number of closed fields, which is also the index of the field
    /// being assembled.
    pub(crate) fields: usize,
    /// The length in bytes of all assembled text, closed and pending.
    pub(crate) text_len: usize,
    /// The length in characters of the pending field.
    pub(crate) field_chars: usize,
}

impl Cursor {
    pub(crate) fn start(pos: usize) -> Cursor {
        Cursor { pos, fields: 0, text_len: 0, field_chars: 0 }
    }

    /// Move past `ch` without keeping it.
    pub(crate) fn skip(self, ch: char) -> Cursor {
        Cursor { pos: self.pos + ch.len_utf8(), ..self }
    }
}

/// A view over a possibly incomplete buffer.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Input<'a> {
    buf: &'a str,
    /// True if the buffer holds all remaining input.
    is_final: bool,
}

impl<'a> Input<'a> {
    pub(crate) fn new(buf: &'a str, is_final: bool) -> Input<'a> {
        Input { buf, is_final }
    }

    pub(crate) fn buf(&self) -> &'a str {
        self.buf
    }

    /// Return the character `lookahead` characters past the cursor.
    ///
    /// Running off the end of the buffer is `NeedMoreInput` if more input
    /// may still arrive, and an `UnexpectedEndOfInput` mismatch otherwise.
    pub(crate) fn peek(
        &self,
        cur: Cursor,
        lookahead: usize,
    ) -> Result<char, Signal> {
        match self.rest(cur).chars().nth(lookahead) {
            Some(ch) => Ok(ch),
            None if self.is_final => {
                Err(Signal::Mismatch(Mismatch::UnexpectedEndOfInput, cur))
            }
            None => Err(Signal::NeedMoreInput(cur)),
        }
    }

    /// Returns true if and only if the buffer is final and holds nothing at
    /// `lookahead` characters past the cursor.
    pub(crate) fn at_end(&self, cur: Cursor, lookahead: usize) -> bool {
        self.is_final && self.rest(cur).chars().nth(lookahead).is_none()
    }

    fn rest(&self, cur: Cursor) -> &'a str {
        self.buf.get(cur.pos..).unwrap_or("")
    }
}
