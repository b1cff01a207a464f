use std::sync::Arc;

use log::{debug, trace};

use crate::assembler::Assembler;
use crate::config::{Config, Newline, ParserBuilder, CR, LF, SPACE};
use crate::cursor::{Cursor, Input, Signal};
use crate::error::{Mismatch, ParseError};
use crate::record::Record;

/// A parser for single records of delimited text.
///
/// The parser implements a backtracking grammar. The same characters can
/// often be read several ways (a leading quote may open a quoted field, a
/// minimally quoted field, an unclosed quoted field, or be plain text), and
/// the parser commits to the first reading under which the whole record
/// parses.
///
/// Buffers may be incomplete. When a parse cannot be decided without input
/// that has not arrived yet, it fails with `ParseError::NeedMoreInput`; the
/// caller grows the buffer and parses again from the same start index.
/// Nothing is carried over between the two calls.
///
/// A `Parser` never changes after it is built, so one parser may be shared
/// by any number of threads parsing independent buffers.
#[derive(Clone, Debug)]
pub struct Parser {
    config: Arc<Config>,
}

impl Parser {
    pub(crate) fn new(config: Config) -> Parser {
        Parser { config: Arc::new(config) }
    }

    /// Shorthand for `ParserBuilder::new(field_count)`.
    pub fn builder(field_count: usize) -> ParserBuilder {
        ParserBuilder::new(field_count)
    }

    pub(crate) fn config(&self) -> &Config {
        &self.config
    }

    /// The exact number of fields in every record.
    pub fn field_count(&self) -> usize {
        self.config.field_count
    }

    /// The field delimiter.
    pub fn delimiter(&self) -> char {
        self.config.delimiter
    }

    /// The quote character, if quoting is enabled.
    pub fn quote(&self) -> Option<char> {
        self.config.quote
    }

    /// The escape character, if any.
    pub fn escape(&self) -> Option<char> {
        self.config.escape
    }

    /// The record terminator.
    pub fn newline(&self) -> Newline {
        self.config.newline
    }

    /// Parse one record from `buf`, starting at byte offset `start`.
    ///
    /// `is_final` says whether `buf` holds all remaining input. On success,
    /// this returns the record along with the byte offset just past it.
    ///
    /// # Errors
    ///
    /// `ParseError::NeedMoreInput` is only returned when `is_final` is
    /// false. `ParseError::Mismatch` is returned when the input cannot be
    /// read as a record under any alternative.
    ///
    /// # Panics
    ///
    /// This panics if `start` is past the end of `buf` or does not fall on
    /// a character boundary.
    pub fn parse(
        &self,
        buf: &str,
        start: usize,
        is_final: bool,
    ) -> Result<(Record, usize), ParseError> {
        assert!(
            buf.is_char_boundary(start),
            "start index {} is not a character boundary of the buffer",
            start,
        );
        let machine = Machine::new(&self.config, Input::new(buf, is_final));
        machine.run(Cursor::start(start), Step::StartField)
    }
}

/// The states of the grammar.
///
/// Each state is a function from a cursor to either the next cursor and
/// state, or a signal. Some states exist only as resumption points for
/// choice points, where a fallback needs to do something before rejoining
/// the grammar.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Step {
    StartField,
    InUnquotedField,
    DelimiterInUnquotedField,
    /// Fallback for a delimiter that could be kept as text: end the field.
    EndFieldAtDelimiter,
    SingleCharLinebreakInUnquotedField,
    CrInUnquotedField,
    OpeningQuote,
    InMinimallyQuotedField,
    InQuotedField,
    QuoteInQuotedField,
    InUnclosedQuotedField,
    /// Fallback for a delimiter or linebreak in an unclosed quoted field
    /// that did not end it: keep it as text.
    SaveInUnclosedQuotedField,
    /// Fallback after every quoted reading failed: the quote is text.
    AbandonQuoting,
    Emit,
}

/// A saved alternative, resumed when everything after it fails.
#[derive(Clone, Copy, Debug)]
struct Choice {
    cur: Cursor,
    step: Step,
}

enum Next {
    Step(Cursor, Step),
    Done(Cursor),
}

type Transition = Result<Next, Signal>;

fn goto(cur: Cursor, step: Step) -> Transition {
    Ok(Next::Step(cur, step))
}

fn mismatch(kind: Mismatch, cur: Cursor) -> Transition {
    Err(Signal::Mismatch(kind, cur))
}

/// A single parse in progress.
///
/// The grammar's states are mutually recursive, but the machine runs them
/// as a loop over `Step` values, so native stack use does not grow with
/// the input. Choice points push their fallbacks onto `choices`; a mismatch
/// pops the most recent one, rewinds the record and resumes there.
struct Machine<'c, 'a> {
    config: &'c Config,
    input: Input<'a>,
    asm: Assembler<'c>,
    choices: Vec<Choice>,
}

impl<'c, 'a> Machine<'c, 'a> {
    fn new(config: &'c Config, input: Input<'a>) -> Machine<'c, 'a> {
        Machine { config, input, asm: Assembler::new(config), choices: vec![] }
    }

    fn run(
        mut self,
        mut cur: Cursor,
        mut step: Step,
    ) -> Result<(Record, usize), ParseError> {
        loop {
            let next = match step {
                Step::StartField => self.start_field(cur),
                Step::InUnquotedField => self.in_unquoted_field(cur),
                Step::DelimiterInUnquotedField => {
                    self.delimiter_in_unquoted_field(cur)
                }
                Step::EndFieldAtDelimiter => self.end_field_at_delimiter(cur),
                Step::SingleCharLinebreakInUnquotedField => {
                    self.single_char_linebreak_in_unquoted_field(cur)
                }
                Step::CrInUnquotedField => self.cr_in_unquoted_field(cur),
                Step::OpeningQuote => self.opening_quote(cur),
                Step::InMinimallyQuotedField => {
                    self.in_minimally_quoted_field(cur)
                }
                Step::InQuotedField => self.in_quoted_field(cur),
                Step::QuoteInQuotedField => self.quote_in_quoted_field(cur),
                Step::InUnclosedQuotedField => {
                    self.in_unclosed_quoted_field(cur)
                }
                Step::SaveInUnclosedQuotedField => {
                    self.save_in_unclosed_quoted_field(cur)
                }
                Step::AbandonQuoting => self.abandon_quoting(cur),
                Step::Emit => self.emit(cur),
            };
            match next {
                Ok(Next::Step(c, s)) => {
                    cur = c;
                    step = s;
                }
                Ok(Next::Done(end)) => {
                    return Ok((self.asm.finish(), end.pos));
                }
                Err(Signal::NeedMoreInput(at)) => {
                    let snapshot = self.asm.snapshot(&self.input, at);
                    return Err(ParseError::NeedMoreInput(snapshot));
                }
                Err(Signal::Mismatch(kind, at)) => match self.choices.pop() {
                    Some(choice) => {
                        trace!(
                            "{} at byte {}, resuming {:?} at byte {}",
                            kind,
                            at.pos,
                            choice.step,
                            choice.cur.pos,
                        );
                        self.asm.rewind(choice.cur);
                        cur = choice.cur;
                        step = choice.step;
                    }
                    None => {
                        let snapshot = self.asm.snapshot(&self.input, at);
                        return Err(ParseError::Mismatch { kind, snapshot });
                    }
                },
            }
        }
    }

    /// Try `step` at `cur` if everything after the current path fails.
    fn fallback(&mut self, cur: Cursor, step: Step) {
        self.choices.push(Choice { cur, step });
    }

    fn peek(&self, cur: Cursor, lookahead: usize) -> Result<char, Signal> {
        self.input.peek(cur, lookahead)
    }

    /// Peek at the cursor, reading the end of input as `None` unless the
    /// parser is strict.
    fn peek_or_end(&self, cur: Cursor) -> Result<Option<char>, Signal> {
        match self.peek(cur, 0) {
            Ok(ch) => Ok(Some(ch)),
            Err(Signal::Mismatch(..)) if !self.config.strict => Ok(None),
            Err(sig) => Err(sig),
        }
    }

    fn start_field(&mut self, cur: Cursor) -> Transition {
        let ch = match self.peek_or_end(cur)? {
            None => return goto(cur, Step::Emit),
            Some(ch) => ch,
        };
        if ch == SPACE {
            let cur = if self.config.skip_initial_space {
                cur.skip(ch)
            } else {
                self.asm.save_char(cur, ch)
            };
            goto(cur, Step::StartField)
        } else if self.config.is_quote(ch) {
            goto(cur, Step::OpeningQuote)
        } else {
            goto(cur, Step::InUnquotedField)
        }
    }

    fn in_unquoted_field(&mut self, cur: Cursor) -> Transition {
        let ch = match self.peek_or_end(cur)? {
            None => return goto(cur, Step::Emit),
            Some(ch) => ch,
        };
        if ch == self.config.delimiter {
            goto(cur, Step::DelimiterInUnquotedField)
        } else if self.config.is_escape(ch) {
            // An escape with nothing after it is malformed no matter how
            // lenient the parser is.
            let next = self.peek(cur, 1)?;
            goto(self.asm.save_escaped(cur, ch, next), Step::InUnquotedField)
        } else if self.config.newline.is_single(ch) {
            goto(cur, Step::SingleCharLinebreakInUnquotedField)
        } else if ch == CR && self.config.newline == Newline::Dos {
            goto(cur, Step::CrInUnquotedField)
        } else {
            goto(self.asm.save_char(cur, ch), Step::InUnquotedField)
        }
    }

    fn delimiter_in_unquoted_field(&mut self, cur: Cursor) -> Transition {
        let delim = self.config.delimiter;
        if self.config.unquoted_delimiters.contains(&cur.fields) {
            self.fallback(cur, Step::EndFieldAtDelimiter);
            return goto(
                self.asm.save_char(cur, delim),
                Step::InUnquotedField,
            );
        }
        goto(cur, Step::EndFieldAtDelimiter)
    }

    fn end_field_at_delimiter(&mut self, cur: Cursor) -> Transition {
        let cur = cur.skip(self.config.delimiter);
        goto(self.asm.close_field(cur, false)?, Step::StartField)
    }

    fn single_char_linebreak_in_unquoted_field(
        &mut self,
        cur: Cursor,
    ) -> Transition {
        let lb = self.peek(cur, 0)?;
        // A linebreak right before the end of input terminates the record,
        // even where linebreaks may be kept.
        if !self.input.at_end(cur, 1)
            && self.config.unquoted_linebreaks.contains(&cur.fields)
        {
            self.fallback(cur.skip(lb), Step::Emit);
            return goto(self.asm.save_char(cur, lb), Step::InUnquotedField);
        }
        goto(cur.skip(lb), Step::Emit)
    }

    fn cr_in_unquoted_field(&mut self, cur: Cursor) -> Transition {
        let next = match self.peek(cur, 1) {
            Ok(next) => next,
            // A final CR is text, and InUnquotedField deals with the end.
            Err(Signal::Mismatch(..)) => {
                return goto(
                    self.asm.save_char(cur, CR),
                    Step::InUnquotedField,
                );
            }
            Err(sig) => return Err(sig),
        };
        if next != LF {
            // The character after CR might be a delimiter or an escape, so
            // only the CR is consumed here.
            return goto(self.asm.save_char(cur, CR), Step::InUnquotedField);
        }
        let past = cur.skip(CR).skip(LF);
        if !self.input.at_end(cur, 2)
            && self.config.unquoted_linebreaks.contains(&cur.fields)
        {
            self.fallback(past, Step::Emit);
            return goto(self.asm.save_str(cur, "\r\n"), Step::InUnquotedField);
        }
        goto(past, Step::Emit)
    }

    fn opening_quote(&mut self, cur: Cursor) -> Transition {
        let quote = self.peek(cur, 0)?;
        let inside = cur.skip(quote);
        // Alternatives run in order: minimal, quoted, unclosed, unquoted.
        // The stack is LIFO, so they are pushed in reverse.
        self.fallback(cur, Step::AbandonQuoting);
        if self.config.unclosed_quoting {
            self.fallback(inside, Step::InUnclosedQuotedField);
        }
        if self.config.minimal_quoting {
            self.fallback(inside, Step::InQuotedField);
            return goto(inside, Step::InMinimallyQuotedField);
        }
        goto(inside, Step::InQuotedField)
    }

    fn abandon_quoting(&mut self, cur: Cursor) -> Transition {
        let quote = self.peek(cur, 0)?;
        debug!("giving up on quoting at byte {}", cur.pos);
        goto(self.asm.save_char(cur, quote), Step::InUnquotedField)
    }

    fn in_minimally_quoted_field(&mut self, cur: Cursor) -> Transition {
        let ch = self.peek(cur, 0)?;
        if ch == LF
            || ch == CR
            || ch == self.config.delimiter
            || self.config.is_escape(ch)
        {
            mismatch(Mismatch::NonMinimalQuoting, cur)
        } else if self.config.is_quote(ch) {
            goto(cur.skip(ch), Step::QuoteInQuotedField)
        } else {
            goto(self.asm.save_char(cur, ch), Step::InMinimallyQuotedField)
        }
    }

    fn in_quoted_field(&mut self, cur: Cursor) -> Transition {
        self.asm.check_field_length(cur)?;
        // A quoted field promises a closing quote, so running out of input
        // here is never soft.
        let ch = self.peek(cur, 0)?;
        if self.config.is_quote(ch) {
            goto(cur.skip(ch), Step::QuoteInQuotedField)
        } else if self.config.is_escape(ch) {
            let next = self.peek(cur, 1)?;
            goto(self.asm.save_escaped(cur, ch, next), Step::InQuotedField)
        } else {
            goto(self.asm.save_char(cur, ch), Step::InQuotedField)
        }
    }

    fn quote_in_quoted_field(&mut self, cur: Cursor) -> Transition {
        let ch = match self.peek_or_end(cur)? {
            None => return goto(cur, Step::Emit),
            Some(ch) => ch,
        };
        if ch == self.config.delimiter {
            let cur = self.asm.close_field(cur.skip(ch), false)?;
            goto(cur, Step::StartField)
        } else if self.config.is_quote(ch) {
            if !self.config.double_quote {
                return mismatch(Mismatch::DataAfterClosingQuote, cur);
            }
            goto(self.asm.save_char(cur, ch), Step::InQuotedField)
        } else if self.config.newline.is_single(ch) {
            goto(cur.skip(ch), Step::Emit)
        } else if ch == CR && self.config.newline == Newline::Dos {
            if self.peek(cur, 1)? != LF {
                return mismatch(Mismatch::DataAfterClosingQuote, cur);
            }
            goto(cur.skip(CR).skip(LF), Step::Emit)
        } else {
            mismatch(Mismatch::DataAfterClosingQuote, cur)
        }
    }

    fn in_unclosed_quoted_field(&mut self, cur: Cursor) -> Transition {
        let ch = match self.peek(cur, 0) {
            Ok(ch) => ch,
            // The end of input stands in for the missing closing quote.
            Err(Signal::Mismatch(..)) => {
                return goto(cur, Step::QuoteInQuotedField);
            }
            Err(sig) => return Err(sig),
        };
        if self.config.is_quote(ch) {
            mismatch(Mismatch::QuoteInUnclosedField, cur)
        } else if ch == LF || ch == CR || ch == self.config.delimiter {
            // Read it as if a closing quote had just been seen. If the rest
            // of the record does not parse that way, it is text.
            self.fallback(cur, Step::SaveInUnclosedQuotedField);
            goto(cur, Step::QuoteInQuotedField)
        } else if self.config.is_escape(ch) {
            let next = self.peek(cur, 1)?;
            goto(
                self.asm.save_escaped(cur, ch, next),
                Step::InUnclosedQuotedField,
            )
        } else {
            goto(self.asm.save_char(cur, ch), Step::InUnclosedQuotedField)
        }
    }

    fn save_in_unclosed_quoted_field(&mut self, cur: Cursor) -> Transition {
        let ch = self.peek(cur, 0)?;
        goto(self.asm.save_char(cur, ch), Step::InUnclosedQuotedField)
    }

    fn emit(&mut self, cur: Cursor) -> Transition {
        Ok(Next::Done(self.asm.close_field(cur, true)?))
    }
}
