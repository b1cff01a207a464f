use core::fmt;
use core::str::FromStr;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use log::warn;

use crate::error::ConfigError;
use crate::names::{char_names, resolve_char};
use crate::parser::Parser;

pub(crate) const CR: char = '\r';
pub(crate) const LF: char = '\n';
pub(crate) const SPACE: char = ' ';

/// The default maximum length, in characters, of a quoted field.
pub const DEFAULT_MAX_FIELD_LENGTH: usize = 1000;

/// A record terminator.
///
/// Exactly one convention is recognized by a parser. Under `Unix` and `Mac`
/// the other single character is ordinary field data, and under `Dos` a CR
/// that is not followed by LF is ordinary field data.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Newline {
    /// A single `\n`.
    Unix,
    /// A single `\r`.
    Mac,
    /// The pair `\r\n`.
    Dos,
}

impl Newline {
    /// Returns true if and only if `ch` terminates a record on its own.
    pub(crate) fn is_single(&self, ch: char) -> bool {
        match *self {
            Newline::Unix => ch == LF,
            Newline::Mac => ch == CR,
            Newline::Dos => false,
        }
    }
}

impl Default for Newline {
    fn default() -> Newline {
        Newline::Unix
    }
}

impl FromStr for Newline {
    type Err = ConfigError;

    /// Accepts `UNIX`, `MAC` and `DOS`, the aliases `LF`, `CR` and `CRLF`
    /// (all case insensitive), and the literal linebreaks themselves.
    fn from_str(s: &str) -> Result<Newline, ConfigError> {
        match s {
            "\n" => return Ok(Newline::Unix),
            "\r" => return Ok(Newline::Mac),
            "\r\n" => return Ok(Newline::Dos),
            _ => {}
        }
        match s.to_ascii_uppercase().as_str() {
            "UNIX" | "LF" => Ok(Newline::Unix),
            "MAC" | "CR" => Ok(Newline::Mac),
            "DOS" | "CRLF" => Ok(Newline::Dos),
            _ => Err(ConfigError::InvalidNewline(s.to_string())),
        }
    }
}

impl fmt::Display for Newline {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match *self {
            Newline::Unix => "UNIX",
            Newline::Mac => "MAC",
            Newline::Dos => "DOS",
        };
        f.write_str(name)
    }
}

/// A content validation rule for a single field.
///
/// The rule sees the raw field text, before null and empty string mapping.
pub type Rule = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// The grammar options shared by every parse.
#[derive(Clone)]
pub(crate) struct Config {
    pub(crate) field_count: usize,
    pub(crate) delimiter: char,
    pub(crate) quote: Option<char>,
    pub(crate) escape: Option<char>,
    pub(crate) newline: Newline,
    pub(crate) skip_initial_space: bool,
    pub(crate) minimal_quoting: bool,
    pub(crate) unclosed_quoting: bool,
    pub(crate) double_quote: bool,
    pub(crate) strict: bool,
    pub(crate) max_field_length: usize,
    pub(crate) null_strings: HashSet<String>,
    pub(crate) empty_strings: HashSet<String>,
    pub(crate) unquoted_delimiters: HashSet<usize>,
    pub(crate) unquoted_linebreaks: HashSet<usize>,
    pub(crate) rules: HashMap<usize, Rule>,
}

impl Config {
    fn new(field_count: usize) -> Config {
        Config {
            field_count,
            delimiter: ',',
            quote: None,
            escape: None,
            newline: Newline::default(),
            skip_initial_space: false,
            minimal_quoting: false,
            unclosed_quoting: false,
            double_quote: false,
            strict: false,
            max_field_length: DEFAULT_MAX_FIELD_LENGTH,
            null_strings: HashSet::new(),
            empty_strings: HashSet::new(),
            unquoted_delimiters: HashSet::new(),
            unquoted_linebreaks: HashSet::new(),
            rules: HashMap::new(),
        }
    }

    pub(crate) fn is_quote(&self, ch: char) -> bool {
        self.quote == Some(ch)
    }

    pub(crate) fn is_escape(&self, ch: char) -> bool {
        self.escape == Some(ch)
    }

    fn check(&self) -> Result<(), ConfigError> {
        if self.field_count == 0 {
            return Err(ConfigError::InvalidFieldCount);
        }
        if self.max_field_length == 0 {
            return Err(ConfigError::InvalidMaxFieldLength);
        }
        let chars = [
            ("delimiter", Some(self.delimiter)),
            ("quote", self.quote),
            ("escape", self.escape),
        ];
        for (i, &(first, a)) in chars.iter().enumerate() {
            let a = match a {
                None => continue,
                Some(a) => a,
            };
            for &(second, b) in &chars[i + 1..] {
                if b == Some(a) {
                    return Err(ConfigError::Conflict { first, second, ch: a });
                }
            }
            for &(second, b) in &[("CR", CR), ("LF", LF)] {
                if a == b {
                    return Err(ConfigError::Conflict { first, second, ch: a });
                }
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut rules: Vec<&usize> = self.rules.keys().collect();
        rules.sort();
        f.debug_struct("Config")
            .field("field_count", &self.field_count)
            .field("delimiter", &self.delimiter)
            .field("quote", &self.quote)
            .field("escape", &self.escape)
            .field("newline", &self.newline)
            .field("skip_initial_space", &self.skip_initial_space)
            .field("minimal_quoting", &self.minimal_quoting)
            .field("unclosed_quoting", &self.unclosed_quoting)
            .field("double_quote", &self.double_quote)
            .field("strict", &self.strict)
            .field("max_field_length", &self.max_field_length)
            .field("null_strings", &self.null_strings)
            .field("empty_strings", &self.empty_strings)
            .field("unquoted_delimiters", &self.unquoted_delimiters)
            .field("unquoted_linebreaks", &self.unquoted_linebreaks)
            .field("rules", &rules)
            .finish()
    }
}

/// Builds a parser with various configuration knobs.
///
/// This builder can be used to tweak the field delimiter, newline style,
/// quoting and more. Once a `Parser` is built, its configuration cannot be
/// changed.
#[derive(Clone, Debug)]
pub struct ParserBuilder {
    config: Config,
}

impl ParserBuilder {
    /// Create a new builder for records of exactly `field_count` fields.
    ///
    /// The delimiter defaults to `,`, the newline style to `Newline::Unix`
    /// and every quoting feature is off.
    pub fn new(field_count: usize) -> ParserBuilder {
        ParserBuilder { config: Config::new(field_count) }
    }

    /// Build a parser from this configuration.
    ///
    /// This fails if the field count or maximum field length is zero, or if
    /// the delimiter, quote and escape characters are not pairwise distinct
    /// and distinct from CR and LF.
    pub fn build(&self) -> Result<Parser, ConfigError> {
        self.config.check()?;
        Ok(Parser::new(self.config.clone()))
    }

    /// The exact number of fields in every record.
    pub fn field_count(&mut self, field_count: usize) -> &mut ParserBuilder {
        self.config.field_count = field_count;
        self
    }

    /// The field delimiter to use when parsing.
    ///
    /// The default is `,`.
    pub fn delimiter(&mut self, delimiter: char) -> &mut ParserBuilder {
        self.config.delimiter = delimiter;
        self
    }

    /// Set the delimiter from a literal character or a symbolic name such as
    /// `SEMICOLON`.
    pub fn delimiter_name(
        &mut self,
        name: &str,
    ) -> Result<&mut ParserBuilder, ConfigError> {
        let ch = resolve("delimiter", name)?;
        Ok(self.delimiter(ch))
    }

    /// The quote character to use when parsing.
    ///
    /// Quoting is disabled when this is `None`, which is the default.
    pub fn quote(&mut self, quote: Option<char>) -> &mut ParserBuilder {
        self.config.quote = quote;
        self
    }

    /// Enable quoting with a literal character or a symbolic name such as
    /// `DOUBLEQUOTE`.
    pub fn quote_name(
        &mut self,
        name: &str,
    ) -> Result<&mut ParserBuilder, ConfigError> {
        let ch = resolve("quote", name)?;
        Ok(self.quote(Some(ch)))
    }

    /// The escape character to use when parsing.
    ///
    /// An escape makes the character after it literal, in quoted and
    /// unquoted fields alike. By default, there is no escape character.
    pub fn escape(&mut self, escape: Option<char>) -> &mut ParserBuilder {
        self.config.escape = escape;
        self
    }

    /// Set the escape from a literal character or a symbolic name such as
    /// `BACKSLASH`.
    pub fn escape_name(
        &mut self,
        name: &str,
    ) -> Result<&mut ParserBuilder, ConfigError> {
        let ch = resolve("escape", name)?;
        Ok(self.escape(Some(ch)))
    }

    /// The record terminator to use when parsing.
    ///
    /// The default is `Newline::Unix`.
    pub fn newline(&mut self, newline: Newline) -> &mut ParserBuilder {
        self.config.newline = newline;
        self
    }

    /// Set the newline style by name. See `Newline`'s `FromStr` impl for
    /// the accepted names.
    pub fn newline_name(
        &mut self,
        name: &str,
    ) -> Result<&mut ParserBuilder, ConfigError> {
        let newline = name.parse()?;
        Ok(self.newline(newline))
    }

    /// Skip spaces at the start of every field instead of keeping them.
    pub fn skip_initial_space(&mut self, yes: bool) -> &mut ParserBuilder {
        self.config.skip_initial_space = yes;
        self
    }

    /// Try quoted fields as "minimally quoted" first.
    ///
    /// A minimally quoted field holds no delimiter, linebreak or escape
    /// character, and its first quote after the opening one closes it.
    pub fn minimal_quoting(&mut self, yes: bool) -> &mut ParserBuilder {
        self.config.minimal_quoting = yes;
        self
    }

    /// Tolerate a quoted field whose closing quote is missing.
    ///
    /// Such a field ends at the first delimiter or linebreak after which the
    /// rest of the record parses, or at the end of input.
    pub fn unclosed_quoting(&mut self, yes: bool) -> &mut ParserBuilder {
        self.config.unclosed_quoting = yes;
        self
    }

    /// Enable doubled quote escapes.
    ///
    /// When enabled, two consecutive quotes inside a quoted field stand for
    /// one literal quote. This is disabled by default.
    pub fn double_quote(&mut self, yes: bool) -> &mut ParserBuilder {
        self.config.double_quote = yes;
        self
    }

    /// Treat a record cut short by the end of input as an error.
    ///
    /// By default, a final buffer that ends in the middle of the last field
    /// closes that field, as if a linebreak had been seen.
    pub fn strict(&mut self, yes: bool) -> &mut ParserBuilder {
        self.config.strict = yes;
        self
    }

    /// The maximum number of characters in a quoted field.
    ///
    /// The default is 1000.
    pub fn max_field_length(&mut self, len: usize) -> &mut ParserBuilder {
        self.config.max_field_length = len;
        self
    }

    /// Map fields whose text is exactly `s` to the null marker.
    ///
    /// Null strings take priority over empty strings.
    pub fn null_string<S: Into<String>>(&mut self, s: S) -> &mut ParserBuilder {
        self.config.null_strings.insert(s.into());
        self
    }

    /// Map fields whose text is exactly `s` to empty text.
    pub fn empty_string<S: Into<String>>(
        &mut self,
        s: S,
    ) -> &mut ParserBuilder {
        self.config.empty_strings.insert(s.into());
        self
    }

    /// Let the unquoted field at index `field` keep a delimiter as text.
    ///
    /// The delimiter is kept whenever the rest of the record still parses
    /// that way; otherwise it ends the field as usual.
    pub fn allow_unquoted_delimiter(
        &mut self,
        field: usize,
    ) -> &mut ParserBuilder {
        self.config.unquoted_delimiters.insert(field);
        self
    }

    /// Let the unquoted field at index `field` keep a linebreak as text.
    ///
    /// A linebreak immediately before the end of input is never kept.
    pub fn allow_unquoted_linebreak(
        &mut self,
        field: usize,
    ) -> &mut ParserBuilder {
        self.config.unquoted_linebreaks.insert(field);
        self
    }

    /// Register a content validation rule for the field at index `field`.
    ///
    /// A field that fails its rule cannot be closed, which sends the parser
    /// looking for another way to read the record. Registering a second rule
    /// for the same field replaces the first.
    pub fn validate<F>(&mut self, field: usize, rule: F) -> &mut ParserBuilder
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        if self.config.rules.insert(field, Arc::new(rule)).is_some() {
            warn!("overwriting validation rule for field {}", field);
        }
        self
    }
}

fn resolve(option: &'static str, name: &str) -> Result<char, ConfigError> {
    resolve_char(name).ok_or_else(|| ConfigError::InvalidChar {
        option,
        value: name.to_string(),
        names: char_names().collect::<Vec<_>>().join(", "),
    })
}

#[cfg(test)]
mod tests {
    use super::{Newline, ParserBuilder};
    use crate::error::ConfigError;

    #[test]
    fn newline_names() {
        assert_eq!(Ok(Newline::Unix), "unix".parse());
        assert_eq!(Ok(Newline::Unix), "LF".parse());
        assert_eq!(Ok(Newline::Unix), "\n".parse());
        assert_eq!(Ok(Newline::Mac), "Mac".parse());
        assert_eq!(Ok(Newline::Mac), "\r".parse());
        assert_eq!(Ok(Newline::Dos), "crlf".parse());
        assert_eq!(Ok(Newline::Dos), "\r\n".parse());
        assert_eq!(
            Err(ConfigError::InvalidNewline("AMIGA".to_string())),
            "AMIGA".parse::<Newline>()
        );
    }

    #[test]
    fn named_characters() {
        let mut b = ParserBuilder::new(3);
        b.delimiter_name("SEMICOLON").unwrap();
        b.escape_name("backslash").unwrap().quote_name("\"").unwrap();
        let p = b.build().unwrap();
        assert_eq!(p.config().delimiter, ';');
        assert_eq!(p.config().escape, Some('\\'));
        assert_eq!(p.config().quote, Some('"'));
    }

    #[test]
    fn bad_character_names_the_option() {
        let err = ParserBuilder::new(3).quote_name("''").unwrap_err();
        match &err {
            ConfigError::InvalidChar { option, value, .. } => {
                assert_eq!(*option, "quote");
                assert_eq!(value, "''");
            }
            err => panic!("unexpected error: {:?}", err),
        }
        assert!(err.to_string().starts_with("quote must be a single"));
    }

    #[test]
    fn conflicts_are_rejected() {
        let err = ParserBuilder::new(3)
            .delimiter(';')
            .escape(Some(';'))
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::Conflict {
                first: "delimiter",
                second: "escape",
                ch: ';',
            }
        );

        let err = ParserBuilder::new(3).quote(Some('\n')).build().unwrap_err();
        assert_eq!(
            err,
            ConfigError::Conflict { first: "quote", second: "LF", ch: '\n' }
        );
    }

    #[test]
    fn positive_counts() {
        assert_eq!(
            ParserBuilder::new(0).build().unwrap_err(),
            ConfigError::InvalidFieldCount
        );
        assert_eq!(
            ParserBuilder::new(1).max_field_length(0).build().unwrap_err(),
            ConfigError::InvalidMaxFieldLength
        );
    }

    #[test]
    fn rules_replace() {
        let mut b = ParserBuilder::new(2);
        b.validate(0, |s| s == "a");
        b.validate(0, |s| s == "b");
        let p = b.build().unwrap();
        let rule = &p.config().rules[&0];
        assert!(rule("b"));
        assert!(!rule("a"));
        assert_eq!(p.config().rules.len(), 1);
    }
}
