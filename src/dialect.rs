use delim_core::{ConfigError, Parser, ParserBuilder};
use serde::{Deserialize, Serialize};

/// A serializable description of a parser configuration.
///
/// Character options accept a literal character or a symbolic name such as
/// `SEMICOLON` or `BACKSLASH`, and the newline style accepts `UNIX`, `MAC`
/// or `DOS`. Every option other than `field_count` may be omitted.
///
/// Validation rules are code, so they cannot be described here. Add them to
/// the builder returned by `Dialect::builder`.
///
/// # Example
///
/// ```
/// let dialect: delim::Dialect = serde_json::from_str(r#"{
///     "field_count": 3,
///     "delimiter": "SEMICOLON",
///     "quote": "DOUBLEQUOTE",
///     "null_strings": ["NULL"]
/// }"#).unwrap();
/// let parser = dialect.build().unwrap();
///
/// let (record, _) = parser.parse("NULL;\"b\";c\n", 0, true).unwrap();
/// assert_eq!(record, vec![None, Some("b"), Some("c")]);
/// ```
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Dialect {
    /// The exact number of fields in every record.
    pub field_count: usize,
    /// The field delimiter. Defaults to `,`.
    pub delimiter: Option<String>,
    /// The quote character. Quoting is disabled if absent.
    pub quote: Option<String>,
    /// The escape character, if any.
    pub escape: Option<String>,
    /// The newline style. Defaults to `UNIX`.
    pub newline: Option<String>,
    /// Skip spaces at the start of every field.
    pub skip_initial_space: bool,
    /// Try minimal quoting before full quoting.
    pub minimal_quoting: bool,
    /// Tolerate quoted fields without a closing quote.
    pub unclosed_quoting: bool,
    /// Read two quotes in a quoted field as one literal quote.
    pub double_quote: bool,
    /// Require every record to end in a linebreak.
    pub strict: bool,
    /// The maximum number of characters in a quoted field.
    pub max_field_length: Option<usize>,
    /// Field texts that map to the null marker.
    pub null_strings: Vec<String>,
    /// Field texts that map to empty text.
    pub empty_strings: Vec<String>,
    /// Indices of fields that may hold unquoted delimiters.
    pub unquoted_delimiters: Vec<usize>,
    /// Indices of fields that may hold unquoted linebreaks.
    pub unquoted_linebreaks: Vec<usize>,
}

impl Dialect {
    /// Convert this description into a parser builder.
    ///
    /// # Errors
    ///
    /// This fails if a character or newline name does not resolve.
    pub fn builder(&self) -> Result<ParserBuilder, ConfigError> {
        let mut b = ParserBuilder::new(self.field_count);
        if let Some(ref name) = self.delimiter {
            b.delimiter_name(name)?;
        }
        if let Some(ref name) = self.quote {
            b.quote_name(name)?;
        }
        if let Some(ref name) = self.escape {
            b.escape_name(name)?;
        }
        if let Some(ref name) = self.newline {
            b.newline_name(name)?;
        }
        b.skip_initial_space(self.skip_initial_space)
            .minimal_quoting(self.minimal_quoting)
            .unclosed_quoting(self.unclosed_quoting)
            .double_quote(self.double_quote)
            .strict(self.strict);
        if let Some(len) = self.max_field_length {
            b.max_field_length(len);
        }
        for s in &self.null_strings {
            b.null_string(s.as_str());
        }
        for s in &self.empty_strings {
            b.empty_string(s.as_str());
        }
        for &i in &self.unquoted_delimiters {
            b.allow_unquoted_delimiter(i);
        }
        for &i in &self.unquoted_linebreaks {
            b.allow_unquoted_linebreak(i);
        }
        Ok(b)
    }

    /// Build a parser from this description.
    ///
    /// # Errors
    ///
    /// This fails if a name does not resolve or the resulting configuration
    /// is invalid.
    pub fn build(&self) -> Result<Parser, ConfigError> {
        self.builder()?.build()
    }
}

#[cfg(test)]
mod tests {
    use delim_core::{ConfigError, Newline};

    use super::Dialect;

    #[test]
    fn defaults() {
        let d: Dialect = serde_json::from_str(r#"{"field_count": 2}"#).unwrap();
        let p = d.build().unwrap();
        assert_eq!(p.field_count(), 2);
        assert_eq!(p.delimiter(), ',');
        assert_eq!(p.quote(), None);
        assert_eq!(p.newline(), Newline::Unix);
    }

    #[test]
    fn names_resolve() {
        let d: Dialect = serde_json::from_str(
            r#"{
                "field_count": 3,
                "delimiter": "tab",
                "escape": "BACKSLASH",
                "newline": "CRLF"
            }"#,
        )
        .unwrap();
        let p = d.build().unwrap();
        assert_eq!(p.delimiter(), '\t');
        assert_eq!(p.escape(), Some('\\'));
        assert_eq!(p.newline(), Newline::Dos);
    }

    #[test]
    fn missing_field_count() {
        let d: Dialect = serde_json::from_str("{}").unwrap();
        assert_eq!(d.build().unwrap_err(), ConfigError::InvalidFieldCount);
    }

    #[test]
    fn unknown_option() {
        let res: Result<Dialect, _> =
            serde_json::from_str(r#"{"field_count": 1, "colour": "red"}"#);
        assert!(res.is_err());
    }

    #[test]
    fn rules_added_through_builder() {
        let d = Dialect {
            field_count: 2,
            delimiter: Some(";".to_string()),
            unquoted_delimiters: vec![0],
            ..Dialect::default()
        };
        let p = d.builder().unwrap().validate(1, |s| s == "z").build().unwrap();
        let (rec, _) = p.parse("x;y;z\n", 0, true).unwrap();
        assert_eq!(rec, vec![Some("x;y"), Some("z")]);
    }
}
