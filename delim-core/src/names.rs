/// Symbolic names accepted wherever a single character is configured.
///
/// Lookups are case insensitive. Metadata files tend to spell awkward
/// characters this way, since a bare backslash or tab rarely survives a round
/// trip through an editor.
const NAMES: &[(&str, char)] = &[
    ("BACKSLASH", '\\'),
    ("TAB", '\t'),
    ("SPACE", ' '),
    ("COMMA", ','),
    ("SEMICOLON", ';'),
    ("COLON", ':'),
    ("PIPE", '|'),
    ("QUOTE", '"'),
    ("DOUBLEQUOTE", '"'),
    ("SINGLEQUOTE", '\''),
    ("APOSTROPHE", '\''),
    ("HASH", '#'),
    ("TILDE", '~'),
    ("CARET", '^'),
    ("UNIT_SEPARATOR", '\x1F'),
    ("RECORD_SEPARATOR", '\x1E'),
    ("NUL", '\0'),
];

/// Resolve a configured character.
///
/// `name` is first looked up in the table of symbolic names. Failing that, a
/// string of exactly one character resolves to that character. Everything
/// else resolves to `None`.
pub fn resolve_char(name: &str) -> Option<char> {
    if let Some(&(_, ch)) =
        NAMES.iter().find(|&&(n, _)| n.eq_ignore_ascii_case(name))
    {
        return Some(ch);
    }
    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) => Some(ch),
        _ => None,
    }
}

/// Return every symbolic name, for use in error messages.
pub fn char_names() -> impl Iterator<Item = &'static str> {
    NAMES.iter().map(|&(n, _)| n)
}
