use core::fmt;

/// A type that renders field text for diagnostics.
///
/// Control characters are escaped so that a message about a stray CR or a
/// doubled linebreak is readable on a terminal.
pub(crate) struct Text<'a>(pub(crate) &'a str);

impl<'a> fmt::Display for Text<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for ch in self.0.chars() {
            write_char(f, ch)?;
        }
        Ok(())
    }
}

/// A type that renders the character at a failure point, if any.
///
/// A missing character means the buffer ran out.
pub(crate) struct Char(pub(crate) Option<char>);

impl fmt::Display for Char {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.0 {
            None => write!(f, "EOF"),
            Some(ch) => write_char(f, ch),
        }
    }
}

fn write_char(f: &mut fmt::Formatter, ch: char) -> fmt::Result {
    match ch {
        '\0' => write!(f, "\\0"),
        '\n' => write!(f, "\\n"),
        '\r' => write!(f, "\\r"),
        '\t' => write!(f, "\\t"),
        // ASCII control characters except \0, \n, \r, \t
        '\x01'..='\x08' | '\x0b' | '\x0c' | '\x0e'..='\x1f' | '\x7f' => {
            write!(f, "\\x{:02x}", u32::from(ch))
        }
        _ => write!(f, "{}", ch),
    }
}

#[cfg(test)]
mod tests {
    use super::{Char, Text};

    #[test]
    fn escapes_controls() {
        assert_eq!("a\\r\\nb", Text("a\r\nb").to_string());
        assert_eq!("\\x1f\\t", Text("\x1f\t").to_string());
        assert_eq!("plain ünïcode", Text("plain ünïcode").to_string());
    }

    #[test]
    fn missing_char_is_eof() {
        assert_eq!("EOF", Char(None).to_string());
        assert_eq!("\\n", Char(Some('\n')).to_string());
        assert_eq!(";", Char(Some(';')).to_string());
    }
}
