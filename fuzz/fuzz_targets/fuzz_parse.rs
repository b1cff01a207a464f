#![no_main]

use delim::{Newline, ParserBuilder};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let (flags, text) = match data.split_first() {
        None => return,
        Some((&flags, rest)) => (flags, rest),
    };
    let text = match std::str::from_utf8(text) {
        Ok(text) => text,
        Err(_) => return,
    };
    let newline = match flags & 0b11 {
        0 => Newline::Unix,
        1 => Newline::Mac,
        _ => Newline::Dos,
    };
    let p = ParserBuilder::new(3)
        .delimiter(';')
        .quote(Some('"'))
        .escape(Some('\\'))
        .newline(newline)
        .minimal_quoting(flags & 0b100 != 0)
        .unclosed_quoting(flags & 0b1000 != 0)
        .double_quote(flags & 0b1_0000 != 0)
        .skip_initial_space(flags & 0b10_0000 != 0)
        .allow_unquoted_delimiter(0)
        .allow_unquoted_linebreak(2)
        .max_field_length(64)
        .build()
        .unwrap();
    let is_final = flags & 0b100_0000 != 0;
    if let Ok((rec, end)) = p.parse(text, 0, is_final) {
        assert_eq!(rec.len(), 3);
        assert!(text.is_char_boundary(end));
    }
});
