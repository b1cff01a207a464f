use delim::{
    Error, Mismatch, Newline, ParseError, Parser, ParserBuilder, Reader,
};

fn parser(f: impl FnOnce(&mut ParserBuilder)) -> Parser {
    let mut b = ParserBuilder::new(3);
    b.delimiter(';').newline(Newline::Unix);
    f(&mut b);
    b.build().unwrap()
}

fn plain() -> Parser {
    parser(|_| {})
}

fn record(p: &Parser, data: &str, is_final: bool) -> Vec<Option<String>> {
    let (rec, end) = p.parse(data, 0, is_final).unwrap();
    assert_eq!(end, data.len(), "parse of {:?} stopped early", data);
    rec.to_vec()
}

fn strings(xs: &[&str]) -> Vec<Option<String>> {
    xs.iter().map(|x| Some(x.to_string())).collect()
}

#[test]
fn basic_final() {
    let (rec, end) = plain().parse("ab;cd;ef\n", 0, true).unwrap();
    assert_eq!(rec, vec![Some("ab"), Some("cd"), Some("ef")]);
    assert_eq!(end, 9);
}

#[test]
fn short_record_without_terminator_needs_more() {
    let err = plain().parse("a;b", 0, false).unwrap_err();
    assert!(err.is_need_more_input());
}

#[test]
fn short_record_with_terminator_is_rejected() {
    let err = plain().parse("a;b\n", 0, false).unwrap_err();
    assert_eq!(err.mismatch(), Some(Mismatch::CannotClose));
}

#[test]
fn strict_requires_terminator() {
    let p = parser(|b| {
        b.strict(true);
    });
    match p.parse("a;b;c", 0, true) {
        Err(ParseError::Mismatch { kind, snapshot }) => {
            assert_eq!(kind, Mismatch::UnexpectedEndOfInput);
            assert_eq!(snapshot.index(), 5);
            assert_eq!(snapshot.field(), "c");
            assert_eq!(snapshot.record().len(), 2);
        }
        res => panic!("expected a mismatch, got {:?}", res),
    }
}

#[test]
fn quoted() {
    let p = parser(|b| {
        b.quote(Some('"'));
    });
    assert_eq!(
        record(&p, "\"ab\";cd;ef\n", true),
        strings(&["ab", "cd", "ef"])
    );
}

#[test]
fn escaped_delimiter() {
    let p = parser(|b| {
        b.escape_name("BACKSLASH").unwrap();
    });
    assert_eq!(
        record(&p, "ab;c\\;d;ef\n", false),
        strings(&["ab", "c;d", "ef"])
    );
}

#[test]
fn unquoted_delimiter_in_first_field() {
    let p = parser(|b| {
        b.allow_unquoted_delimiter(0);
    });
    assert_eq!(
        record(&p, "a;b;cd;ef\n", false),
        strings(&["a;b", "cd", "ef"])
    );
}

#[test]
fn unclosed_quote_with_short_max_length() {
    let p = parser(|b| {
        b.quote(Some('"')).max_field_length(2).unclosed_quoting(true);
    });
    assert_eq!(
        record(&p, "\"aaaa;cd;ef\n", false),
        strings(&["aaaa", "cd", "ef"])
    );
}

#[test]
fn max_length_boundary_in_quoted_field() {
    // Minimal and unclosed quoting are off, so a quoted field that is too
    // long can only be read as unquoted text, quotes and all.
    let p = parser(|b| {
        b.quote(Some('"')).max_field_length(3);
    });
    assert_eq!(
        record(&p, "\"abc\";x;y\n", true),
        strings(&["abc", "x", "y"])
    );
    assert_eq!(
        record(&p, "\"abcd\";x;y\n", true),
        strings(&["\"abcd\"", "x", "y"])
    );
}

#[test]
fn null_takes_priority() {
    let p = parser(|b| {
        b.null_string("\\N").empty_string("\\N").empty_string("");
    });
    let (rec, _) = p.parse("\\N;;x\n", 0, true).unwrap();
    assert_eq!(rec.get(0).map(|v| v.is_null()), Some(true));
    assert_eq!(rec.get(1).and_then(|v| v.as_str()), Some(""));
    assert_eq!(rec, vec![None, Some(""), Some("x")]);
}

#[test]
fn validation_drives_backtracking() {
    let p = parser(|b| {
        b.allow_unquoted_delimiter(1)
            .validate(0, |s| s.parse::<u32>().is_ok())
            .validate(2, |s| s.contains('@'));
    });
    assert_eq!(
        record(&p, "42;Smith; John;j@example.com\n", true),
        strings(&["42", "Smith; John", "j@example.com"])
    );
}

#[test]
fn start_index_continues() {
    let p = plain();
    let data = "a;b;c\nd;e;f\n";
    let (_, end) = p.parse(data, 0, false).unwrap();
    let (rec, end) = p.parse(data, end, false).unwrap();
    assert_eq!(rec, vec![Some("d"), Some("e"), Some("f")]);
    assert_eq!(end, data.len());
}

#[test]
fn parser_is_shareable() {
    let p = plain();
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let p = p.clone();
            std::thread::spawn(move || {
                let data = format!("{};{};{}\n", i, i + 1, i + 2);
                let (rec, _) = p.parse(&data, 0, true).unwrap();
                rec.to_vec()
            })
        })
        .collect();
    for (i, h) in handles.into_iter().enumerate() {
        let fields = h.join().unwrap();
        assert_eq!(fields[0], Some(i.to_string()));
    }
}

#[test]
fn reader_reports_parse_errors() {
    let p = plain();
    let data = "a;b;c\nd;e\nf;g;h\n";
    let mut rdr = Reader::from_reader(&p, data.as_bytes());
    assert!(rdr.read_record().unwrap().is_some());
    match rdr.read_record() {
        Err(Error::Parse { pos, err }) => {
            assert_eq!(pos.record(), 1);
            assert_eq!(pos.line(), 2);
            assert_eq!(err.mismatch(), Some(Mismatch::CannotClose));
        }
        res => panic!("expected a parse error, got {:?}", res),
    }
}

#[test]
fn error_messages() {
    let err = plain().parse("a;b\n", 0, true).unwrap_err();
    assert_eq!(
        err.to_string(),
        "can't close field (1+'b': 'EOF') at byte 4: \"a;b\\n>>\""
    );
}

#[cfg(feature = "serde")]
#[test]
fn records_serialize() {
    let p = parser(|b| {
        b.null_string("NULL");
    });
    let (rec, _) = p.parse("NULL;b;c\n", 0, true).unwrap();
    let json = serde_json::to_string(&rec).unwrap();
    assert_eq!(json, r#"[null,"b","c"]"#);
}
