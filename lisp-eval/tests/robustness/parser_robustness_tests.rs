// Parser robustness tests
// Malformed input must produce a ParseError with a usable position, never a
// panic, and well-formed but unusual input must read as expected.

use lisp_eval::{parse, parse_expression, ParseError, Value};

#[test]
fn test_unclosed_list_reports_position() {
    let err = parse("test.lisp", "(set 'x 5)\n(+ 1 2").unwrap_err();
    match err {
        ParseError::Syntax {
            source_name, line, ..
        } => {
            assert_eq!(source_name, "test.lisp");
            assert_eq!(line, 2);
        }
        other => panic!("expected syntax error, got {:?}", other),
    }
}

#[test]
fn test_mismatched_delimiters() {
    for source in ["[1 2 3)", "(1 2]", ")", "]", "(()"] {
        assert!(
            matches!(parse("t", source), Err(ParseError::Syntax { .. })),
            "{:?} should not parse",
            source
        );
    }
}

#[test]
fn test_unterminated_strings() {
    assert!(parse("t", "\"abc").is_err());
    assert!(parse("t", "\"\"\"abc\"\"").is_err());
}

#[test]
fn test_dangling_reader_macros() {
    for source in ["'", "`", ",", ",@", "#'", "#^", "(a ')"] {
        assert!(parse("t", source).is_err(), "{:?} should not parse", source);
    }
}

#[test]
fn test_bad_escapes_and_literals() {
    let err = parse("t", "(list \"ok\"\n \"bad \\x\")").unwrap_err();
    assert_eq!(err.line(), Some(2));
    assert!(err.to_string().contains("\\x"));

    assert!(matches!(
        parse("t", "-99999999999999999999"),
        Err(ParseError::InvalidLiteral { .. })
    ));
}

#[test]
fn test_error_display_includes_location() {
    let err = parse("init.lisp", "(a\n(b").unwrap_err();
    assert!(err.to_string().starts_with("init.lisp:"), "{}", err);
}

#[test]
fn test_empty_and_comment_only_input() {
    assert!(parse("t", "").unwrap().is_empty());
    assert!(parse("t", "   \n\t").unwrap().is_empty());
    assert!(parse("t", "; nothing here\n;; or here").unwrap().is_empty());
}

#[test]
fn test_deeply_nested_lists() {
    let depth = 200;
    let source = format!("{}{}", "(".repeat(depth), ")".repeat(depth));
    let value = parse_expression(&source).unwrap();
    assert!(matches!(value, Value::List(_)));
}

#[test]
fn test_symbol_edge_cases() {
    for (source, expected) in [
        ("+", "+"),
        ("-", "-"),
        ("...", "..."),
        ("a.b/c", "a.b/c"),
        ("1-", "1-"),
        ("lisp:+", "lisp:+"),
        ("%&rest", "%&rest"),
        ("empty?", "empty?"),
        ("#t", "#t"),
    ] {
        assert_eq!(parse_expression(source).unwrap(), Value::symbol(expected), "{}", source);
    }
}

#[test]
fn test_numbers_adjacent_to_delimiters() {
    let value = parse_expression("(1(2)3.5[4])").unwrap();
    assert_eq!(value.to_string(), "'(1 (2) 3.5 '(4))");
}

#[test]
fn test_comments_end_at_newline() {
    let forms = parse("t", "(a ; comment (b\n c)").unwrap();
    assert_eq!(forms.len(), 1);
    assert_eq!(forms[0].value.to_string(), "'(a c)");
}

#[test]
fn test_unicode_content() {
    let value = parse_expression("\"héllo \\u{1F600}\"").unwrap();
    assert_eq!(value, Value::String("héllo 😀".to_string()));
    assert_eq!(parse_expression("λ").unwrap(), Value::symbol("λ"));
}
