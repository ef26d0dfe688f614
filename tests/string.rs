mod common;

use common::{run_err, run_ok};

#[test]
fn string_literals() {
    let source = r#"
        print "()";
        print "a string";
        print "A~\u{b6}\u{de}\u{950}\u{b83}";
    "#;
    assert_eq!(run_ok(source), "()\na string\nA~\u{b6}\u{de}\u{950}\u{b83}\n");
}

#[test]
fn a_string_literal_may_span_multiple_lines() {
    let source = "print \"1\n2\n3\";";
    assert_eq!(run_ok(source), "1\n2\n3\n");
}

#[test]
fn an_unterminated_string_is_a_scan_error() {
    let (had_error, had_runtime_error) = run_err("\"unterminated");
    assert!(had_error);
    assert!(!had_runtime_error);
}

#[test]
fn an_unterminated_string_reports_the_line_it_started_on() {
    // the scanner keeps tokenizing other lines even though this string
    // never finds its closing quote and consumes the rest of the file
    let (had_error, had_runtime_error) = run_err("print 1;\n\"unterminated");
    assert!(had_error);
    assert!(!had_runtime_error);
}
