mod common;

use common::{run_err, run_ok};

#[test]
fn integer_and_fractional_literals() {
    let source = r#"
        print 123;
        print 987654;
        print 0;
        print 123.456;
        print -0.001;
    "#;
    assert_eq!(run_ok(source), "123\n987654\n0\n123.456\n-0.001\n");
}

#[test]
fn whole_numbers_print_without_a_trailing_fraction() {
    assert_eq!(run_ok("print 4.0;"), "4\n");
}

#[test]
fn negative_zero_keeps_its_sign() {
    assert_eq!(run_ok("print -0;"), "-0\n");
}

#[test]
fn a_number_too_large_for_i64_prints_in_full_rather_than_saturating() {
    let output = run_ok("print 10000000000000000000000;");
    assert_ne!(output.trim_end(), i64::MAX.to_string());
    assert_eq!(output.trim_end().parse::<f64>().unwrap(), 1e22);
}

#[test]
fn nan_compares_unequal_to_itself() {
    let source = r#"
        var nan = 0.0 / 0.0;
        print nan == nan;
        print nan != nan;
    "#;
    assert_eq!(run_ok(source), "false\ntrue\n");
}

#[test]
fn a_leading_dot_is_not_a_valid_expression_start() {
    let (had_error, had_runtime_error) = run_err("print .5;");
    assert!(had_error);
    assert!(!had_runtime_error);
}

#[test]
fn a_trailing_dot_with_no_digits_scans_as_a_separate_dot_token() {
    // Consistent with the rest of the grammar: a bare trailing '.' after
    // digits is left for the next token rather than treated as a scan
    // error, so `123.` parses as a number followed by a property access.
    let (had_error, had_runtime_error) = run_err("123.;");
    assert!(had_error);
    assert!(!had_runtime_error);
}
