mod common;

use common::{run_err, run_ok};

#[test]
fn add_numbers_and_concatenate_strings() {
    let source = r#"
        print 123 + 456;
        print "str" + "ing";
    "#;
    assert_eq!(run_ok(source), "579\nstring\n");
}

#[test]
fn adding_a_number_and_a_string_is_a_runtime_error() {
    let (had_error, had_runtime_error) = run_err("print 1 + \"1\";");
    assert!(had_error);
    assert!(had_runtime_error);
}

#[test]
fn comparisons() {
    let source = r#"
        print 1 < 2;
        print 2 < 2;
        print 2 < 1;
        print 1 <= 2;
        print 2 <= 2;
        print 2 <= 1;
        print 1 > 2;
        print 2 > 2;
        print 2 > 1;
        print 1 >= 2;
        print 2 >= 2;
        print 2 >= 1;
    "#;
    let expected = "true\nfalse\nfalse\ntrue\ntrue\nfalse\nfalse\nfalse\ntrue\nfalse\ntrue\ntrue\n";
    assert_eq!(run_ok(source), expected);
}

#[test]
fn divide() {
    let source = r#"
        print 8 / 2;
        print 12.34 / 12.34;
    "#;
    assert_eq!(run_ok(source), "4\n1\n");
}

#[test]
fn comparing_a_number_to_a_non_number_is_a_runtime_error() {
    let (had_error, had_runtime_error) = run_err("print 1 < \"1\";");
    assert!(had_error);
    assert!(had_runtime_error);
}

#[test]
fn equality_across_value_kinds_is_false_not_an_error() {
    let source = r#"
        print 1 == 1;
        print 1 == 2;
        print 1 == "1";
        print nil == nil;
        print nil == false;
    "#;
    assert_eq!(run_ok(source), "true\nfalse\nfalse\ntrue\nfalse\n");
}

#[test]
fn two_separately_constructed_instances_are_never_equal() {
    let source = r#"
        class Foo {}
        print Foo() == Foo();
        var a = Foo();
        print a == a;
    "#;
    assert_eq!(run_ok(source), "false\ntrue\n");
}

#[test]
fn multiply() {
    let source = r#"
        print 5 * 3;
        print 12.34 * 0.3;
    "#;
    assert_eq!(run_ok(source), "15\n3.702\n");
}

#[test]
fn negate() {
    let source = r#"
        print -(3);
        print --3;
        print -3;
    "#;
    assert_eq!(run_ok(source), "-3\n3\n-3\n");
}

#[test]
fn negating_a_non_number_is_a_runtime_error() {
    let (had_error, had_runtime_error) = run_err("print -\"s\";");
    assert!(had_error);
    assert!(had_runtime_error);
}

#[test]
fn not() {
    let source = r#"
        print !true;
        print !false;
        print !nil;
        print !123;
    "#;
    assert_eq!(run_ok(source), "false\ntrue\ntrue\nfalse\n");
}

#[test]
fn not_equals() {
    let source = r#"
        print 1 != 1;
        print 1 != 2;
        print "a" != "b";
    "#;
    assert_eq!(run_ok(source), "false\ntrue\ntrue\n");
}

#[test]
fn subtract() {
    let source = r#"
        print 4 - 3;
        print 3 - 3;
    "#;
    assert_eq!(run_ok(source), "1\n0\n");
}
