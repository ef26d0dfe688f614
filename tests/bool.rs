mod common;

use common::run_ok;

#[test]
fn equality() {
    let source = r#"
        print true == true;
        print true == false;
        print true == "true";
        print true == 1;
        print false == nil;
    "#;
    assert_eq!(run_ok(source), "true\nfalse\nfalse\nfalse\nfalse\n");
}

#[test]
fn not() {
    let source = r#"
        print !true;
        print !false;
        print !!true;
    "#;
    assert_eq!(run_ok(source), "false\ntrue\ntrue\n");
}

#[test]
fn truthiness_in_conditionals() {
    let source = r#"
        if (0) print "zero is truthy"; else print "zero is falsey";
        if ("") print "empty string is truthy"; else print "empty string is falsey";
    "#;
    assert_eq!(run_ok(source), "zero is truthy\nempty string is truthy\n");
}
