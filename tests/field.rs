mod common;

use common::{run_err, run_ok};

#[test]
fn fields_hold_any_value_including_functions() {
    let source = r#"
        class Box {}
        fun add(a, b) { print a + b; }
        var box = Box();
        box.fn = add;
        box.fn(1, 2);
    "#;
    assert_eq!(run_ok(source), "3\n");
}

#[test]
fn fields_can_be_set_and_read_back_repeatedly() {
    let source = r#"
        class Box {}
        var box = Box();
        box.a = "bar value";
        box.b = "baz value";
        print box.a;
        print box.b;
        print box.a;
        print box.b;
    "#;
    assert_eq!(run_ok(source), "bar value\nbaz value\nbar value\nbaz value\n");
}

#[test]
fn a_field_shadows_a_method_of_the_same_name() {
    let source = r#"
        class Box {
            label() { return "method"; }
        }
        var box = Box();
        print box.label();
        box.label = "field";
        print box.label;
    "#;
    assert_eq!(run_ok(source), "method\nfield\n");
}

fn expect_instance_only(source: &str) {
    let (had_error, had_runtime_error) = run_err(source);
    assert!(had_error);
    assert!(had_runtime_error);
}

#[test]
fn reading_a_property_off_a_non_instance_is_a_runtime_error() {
    expect_instance_only("true.foo;");
    expect_instance_only("nil.foo;");
    expect_instance_only("123.foo;");
    expect_instance_only("\"str\".foo;");
}

#[test]
fn writing_a_property_to_a_non_instance_is_a_runtime_error() {
    expect_instance_only("true.foo = 1;");
    expect_instance_only("nil.foo = 1;");
}

#[test]
fn reading_an_undefined_property_is_a_runtime_error() {
    let source = r#"
        class Box {}
        var box = Box();
        print box.missing;
    "#;
    expect_instance_only(source);
}
