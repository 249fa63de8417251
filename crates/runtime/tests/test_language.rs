//! End-to-end language tests: one session per test, statements evaluated
//! the way the REPL evaluates them.

use benzl_runtime::{Kind, Session, Value};
use std::rc::Rc;

fn run(lines: &[&str]) -> Rc<Value> {
    let mut session = Session::new().expect("session builds");
    let mut last = Value::empty_sexpr();
    for line in lines {
        last = session.eval_line(line);
        if last.is_err() {
            return last;
        }
    }
    last
}

fn show(v: &Value) -> String {
    benzl_core::value::to_display_string(v, true)
}

fn assert_err_containing(v: &Value, needle: &str) {
    match &v.kind {
        Kind::Err(e) => assert!(
            e.message.contains(needle),
            "expected error containing {:?}, got {:?}",
            needle,
            e.message
        ),
        _ => panic!("expected an error, got {}", show(v)),
    }
}

#[test]
fn addition_folds_integers() {
    assert_eq!(show(&run(&["(+ 1 2 3)"])), "6");
}

#[test]
fn printf_formats_and_returns_nothing() {
    let r = run(&["(printf \"hello, %\" \"world\")"]);
    assert!(Session::is_silent(&r));
    assert_eq!(show(&run(&["(format \"hello, %\" \"world\")"])), "\"hello, world\"");
}

#[test]
fn record_types_round_trip_their_properties() {
    let r = run(&[
        "(def-type {Point x:Float y:Float})",
        "(def {p} (Point x:1.0 y:2.0))",
        "(p y)",
    ]);
    assert_eq!(show(&r), "2");
}

#[test]
fn try_catches_division_by_zero() {
    assert_eq!(show(&run(&["(try {(/ 10 0)} {catch e \"ok\"})"])), "\"ok\"");
}

#[test]
fn buffer_round_trips_an_unsigned_short() {
    let r = run(&[
        "(def {b} (put-unsigned-short (create-buffer 4) 0 65535))",
        "(get-unsigned-short b 0)",
    ]);
    assert_eq!(show(&r), "65535");
}

#[test]
fn join_concatenates_strings() {
    assert_eq!(show(&run(&["(join \"a\" \"b\" \"c\")"])), "\"abc\"");
}

#[test]
fn join_concatenates_lists() {
    assert_eq!(show(&run(&["(join {1 2} {3 4})"])), "{1 2 3 4}");
}

#[test]
fn variadic_functions_pack_their_arguments() {
    let r = run(&["(fun {f & xs} {len xs})", "(f 1 2 3 4)"]);
    assert_eq!(show(&r), "4");
}

#[test]
fn typed_definitions_constrain_later_sets() {
    let r = run(&["(def {x:Integer} 1)", "(set {x} \"oops\")"]);
    assert_err_containing(&r, "Type mismatch");
    // A castable value is accepted and converted
    let r = run(&["(def {y:Integer} 1)", "(set {y} 0x10)", "(y)"]);
    assert_eq!(show(&r), "16");
}

// Parse/print round-trip: printing a function-free, error-free value and
// evaluating the text again yields an equal value.
#[test]
fn printed_values_parse_back() {
    for src in [
        "{1 2 3}",
        "{1 {2 \"three\"} 0xFF 2.5}",
        "\"a string with \\\"quotes\\\" and \\n\"",
        "-42",
    ] {
        let first = run(&[src]);
        let reprinted = run(&[&show(&first)]);
        assert!(
            benzl_core::value::values_equal(&first, &reprinted),
            "round trip failed for {}: {} vs {}",
            src,
            show(&first),
            show(&reprinted)
        );
    }
}

// Arithmetic coercion: the result rank is the highest operand rank.
#[test]
fn arithmetic_coerces_to_the_widest_rank() {
    assert_eq!(show(&run(&["(+ 0x01 0x02)"])), "0x03");
    assert_eq!(show(&run(&["(+ 0x01 2)"])), "3");
    assert_eq!(show(&run(&["(+ 1 2.5)"])), "3.5");
    assert_eq!(show(&run(&["(type-of (+ 0x01 2))"])), "<Integer>");
    assert_eq!(show(&run(&["(type-of (+ 1 2.5))"])), "<Float>");
    // Equal results regardless of pre-widening by hand
    assert_eq!(show(&run(&["(== (+ 0x01 2) (+ 1 2))"])), "1");
}

#[test]
fn division_and_modulo_by_zero_fail() {
    assert_err_containing(&run(&["(/ 1 0)"]), "Division by zero");
    assert_err_containing(&run(&["(% 5 0)"]), "Modulo by zero");
    assert_err_containing(&run(&["(>> 1.5 1)"]), "Unsupported operation");
}

#[test]
fn subtraction_negates_a_single_argument() {
    assert_eq!(show(&run(&["(- 4)"])), "-4");
    assert_eq!(show(&run(&["(- 4.5)"])), "-4.5");
}

#[test]
fn operators_accept_a_single_list_argument() {
    assert_eq!(show(&run(&["(+ {1 2 3})"])), "6");
    assert_eq!(show(&run(&["(min {3 5 2})"])), "2");
    assert_eq!(show(&run(&["(max 3 5 2)"])), "5");
}

#[test]
fn plus_joins_non_numeric_arguments() {
    assert_eq!(show(&run(&["(+ \"ab\" \"cd\")"])), "\"abcd\"");
    assert_eq!(show(&run(&["(+ {1} {2})"])), "{1 2}");
}

#[test]
fn floor_and_ceil() {
    assert_eq!(show(&run(&["(floor 10.75)"])), "10");
    assert_eq!(show(&run(&["(ceil 10.75)"])), "11");
    assert_eq!(show(&run(&["(floor 7)"])), "7");
    assert_err_containing(&run(&["(floor \"x\")"]), "only works on numbers");
}

#[test]
fn comparisons_cover_numbers_and_strings() {
    assert_eq!(show(&run(&["(< 1 2)"])), "1");
    assert_eq!(show(&run(&["(>= 2 2.0)"])), "1");
    assert_eq!(show(&run(&["(< \"abc\" \"abd\")"])), "1");
    assert_eq!(show(&run(&["(== {1 2} {1 2})"])), "1");
    assert_eq!(show(&run(&["(!= 1 2)"])), "1");
    assert_err_containing(&run(&["(< {1} 2)"]), "Unexpected type");
}

// Buffer put/get inverse for every width, signed and unsigned, with the
// signed boundary wrapping two's-complement.
#[test]
fn buffer_field_io_inverts() {
    let cases = [
        ("unsigned-char", "255", "255"),
        ("signed-char", "-128", "-128"),
        ("unsigned-short", "65535", "65535"),
        ("signed-short", "-32768", "-32768"),
        ("unsigned-integer", "4294967295", "4294967295"),
        ("signed-integer", "-2147483648", "-2147483648"),
        ("signed-long", "-9223372036854775808", "-9223372036854775808"),
        ("unsigned-long", "9223372036854775807", "9223372036854775807"),
        // Signed overflow wraps
        ("signed-char", "128", "-128"),
        ("signed-short", "65535", "-1"),
    ];
    for (ty, input, expected) in cases {
        let put = format!("(def {{b}} (put-{} (create-buffer 8) 0 {}))", ty, input);
        let get = format!("(get-{} b 0)", ty);
        let r = run(&[&put, &get]);
        assert_eq!(show(&r), expected, "width {}", ty);
    }
}

#[test]
fn buffer_access_is_bounds_checked() {
    assert_err_containing(&run(&["(get-byte (create-buffer 2) 2)"]), "out of range");
    assert_err_containing(
        &run(&["(put-unsigned-integer (create-buffer 3) 0 1)"]),
        "out of range",
    );
    assert_err_containing(&run(&["(get-bytes (create-buffer 4) 2 3)"]), "out of range");
}

#[test]
fn buffer_strings_and_bytes() {
    let r = run(&[
        "(def {b} (put-string (create-buffer 16) 2 \"hi\"))",
        "(get-string b 2)",
    ]);
    assert_eq!(show(&r), "\"hi\"");
    let r = run(&[
        "(def {b} (put-bytes (create-buffer 4) 1 (buffer-with-bytes 0xAA 0xBB)))",
        "(get-bytes b 0 4)",
    ]);
    assert_eq!(show(&r), "<0x00 0xAA 0xBB 0x00>");
}

#[test]
fn puts_do_not_mutate_their_argument() {
    let r = run(&[
        "(def {b} (create-buffer 2))",
        "(def {b2} (put-byte b 0 0xFF))",
        "(b)",
    ]);
    assert_eq!(show(&r), "<0x00 0x00>");
}

#[test]
fn buffer_map_transforms_chunks() {
    let r = run(&[
        "(buffer-map (buffer-with-bytes 0x01 0x02 0x03 0x04) 1 \
          (lambda {chunk i} {+ (get-byte chunk 0) 0x10}))",
    ]);
    assert_eq!(show(&r), "<0x11 0x12 0x13 0x14>");
}

// List laws: join length adds, head/tail invert a cons.
#[test]
fn list_laws_hold() {
    assert_eq!(show(&run(&["(len (join {1 2} {3 4 5}))"])), "5");
    assert_eq!(show(&run(&["(head (join {9} {1 2}))"])), "{9}");
    assert_eq!(show(&run(&["(tail (join {9} {1 2}))"])), "{1 2}");
}

#[test]
fn sequence_accessors_work_on_all_three_sequence_kinds() {
    assert_eq!(show(&run(&["(first {7 8 9})"])), "7");
    assert_eq!(show(&run(&["(second \"hello\")"])), "\"e\"");
    assert_eq!(show(&run(&["(last (buffer-with-bytes 0x01 0x02))"])), "0x02");
    assert_eq!(show(&run(&["(nth 2 {1 2 3})"])), "3");
    assert_eq!(show(&run(&["(nth -1 \"abc\")"])), "\"c\"");
    assert_eq!(show(&run(&["(take 2 \"hello\")"])), "\"he\"");
    assert_eq!(show(&run(&["(drop 2 {1 2 3 5})"])), "{3 5}");
    assert_eq!(show(&run(&["(len \"hello\")"])), "5");
}

#[test]
fn sequence_edges_error_or_empty() {
    assert_err_containing(&run(&["(head {})"]), "passed {} for argument");
    assert_eq!(show(&run(&["(head \"\")"])), "");
    assert_err_containing(&run(&["(nth 5 {1 2})"]), "out of range");
    assert_err_containing(&run(&["(drop 9 {1 2})"]), "out of range");
    assert_err_containing(&run(&["(len 5)"]), "len works on strings");
}

#[test]
fn list_elements_evaluate_when_fetched() {
    assert_eq!(show(&run(&["(first {(+ 1 2) 9})"])), "3");
}

// Environment shadowing: an inner def leaves the outer binding alone.
#[test]
fn shadowing_preserves_the_outer_binding() {
    let r = run(&[
        "(def {x} 1)",
        "(def {observed} ((lambda {} {do (def {x} 2) x})))",
        "(list x observed)",
    ]);
    assert_eq!(show(&r), "{1 2}");
}

#[test]
fn def_refuses_rebinding_and_set_requires_one() {
    assert_err_containing(&run(&["(def {x} 1)", "(def {x} 2)"]), "already declared");
    assert_err_containing(&run(&["(set {nope} 2)"]), "must be defined before");
}

// try/catch totality: the result is either the block's value or the
// caught error, never a propagating error.
#[test]
fn try_returns_the_value_or_the_caught_error() {
    assert_eq!(show(&run(&["(try {(+ 1 1)} {catch e e})"])), "2");
    let caught = run(&["(try {(error \"boom\")} {catch e e})"]);
    assert!(matches!(caught.kind, Kind::CaughtErr(_)), "got {}", show(&caught));
    // A caught error is an ordinary value: comparisons work on it
    let r = run(&["(== (try {(error \"boom\")} {catch e e}) (try {(error \"boom\")} {catch e e}))"]);
    assert_eq!(show(&r), "1");
}

#[test]
fn try_reports_malformed_catch_clauses() {
    assert_err_containing(&run(&["(try {1} {oops e {2}})"]), "missing catch");
}

#[test]
fn errors_carry_a_position_and_a_trace() {
    let r = run(&["(/ 1 0)"]);
    match &r.kind {
        Kind::Err(e) => {
            assert!(e.message.contains("at line 1:"), "message: {}", e.message);
            assert!(e.trace.is_some());
        }
        _ => panic!("expected error"),
    }
}

#[test]
fn conditionals_use_truthiness() {
    assert_eq!(show(&run(&["(if 1 {\"yes\"} {\"no\"})"])), "\"yes\"");
    assert_eq!(show(&run(&["(if {} {\"yes\"} {\"no\"})"])), "\"no\"");
    assert_eq!(show(&run(&["(if 0.0 {1} {2})"])), "2");
    assert_eq!(show(&run(&["(and 1 2 {})"])), "0");
    assert_eq!(show(&run(&["(or 0 {} \"s\")"])), "1");
    assert_eq!(show(&run(&["(not 0)"])), "1");
}

#[test]
fn eval_and_eval_string() {
    assert_eq!(show(&run(&["(eval {+ 1 2})"])), "3");
    assert_eq!(show(&run(&["(eval-string \"(* 6 7)\")"])), "42");
    assert_err_containing(&run(&["(eval-string \"(+ 1\")"]), "Missing ')'");
}

#[test]
fn type_introspection_and_conversion() {
    assert_eq!(show(&run(&["(type-of \"hello\")"])), "<String>");
    assert_eq!(show(&run(&["(type-of 123.3)"])), "<Float>");
    assert_eq!(show(&run(&["(def-type {P x})", "(type-of (P x:1))"])), "<P x>");
    assert_eq!(show(&run(&["(to-string {1 2 3})"])), "\"{1 2 3}\"");
    assert_eq!(show(&run(&["(to-number \"123.5\")"])), "123.5");
    assert_eq!(show(&run(&["(to-number \"0xFF\")"])), "0xFF");
    assert_err_containing(&run(&["(to-number \"pear\")"]), "Failed to convert");
}

#[test]
fn to_string_of_a_buffer_reads_its_text() {
    let r = run(&["(to-string (buffer-with-bytes 0x48 0x65 0x6C 0x6C 0x6F 0x00))"]);
    assert_eq!(show(&r), "\"Hello\"");
}

#[test]
fn dictionaries_store_and_update() {
    let r = run(&["(def {d} (dict a:1 b:(+ 1 1)))", "(d b)"]);
    assert_eq!(show(&r), "2");
    // set-prop adds new keys to dictionaries unconditionally
    let r = run(&["(def {d} (dict a:1))", "(set-prop {d c} 3)", "(d c)"]);
    assert_eq!(show(&r), "3");
}

#[test]
fn set_prop_checks_record_properties() {
    let r = run(&[
        "(def-type {Point x y})",
        "(def {p} (Point x:1 y:2))",
        "(set-prop {p x} 9)",
        "(p x)",
    ]);
    assert_eq!(show(&r), "9");
    let r = run(&[
        "(def-type {Point x y})",
        "(def {p} (Point x:1 y:2))",
        "(set-prop {p z} 9)",
    ]);
    assert_err_containing(&r, "has no property");
}

#[test]
fn def_type_rejects_redefinition() {
    assert_err_containing(&run(&["(def-type {Integer x})"]), "Cannot redefine type");
    assert_err_containing(&run(&["(def-type {T x})", "(def-type {T y})"]), "already declared");
}

#[test]
fn record_instances_print_with_their_type_name() {
    let r = run(&["(def-type {Point x y})", "(Point x:1 y:2)"]);
    let text = show(&r);
    assert!(text.starts_with("(Point "), "got {}", text);
    assert!(text.contains("x:1") && text.contains("y:2"), "got {}", text);
}

#[test]
fn stdlib_helpers_compose() {
    assert_eq!(show(&run(&["(filter (lambda {x} {> x 2}) {1 2 3 4})"])), "{3 4}");
    assert_eq!(show(&run(&["(reverse {1 2 3})"])), "{3 2 1}");
    assert_eq!(show(&run(&["(foldl + 0 (range 1 11))"])), "55");
    assert_eq!(show(&run(&["(contains 3 {1 2 3})"])), "1");
    assert_eq!(show(&run(&["(do (def {t} 5) (* t 2))"])), "10");
}

#[test]
fn format_edge_cases() {
    assert_eq!(show(&run(&["(format \"no args\")"])), "\"no args\"");
    // A literal percent via backslash escape
    assert_eq!(show(&run(&["(format \"100\\% of %\" \"it\")"])), "\"100% of it\"");
    // Out of arguments: the remainder is appended untouched
    assert_eq!(show(&run(&["(format \"% and % and %\" 1)"])), "\"1 and % and %\"");
    assert_err_containing(&run(&["(format 5)"]), "must be a string");
}

#[test]
fn lambdas_print_readably() {
    let r = run(&["(to-string (lambda {x} {+ x 1}))"]);
    match &r.kind {
        Kind::Str(s) => assert_eq!(&**s, "(\\ {x} {+ x 1})"),
        _ => panic!("expected string, got {}", show(&r)),
    }
    let r = run(&["(to-string head)"]);
    match &r.kind {
        Kind::Str(s) => assert_eq!(&**s, "head"),
        _ => panic!("expected string, got {}", show(&r)),
    }
}
