//! Module loading and file I/O against a real filesystem.

use benzl_runtime::{Kind, Session, Value};
use std::fs;
use std::rc::Rc;

fn show(v: &Value) -> String {
    benzl_core::value::to_display_string(v, true)
}

fn assert_ok(v: &Rc<Value>) {
    assert!(!v.is_err(), "unexpected error: {}", show(v));
}

#[test]
fn load_evaluates_a_module_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("counter.benzl");
    fs::write(&path, "(def {module-answer} 41)\n").unwrap();

    let mut session = Session::new().unwrap();
    let load_expr = format!("(load \"{}\")", path.display());
    assert_ok(&session.eval_line(&load_expr));
    assert_eq!(show(&session.eval_line("(+ module-answer 1)")), "42");

    // A second load is a no-op: the def does not run again, so no
    // AlreadyDeclared error surfaces
    assert_ok(&session.eval_line(&load_expr));
    assert_eq!(show(&session.eval_line("(module-answer)")), "41");
}

#[test]
fn load_appends_the_extension() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("helpers.benzl");
    fs::write(&path, "(fun {triple n} {* n 3})\n").unwrap();

    let mut session = Session::new().unwrap();
    let bare = dir.path().join("helpers");
    let load_expr = format!("(load \"{}\")", bare.display());
    assert_ok(&session.eval_line(&load_expr));
    assert_eq!(show(&session.eval_line("(triple 5)")), "15");
}

#[test]
fn self_loading_modules_terminate() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("selfish.benzl");
    let source = format!(
        "(load \"{}\")\n(def {{selfish-loaded}} 1)\n",
        path.display()
    );
    fs::write(&path, source).unwrap();

    let mut session = Session::new().unwrap();
    let load_expr = format!("(load \"{}\")", path.display());
    assert_ok(&session.eval_line(&load_expr));
    assert_eq!(show(&session.eval_line("(selfish-loaded)")), "1");
}

#[test]
fn sibling_modules_resolve_through_the_script_directory() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("util.benzl"), "(def {from-util} 7)\n").unwrap();
    let main = dir.path().join("main.benzl");
    fs::write(&main, "(load \"util\")\n(def {from-main} from-util)\n").unwrap();

    let mut session = Session::new().unwrap();
    let load_expr = format!("(load \"{}\")", main.display());
    assert_ok(&session.eval_line(&load_expr));
    assert_eq!(show(&session.eval_line("(from-main)")), "7");
}

#[test]
fn loading_a_missing_file_errors() {
    let mut session = Session::new().unwrap();
    let r = session.eval_line("(load \"/definitely/not/here\")");
    match &r.kind {
        Kind::Err(e) => assert!(e.message.contains("Could not load"), "{}", e.message),
        _ => panic!("expected error, got {}", show(&r)),
    }
}

#[test]
fn syntax_errors_in_modules_propagate() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.benzl");
    fs::write(&path, "(def {x} 1\n").unwrap();

    let mut session = Session::new().unwrap();
    let r = session.eval_line(&format!("(load \"{}\")", path.display()));
    match &r.kind {
        Kind::Err(e) => assert!(e.message.contains("Missing ')'"), "{}", e.message),
        _ => panic!("expected error, got {}", show(&r)),
    }
}

#[test]
fn write_then_read_round_trips_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.bin");

    let mut session = Session::new().unwrap();
    let write = format!(
        "(write-file \"{}\" (buffer-with-bytes 0x01 0x02 0xFF))",
        path.display()
    );
    assert_ok(&session.eval_line(&write));
    let r = session.eval_line(&format!("(read-file \"{}\")", path.display()));
    assert_eq!(show(&r), "<0x01 0x02 0xFF>");
    assert_eq!(fs::read(&path).unwrap(), vec![1, 2, 255]);
}

#[test]
fn write_file_serializes_strings_and_lists() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("text.bin");

    let mut session = Session::new().unwrap();
    let write = format!("(write-file \"{}\" {{\"ab\" 0x21}})", path.display());
    assert_ok(&session.eval_line(&write));
    assert_eq!(fs::read(&path).unwrap(), b"ab!".to_vec());

    let r = session.eval_line(&format!("(write-file \"{}\" print)", path.display()));
    match &r.kind {
        Kind::Err(e) => assert!(e.message.contains("not supported"), "{}", e.message),
        _ => panic!("expected error, got {}", show(&r)),
    }
}

#[test]
fn eval_string_runs_in_the_current_environment() {
    let mut session = Session::new().unwrap();
    assert_ok(&session.eval_line("(def {base} 10)"));
    assert_eq!(show(&session.eval_line("(eval-string \"(+ base 5)\")")), "15");
}
