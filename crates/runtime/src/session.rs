//! A ready-to-use interpreter: root environment, builtins and stdlib
//!
//! The REPL and the script runner are thin wrappers over this. One
//! session owns one evaluator context and one root environment; several
//! sessions can coexist in a process without sharing any state.

use crate::builtins;
use crate::builtins::eval_ops::load_source;
use crate::eval::eval;
use crate::parser;
use crate::stdlib::{STDLIB_LABEL, STDLIB_SOURCE};
use benzl_core::env::Env;
use benzl_core::interp::{Interp, error_report};
use benzl_core::value::{Kind, Symbol, Value};
use std::rc::Rc;

// Enough buckets for the builtins and stdlib without an early resize
const ROOT_BUCKETS: usize = 416;

pub struct Session {
    pub interp: Interp,
    pub root: Env,
}

impl Session {
    /// Build a session: fresh root environment, builtins registered,
    /// standard library evaluated.
    pub fn new() -> Result<Session, String> {
        let mut interp = Interp::new();
        let root = Env::new(ROOT_BUCKETS);
        builtins::register(&root);

        tracing::debug!("evaluating embedded standard library");
        let r = load_source(&mut interp, &root, STDLIB_SOURCE, Some(STDLIB_LABEL));
        if r.is_err() {
            return Err(format!("Error in standard library:\n{}", error_report(&r)));
        }
        Ok(Session { interp, root })
    }

    /// Evaluate one REPL line: the line's expressions become the children
    /// of a single S-expression, so `+ 1 2` and `(+ 1 2)` both work.
    pub fn eval_line(&mut self, line: &str) -> Rc<Value> {
        let exprs = match parser::parse(line, None) {
            Ok(exprs) => exprs,
            Err(e) => return e.into_value(),
        };
        let wrapped = Value::sexpr(exprs);
        eval(&mut self.interp, &self.root, &wrapped)
    }

    /// Evaluate a whole source text in the root environment.
    pub fn run_source(&mut self, source: &str, file: Option<&str>) -> Rc<Value> {
        load_source(&mut self.interp, &self.root, source, file)
    }

    /// Run the `load` builtin against a path (script startup).
    pub fn load_file(&mut self, path: &str) -> Rc<Value> {
        let args = Value::sexpr(vec![Value::str_(path)]);
        builtins::eval_ops::load(&mut self.interp, &self.root, &args)
    }

    /// Bind `launch-args` in the root environment to the extra
    /// command-line arguments, as a list of strings.
    pub fn bind_launch_args(&mut self, args: &[String]) {
        let list = Value::qexpr(args.iter().map(|a| Value::str_(a)).collect());
        self.root.def_or_set(&Symbol::new("launch-args"), list);
    }

    /// True when a result should not be echoed by the REPL (the empty
    /// S-expression prints as nothing).
    pub fn is_silent(v: &Value) -> bool {
        matches!(&v.kind, Kind::SExpr(children) if children.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use benzl_core::value::values_equal;

    #[test]
    fn session_evaluates_lines() {
        let mut session = Session::new().unwrap();
        let r = session.eval_line("(+ 1 2 3)");
        assert!(values_equal(&r, &Value::int(6)));
        // Bare expressions work without parentheses
        let r = session.eval_line("+ 1 2");
        assert!(values_equal(&r, &Value::int(3)));
    }

    #[test]
    fn stdlib_is_available() {
        let mut session = Session::new().unwrap();
        let r = session.eval_line("(sum (range 1 5))");
        assert!(values_equal(&r, &Value::int(10)));
        let r = session.eval_line("(map (lambda {x} {* x 2}) {1 2 3})");
        assert_eq!(
            benzl_core::value::to_display_string(&r, true),
            "{2 4 6}"
        );
    }

    #[test]
    fn launch_args_are_visible() {
        let mut session = Session::new().unwrap();
        session.bind_launch_args(&["a".to_string(), "b".to_string()]);
        let r = session.eval_line("(len launch-args)");
        assert!(values_equal(&r, &Value::int(2)));
    }

    #[test]
    fn empty_results_are_silent() {
        let mut session = Session::new().unwrap();
        let r = session.eval_line("(def {something} 1)");
        assert!(Session::is_silent(&r));
        let r = session.eval_line("42");
        assert!(!Session::is_silent(&r));
    }
}
