//! Evaluation builtins: `eval`, `eval-string` and module loading
//!
//! `load` resolves a module name to an absolute path, appends the
//! `.benzl` extension when missing, and evaluates each top-level
//! expression in the root environment. A path is recorded as loaded
//! before its body runs, so a module that loads itself (directly or
//! through a cycle) is a no-op the second time.

use super::{arg_type, arity};
use crate::eval::{eval, eval_sexpr};
use crate::parser;
use benzl_core::env::Env;
use benzl_core::interp::Interp;
use benzl_core::value::{ErrKind, Kind, PrimType, Value};
use std::path::PathBuf;
use std::rc::Rc;

/// `(eval {+ 1 2})` => `3`
pub fn eval_(interp: &mut Interp, env: &Env, args: &Rc<Value>) -> Rc<Value> {
    arity!(interp, "eval", args, 1);
    let v = &args.children()[0];
    match v.kind {
        Kind::QExpr(_) => eval_sexpr(interp, env, v),
        _ => eval(interp, env, v),
    }
}

/// `(eval-string "(+ 1 2)")` => `3`; evaluates in the current scope.
pub fn eval_string(interp: &mut Interp, env: &Env, args: &Rc<Value>) -> Rc<Value> {
    arity!(interp, "eval-string", args, 1);
    arg_type!(interp, "eval-string", args, 0, PrimType::String);
    let Kind::Str(source) = &args.children()[0].kind else {
        unreachable!("checked above");
    };

    let exprs = match parser::parse(source, args.pos.file.as_deref()) {
        Ok(exprs) => exprs,
        Err(e) => return e.into_value(),
    };
    if exprs.is_empty() {
        return interp.error_at(
            ErrKind::Syntax,
            args,
            format!("Invalid expression: '{}'", source),
        );
    }
    let mut result = Value::empty_sexpr();
    for expr in &exprs {
        result = eval(interp, env, expr);
        if result.is_err() {
            break;
        }
    }
    result
}

/// Evaluate a whole source text in the given environment: each top-level
/// expression in order, stopping at the first error. Used for `load`, the
/// embedded stdlib and script startup.
pub fn load_source(
    interp: &mut Interp,
    env: &Env,
    source: &str,
    file: Option<&str>,
) -> Rc<Value> {
    let exprs = match parser::parse(source, file) {
        Ok(exprs) => exprs,
        Err(e) => return e.into_value(),
    };
    for expr in &exprs {
        let result = eval(interp, env, expr);
        if result.is_err() {
            return result;
        }
    }
    Value::empty_sexpr()
}

/// Resolve a `load` argument to the path to read.
///
/// `/`- and `~`-prefixed names are absolute (`~` expands to the home
/// directory); anything else is relative to the working directory. The
/// `.benzl` extension is appended when missing, and when the file does
/// not exist but a script is already loaded, its directory is tried too.
pub fn resolve_load_path(env: &Env, name: &str) -> Result<PathBuf, String> {
    let mut path = if let Some(rest) = name.strip_prefix("~") {
        match home::home_dir() {
            Some(home) => home.join(rest.trim_start_matches('/')),
            None => PathBuf::from(name),
        }
    } else if name.starts_with('/') {
        PathBuf::from(name)
    } else {
        let cwd = std::env::current_dir().map_err(|_| {
            format!("Could not load '{}': Failed to determine the current path!", name)
        })?;
        cwd.join(name)
    };

    if path.extension().and_then(|e| e.to_str()) != Some("benzl") {
        let mut with_ext = path.into_os_string();
        with_ext.push(".benzl");
        path = PathBuf::from(with_ext);
    }

    if !path.exists() {
        if let (Some(dir), Some(base)) = (env.root().script_dir(), path.file_name()) {
            path = dir.join(base);
        }
    }
    Ok(path)
}

/// `(load "my-module")` parses and evaluates a file once.
pub fn load(interp: &mut Interp, env: &Env, args: &Rc<Value>) -> Rc<Value> {
    arity!(interp, "load", args, 1);
    arg_type!(interp, "load", args, 0, PrimType::String);
    let Kind::Str(name) = &args.children()[0].kind else {
        unreachable!("checked above");
    };

    let path = match resolve_load_path(env, name) {
        Ok(path) => path,
        Err(message) => return interp.error_at(ErrKind::Io, args, message),
    };
    let path_str = path.to_string_lossy().into_owned();

    let root = env.root();
    if root.is_module_loaded(&path_str) {
        tracing::debug!(path = %path_str, "module already loaded");
        return Value::empty_sexpr();
    }

    let source = match std::fs::read(&path) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(_) => {
            return interp.error_at(
                ErrKind::Io,
                args,
                format!("Could not load library '{}'", path_str),
            );
        }
    };

    if let Some(dir) = path.parent() {
        root.set_script_dir(dir);
    }
    // Recorded before evaluation so re-entrant loads are no-ops
    root.record_module_loaded(&path_str);
    tracing::debug!(path = %path_str, "loading module");

    load_source(interp, &root, &source, Some(&path_str))
}
