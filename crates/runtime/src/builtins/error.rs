//! Error creation and try/catch
//!
//! An uncaught error value stops evaluation of every enclosing
//! S-expression. `try` runs a block and, if it produced an error,
//! re-tags it as caught and hands it to the catch body bound to the
//! catch variable, where it behaves like any other value.

use super::{arg_type, arity};
use crate::eval::{call, eval_sexpr};
use benzl_core::env::Env;
use benzl_core::interp::Interp;
use benzl_core::value::{ErrKind, Kind, PrimType, Value};
use std::rc::Rc;

/// `(error "This shouldn't happen")`
pub fn error(interp: &mut Interp, _env: &Env, args: &Rc<Value>) -> Rc<Value> {
    arity!(interp, "error", args, 1);
    arg_type!(interp, "error", args, 0, PrimType::String);
    let Kind::Str(message) = &args.children()[0].kind else {
        unreachable!("checked above");
    };
    Value::err(ErrKind::User, &**message)
}

/// `(try {body} {catch e {handler}})`
pub fn try_(interp: &mut Interp, env: &Env, args: &Rc<Value>) -> Rc<Value> {
    arity!(interp, "try", args, 2);
    arg_type!(interp, "try", args, 0, PrimType::List);
    let children = args.children();

    let catch_clause = &children[1];
    if !matches!(catch_clause.kind, Kind::QExpr(_)) || catch_clause.children().len() != 3 {
        return interp.error_at(ErrKind::Type, args, "Function 'try' missing catch");
    }
    let clause = catch_clause.children();
    match &clause[0].kind {
        Kind::Sym(sym) if &*sym.name == "catch" => {}
        _ => return interp.error_at(ErrKind::Type, args, "Function 'try' missing catch"),
    }
    let catch_var = &clause[1];
    if !matches!(catch_var.kind, Kind::Sym(_)) {
        return interp.error_at(ErrKind::Type, args, "function 'catch' missing error argument");
    }
    // A bare value body ({catch e "ok"}) gets wrapped so the synthesized
    // handler returns it unchanged
    let catch_body = match &clause[2].kind {
        Kind::QExpr(_) => clause[2].clone(),
        _ => Value::qexpr(vec![clause[2].clone()]),
    };

    let result = eval_sexpr(interp, env, &children[0]);
    let Kind::Err(data) = &result.kind else {
        return result;
    };

    // Re-tag as caught, then run the handler as a one-parameter lambda
    let caught = Value::new(Kind::CaughtErr(data.clone()), result.pos.clone());
    let handler = Value::lambda(
        Value::qexpr(vec![catch_var.clone()]),
        catch_body,
        env.clone(),
    );
    let handler_args = Value::sexpr(vec![caught]);
    call(interp, env, &handler, &handler_args)
}
