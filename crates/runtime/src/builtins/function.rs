//! Lambda construction and named function definition

use benzl_core::env::Env;
use benzl_core::interp::Interp;
use benzl_core::value::{ErrKind, Kind, Value};
use std::rc::Rc;

const FUN_FORM: &str = "Functions must be defined in the form \
                        (fun {name arg1 arg2} {body}) or \
                        (fun {name arg1:type arg2:type} {body})";

const LAMBDA_FORM: &str = "Lambdas must be defined in the form \
                           (\\ {arg1 arg2} {body}) or \
                           (\\ {arg1:type arg2:type} {body})";

/// Check that every typed parameter names a type that exists.
fn check_param_types(
    interp: &Interp,
    env: &Env,
    args: &Rc<Value>,
    params: &[Rc<Value>],
    what: &str,
) -> Option<Rc<Value>> {
    for param in params {
        if let Kind::Pair(key, ty_expr) = &param.kind {
            if let Kind::Sym(ty_sym) = &ty_expr.kind {
                if env.get(ty_sym).is_none() {
                    return Some(interp.error_at(
                        ErrKind::Type,
                        args,
                        format!(
                            "Invalid type '{}' for {} parameter '{}'",
                            ty_sym.name, what, key.name
                        ),
                    ));
                }
            }
        }
    }
    None
}

/// `(fun {add-1 x} {+ x 1})` defines `add-1` in the current scope.
pub fn fun(interp: &mut Interp, env: &Env, args: &Rc<Value>) -> Rc<Value> {
    let children = args.children();
    if children.len() != 2 {
        return interp.error_at(ErrKind::Type, args, FUN_FORM);
    }
    let (header, body) = (&children[0], &children[1]);
    if !matches!(header.kind, Kind::QExpr(_)) || header.children().is_empty() {
        return interp.error_at(ErrKind::Type, args, format!("Bad function name or arguments: {}", FUN_FORM));
    }
    if !matches!(body.kind, Kind::QExpr(_)) {
        return interp.error_at(ErrKind::Type, args, format!("Bad function body: {}", FUN_FORM));
    }

    let decl = header.children();
    let Kind::Sym(name) = &decl[0].kind else {
        return interp.error_at(ErrKind::Type, args, format!("Bad function name or arguments: {}", FUN_FORM));
    };
    if let Some(err) = check_param_types(interp, env, args, &decl[1..], "function") {
        return err;
    }

    let params = Value::qexpr(decl[1..].to_vec());
    let lambda = Value::lambda(params, body.clone(), env.clone());
    match env.def(name, lambda) {
        Ok(()) => Value::empty_sexpr(),
        Err(_) => interp.error_at(
            ErrKind::AlreadyDeclared,
            args,
            format!("'{}' is already declared", name.name),
        ),
    }
}

/// `(lambda {x} {+ x 1})` builds an anonymous function closing over the
/// current environment.
pub fn lambda(interp: &mut Interp, env: &Env, args: &Rc<Value>) -> Rc<Value> {
    let children = args.children();
    if children.len() != 2 {
        return interp.error_at(ErrKind::Type, args, LAMBDA_FORM);
    }
    let (params, body) = (&children[0], &children[1]);
    if !matches!(params.kind, Kind::QExpr(_)) {
        return interp.error_at(ErrKind::Type, args, format!("Bad function arguments: {}", LAMBDA_FORM));
    }
    for param in params.children() {
        if !matches!(param.kind, Kind::Sym(_) | Kind::Pair(..)) {
            return interp.error_at(
                ErrKind::Type,
                args,
                format!("Bad function arguments: {}", LAMBDA_FORM),
            );
        }
    }
    if !matches!(body.kind, Kind::QExpr(_)) || body.children().is_empty() {
        return interp.error_at(ErrKind::Type, args, format!("Bad function body: {}", LAMBDA_FORM));
    }
    if let Some(err) = check_param_types(interp, env, args, params.children(), "lambda") {
        return err;
    }
    Value::lambda(params.clone(), body.clone(), env.clone())
}
