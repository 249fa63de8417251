//! The tree-walking evaluator
//!
//! Every surface form collapses into one recursive rule over values:
//! symbols resolve in the environment, S-expressions evaluate their
//! children left to right and then dispatch on the head, and everything
//! else evaluates to itself. Errors are ordinary values that
//! short-circuit each enclosing S-expression until `try` catches them or
//! the top level reports them.

use benzl_core::env::Env;
use benzl_core::interp::Interp;
use benzl_core::value::{
    ErrKind, Fun, Kind, Lambda, Symbol, TypeRef, Value, matches_type, to_display_string,
    type_mismatch_description,
};
use std::rc::Rc;

/// Evaluate a value: symbols resolve, S-expressions dispatch, everything
/// else is already a result.
pub fn eval(interp: &mut Interp, env: &Env, v: &Rc<Value>) -> Rc<Value> {
    match &v.kind {
        Kind::Sym(sym) => match env.get(sym) {
            Some(value) => value,
            None => interp.error_at(ErrKind::Unbound, v, format!("Unbound symbol '{}'", sym.name)),
        },
        Kind::SExpr(_) => eval_sexpr(interp, env, v),
        _ => v.clone(),
    }
}

/// Evaluate an S-expression (or a Q-expression being run as one, which is
/// how function bodies and `if`/`try` blocks execute).
pub fn eval_sexpr(interp: &mut Interp, env: &Env, v: &Rc<Value>) -> Rc<Value> {
    interp.call_stack.push(v.clone());
    let r = eval_sexpr_inner(interp, env, v);
    interp.call_stack.pop();
    r
}

fn eval_sexpr_inner(interp: &mut Interp, env: &Env, v: &Rc<Value>) -> Rc<Value> {
    let children = v.children();
    let mut evaluated: Vec<Rc<Value>> = Vec::with_capacity(children.len());

    // When the head evaluates to a record instance or dictionary, its
    // property table is spliced over the scope while the remaining
    // children evaluate. That is all `(p x)` property access is.
    let mut scope = env.clone();
    for (i, child) in children.iter().enumerate() {
        let out = eval(interp, &scope, child);
        if i == 0 {
            match &out.kind {
                Kind::Record(record) => scope = Env::spliced(env, record.props.clone()),
                Kind::Dict(table) => scope = Env::spliced(env, table.clone()),
                _ => {}
            }
        }
        evaluated.push(out);
    }
    drop(scope);

    if let Some(err) = evaluated.iter().find(|c| c.is_err()) {
        return err.clone();
    }
    if evaluated.is_empty() {
        return Value::new(Kind::SExpr(Vec::new()), v.pos.clone());
    }

    let head = evaluated.remove(0);
    let rest = Value::new(Kind::SExpr(evaluated), v.pos.clone());

    // A single non-function value evaluates to itself
    if rest.children().is_empty() && !matches!(head.kind, Kind::Fun(_)) {
        return head;
    }

    match &head.kind {
        Kind::Type(_) => construct_record(interp, env, &head, &rest),
        Kind::Record(_) | Kind::Dict(_) => eval(interp, env, &rest),
        Kind::Fun(_) => call(interp, env, &head, &rest),
        _ => interp.error_at(
            ErrKind::Type,
            &rest,
            format!(
                "Expression starts with incorrect type (got {} expected {})",
                head.type_name(),
                "Function"
            ),
        ),
    }
}

/// Apply a function value to an S-expression of evaluated arguments.
pub fn call(interp: &mut Interp, env: &Env, f: &Rc<Value>, args: &Rc<Value>) -> Rc<Value> {
    match &f.kind {
        Kind::Fun(Fun::Builtin(builtin)) => (builtin.func)(interp, env, args),
        Kind::Fun(Fun::Lambda(lambda)) => call_lambda(interp, env, f, lambda, args),
        _ => interp.error_at(
            ErrKind::Type,
            args,
            format!("Cannot call a value of type {}", f.type_name()),
        ),
    }
}

fn call_lambda(
    interp: &mut Interp,
    env: &Env,
    f: &Rc<Value>,
    lambda: &Rc<Lambda>,
    args: &Rc<Value>,
) -> Rc<Value> {
    let params = lambda.params.children();
    let supplied = args.children();
    let mut needed = params.len();
    let mut used = 0usize;

    // Parameters bind into a child of the environment captured at the
    // lambda's creation site
    let local = Env::child(&lambda.env, params.len().max(2));

    for (i, arg) in supplied.iter().enumerate() {
        if i >= params.len() {
            return arity_error(interp, f, args, needed);
        }

        let mut bound = arg.clone();
        let param_sym: &Symbol = match &params[i].kind {
            Kind::Pair(key, ty_expr) => {
                let ty = match type_from_pair(env, ty_expr) {
                    Some(ty) => ty,
                    None => {
                        return interp.error_at(
                            ErrKind::Type,
                            args,
                            format!(
                                "Parameter '{}': Invalid type '{}'",
                                key.name,
                                to_display_string(ty_expr, true)
                            ),
                        );
                    }
                };
                match matches_type(arg, &ty) {
                    Ok(None) => {}
                    Ok(Some(cast)) => bound = cast,
                    Err(()) => {
                        return interp.error_at(
                            ErrKind::Type,
                            args,
                            format!(
                                "Parameter '{}' for function '{}': {}",
                                key.name,
                                f.bound_name_str(),
                                type_mismatch_description(&ty, arg)
                            ),
                        );
                    }
                }
                key
            }
            Kind::Sym(sym) => sym,
            _ => {
                return interp.error_at(
                    ErrKind::Type,
                    args,
                    format!("Function '{}' has a non-symbol parameter", f.bound_name_str()),
                );
            }
        };

        // `&` packs every remaining argument into a list bound to the
        // final parameter
        if &*param_sym.name == "&" {
            if i + 2 != needed {
                return interp.error_at(
                    ErrKind::Syntax,
                    args,
                    format!(
                        "Function format for '{}': Symbol '&' not followed by single symbol.",
                        f.bound_name_str()
                    ),
                );
            }
            needed -= 1;
            used += 1;
            let packed = Value::qexpr(supplied[i..].to_vec());
            match &params[i + 1].kind {
                Kind::Sym(last) => local.def_or_set(last, packed),
                Kind::Pair(last, _) => local.def_or_set(last, packed),
                _ => {
                    return interp.error_at(
                        ErrKind::Type,
                        args,
                        format!("Function '{}' has a non-symbol parameter", f.bound_name_str()),
                    );
                }
            }
            break;
        }

        local.def_or_set(param_sym, bound);
        used += 1;
    }

    if used != needed {
        return arity_error(interp, f, args, needed);
    }
    eval_sexpr(interp, &local, &lambda.body)
}

fn arity_error(interp: &Interp, f: &Rc<Value>, args: &Rc<Value>, needed: usize) -> Rc<Value> {
    interp.error_at(
        ErrKind::Arity,
        args,
        format!(
            "Function '{}' expects {} arguments (Got: {})",
            f.bound_name_str(),
            needed,
            to_display_string(args, true)
        ),
    )
}

/// Resolve the type half of a `name:type` pair to a type value: either a
/// type literal, or a symbol bound to one.
pub fn type_from_pair(env: &Env, ty_expr: &Rc<Value>) -> Option<Rc<Value>> {
    match &ty_expr.kind {
        Kind::Type(_) => Some(ty_expr.clone()),
        Kind::Sym(sym) => {
            let resolved = env.get(sym)?;
            matches!(resolved.kind, Kind::Type(_)).then_some(resolved)
        }
        _ => None,
    }
}

/// Build a record instance from `(TypeName prop:value ...)`.
///
/// The supplied pairs must cover the declared properties exactly; each
/// value is evaluated, and values for typed properties are checked and
/// cast if necessary.
fn construct_record(
    interp: &mut Interp,
    env: &Env,
    type_value: &Rc<Value>,
    args: &Rc<Value>,
) -> Rc<Value> {
    let Kind::Type(type_ref) = &type_value.kind else {
        unreachable!("construct_record requires a type head");
    };
    let TypeRef::Custom { name, props } = type_ref else {
        return interp.error_at(
            ErrKind::Type,
            args,
            format!("Cannot construct an instance of primitive type '{}'", type_ref.name()),
        );
    };

    let declared = props.children();
    let supplied = args.children();
    if supplied.len() != declared.len() {
        return interp.error_at(
            ErrKind::Arity,
            args,
            format!(
                "Incorrect number of arguments to create {} (got {} expected {})",
                name.name,
                to_display_string(args, true),
                to_display_string(props, true)
            ),
        );
    }

    let mut fields: Vec<(Symbol, Rc<Value>)> = Vec::with_capacity(declared.len());
    for decl in declared {
        let (prop_sym, declared_ty) = match &decl.kind {
            Kind::Pair(key, ty_expr) => (key, Some(ty_expr)),
            Kind::Sym(sym) => (sym, None),
            _ => {
                return interp.error_at(
                    ErrKind::Type,
                    args,
                    format!("Type {} declares a non-symbol property", name.name),
                );
            }
        };

        let mut found = false;
        for arg in supplied {
            let Kind::Pair(arg_key, arg_value) = &arg.kind else {
                return interp.error_at(
                    ErrKind::Type,
                    args,
                    format!("Arguments to create {} must be in the form name:value", name.name),
                );
            };
            if arg_key != prop_sym {
                continue;
            }
            found = true;

            let mut value = eval(interp, env, arg_value);
            if value.is_err() {
                return value;
            }
            if let Some(ty_expr) = declared_ty {
                let ty = match type_from_pair(env, ty_expr) {
                    Some(ty) => ty,
                    None => {
                        return interp.error_at(
                            ErrKind::Type,
                            args,
                            format!(
                                "Parameter '{}': Invalid type '{}'",
                                prop_sym.name,
                                to_display_string(ty_expr, true)
                            ),
                        );
                    }
                };
                match matches_type(&value, &ty) {
                    Ok(None) => {}
                    Ok(Some(cast)) => value = cast,
                    Err(()) => {
                        return interp.error_at(
                            ErrKind::Type,
                            args,
                            format!(
                                "Property '{}' for '{}': {}",
                                prop_sym.name,
                                type_value.bound_name_str(),
                                type_mismatch_description(&ty, &value)
                            ),
                        );
                    }
                }
            }
            fields.push((prop_sym.clone(), value));
            break;
        }

        if !found {
            return interp.error_at(
                ErrKind::MissingProperty,
                args,
                format!("Missing argument '{}' to create {}", prop_sym.name, name.name),
            );
        }
    }

    Value::record(type_value.clone(), &fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins;

    fn run(src: &str) -> Rc<Value> {
        let mut interp = Interp::new();
        let env = Env::new(64);
        builtins::register(&env);
        let stdlib = crate::builtins::eval_ops::load_source(
            &mut interp,
            &env,
            crate::stdlib::STDLIB_SOURCE,
            None,
        );
        assert!(!stdlib.is_err(), "stdlib loads");
        let items = crate::parser::parse(src, None).unwrap();
        let mut last = Value::empty_sexpr();
        for item in items {
            last = eval(&mut interp, &env, &item);
            if last.is_err() {
                return last;
            }
        }
        last
    }

    #[test]
    fn self_evaluating_values() {
        assert_eq!(*run("42"), *Value::int(42));
        assert_eq!(*run("\"hi\""), *Value::str_("hi"));
        assert_eq!(*run("{1 2 3}"), *Value::qexpr(vec![Value::int(1), Value::int(2), Value::int(3)]));
    }

    #[test]
    fn unbound_symbols_error() {
        let r = run("missing-thing");
        match &r.kind {
            Kind::Err(e) => assert!(e.message.contains("Unbound symbol 'missing-thing'")),
            _ => panic!("expected error, got {}", r),
        }
    }

    #[test]
    fn non_callable_head_errors() {
        let r = run("(1 2 3)");
        match &r.kind {
            Kind::Err(e) => assert!(e.message.contains("starts with incorrect type")),
            _ => panic!("expected error, got {}", r),
        }
    }

    #[test]
    fn child_errors_short_circuit() {
        let r = run("(+ 1 (/ 1 0) (print \"never\"))");
        assert!(r.is_err());
    }

    #[test]
    fn lambda_application_and_shadowing() {
        assert_eq!(*run("((lambda {x} {+ x 1}) 41)"), *Value::int(42));
        // Inner defs shadow without touching the outer binding
        let r = run(
            "(def {x} 1) \
             ((lambda {} {do (def {x} 2) x})) \
             (x)",
        );
        assert_eq!(*r, *Value::int(1));
    }

    #[test]
    fn lambdas_capture_their_definition_environment() {
        let r = run(
            "(def {make-adder} (lambda {n} {lambda {x} {+ x n}})) \
             (def {add-3} (make-adder 3)) \
             (add-3 4)",
        );
        assert_eq!(*r, *Value::int(7));
    }

    #[test]
    fn typed_parameters_check_and_cast() {
        assert_eq!(*run("((lambda {x:Integer} {x}) 0x10)"), *Value::int(16));
        let r = run("((lambda {x:Integer} {x}) \"nope\")");
        match &r.kind {
            Kind::Err(e) => assert!(e.message.contains("Type mismatch")),
            _ => panic!("expected error, got {}", r),
        }
    }

    #[test]
    fn variadic_parameters_pack_a_list() {
        assert_eq!(*run("(fun {count-args & xs} {len xs}) (count-args 1 2 3 4)"), *Value::int(4));
        let r = run("(fun {bad & x y} {x}) (bad 1 2)");
        assert!(r.is_err());
    }

    #[test]
    fn wrong_arity_is_an_error() {
        let r = run("((lambda {x y} {+ x y}) 1)");
        match &r.kind {
            Kind::Err(e) => assert!(e.message.contains("expects 2 arguments")),
            _ => panic!("expected error, got {}", r),
        }
        let r = run("((lambda {x} {x}) 1 2)");
        assert!(r.is_err());
    }

    #[test]
    fn records_construct_and_read_properties() {
        let r = run(
            "(def-type {Point x:Float y:Float}) \
             (def {p} (Point x:1.0 y:2.0)) \
             (p y)",
        );
        assert_eq!(*r, *Value::float(2.0));
    }

    #[test]
    fn record_property_values_are_evaluated() {
        let r = run(
            "(def-type {Pair a b}) \
             (def {p} (Pair a:(+ 1 2) b:4)) \
             (p a)",
        );
        assert_eq!(*r, *Value::int(3));
    }

    #[test]
    fn record_construction_checks_coverage() {
        let missing = run("(def-type {Point x y}) (Point x:1)");
        assert!(missing.is_err());
        let extra = run("(def-type {Point2 x y}) (Point2 x:1 y:2 z:3)");
        assert!(extra.is_err());
        let wrong = run("(def-type {Point3 x y}) (Point3 x:1 z:2)");
        match &wrong.kind {
            Kind::Err(e) => assert!(e.message.contains("Missing argument 'y'")),
            _ => panic!("expected error, got {}", wrong),
        }
    }

    #[test]
    fn record_typed_properties_cast() {
        let r = run(
            "(def-type {Weight grams:Float}) \
             (def {w} (Weight grams:5)) \
             (w grams)",
        );
        assert_eq!(*r, *Value::float(5.0));
        let bad = run("(def-type {Weight2 grams:Float}) (Weight2 grams:\"heavy\")");
        assert!(bad.is_err());
    }

    #[test]
    fn dict_property_access() {
        let r = run("(def {d} (dict a:1 b:2)) (d b)");
        assert_eq!(*r, *Value::int(2));
    }
}
