//! Variable definition and assignment builtins
//!
//! `def` introduces new bindings in the current scope and refuses to
//! rebind; `set` replaces the nearest existing binding. Both accept typed
//! names (`x:Integer`), and a type attached by `def` keeps constraining
//! every later `set`. `set-prop` writes through to a dictionary's or
//! record instance's own property table.

use crate::eval::{eval, type_from_pair};
use benzl_core::env::Env;
use benzl_core::interp::Interp;
use benzl_core::value::{
    ErrKind, Kind, Symbol, Value, matches_type, to_display_string, type_mismatch_description,
};
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VarAction {
    Define,
    Set,
}

impl VarAction {
    fn name(self) -> &'static str {
        match self {
            VarAction::Define => "def",
            VarAction::Set => "set",
        }
    }
}

fn var(interp: &mut Interp, env: &Env, args: &Rc<Value>, action: VarAction) -> Rc<Value> {
    let children = args.children();
    if children.is_empty() || !matches!(children[0].kind, Kind::QExpr(_)) {
        return interp.error_at(
            ErrKind::Type,
            args,
            format!("{} expects a list of symbols as its first argument", action.name()),
        );
    }
    let names = children[0].children();
    for name in names {
        if !matches!(name.kind, Kind::Sym(_) | Kind::Pair(..)) {
            return interp.error_at(
                ErrKind::Type,
                args,
                format!("{} cannot define non-symbol", action.name()),
            );
        }
    }
    if names.len() != children.len() - 1 {
        return interp.error_at(
            ErrKind::Arity,
            args,
            format!(
                "{} cannot define incorrect number of values to symbols",
                action.name()
            ),
        );
    }

    for (name, value) in names.iter().zip(&children[1..]) {
        let result = match action {
            VarAction::Define => define_one(interp, env, args, name, value),
            VarAction::Set => set_one(interp, env, args, name, value),
        };
        if let Some(err) = result {
            return err;
        }
    }
    Value::empty_sexpr()
}

fn define_one(
    interp: &mut Interp,
    env: &Env,
    args: &Rc<Value>,
    name: &Rc<Value>,
    value: &Rc<Value>,
) -> Option<Rc<Value>> {
    match &name.kind {
        Kind::Pair(key, ty_expr) => {
            let Some(ty) = type_from_pair(env, ty_expr) else {
                return Some(interp.error_at(
                    ErrKind::Type,
                    args,
                    format!(
                        "Variable '{}': Invalid type '{}'",
                        key.name,
                        to_display_string(ty_expr, true)
                    ),
                ));
            };
            let bound = match matches_type(value, &ty) {
                Ok(None) => value.clone(),
                Ok(Some(cast)) => cast,
                Err(()) => {
                    return Some(interp.error_at(
                        ErrKind::Type,
                        args,
                        format!(
                            "Variable '{}': {}",
                            key.name,
                            type_mismatch_description(&ty, value)
                        ),
                    ));
                }
            };
            match env.def_typed(key, bound, ty) {
                Ok(()) => None,
                Err(_) => Some(already_declared(interp, args, key)),
            }
        }
        Kind::Sym(sym) => match env.def(sym, value.clone()) {
            Ok(()) => None,
            Err(_) => Some(already_declared(interp, args, sym)),
        },
        _ => unreachable!("names were validated"),
    }
}

fn set_one(
    interp: &mut Interp,
    env: &Env,
    args: &Rc<Value>,
    name: &Rc<Value>,
    value: &Rc<Value>,
) -> Option<Rc<Value>> {
    let sym: &Symbol = match &name.kind {
        Kind::Sym(sym) => sym,
        Kind::Pair(key, _) => key,
        _ => unreachable!("names were validated"),
    };
    let mut bound = value.clone();
    if let Some(ty) = env.declared_type(sym) {
        match matches_type(value, &ty) {
            Ok(None) => {}
            Ok(Some(cast)) => bound = cast,
            Err(()) => {
                return Some(interp.error_at(
                    ErrKind::Type,
                    args,
                    format!("Variable '{}': {}", sym.name, type_mismatch_description(&ty, value)),
                ));
            }
        }
    }
    match env.set(sym, bound) {
        Ok(()) => None,
        Err(_) => Some(interp.error_at(
            ErrKind::Unbound,
            args,
            format!("'{}' must be defined before it can be set", sym.name),
        )),
    }
}

fn already_declared(interp: &Interp, args: &Rc<Value>, sym: &Symbol) -> Rc<Value> {
    interp.error_at(
        ErrKind::AlreadyDeclared,
        args,
        format!("'{}' is already declared", sym.name),
    )
}

/// `(def {x} 10)`
pub fn def(interp: &mut Interp, env: &Env, args: &Rc<Value>) -> Rc<Value> {
    var(interp, env, args, VarAction::Define)
}

/// `(set {x} 20)`; fails when `x` has never been defined
pub fn set(interp: &mut Interp, env: &Env, args: &Rc<Value>) -> Rc<Value> {
    var(interp, env, args, VarAction::Set)
}

/// `(set-prop {obj prop} value)` writes a dictionary key or a declared
/// record property in place.
pub fn set_prop(interp: &mut Interp, env: &Env, args: &Rc<Value>) -> Rc<Value> {
    let children = args.children();
    let form_err = "set-prop takes arguments in the form (set-prop {obj prop} value)";
    if children.len() != 2 || !matches!(children[0].kind, Kind::QExpr(_)) {
        return interp.error_at(ErrKind::Type, args, form_err);
    }
    let target = children[0].children();
    if target.len() != 2 {
        return interp.error_at(ErrKind::Type, args, form_err);
    }
    let Kind::Sym(prop) = &target[1].kind else {
        return interp.error_at(ErrKind::Type, args, "set-prop cannot define non-symbol");
    };
    let value = &children[1];

    let obj = eval(interp, env, &target[0]);
    match &obj.kind {
        Kind::Err(_) => obj.clone(),
        Kind::Dict(table) => {
            table.borrow_mut().insert(prop.clone(), value.clone());
            obj.clone()
        }
        Kind::Record(record) => {
            let Kind::Type(type_ref) = &record.type_ref.kind else {
                unreachable!("record instances hold type values");
            };
            let benzl_core::value::TypeRef::Custom { name, props } = type_ref else {
                unreachable!("record instances have custom types");
            };
            let declared = props.children().iter().any(|decl| match &decl.kind {
                Kind::Pair(key, _) => key == prop,
                Kind::Sym(sym) => sym == prop,
                _ => false,
            });
            if !declared {
                return interp.error_at(
                    ErrKind::UnknownProperty,
                    args,
                    format!("set-prop: {} has no property {}", name.name, prop.name),
                );
            }
            record.props.borrow_mut().insert(prop.clone(), value.clone());
            obj.clone()
        }
        _ => interp.error_at(
            ErrKind::Type,
            args,
            format!("Cannot call set-prop on '{}'", to_display_string(&obj, true)),
        ),
    }
}
