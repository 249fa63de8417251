//! Type introspection, conversion and custom type declaration

use super::arity;
use crate::parser::string_to_number;
use benzl_core::env::Env;
use benzl_core::interp::Interp;
use benzl_core::value::{ErrKind, Kind, PrimType, Symbol, Value, cast_to, to_display_string};
use std::rc::Rc;

/// `(type-of 123.3)` => `<Float>`; record instances report their own type.
pub fn type_of(interp: &mut Interp, _env: &Env, args: &Rc<Value>) -> Rc<Value> {
    arity!(interp, "type-of", args, 1);
    let v = &args.children()[0];
    match &v.kind {
        Kind::Record(record) => record.type_ref.clone(),
        _ => Value::prim_type(v.prim_type_of()),
    }
}

/// `(to-string {1 2 3})` => `"{1 2 3}"`; buffers convert through their
/// bytes, numbers format as decimals.
pub fn to_string(interp: &mut Interp, _env: &Env, args: &Rc<Value>) -> Rc<Value> {
    arity!(interp, "to-string", args, 1);
    let v = &args.children()[0];
    match cast_to(v, PrimType::String) {
        Some(s) => s,
        None => Value::str_(&to_display_string(v, true)),
    }
}

/// `(to-number "123.33")` => `123.33`
pub fn to_number(interp: &mut Interp, _env: &Env, args: &Rc<Value>) -> Rc<Value> {
    arity!(interp, "to-number", args, 1);
    let v = &args.children()[0];
    match &v.kind {
        Kind::Str(s) => match string_to_number(s) {
            Ok(Some(n)) => n,
            Ok(None) => {
                interp.error_at(ErrKind::Type, args, "Failed to convert string to number")
            }
            Err(message) => interp.error_at(ErrKind::Overflow, args, message),
        },
        _ if v.is_number() => v.clone(),
        _ => interp.error_at(
            ErrKind::Type,
            args,
            format!("Cannot convert {} to number", v.type_name()),
        ),
    }
}

const DEF_TYPE_FORM: &str = "Arguments for def-type must be in the form \
                             (def-type {Name prop prop2}) or \
                             (def-type {Name prop:type prop2:type})";

/// `(def-type {Point x:Float y:Float})` binds `Point` to a new type.
pub fn def_type(interp: &mut Interp, env: &Env, args: &Rc<Value>) -> Rc<Value> {
    let children = args.children();
    if children.len() != 1
        || !matches!(children[0].kind, Kind::QExpr(_))
        || children[0].children().len() < 2
    {
        return interp.error_at(ErrKind::Type, args, DEF_TYPE_FORM);
    }
    let decl = children[0].children();
    let name: &Symbol = match &decl[0].kind {
        Kind::Sym(sym) => sym,
        Kind::Type(type_ref) => {
            return interp.error_at(
                ErrKind::AlreadyDeclared,
                args,
                format!("Cannot redefine type '{}'", type_ref.name()),
            );
        }
        _ => return interp.error_at(ErrKind::Type, args, DEF_TYPE_FORM),
    };

    for prop in &decl[1..] {
        match &prop.kind {
            Kind::Sym(_) => {}
            Kind::Pair(key, ty_expr) => {
                if let Kind::Sym(ty_sym) = &ty_expr.kind {
                    if env.get(ty_sym).is_none() {
                        return interp.error_at(
                            ErrKind::Type,
                            args,
                            format!(
                                "def-type: invalid type '{}' for parameter '{}'",
                                ty_sym.name, key.name
                            ),
                        );
                    }
                }
            }
            _ => return interp.error_at(ErrKind::Type, args, DEF_TYPE_FORM),
        }
    }

    let props = Value::qexpr(decl[1..].to_vec());
    let ty = Value::custom_type(name.clone(), props);
    match env.def(name, ty) {
        Ok(()) => Value::empty_sexpr(),
        Err(_) => interp.error_at(
            ErrKind::AlreadyDeclared,
            args,
            format!("'{}' is already declared", name.name),
        ),
    }
}
