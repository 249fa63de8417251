//! Sequence builtins over lists, strings and buffers
//!
//! Q-expressions, strings and buffers are treated uniformly wherever that
//! makes sense: `head`, `tail`, `first`, `second`, `last`, `nth`, `take`,
//! `drop` and `len` all accept any of the three. `join` decides its result
//! type by scanning the arguments: bytes/buffers win, then lists, then
//! strings.

use super::{arg_type, arity, not_empty};
use crate::eval::eval;
use benzl_core::env::Env;
use benzl_core::interp::Interp;
use benzl_core::value::{ErrKind, Kind, PrimType, Value, cast_to, to_display_string};
use std::rc::Rc;

/// `(list 1 2 3)` => `{1 2 3}`
pub fn list(_interp: &mut Interp, _env: &Env, args: &Rc<Value>) -> Rc<Value> {
    Value::new(Kind::QExpr(args.children().to_vec()), args.pos.clone())
}

/// `(head {1 2 3})` => `{1}`; `(head "hello")` => `"h"`
pub fn head(interp: &mut Interp, _env: &Env, args: &Rc<Value>) -> Rc<Value> {
    arity!(interp, "head", args, 1);
    let v = &args.children()[0];
    match &v.kind {
        Kind::QExpr(children) => {
            not_empty!(interp, "head", args, 0);
            Value::qexpr(vec![children[0].clone()])
        }
        Kind::Str(s) => {
            if s.is_empty() {
                return Value::qexpr(Vec::new());
            }
            let first = &s[..s.chars().next().map_or(0, char::len_utf8)];
            Value::str_(first)
        }
        Kind::Buf(bytes) => {
            if bytes.is_empty() {
                return Value::qexpr(Vec::new());
            }
            Value::buf(vec![bytes[0]])
        }
        _ => interp.error_at(
            ErrKind::Type,
            args,
            format!(
                "head expects a single list, buffer or string argument (Got: {})",
                v.type_name()
            ),
        ),
    }
}

/// `(tail {1 2 3})` => `{2 3}`; `(tail "hello")` => `"ello"`
pub fn tail(interp: &mut Interp, _env: &Env, args: &Rc<Value>) -> Rc<Value> {
    arity!(interp, "tail", args, 1);
    let v = &args.children()[0];
    match &v.kind {
        Kind::QExpr(children) => {
            not_empty!(interp, "tail", args, 0);
            Value::qexpr(children[1..].to_vec())
        }
        Kind::Str(s) => {
            if s.is_empty() {
                return Value::qexpr(Vec::new());
            }
            Value::str_(&s[s.chars().next().map_or(0, char::len_utf8)..])
        }
        Kind::Buf(bytes) => {
            if bytes.is_empty() {
                return Value::qexpr(Vec::new());
            }
            Value::buf(bytes[1..].to_vec())
        }
        _ => interp.error_at(
            ErrKind::Type,
            args,
            format!(
                "tail expects a single list, buffer or string argument (Got: {})",
                v.type_name()
            ),
        ),
    }
}

fn seq_len(v: &Value) -> Option<usize> {
    match &v.kind {
        Kind::QExpr(children) => Some(children.len()),
        Kind::Str(s) => Some(s.len()),
        Kind::Buf(bytes) => Some(bytes.len()),
        _ => None,
    }
}

/// `(drop 2 {1 2 3 5})` => `{3 5}`
pub fn drop_(interp: &mut Interp, _env: &Env, args: &Rc<Value>) -> Rc<Value> {
    arity!(interp, "drop", args, 2);
    arg_type!(interp, "drop", args, 0, PrimType::Integer);
    let children = args.children();
    let Kind::Int(n) = children[0].kind else {
        unreachable!("checked above");
    };
    let v = &children[1];
    let Some(len) = seq_len(v) else {
        return interp.error_at(
            ErrKind::Type,
            args,
            format!(
                "drop expects a single list, buffer or string argument (Got: {})",
                v.type_name()
            ),
        );
    };
    if len == 0 {
        return Value::qexpr(Vec::new());
    }
    if n < 0 || n as usize > len {
        return interp.error_at(
            ErrKind::Range,
            args,
            format!("drop: out of range ({} length is: {}, got: {})", v.type_name(), len, n),
        );
    }
    let n = n as usize;
    match &v.kind {
        Kind::QExpr(children) => Value::qexpr(children[n..].to_vec()),
        Kind::Str(s) => Value::str_(&String::from_utf8_lossy(&s.as_bytes()[n..])),
        Kind::Buf(bytes) => Value::buf(bytes[n..].to_vec()),
        _ => unreachable!("seq_len covered the kinds"),
    }
}

/// `(take 2 {1 2 3 5})` => `{1 2}`
pub fn take(interp: &mut Interp, _env: &Env, args: &Rc<Value>) -> Rc<Value> {
    arity!(interp, "take", args, 2);
    arg_type!(interp, "take", args, 0, PrimType::Integer);
    let children = args.children();
    let Kind::Int(n) = children[0].kind else {
        unreachable!("checked above");
    };
    let v = &children[1];
    let Some(len) = seq_len(v) else {
        return interp.error_at(
            ErrKind::Type,
            args,
            format!(
                "take expects a single list, buffer or string argument (Got: {})",
                v.type_name()
            ),
        );
    };
    if len == 0 {
        return Value::qexpr(Vec::new());
    }
    if n < 0 || n as usize > len {
        return interp.error_at(
            ErrKind::Range,
            args,
            format!("take: out of range ({} length is: {}, got: {})", v.type_name(), len, n),
        );
    }
    let n = n as usize;
    match &v.kind {
        Kind::QExpr(children) => Value::qexpr(children[..n].to_vec()),
        Kind::Str(s) => Value::str_(&String::from_utf8_lossy(&s.as_bytes()[..n])),
        Kind::Buf(bytes) => Value::buf(bytes[..n].to_vec()),
        _ => unreachable!("seq_len covered the kinds"),
    }
}

fn get_element(
    interp: &mut Interp,
    env: &Env,
    name: &str,
    args: &Rc<Value>,
    v: &Rc<Value>,
    num: i64,
) -> Rc<Value> {
    let Some(len) = seq_len(v) else {
        return interp.error_at(
            ErrKind::Type,
            args,
            format!(
                "{} expects a list, buffer or string argument (Got: {})",
                name,
                v.type_name()
            ),
        );
    };
    let index = if num < 0 { len as i64 + num } else { num };
    if index < 0 || index >= len as i64 {
        return interp.error_at(
            ErrKind::Range,
            args,
            format!("{}: out of range ({} length is: {})", name, v.type_name(), len),
        );
    }
    let index = index as usize;
    match &v.kind {
        // List elements may still be unevaluated expressions
        Kind::QExpr(children) => eval(interp, env, &children[index]),
        Kind::Str(s) => {
            let byte = s.as_bytes()[index];
            Value::str_(&String::from_utf8_lossy(&[byte]))
        }
        Kind::Buf(bytes) => Value::byte(bytes[index]),
        _ => unreachable!("seq_len covered the kinds"),
    }
}

/// `(first {1 2 3})` => `1`
pub fn first(interp: &mut Interp, env: &Env, args: &Rc<Value>) -> Rc<Value> {
    arity!(interp, "first", args, 1);
    let v = args.children()[0].clone();
    get_element(interp, env, "first", args, &v, 0)
}

/// `(second {1 2 3})` => `2`
pub fn second(interp: &mut Interp, env: &Env, args: &Rc<Value>) -> Rc<Value> {
    arity!(interp, "second", args, 1);
    let v = args.children()[0].clone();
    get_element(interp, env, "second", args, &v, 1)
}

/// `(last {1 2 3})` => `3`
pub fn last(interp: &mut Interp, env: &Env, args: &Rc<Value>) -> Rc<Value> {
    arity!(interp, "last", args, 1);
    let v = args.children()[0].clone();
    get_element(interp, env, "last", args, &v, -1)
}

/// `(nth 2 {1 2 3})` => `3`; negative indexes count from the end
pub fn nth(interp: &mut Interp, env: &Env, args: &Rc<Value>) -> Rc<Value> {
    arity!(interp, "nth", args, 2);
    let children = args.children();
    let Some(num) = cast_to(&children[0], PrimType::Integer) else {
        return interp.error_at(
            ErrKind::Type,
            args,
            format!(
                "nth expects a number for the first argument (Got: {})",
                children[0].type_name()
            ),
        );
    };
    let Kind::Int(num) = num.kind else {
        unreachable!("cast produced an integer");
    };
    let v = children[1].clone();
    get_element(interp, env, "nth", args, &v, num)
}

/// `(len {1 2 3})` => `3`; `(len "hello")` => `5`
pub fn len(interp: &mut Interp, _env: &Env, args: &Rc<Value>) -> Rc<Value> {
    arity!(interp, "len", args, 1);
    let v = &args.children()[0];
    match seq_len(v) {
        Some(len) => Value::int(len as i64),
        None => interp.error_at(
            ErrKind::Type,
            args,
            format!("len works on strings, lists and buffers (got {})", v.type_name()),
        ),
    }
}

fn join_as_buffer(interp: &Interp, args: &Value, out: &mut Vec<u8>, v: &Rc<Value>) -> Option<Rc<Value>> {
    match &v.kind {
        Kind::Buf(bytes) => {
            out.extend_from_slice(bytes);
            None
        }
        Kind::QExpr(children) => {
            for child in children {
                if let Some(err) = join_as_buffer(interp, args, out, child) {
                    return Some(err);
                }
            }
            None
        }
        _ => match cast_to(v, PrimType::Buffer) {
            Some(buf) => {
                let Kind::Buf(bytes) = &buf.kind else {
                    unreachable!("cast produced a buffer");
                };
                out.extend_from_slice(bytes);
                None
            }
            None => Some(interp.error_at(
                ErrKind::Type,
                args,
                format!("Cannot perform join on type {}", v.type_name()),
            )),
        },
    }
}

/// Join heterogeneous values. Any byte/buffer argument makes the result a
/// buffer; otherwise any list argument makes it a list (inner lists are
/// flattened one level); otherwise everything is formatted into a string.
pub fn join(interp: &mut Interp, _env: &Env, args: &Rc<Value>) -> Rc<Value> {
    let children = args.children();

    let mut target = PrimType::String;
    for child in children {
        match child.kind {
            Kind::Buf(_) | Kind::Byte(_) => {
                target = PrimType::Buffer;
                break;
            }
            Kind::QExpr(_) | Kind::SExpr(_) => {
                target = PrimType::List;
                break;
            }
            _ => {}
        }
    }

    match target {
        PrimType::List => {
            let mut out: Vec<Rc<Value>> = Vec::new();
            for child in children {
                match &child.kind {
                    Kind::QExpr(inner) => out.extend(inner.iter().cloned()),
                    _ => out.push(child.clone()),
                }
            }
            Value::qexpr(out)
        }
        PrimType::Buffer => {
            let mut out: Vec<u8> = Vec::new();
            for child in children {
                if let Some(err) = join_as_buffer(interp, args, &mut out, child) {
                    return err;
                }
            }
            Value::buf(out)
        }
        _ => {
            let mut out = String::new();
            for child in children {
                // Empty expressions contribute nothing
                if let Kind::SExpr(inner) = &child.kind {
                    if inner.is_empty() {
                        continue;
                    }
                }
                out.push_str(&to_display_string(child, false));
            }
            Value::str_(&out)
        }
    }
}
