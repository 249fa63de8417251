//! Comparison builtins
//!
//! Ordering follows the numeric coercion lattice, widened to String when
//! either side is a string (numbers stringify for the comparison, strings
//! compare by byte order). Results are Integer 0/1. Equality is the deep
//! structural equality from `benzl-core`.

use super::arity;
use benzl_core::env::Env;
use benzl_core::interp::Interp;
use benzl_core::value::{ErrKind, Kind, PrimType, Value, cast_to, values_equal};
use std::cmp::Ordering;
use std::rc::Rc;

#[derive(Debug, Clone, Copy)]
enum OrdOp {
    LessThan,
    GreaterThan,
    LessThanOrEqual,
    GreaterThanOrEqual,
}

impl OrdOp {
    fn name(self) -> &'static str {
        match self {
            OrdOp::LessThan => "<",
            OrdOp::GreaterThan => ">",
            OrdOp::LessThanOrEqual => "<=",
            OrdOp::GreaterThanOrEqual => ">=",
        }
    }

    fn holds(self, ordering: Ordering) -> bool {
        match self {
            OrdOp::LessThan => ordering == Ordering::Less,
            OrdOp::GreaterThan => ordering == Ordering::Greater,
            OrdOp::LessThanOrEqual => ordering != Ordering::Greater,
            OrdOp::GreaterThanOrEqual => ordering != Ordering::Less,
        }
    }
}

fn ord_rank(v: &Value, index: usize, op: OrdOp, interp: &Interp, args: &Value) -> Result<PrimType, Rc<Value>> {
    match v.kind {
        Kind::Str(_) => Ok(PrimType::String),
        Kind::Float(_) => Ok(PrimType::Float),
        Kind::Int(_) => Ok(PrimType::Integer),
        Kind::Byte(_) => Ok(PrimType::Byte),
        _ => Err(interp.error_at(
            ErrKind::Type,
            args,
            format!(
                "Unexpected type for arg {} of '{}' comparison (Got: '{}')",
                index,
                op.name(),
                v.type_name()
            ),
        )),
    }
}

fn rank_order(t: PrimType) -> u8 {
    match t {
        PrimType::Byte => 0,
        PrimType::Integer => 1,
        PrimType::Float => 2,
        _ => 3,
    }
}

fn ord(interp: &mut Interp, env: &Env, args: &Rc<Value>, op: OrdOp) -> Rc<Value> {
    let children = args.children();

    // A single list argument supplies the operands
    if children.len() == 1 {
        if let Kind::QExpr(_) = children[0].kind {
            return ord(interp, env, &children[0], op);
        }
    }
    arity!(interp, op.name(), args, 2);

    let r1 = match ord_rank(&children[0], 0, op, interp, args) {
        Ok(r) => r,
        Err(e) => return e,
    };
    let r2 = match ord_rank(&children[1], 1, op, interp, args) {
        Ok(r) => r,
        Err(e) => return e,
    };
    let target = if rank_order(r1) >= rank_order(r2) { r1 } else { r2 };

    let a = cast_to(&children[0], target).expect("comparable values always cast");
    let b = cast_to(&children[1], target).expect("comparable values always cast");

    let ordering = match (&a.kind, &b.kind) {
        (Kind::Byte(x), Kind::Byte(y)) => x.cmp(y),
        (Kind::Int(x), Kind::Int(y)) => x.cmp(y),
        (Kind::Float(x), Kind::Float(y)) => x.partial_cmp(y).unwrap_or(Ordering::Equal),
        (Kind::Str(x), Kind::Str(y)) => x.as_bytes().cmp(y.as_bytes()),
        _ => unreachable!("operands were cast to a common rank"),
    };
    Value::int(i64::from(op.holds(ordering)))
}

pub fn less_than(interp: &mut Interp, env: &Env, args: &Rc<Value>) -> Rc<Value> {
    ord(interp, env, args, OrdOp::LessThan)
}

pub fn greater_than(interp: &mut Interp, env: &Env, args: &Rc<Value>) -> Rc<Value> {
    ord(interp, env, args, OrdOp::GreaterThan)
}

pub fn less_than_or_equal(interp: &mut Interp, env: &Env, args: &Rc<Value>) -> Rc<Value> {
    ord(interp, env, args, OrdOp::LessThanOrEqual)
}

pub fn greater_than_or_equal(interp: &mut Interp, env: &Env, args: &Rc<Value>) -> Rc<Value> {
    ord(interp, env, args, OrdOp::GreaterThanOrEqual)
}

pub fn equal(interp: &mut Interp, _env: &Env, args: &Rc<Value>) -> Rc<Value> {
    arity!(interp, "==", args, 2);
    let children = args.children();
    Value::int(i64::from(values_equal(&children[0], &children[1])))
}

pub fn not_equal(interp: &mut Interp, _env: &Env, args: &Rc<Value>) -> Rc<Value> {
    arity!(interp, "!=", args, 2);
    let children = args.children();
    Value::int(i64::from(!values_equal(&children[0], &children[1])))
}
