//! Arithmetic, bitwise and rounding builtins
//!
//! Binary operations follow the numeric coercion lattice
//! `Byte < Integer < Float`: the result type is the highest rank among
//! the operands and everything is cast up before the fold. Bitwise and
//! shift operations stop at Integer; applying them to a Float is an
//! error. `+` over non-numeric arguments hands off to `join`.

use super::list;
use benzl_core::env::Env;
use benzl_core::interp::Interp;
use benzl_core::value::{ErrKind, Kind, PrimType, Value, cast_to};
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MathOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    ShiftRight,
    ShiftLeft,
    BitwiseAnd,
    BitwiseOr,
    BitwiseXor,
}

impl MathOp {
    fn name(self) -> &'static str {
        match self {
            MathOp::Add => "+",
            MathOp::Subtract => "-",
            MathOp::Multiply => "*",
            MathOp::Divide => "/",
            MathOp::Modulo => "%",
            MathOp::ShiftRight => ">>",
            MathOp::ShiftLeft => "<<",
            MathOp::BitwiseAnd => "&",
            MathOp::BitwiseOr => "|",
            MathOp::BitwiseXor => "^",
        }
    }
}

fn cast_all(children: &[Rc<Value>], target: PrimType) -> Vec<Rc<Value>> {
    children
        .iter()
        .map(|c| cast_to(c, target).expect("numeric arguments always cast"))
        .collect()
}

fn int_op(interp: &Interp, args: &Value, children: &[Rc<Value>], op: MathOp) -> Rc<Value> {
    let Kind::Int(first) = children[0].kind else {
        unreachable!("int_op requires integer arguments");
    };
    if op == MathOp::Subtract && children.len() == 1 {
        return Value::int(first.wrapping_neg());
    }
    let mut x = first;
    for child in &children[1..] {
        let Kind::Int(y) = child.kind else {
            unreachable!("int_op requires integer arguments");
        };
        x = match op {
            MathOp::Add => x.wrapping_add(y),
            MathOp::Subtract => x.wrapping_sub(y),
            MathOp::Multiply => x.wrapping_mul(y),
            MathOp::Divide => {
                if y == 0 {
                    return interp.error_at(ErrKind::DivisionByZero, args, "Division by zero!");
                }
                x.wrapping_div(y)
            }
            MathOp::Modulo => {
                if y == 0 {
                    return interp.error_at(ErrKind::DivisionByZero, args, "Modulo by zero");
                }
                x.wrapping_rem(y)
            }
            MathOp::ShiftRight => x.wrapping_shr(y as u32),
            MathOp::ShiftLeft => x.wrapping_shl(y as u32),
            MathOp::BitwiseAnd => x & y,
            MathOp::BitwiseOr => x | y,
            MathOp::BitwiseXor => x ^ y,
        };
    }
    Value::int(x)
}

fn float_op(interp: &Interp, args: &Value, children: &[Rc<Value>], op: MathOp) -> Rc<Value> {
    let Kind::Float(first) = children[0].kind else {
        unreachable!("float_op requires float arguments");
    };
    if op == MathOp::Subtract && children.len() == 1 {
        return Value::float(-first);
    }
    let mut x = first;
    for child in &children[1..] {
        let Kind::Float(y) = child.kind else {
            unreachable!("float_op requires float arguments");
        };
        x = match op {
            MathOp::Add => x + y,
            MathOp::Subtract => x - y,
            MathOp::Multiply => x * y,
            MathOp::Divide => {
                if y == 0.0 {
                    return interp.error_at(ErrKind::DivisionByZero, args, "Division by zero");
                }
                x / y
            }
            MathOp::Modulo => {
                if y == 0.0 {
                    return interp.error_at(ErrKind::DivisionByZero, args, "Modulo by zero");
                }
                x % y
            }
            _ => {
                return interp.error_at(
                    ErrKind::Type,
                    args,
                    format!("Unsupported operation: {} on Float", op.name()),
                );
            }
        };
    }
    Value::float(x)
}

fn byte_op(interp: &Interp, args: &Value, children: &[Rc<Value>], op: MathOp) -> Rc<Value> {
    if children.len() < 2 {
        return interp.error_at(
            ErrKind::Arity,
            args,
            format!("{} requires at least 2 arguments!", op.name()),
        );
    }
    let Kind::Byte(first) = children[0].kind else {
        unreachable!("byte_op requires byte arguments");
    };
    let mut x = first;
    for child in &children[1..] {
        let Kind::Byte(y) = child.kind else {
            unreachable!("byte_op requires byte arguments");
        };
        x = match op {
            MathOp::Add => x.wrapping_add(y),
            MathOp::Subtract => x.wrapping_sub(y),
            MathOp::Multiply => x.wrapping_mul(y),
            MathOp::Divide => {
                if y == 0 {
                    return interp.error_at(ErrKind::DivisionByZero, args, "Division by zero");
                }
                x / y
            }
            MathOp::Modulo => {
                if y == 0 {
                    return interp.error_at(ErrKind::DivisionByZero, args, "Modulo by zero");
                }
                x % y
            }
            MathOp::ShiftRight => x.wrapping_shr(u32::from(y)),
            MathOp::ShiftLeft => x.wrapping_shl(u32::from(y)),
            MathOp::BitwiseAnd => x & y,
            MathOp::BitwiseOr => x | y,
            MathOp::BitwiseXor => x ^ y,
        };
    }
    Value::byte(x)
}

fn math_op(interp: &mut Interp, env: &Env, args: &Value, op: MathOp) -> Rc<Value> {
    let children = args.children();

    // A single list argument supplies the operands
    if children.len() == 1 {
        if let Kind::QExpr(_) = children[0].kind {
            return math_op(interp, env, &children[0], op);
        }
    }

    let mut target = PrimType::Byte;
    for child in children {
        match child.kind {
            Kind::Float(_) => target = PrimType::Float,
            Kind::Int(_) => {
                if target != PrimType::Float {
                    target = PrimType::Integer;
                }
            }
            Kind::Byte(_) => {}
            _ => {
                return interp.error_at(
                    ErrKind::Type,
                    args,
                    format!("Cannot do operation '{}' on '{}'", op.name(), child.type_name()),
                );
            }
        }
    }
    if children.is_empty() {
        return interp.error_at(
            ErrKind::Arity,
            args,
            format!("{} requires at least 2 arguments!", op.name()),
        );
    }

    match target {
        PrimType::Byte => byte_op(interp, args, children, op),
        PrimType::Integer => int_op(interp, args, &cast_all(children, target), op),
        _ => float_op(interp, args, &cast_all(children, target), op),
    }
}

/// `+` adds numbers; anything else joins.
pub fn add(interp: &mut Interp, env: &Env, args: &Rc<Value>) -> Rc<Value> {
    if args.children().iter().any(|c| !c.is_number()) {
        return list::join(interp, env, args);
    }
    math_op(interp, env, args, MathOp::Add)
}

pub fn subtract(interp: &mut Interp, env: &Env, args: &Rc<Value>) -> Rc<Value> {
    math_op(interp, env, args, MathOp::Subtract)
}

pub fn multiply(interp: &mut Interp, env: &Env, args: &Rc<Value>) -> Rc<Value> {
    math_op(interp, env, args, MathOp::Multiply)
}

pub fn divide(interp: &mut Interp, env: &Env, args: &Rc<Value>) -> Rc<Value> {
    math_op(interp, env, args, MathOp::Divide)
}

pub fn modulo(interp: &mut Interp, env: &Env, args: &Rc<Value>) -> Rc<Value> {
    math_op(interp, env, args, MathOp::Modulo)
}

pub fn shift_right(interp: &mut Interp, env: &Env, args: &Rc<Value>) -> Rc<Value> {
    math_op(interp, env, args, MathOp::ShiftRight)
}

pub fn shift_left(interp: &mut Interp, env: &Env, args: &Rc<Value>) -> Rc<Value> {
    math_op(interp, env, args, MathOp::ShiftLeft)
}

pub fn bitwise_and(interp: &mut Interp, env: &Env, args: &Rc<Value>) -> Rc<Value> {
    math_op(interp, env, args, MathOp::BitwiseAnd)
}

pub fn bitwise_or(interp: &mut Interp, env: &Env, args: &Rc<Value>) -> Rc<Value> {
    math_op(interp, env, args, MathOp::BitwiseOr)
}

pub fn bitwise_xor(interp: &mut Interp, env: &Env, args: &Rc<Value>) -> Rc<Value> {
    math_op(interp, env, args, MathOp::BitwiseXor)
}

fn extreme(
    interp: &mut Interp,
    env: &Env,
    args: &Rc<Value>,
    name: &str,
    keep_first: fn(&mut Interp, &Env, &Rc<Value>) -> Rc<Value>,
) -> Rc<Value> {
    let children = args.children();
    if children.len() == 1 {
        if let Kind::QExpr(_) = children[0].kind {
            return extreme(interp, env, &children[0], name, keep_first);
        }
    }
    if children.len() < 2 {
        return interp.error_at(
            ErrKind::Arity,
            args,
            format!("{} requires at least two numeric arguments", name),
        );
    }
    let mut best = &children[0];
    for next in &children[1..] {
        let pair = Value::sexpr(vec![best.clone(), next.clone()]);
        let keeps = keep_first(interp, env, &pair);
        if keeps.is_err() {
            return keeps;
        }
        if matches!(keeps.kind, Kind::Int(0)) {
            best = next;
        }
    }
    best.clone()
}

/// `(min 3 5 2)` or `(min {3 5 2})`; the first of equals wins.
pub fn min(interp: &mut Interp, env: &Env, args: &Rc<Value>) -> Rc<Value> {
    extreme(interp, env, args, "min", super::compare::less_than_or_equal)
}

/// `(max 3 5 2)` or `(max {3 5 2})`; the first of equals wins.
pub fn max(interp: &mut Interp, env: &Env, args: &Rc<Value>) -> Rc<Value> {
    extreme(interp, env, args, "max", super::compare::greater_than_or_equal)
}

fn round_op(
    interp: &mut Interp,
    args: &Rc<Value>,
    name: &str,
    round: fn(f64) -> f64,
) -> Rc<Value> {
    super::arity!(interp, name, args, 1);
    let v = &args.children()[0];
    match v.kind {
        Kind::Int(_) | Kind::Byte(_) => v.clone(),
        Kind::Float(x) => Value::int(round(x) as i64),
        _ => interp.error_at(ErrKind::Type, args, format!("{} only works on numbers", name)),
    }
}

/// `(floor 10.75)` => `10`; integers and bytes pass through.
pub fn floor(interp: &mut Interp, _env: &Env, args: &Rc<Value>) -> Rc<Value> {
    round_op(interp, args, "floor", f64::floor)
}

/// `(ceil 10.75)` => `11`; integers and bytes pass through.
pub fn ceil(interp: &mut Interp, _env: &Env, args: &Rc<Value>) -> Rc<Value> {
    round_op(interp, args, "ceil", f64::ceil)
}
