//! Buffer builtins: creation, field I/O and chunked mapping
//!
//! Buffers are owned byte sequences. The `get-`/`put-` family reads and
//! writes fixed-width scalars at byte offsets in the machine's native
//! endianness; every access is bounds-checked against the buffer size,
//! and every put returns a new buffer rather than mutating its argument.

use super::arity;
use crate::eval::call;
use benzl_core::env::Env;
use benzl_core::interp::Interp;
use benzl_core::value::{ErrKind, Kind, PrimType, Value, cast_to};
use std::rc::Rc;

/// `(create-buffer 32)` => a zeroed 32-byte buffer
pub fn create_buffer(interp: &mut Interp, _env: &Env, args: &Rc<Value>) -> Rc<Value> {
    let children = args.children();
    let size = match children.first().map(|c| &c.kind) {
        Some(Kind::Int(n)) if children.len() == 1 && *n >= 0 => *n as usize,
        _ => {
            return interp.error_at(
                ErrKind::Type,
                args,
                "create-buffer takes a single integer argument for the length",
            );
        }
    };
    Value::buf(vec![0; size])
}

/// `(buffer-with-bytes 0xFF 0xFE 0x00)`
pub fn buffer_with_bytes(interp: &mut Interp, _env: &Env, args: &Rc<Value>) -> Rc<Value> {
    let children = args.children();
    let mut bytes = Vec::with_capacity(children.len());
    for (i, child) in children.iter().enumerate() {
        match cast_to(child, PrimType::Byte) {
            Some(b) => {
                let Kind::Byte(b) = b.kind else {
                    unreachable!("cast produced a byte");
                };
                bytes.push(b);
            }
            None => {
                return interp.error_at(
                    ErrKind::Type,
                    args,
                    format!(
                        "buffer-with-bytes expects only bytes (got: {} for argument {})",
                        child.type_name(),
                        i
                    ),
                );
            }
        }
    }
    Value::buf(bytes)
}

fn bad_args(interp: &Interp, args: &Value, name: &str) -> Rc<Value> {
    interp.error_at(
        ErrKind::Type,
        args,
        format!(
            "{} expects arguments in the form ({} buffer:Buffer offset:Integer value:Integer)",
            name, name
        ),
    )
}

fn out_of_range(
    interp: &Interp,
    args: &Value,
    name: &str,
    offset: i64,
    width: usize,
    size: usize,
) -> Rc<Value> {
    interp.error_at(
        ErrKind::Range,
        args,
        format!(
            "{}: offset {} out of range to set {} bytes (Buffer size: {} bytes)",
            name, offset, width, size
        ),
    )
}

fn int_arg(v: &Rc<Value>) -> Option<i64> {
    let cast = cast_to(v, PrimType::Integer)?;
    match cast.kind {
        Kind::Int(x) => Some(x),
        _ => None,
    }
}

fn write_scalar(bytes: &mut [u8], offset: usize, value: i64, width: usize) {
    match width {
        1 => bytes[offset] = value as u8,
        2 => bytes[offset..offset + 2].copy_from_slice(&(value as u16).to_ne_bytes()),
        4 => bytes[offset..offset + 4].copy_from_slice(&(value as u32).to_ne_bytes()),
        _ => bytes[offset..offset + 8].copy_from_slice(&(value as u64).to_ne_bytes()),
    }
}

fn read_scalar(bytes: &[u8], offset: usize, width: usize, signed: bool) -> i64 {
    let field = &bytes[offset..offset + width];
    match (width, signed) {
        (1, false) => i64::from(field[0]),
        (1, true) => i64::from(field[0] as i8),
        (2, false) => i64::from(u16::from_ne_bytes([field[0], field[1]])),
        (2, true) => i64::from(i16::from_ne_bytes([field[0], field[1]])),
        (4, false) => i64::from(u32::from_ne_bytes([field[0], field[1], field[2], field[3]])),
        (4, true) => i64::from(i32::from_ne_bytes([field[0], field[1], field[2], field[3]])),
        (8, false) => u64::from_ne_bytes(field.try_into().expect("width checked")) as i64,
        _ => i64::from_ne_bytes(field.try_into().expect("width checked")),
    }
}

fn put_scalar(interp: &mut Interp, args: &Rc<Value>, name: &str, width: usize) -> Rc<Value> {
    let children = args.children();
    if children.len() != 3 || !matches!(children[0].kind, Kind::Buf(_)) {
        return bad_args(interp, args, name);
    }
    let Kind::Buf(bytes) = &children[0].kind else {
        unreachable!("checked above");
    };
    let Some(offset) = int_arg(&children[1]) else {
        return bad_args(interp, args, name);
    };
    let Some(value) = int_arg(&children[2]) else {
        return bad_args(interp, args, name);
    };
    if offset < 0 || (offset as usize) + width > bytes.len() {
        return out_of_range(interp, args, name, offset, width, bytes.len());
    }
    let mut out = bytes.clone();
    write_scalar(&mut out, offset as usize, value, width);
    Value::buf(out)
}

fn get_scalar(
    interp: &mut Interp,
    args: &Rc<Value>,
    name: &str,
    width: usize,
    signed: bool,
    as_byte: bool,
) -> Rc<Value> {
    let children = args.children();
    if children.len() != 2 || !matches!(children[0].kind, Kind::Buf(_)) {
        return bad_args(interp, args, name);
    }
    let Kind::Buf(bytes) = &children[0].kind else {
        unreachable!("checked above");
    };
    let Some(offset) = int_arg(&children[1]) else {
        return bad_args(interp, args, name);
    };
    if offset < 0 || (offset as usize) + width > bytes.len() {
        return out_of_range(interp, args, name, offset, width, bytes.len());
    }
    let value = read_scalar(bytes, offset as usize, width, signed);
    if as_byte {
        Value::byte(value as u8)
    } else {
        Value::int(value)
    }
}

pub fn get_byte(interp: &mut Interp, _env: &Env, args: &Rc<Value>) -> Rc<Value> {
    get_scalar(interp, args, "get-byte", 1, false, true)
}

pub fn put_byte(interp: &mut Interp, _env: &Env, args: &Rc<Value>) -> Rc<Value> {
    put_scalar(interp, args, "put-byte", 1)
}

pub fn get_unsigned_char(interp: &mut Interp, _env: &Env, args: &Rc<Value>) -> Rc<Value> {
    get_scalar(interp, args, "get-unsigned-char", 1, false, false)
}

pub fn put_unsigned_char(interp: &mut Interp, _env: &Env, args: &Rc<Value>) -> Rc<Value> {
    put_scalar(interp, args, "put-unsigned-char", 1)
}

pub fn get_signed_char(interp: &mut Interp, _env: &Env, args: &Rc<Value>) -> Rc<Value> {
    get_scalar(interp, args, "get-signed-char", 1, true, false)
}

pub fn put_signed_char(interp: &mut Interp, _env: &Env, args: &Rc<Value>) -> Rc<Value> {
    put_scalar(interp, args, "put-signed-char", 1)
}

pub fn get_unsigned_short(interp: &mut Interp, _env: &Env, args: &Rc<Value>) -> Rc<Value> {
    get_scalar(interp, args, "get-unsigned-short", 2, false, false)
}

pub fn put_unsigned_short(interp: &mut Interp, _env: &Env, args: &Rc<Value>) -> Rc<Value> {
    put_scalar(interp, args, "put-unsigned-short", 2)
}

pub fn get_signed_short(interp: &mut Interp, _env: &Env, args: &Rc<Value>) -> Rc<Value> {
    get_scalar(interp, args, "get-signed-short", 2, true, false)
}

pub fn put_signed_short(interp: &mut Interp, _env: &Env, args: &Rc<Value>) -> Rc<Value> {
    put_scalar(interp, args, "put-signed-short", 2)
}

pub fn get_unsigned_integer(interp: &mut Interp, _env: &Env, args: &Rc<Value>) -> Rc<Value> {
    get_scalar(interp, args, "get-unsigned-integer", 4, false, false)
}

pub fn put_unsigned_integer(interp: &mut Interp, _env: &Env, args: &Rc<Value>) -> Rc<Value> {
    put_scalar(interp, args, "put-unsigned-integer", 4)
}

pub fn get_signed_integer(interp: &mut Interp, _env: &Env, args: &Rc<Value>) -> Rc<Value> {
    get_scalar(interp, args, "get-signed-integer", 4, true, false)
}

pub fn put_signed_integer(interp: &mut Interp, _env: &Env, args: &Rc<Value>) -> Rc<Value> {
    put_scalar(interp, args, "put-signed-integer", 4)
}

pub fn get_unsigned_long(interp: &mut Interp, _env: &Env, args: &Rc<Value>) -> Rc<Value> {
    get_scalar(interp, args, "get-unsigned-long", 8, false, false)
}

pub fn put_unsigned_long(interp: &mut Interp, _env: &Env, args: &Rc<Value>) -> Rc<Value> {
    put_scalar(interp, args, "put-unsigned-long", 8)
}

pub fn get_signed_long(interp: &mut Interp, _env: &Env, args: &Rc<Value>) -> Rc<Value> {
    get_scalar(interp, args, "get-signed-long", 8, true, false)
}

pub fn put_signed_long(interp: &mut Interp, _env: &Env, args: &Rc<Value>) -> Rc<Value> {
    put_scalar(interp, args, "put-signed-long", 8)
}

/// `(get-string buffer 0)` reads a NUL-terminated string at the offset.
pub fn get_string(interp: &mut Interp, _env: &Env, args: &Rc<Value>) -> Rc<Value> {
    let children = args.children();
    if children.len() != 2 || !matches!(children[0].kind, Kind::Buf(_)) {
        return interp.error_at(
            ErrKind::Type,
            args,
            "get-string expects arguments in the form (get-string buffer:Buffer offset:Integer)",
        );
    }
    let Kind::Buf(bytes) = &children[0].kind else {
        unreachable!("checked above");
    };
    let Some(offset) = int_arg(&children[1]) else {
        return interp.error_at(
            ErrKind::Type,
            args,
            "get-string expects arguments in the form (get-string buffer:Buffer offset:Integer)",
        );
    };
    if offset < 0 || (offset as usize) + 1 > bytes.len() {
        return interp.error_at(
            ErrKind::Range,
            args,
            format!(
                "get-string: offset {} out of range (Buffer size: {} bytes)",
                offset,
                bytes.len()
            ),
        );
    }
    let tail = &bytes[offset as usize..];
    let end = tail.iter().position(|b| *b == 0).unwrap_or(tail.len());
    Value::str_(&String::from_utf8_lossy(&tail[..end]))
}

/// `(put-string buffer 0 "hello!")` writes the string and its terminator.
pub fn put_string(interp: &mut Interp, _env: &Env, args: &Rc<Value>) -> Rc<Value> {
    let children = args.children();
    if children.len() != 3
        || !matches!(children[0].kind, Kind::Buf(_))
        || !matches!(children[2].kind, Kind::Str(_))
    {
        return interp.error_at(
            ErrKind::Type,
            args,
            "put-string expects arguments in the form \
             (put-string buffer:Buffer offset:Integer string:String)",
        );
    }
    let (Kind::Buf(bytes), Kind::Str(s)) = (&children[0].kind, &children[2].kind) else {
        unreachable!("checked above");
    };
    let Some(offset) = int_arg(&children[1]) else {
        return interp.error_at(
            ErrKind::Type,
            args,
            "put-string expects arguments in the form \
             (put-string buffer:Buffer offset:Integer string:String)",
        );
    };
    let len = s.len();
    if offset < 0 || (offset as usize) + len + 1 > bytes.len() {
        return out_of_range(interp, args, "put-string", offset, len + 1, bytes.len());
    }
    let mut out = bytes.clone();
    let offset = offset as usize;
    out[offset..offset + len].copy_from_slice(s.as_bytes());
    out[offset + len] = 0;
    Value::buf(out)
}

/// `(get-bytes source 0 128)` copies a range into a new buffer.
pub fn get_bytes(interp: &mut Interp, _env: &Env, args: &Rc<Value>) -> Rc<Value> {
    let children = args.children();
    let form = "get-bytes expects arguments in the form \
                (get-bytes source:Buffer offset:Integer length:Integer)";
    if children.len() != 3 || !matches!(children[0].kind, Kind::Buf(_)) {
        return interp.error_at(ErrKind::Type, args, form);
    }
    let Kind::Buf(bytes) = &children[0].kind else {
        unreachable!("checked above");
    };
    let (Some(offset), Some(length)) = (int_arg(&children[1]), int_arg(&children[2])) else {
        return interp.error_at(ErrKind::Type, args, form);
    };
    if offset < 0 || length < 0 || (offset as usize) + (length as usize) > bytes.len() {
        return interp.error_at(
            ErrKind::Range,
            args,
            format!(
                "get-bytes: offset {} out of range to get {} bytes (Buffer size: {} bytes)",
                offset,
                length,
                bytes.len()
            ),
        );
    }
    Value::buf(bytes[offset as usize..offset as usize + length as usize].to_vec())
}

/// `(put-bytes target 0 source)` copies a whole buffer into another.
pub fn put_bytes(interp: &mut Interp, _env: &Env, args: &Rc<Value>) -> Rc<Value> {
    let children = args.children();
    let form = "put-bytes expects arguments in the form \
                (put-bytes target:Buffer offset:Integer source:Buffer)";
    if children.len() != 3
        || !matches!(children[0].kind, Kind::Buf(_))
        || !matches!(children[2].kind, Kind::Buf(_))
    {
        return interp.error_at(ErrKind::Type, args, form);
    }
    let (Kind::Buf(bytes), Kind::Buf(source)) = (&children[0].kind, &children[2].kind) else {
        unreachable!("checked above");
    };
    let Some(offset) = int_arg(&children[1]) else {
        return interp.error_at(ErrKind::Type, args, form);
    };
    if offset < 0 || (offset as usize) + source.len() > bytes.len() {
        return out_of_range(interp, args, "put-bytes", offset, source.len(), bytes.len());
    }
    let mut out = bytes.clone();
    out[offset as usize..offset as usize + source.len()].copy_from_slice(source);
    Value::buf(out)
}

/// `(buffer-map buffer 4 (lambda {chunk offset} {...}))`
///
/// Calls the function once per `chunk`-sized slice and composes each
/// returned scalar or buffer back into a new buffer at the same offset.
pub fn buffer_map(interp: &mut Interp, env: &Env, args: &Rc<Value>) -> Rc<Value> {
    arity!(interp, "buffer-map", args, 3);
    let children = args.children();
    let (Kind::Buf(bytes), Kind::Int(chunk), Kind::Fun(_)) =
        (&children[0].kind, &children[1].kind, &children[2].kind)
    else {
        return interp.error_at(
            ErrKind::Type,
            args,
            "buffer-map expects 3 arguments in the form \
             (buffer-map buffer:Buffer componentSize:Integer func:Function)",
        );
    };
    if *chunk <= 0 {
        return interp.error_at(
            ErrKind::Range,
            args,
            format!("buffer-map: invalid component size {}", chunk),
        );
    }
    let chunk = *chunk as usize;
    let fun = &children[2];
    let mut out = vec![0u8; bytes.len()];

    let mut i = 0usize;
    let mut index = 0i64;
    while i < bytes.len() {
        let span = chunk.min(bytes.len() - i);
        let mut piece = vec![0u8; chunk];
        piece[..span].copy_from_slice(&bytes[i..i + span]);

        let call_args = Value::sexpr(vec![Value::buf(piece), Value::int(index)]);
        let r = call(interp, env, fun, &call_args);
        match &r.kind {
            Kind::Err(_) => return r,
            Kind::Byte(b) => out[i] = *b,
            Kind::Int(x) => {
                let width = span.min(8);
                let scalar = x.to_ne_bytes();
                out[i..i + width].copy_from_slice(&scalar[..width]);
            }
            Kind::Float(x) => {
                let width = span.min(8);
                let scalar = x.to_ne_bytes();
                out[i..i + width].copy_from_slice(&scalar[..width]);
            }
            Kind::Buf(returned) => {
                let width = span.min(returned.len());
                out[i..i + width].copy_from_slice(&returned[..width]);
            }
            _ => {}
        }
        i += chunk;
        index += 1;
    }
    Value::buf(out)
}
