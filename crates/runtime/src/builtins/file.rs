//! File I/O builtins
//!
//! `read-file` returns a file's raw bytes as a buffer. `write-file`
//! writes a value's bytes: buffers and strings verbatim, scalars in their
//! native layout, and lists element by element, recursively.

use super::{arg_type, arity};
use benzl_core::env::Env;
use benzl_core::interp::Interp;
use benzl_core::value::{ErrKind, Kind, PrimType, Value};
use std::io::Write as _;
use std::rc::Rc;

/// `(read-file "~/my-data.bin")` => Buffer of the file's bytes
pub fn read_file(interp: &mut Interp, _env: &Env, args: &Rc<Value>) -> Rc<Value> {
    arity!(interp, "read-file", args, 1);
    arg_type!(interp, "read-file", args, 0, PrimType::String);
    let Kind::Str(path) = &args.children()[0].kind else {
        unreachable!("checked above");
    };
    match std::fs::read(&**path) {
        Ok(bytes) => Value::buf(bytes),
        Err(_) => interp.error_at(
            ErrKind::Io,
            args,
            format!("Unable to read the file at '{}'", path),
        ),
    }
}

fn write_value(out: &mut impl std::io::Write, v: &Value) -> Result<(), String> {
    match &v.kind {
        Kind::Buf(bytes) => out.write_all(bytes).map_err(|e| e.to_string()),
        Kind::Str(s) => out.write_all(s.as_bytes()).map_err(|e| e.to_string()),
        Kind::Int(x) => out.write_all(&x.to_ne_bytes()).map_err(|e| e.to_string()),
        Kind::Float(x) => out.write_all(&x.to_ne_bytes()).map_err(|e| e.to_string()),
        Kind::Byte(x) => out.write_all(&[*x]).map_err(|e| e.to_string()),
        Kind::QExpr(children) | Kind::SExpr(children) => {
            for child in children {
                write_value(out, child)?;
            }
            Ok(())
        }
        _ => Err(format!(
            "Writing is not supported for objects of type '{}'",
            v.type_name()
        )),
    }
}

/// `(write-file "~/my-data.bin" {0x01 0x02 0xFF})`
pub fn write_file(interp: &mut Interp, _env: &Env, args: &Rc<Value>) -> Rc<Value> {
    arity!(interp, "write-file", args, 2);
    arg_type!(interp, "write-file", args, 0, PrimType::String);
    let children = args.children();
    let Kind::Str(path) = &children[0].kind else {
        unreachable!("checked above");
    };

    let mut file = match std::fs::File::create(&**path) {
        Ok(file) => file,
        Err(_) => {
            return interp.error_at(
                ErrKind::Io,
                args,
                format!("Unable to open '{}' for writing", path),
            );
        }
    };
    if let Err(message) = write_value(&mut file, &children[1]) {
        return interp.error_at(ErrKind::Io, args, message);
    }
    if let Err(e) = file.flush() {
        return interp.error_at(ErrKind::Io, args, format!("Unable to write '{}': {}", path, e));
    }
    Value::empty_sexpr()
}
