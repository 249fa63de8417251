//! String formatting and console printing builtins
//!
//! `format` walks its format string substituting each unescaped `%` with
//! the next argument's unquoted text form (`\%` is a literal percent).
//! When the arguments run out, the rest of the format string is appended
//! untouched, so later `%` signs print literally.

use benzl_core::env::Env;
use benzl_core::interp::Interp;
use benzl_core::value::{ErrKind, Kind, Value, to_display_string};
use std::rc::Rc;

/// `(format "Hello, %." "Ben")` => `"Hello, Ben."`
pub fn format(interp: &mut Interp, env: &Env, args: &Rc<Value>) -> Rc<Value> {
    let children = args.children();
    if children.is_empty() {
        return interp.error_at(ErrKind::Arity, args, "Got no args for format!");
    }
    if let Kind::QExpr(_) = children[0].kind {
        return format(interp, env, &children[0]);
    }
    let Kind::Str(fmt) = &children[0].kind else {
        return interp.error_at(
            ErrKind::Type,
            args,
            std::format!(
                "First argument to format must be a string (got {})",
                children[0].type_name()
            ),
        );
    };

    let format_args = &children[1..];
    if format_args.is_empty() {
        return Value::str_(fmt);
    }

    let mut out = String::new();
    let mut next_arg = 0usize;
    let mut escaped = false;
    let mut chars = fmt.char_indices();
    while let Some((i, c)) = chars.next() {
        if c == '\\' && !escaped {
            escaped = true;
            continue;
        }
        if !escaped && c == '%' {
            out.push_str(&to_display_string(&format_args[next_arg], false));
            next_arg += 1;
            if next_arg >= format_args.len() {
                // Out of arguments: the remainder is literal
                out.push_str(&fmt[i + c.len_utf8()..]);
                break;
            }
        } else {
            out.push(c);
        }
        escaped = false;
    }
    Value::str_(&out)
}

/// `(print "hello" 2 1.3)` prints each argument in its quoted form.
pub fn print(_interp: &mut Interp, _env: &Env, args: &Rc<Value>) -> Rc<Value> {
    let mut line = String::new();
    for child in args.children() {
        line.push_str(&to_display_string(child, true));
        line.push(' ');
    }
    println!("{}", line.trim_end_matches(' '));
    Value::empty_sexpr()
}

/// `(printf "Hello, %." "Ben")` formats, then prints without quotes.
pub fn printf(interp: &mut Interp, env: &Env, args: &Rc<Value>) -> Rc<Value> {
    let formatted = format(interp, env, args);
    match &formatted.kind {
        Kind::Str(s) => println!("{}", s),
        _ => print!("{}", formatted),
    }
    Value::empty_sexpr()
}
