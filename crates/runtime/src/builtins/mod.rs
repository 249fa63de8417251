//! Builtin functions: the primitive operations of the language
//!
//! Each submodule implements one family of builtins with the shared
//! signature `fn(&mut Interp, &Env, &Value) -> Rc<Value>`, receiving its
//! already-evaluated arguments as an S-expression. [`register`] binds the
//! whole set into an environment (normally the root, once, at startup).

use benzl_core::env::Env;
use benzl_core::value::{BuiltinFn, Symbol, Value};

pub mod buffer;
pub mod compare;
pub mod conditional;
pub mod dictionary;
pub mod env_ops;
pub mod error;
pub mod eval_ops;
pub mod file;
pub mod format;
pub mod function;
pub mod list;
pub mod math;
pub mod misc;
pub mod types;

/// Reject a call with the wrong number of arguments.
macro_rules! arity {
    ($interp:expr, $name:expr, $args:expr, $expected:expr) => {
        if $args.children().len() != $expected {
            return $interp.error_at(
                benzl_core::value::ErrKind::Arity,
                $args,
                format!(
                    "Function '{}' passed wrong number of arguments (Got: {} Expected: {})",
                    $name,
                    $args.children().len(),
                    $expected
                ),
            );
        }
    };
}

/// Reject a call whose argument at `$index` has the wrong primitive type.
macro_rules! arg_type {
    ($interp:expr, $name:expr, $args:expr, $index:expr, $expected:expr) => {
        if $args.children()[$index].prim_type_of() != $expected {
            return $interp.error_at(
                benzl_core::value::ErrKind::Type,
                $args,
                format!(
                    "Function '{}' passed incorrect type for arg {} (Got: {} Expected: {})",
                    $name,
                    $index,
                    $args.children()[$index].type_name(),
                    $expected.name()
                ),
            );
        }
    };
}

/// Reject a call whose argument at `$index` is an empty expression.
macro_rules! not_empty {
    ($interp:expr, $name:expr, $args:expr, $index:expr) => {
        if $args.children()[$index].children().is_empty() {
            return $interp.error_at(
                benzl_core::value::ErrKind::Range,
                $args,
                format!("Function '{}' passed {{}} for argument {}", $name, $index),
            );
        }
    };
}

pub(crate) use arg_type;
pub(crate) use arity;
pub(crate) use not_empty;

/// Load every builtin into the passed environment.
pub fn register(env: &Env) {
    let add = |name: &'static str, func: BuiltinFn| {
        env.def_or_set(&Symbol::new(name), Value::builtin(name, func));
    };

    // Variables
    add("def", env_ops::def);
    add("set", env_ops::set);
    add("set-prop", env_ops::set_prop);

    // User defined functions
    add("lambda", function::lambda);
    add("fun", function::fun);

    // Lists, strings and buffers as sequences
    add("list", list::list);
    add("head", list::head);
    add("tail", list::tail);
    add("join", list::join);
    add("len", list::len);
    add("drop", list::drop_);
    add("take", list::take);
    add("first", list::first);
    add("second", list::second);
    add("last", list::last);
    add("nth", list::nth);

    // Arithmetic and bitwise operations
    add("+", math::add);
    add("-", math::subtract);
    add("*", math::multiply);
    add("/", math::divide);
    add("%", math::modulo);
    add(">>", math::shift_right);
    add("<<", math::shift_left);
    add("&", math::bitwise_and);
    add("|", math::bitwise_or);
    add("^", math::bitwise_xor);
    add("min", math::min);
    add("max", math::max);
    add("floor", math::floor);
    add("ceil", math::ceil);

    // Conditionals and comparisons
    add("if", conditional::if_);
    add("or", conditional::or);
    add("and", conditional::and);
    add("not", conditional::not);
    add(">", compare::greater_than);
    add("<", compare::less_than);
    add(">=", compare::greater_than_or_equal);
    add("<=", compare::less_than_or_equal);
    add("==", compare::equal);
    add("!=", compare::not_equal);

    // Errors
    add("error", error::error);
    add("try", error::try_);

    // Buffers
    add("create-buffer", buffer::create_buffer);
    add("buffer-with-bytes", buffer::buffer_with_bytes);
    add("buffer-map", buffer::buffer_map);
    add("put-byte", buffer::put_byte);
    add("get-byte", buffer::get_byte);
    add("put-unsigned-char", buffer::put_unsigned_char);
    add("get-unsigned-char", buffer::get_unsigned_char);
    add("put-signed-char", buffer::put_signed_char);
    add("get-signed-char", buffer::get_signed_char);
    add("put-unsigned-short", buffer::put_unsigned_short);
    add("get-unsigned-short", buffer::get_unsigned_short);
    add("put-signed-short", buffer::put_signed_short);
    add("get-signed-short", buffer::get_signed_short);
    add("put-unsigned-integer", buffer::put_unsigned_integer);
    add("get-unsigned-integer", buffer::get_unsigned_integer);
    add("put-signed-integer", buffer::put_signed_integer);
    add("get-signed-integer", buffer::get_signed_integer);
    add("put-unsigned-long", buffer::put_unsigned_long);
    add("get-unsigned-long", buffer::get_unsigned_long);
    add("put-signed-long", buffer::put_signed_long);
    add("get-signed-long", buffer::get_signed_long);
    add("put-string", buffer::put_string);
    add("get-string", buffer::get_string);
    add("put-bytes", buffer::put_bytes);
    add("get-bytes", buffer::get_bytes);

    // Formatting and printing
    add("print", format::print);
    add("format", format::format);
    add("printf", format::printf);

    // Evaluation
    add("eval", eval_ops::eval_);
    add("eval-string", eval_ops::eval_string);
    add("load", eval_ops::load);

    // Types
    add("type-of", types::type_of);
    add("def-type", types::def_type);
    add("to-string", types::to_string);
    add("to-number", types::to_number);

    // Dictionaries
    add("dict", dictionary::dict);

    // Files
    add("read-file", file::read_file);
    add("write-file", file::write_file);

    // Misc host services
    add("cpu-time-since", misc::cpu_time_since);
    add("console-size", misc::console_size);
    add("version", misc::version);
    add("print-env", misc::print_env);
    add("exit", misc::exit);
}
