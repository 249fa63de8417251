//! benzl-core: the value model for the benzl language
//!
//! This crate holds everything the rest of the interpreter agrees on:
//!
//! - `value`: the tagged [`Value`] type with construction, deep equality,
//!   numeric coercion, casting and printing
//! - `symtab`: the separate-chaining [`SymbolTable`] used by environments,
//!   dictionaries and record instances
//! - `env`: the [`Env`] chain of scopes with typed bindings and module
//!   bookkeeping
//! - `interp`: the per-interpreter [`Interp`] context owning the
//!   [`CallStack`] used for error traces
//!
//! Parsing, evaluation and the builtin operations live in `benzl-runtime`.

pub mod env;
pub mod interp;
pub mod symtab;
pub mod value;

pub use env::{Env, EnvError};
pub use interp::{CallStack, Interp, error_report};
pub use symtab::{Entry, SymbolTable};
pub use value::{
    Builtin, BuiltinFn, ErrData, ErrKind, Fun, Kind, Lambda, PrimType, Record, SourcePos, Symbol,
    TypeRef, Value, cast_to, format_float, matches_type, symbol_hash, to_display_string,
    type_mismatch_description, values_equal,
};
