//! benzl-runtime: parser, evaluator and builtins for the benzl language
//!
//! The language core: source text goes through [`parser`], the resulting
//! values run through [`eval`], and [`builtins`] supplies the primitive
//! operations. [`Session`] packages the whole thing (root environment,
//! builtins, embedded stdlib) for the CLI and for tests.

pub mod builtins;
pub mod eval;
pub mod parser;
pub mod session;
pub mod stdlib;

pub use eval::{call, eval, eval_sexpr};
pub use parser::{ParseError, parse};
pub use session::Session;

// Re-export the core types callers of a session need
pub use benzl_core::env::Env;
pub use benzl_core::interp::{Interp, error_report};
pub use benzl_core::value::{Kind, Value};
