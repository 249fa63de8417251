//! Embedded standard library
//!
//! The stdlib ships inside the binary (via `include_str!`) so the
//! interpreter is self-contained. It is evaluated into the root
//! environment at startup, before any user input.

/// Source-file label stdlib expressions carry in errors and traces.
pub const STDLIB_LABEL: &str = "benzl-standard-library";

/// The standard library text.
pub const STDLIB_SOURCE: &str = include_str!("../stdlib/stdlib.benzl");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stdlib_defines_the_list_helpers() {
        for name in ["map", "filter", "foldl", "reverse", "range", "quit"] {
            assert!(
                STDLIB_SOURCE.contains(&format!("(fun {{{}", name)),
                "stdlib should define {}",
                name
            );
        }
    }
}
