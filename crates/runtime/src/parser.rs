//! Lexical parser for benzl source
//!
//! Consumes a byte string and produces the top-level expressions as
//! values, each stamped with the row/column (and optional source file
//! label) it came from. There is no separate token type: symbols, numbers
//! and reserved type names are disambiguated as they are read, so the
//! parser's output is already the evaluator's input.
//!
//! Syntax summary:
//! - `( ... )` S-expression, `{ ... }` Q-expression
//! - `;` comments to end of line, `#!` shebang on the first line only
//! - strings delimited by `"` or `'` with `\a \b \f \n \r \t \v \\ \' \"`
//! - `key:value` pairs (the key must have parsed as a symbol)
//! - symbols cover `[A-Za-z0-9._+\-*\\/=<>!&%^|]` and are re-read as hex
//!   (`0x..`, Byte below 256), integers, floats, or primitive type names

use benzl_core::value::{ErrKind, Kind, PrimType, SourcePos, Symbol, Value};
use std::rc::Rc;

const SYMBOL_CHARS: &str = "abcdefghijklmnopqrstuvwxyz\
                            ABCDEFGHIJKLMNOPQRSTUVWXYZ\
                            0123456789._+-*\\/=<>!&%^|";

const WHITESPACE: &str = " \t\x0b\r";

/// A syntax error with the position it was noticed at.
#[derive(Debug, Clone)]
pub struct ParseError {
    pub message: String,
    pub pos: SourcePos,
}

impl ParseError {
    /// Convert into an in-language SyntaxError value.
    pub fn into_value(self) -> Rc<Value> {
        let message = format!(
            "{} at line {}:{}",
            self.message,
            self.pos.row + 1,
            self.pos.col
        );
        Value::new(
            Kind::Err(benzl_core::value::ErrData {
                kind: ErrKind::Syntax,
                message: Rc::from(message.as_str()),
                trace: None,
            }),
            self.pos,
        )
    }
}

/// Parse a full source text into its top-level expressions.
pub fn parse(source: &str, file: Option<&str>) -> Result<Vec<Rc<Value>>, ParseError> {
    let mut scanner = Scanner::new(source, file);
    scanner.read_expr(None)
}

/// Interpret a symbol-shaped string as a number.
///
/// Returns `Ok(None)` when the text is not number-shaped at all (it stays
/// a symbol), and `Err` when it is number-shaped but unrepresentable.
pub fn string_to_number(s: &str) -> Result<Option<Rc<Value>>, String> {
    if s.is_empty() {
        return Ok(None);
    }
    if let Some(hex) = s.strip_prefix("0x") {
        if !hex.is_empty() && hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return match i64::from_str_radix(hex, 16) {
                Ok(x) if (0..256).contains(&x) => Ok(Some(Value::byte(x as u8))),
                Ok(x) => Ok(Some(Value::int(x))),
                Err(_) => Err(format!("Invalid number '{}'", s)),
            };
        }
        return Ok(None);
    }
    let mut chars = s.chars();
    let first = chars.next().unwrap();
    if first != '-' && !first.is_ascii_digit() {
        return Ok(None);
    }
    if s == "-" {
        return Ok(None);
    }
    let mut is_float = false;
    for c in chars {
        if c == '.' {
            is_float = true;
        } else if !c.is_ascii_digit() {
            return Ok(None);
        }
    }
    if is_float {
        match s.parse::<f64>() {
            Ok(x) => Ok(Some(Value::float(x))),
            Err(_) => Err(format!("Invalid float '{}'", s)),
        }
    } else {
        match s.parse::<i64>() {
            Ok(x) => Ok(Some(Value::int(x))),
            Err(_) => Err(format!("Invalid integer '{}'", s)),
        }
    }
}

struct Scanner<'a> {
    bytes: &'a [u8],
    i: usize,
    row: u32,
    col: u32,
    file: Option<Rc<str>>,
}

impl<'a> Scanner<'a> {
    fn new(source: &'a str, file: Option<&str>) -> Scanner<'a> {
        Scanner {
            bytes: source.as_bytes(),
            i: 0,
            row: 0,
            col: 0,
            file: file.map(Rc::from),
        }
    }

    fn pos(&self) -> SourcePos {
        SourcePos::new(self.row, self.col, self.file.clone())
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.i).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.i += 1;
        if b == b'\n' {
            self.row += 1;
            self.col = 0;
        } else {
            self.col += 1;
        }
        Some(b)
    }

    fn error(&self, pos: SourcePos, message: String) -> ParseError {
        ParseError { message, pos }
    }

    fn skip_line(&mut self) {
        while let Some(b) = self.peek() {
            if b == b'\n' {
                break;
            }
            self.bump();
        }
    }

    /// Skip whitespace, newlines, comments and the first-line shebang.
    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(b'\n') => {
                    self.bump();
                }
                Some(b) if WHITESPACE.as_bytes().contains(&b) => {
                    self.bump();
                }
                Some(b';') => self.skip_line(),
                Some(b'#') if self.i == 0 && self.bytes.get(1) == Some(&b'!') => self.skip_line(),
                _ => return,
            }
        }
    }

    /// Read elements until `end` (or end of input when `end` is `None`).
    fn read_expr(&mut self, end: Option<u8>) -> Result<Vec<Rc<Value>>, ParseError> {
        let mut items: Vec<Rc<Value>> = Vec::new();
        loop {
            self.skip_trivia();
            match self.peek() {
                None => {
                    if let Some(close) = end {
                        return Err(self.error(
                            self.pos(),
                            format!("Missing '{}' at end of input", close as char),
                        ));
                    }
                    return Ok(items);
                }
                Some(b) if Some(b) == end => {
                    self.bump();
                    return Ok(items);
                }
                Some(b':') => {
                    let pos = self.pos();
                    self.bump();
                    let key = match items.pop() {
                        Some(key) => key,
                        None => {
                            return Err(self.error(
                                pos,
                                "Encountered ':' with no key before it".to_string(),
                            ));
                        }
                    };
                    let value = self.read_one(end)?;
                    let Kind::Sym(key_sym) = &key.kind else {
                        return Err(self.error(
                            pos,
                            format!(
                                "Encountered unexpected key:value pair '{}:{}'",
                                key, value
                            ),
                        ));
                    };
                    items.push(Value::new(Kind::Pair(key_sym.clone(), value), pos));
                }
                Some(_) => {
                    let item = self.read_element(end)?;
                    items.push(item);
                }
            }
        }
    }

    /// Read exactly one value, folding any `key:value` suffix chain so
    /// `a:b:c` nests to the right.
    fn read_one(&mut self, end: Option<u8>) -> Result<Rc<Value>, ParseError> {
        self.skip_trivia();
        if self.peek().is_none() || self.peek() == end {
            return Err(self.error(self.pos(), "Missing value after ':'".to_string()));
        }
        let value = self.read_element(end)?;
        self.skip_trivia();
        if self.peek() == Some(b':') {
            let pos = self.pos();
            self.bump();
            let inner = self.read_one(end)?;
            let Kind::Sym(key_sym) = &value.kind else {
                return Err(self.error(
                    pos,
                    format!("Encountered unexpected key:value pair '{}:{}'", value, inner),
                ));
            };
            return Ok(Value::new(Kind::Pair(key_sym.clone(), inner), pos));
        }
        Ok(value)
    }

    /// Read one nested expression, string or symbol-like element.
    fn read_element(&mut self, _end: Option<u8>) -> Result<Rc<Value>, ParseError> {
        let pos = self.pos();
        match self.peek() {
            Some(b'(') => {
                self.bump();
                let children = self.read_expr(Some(b')'))?;
                Ok(Value::new(Kind::SExpr(children), pos))
            }
            Some(b'{') => {
                self.bump();
                let children = self.read_expr(Some(b'}'))?;
                Ok(Value::new(Kind::QExpr(children), pos))
            }
            Some(q @ (b'"' | b'\'')) => {
                self.bump();
                self.read_str(q, pos)
            }
            Some(b) if SYMBOL_CHARS.as_bytes().contains(&b) => self.read_symbol_like(pos),
            Some(b) => Err(self.error(pos, format!("Unknown character '{}'", b as char))),
            None => Err(self.error(pos, "Unexpected end of input".to_string())),
        }
    }

    fn read_str(&mut self, delim: u8, pos: SourcePos) -> Result<Rc<Value>, ParseError> {
        let mut out: Vec<u8> = Vec::new();
        loop {
            match self.bump() {
                None => {
                    return Err(self.error(
                        pos,
                        "Unexpected end of input in string literal".to_string(),
                    ));
                }
                Some(b) if b == delim => break,
                Some(b'\\') => match self.peek() {
                    Some(e) if b"abfnrtv\\'\"".contains(&e) => {
                        self.bump();
                        out.push(unescape(e));
                    }
                    // Unknown escape: the backslash stands for itself
                    _ => out.push(b'\\'),
                },
                Some(b) => out.push(b),
            }
        }
        let text = String::from_utf8_lossy(&out);
        Ok(Value::new(Kind::Str(Rc::from(text.as_ref())), pos))
    }

    fn read_symbol_like(&mut self, pos: SourcePos) -> Result<Rc<Value>, ParseError> {
        let start = self.i;
        while let Some(b) = self.peek() {
            if SYMBOL_CHARS.as_bytes().contains(&b) {
                self.bump();
            } else {
                break;
            }
        }
        let text = std::str::from_utf8(&self.bytes[start..self.i])
            .expect("symbol characters are ASCII");

        match string_to_number(text) {
            Ok(Some(n)) => return Ok(n.with_pos(pos)),
            Ok(None) => {}
            Err(message) => return Err(self.error(pos, message)),
        }
        if let Some(prim) = PrimType::from_name(text) {
            return Ok(Value::new(Kind::Type(benzl_core::value::TypeRef::Primitive(prim)), pos));
        }
        Ok(Value::new(Kind::Sym(Symbol::new(text)), pos))
    }
}

fn unescape(b: u8) -> u8 {
    match b {
        b'a' => 0x07,
        b'b' => 0x08,
        b'f' => 0x0c,
        b'n' => b'\n',
        b'r' => b'\r',
        b't' => b'\t',
        b'v' => 0x0b,
        b'\\' | b'\'' | b'"' => b,
        _ => unreachable!("checked against the escape set"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use benzl_core::value::to_display_string;

    fn parse_one(src: &str) -> Rc<Value> {
        let mut items = parse(src, None).unwrap();
        assert_eq!(items.len(), 1, "expected one expression from {:?}", src);
        items.remove(0)
    }

    #[test]
    fn parses_integers_floats_and_bytes() {
        assert_eq!(*parse_one("42"), *Value::int(42));
        assert_eq!(*parse_one("-7"), *Value::int(-7));
        assert_eq!(*parse_one("2.5"), *Value::float(2.5));
        assert_eq!(*parse_one("0xFF"), *Value::byte(0xff));
        assert_eq!(*parse_one("0x1FF"), *Value::int(0x1ff));
    }

    #[test]
    fn dash_and_dotted_words_stay_symbols() {
        assert!(matches!(parse_one("-").kind, Kind::Sym(_)));
        assert!(matches!(parse_one("add-1").kind, Kind::Sym(_)));
        assert!(matches!(parse_one(".5").kind, Kind::Sym(_)));
        assert!(matches!(parse_one("0xGG").kind, Kind::Sym(_)));
    }

    #[test]
    fn reserved_names_become_primitive_types() {
        match &parse_one("Integer").kind {
            Kind::Type(benzl_core::value::TypeRef::Primitive(p)) => {
                assert_eq!(*p, PrimType::Integer)
            }
            other => panic!("expected primitive type, got {:?}", other),
        }
        assert!(matches!(parse_one("Integers").kind, Kind::Sym(_)));
    }

    #[test]
    fn parses_nested_expressions() {
        let v = parse_one("(+ 1 {2 3})");
        assert_eq!(to_display_string(&v, true), "(+ 1 {2 3})");
        match &v.kind {
            Kind::SExpr(children) => {
                assert_eq!(children.len(), 3);
                assert!(matches!(children[2].kind, Kind::QExpr(_)));
            }
            _ => panic!("expected s-expression"),
        }
    }

    #[test]
    fn strings_support_both_delimiters_and_escapes() {
        assert_eq!(*parse_one("\"hi\\n\""), *Value::str_("hi\n"));
        assert_eq!(*parse_one("'hi'"), *Value::str_("hi"));
        assert_eq!(*parse_one(r#""say \"hey\"""#), *Value::str_("say \"hey\""));
        // Unknown escapes keep the backslash
        assert_eq!(*parse_one(r#""a\qb""#), *Value::str_("a\\qb"));
    }

    #[test]
    fn comments_and_shebang_are_skipped() {
        let items = parse("#!/usr/bin/env benzl\n; comment\n1 ; trailing\n2", None).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(*items[0], *Value::int(1));
        assert_eq!(*items[1], *Value::int(2));
    }

    #[test]
    fn key_value_pairs_attach_to_the_preceding_symbol() {
        let v = parse_one("{x:Integer}");
        let children = v.children();
        match &children[0].kind {
            Kind::Pair(key, value) => {
                assert_eq!(&*key.name, "x");
                assert!(matches!(value.kind, Kind::Type(_)));
            }
            other => panic!("expected pair, got {:?}", other),
        }
    }

    #[test]
    fn pair_chains_nest_to_the_right() {
        let v = parse_one("{a:b:c}");
        match &v.children()[0].kind {
            Kind::Pair(key, value) => {
                assert_eq!(&*key.name, "a");
                match &value.kind {
                    Kind::Pair(inner_key, _) => assert_eq!(&*inner_key.name, "b"),
                    other => panic!("expected nested pair, got {:?}", other),
                }
            }
            other => panic!("expected pair, got {:?}", other),
        }
    }

    #[test]
    fn pair_key_must_be_a_symbol() {
        let err = parse("{1:2}", None).unwrap_err();
        assert!(err.message.contains("key:value pair"), "{}", err.message);
    }

    #[test]
    fn unterminated_input_is_a_syntax_error() {
        assert!(parse("(+ 1 2", None).unwrap_err().message.contains("Missing ')'"));
        assert!(parse("{1 2", None).unwrap_err().message.contains("Missing '}'"));
        assert!(
            parse("\"abc", None)
                .unwrap_err()
                .message
                .contains("string literal")
        );
    }

    #[test]
    fn unknown_bytes_are_syntax_errors() {
        let err = parse("(+ 1 §)", None).unwrap_err();
        assert!(err.message.contains("Unknown character"), "{}", err.message);
    }

    #[test]
    fn positions_track_rows_and_columns() {
        let items = parse("1\n  (add 2)", None).unwrap();
        assert_eq!(items[0].pos.row, 0);
        let call = &items[1];
        assert_eq!(call.pos.row, 1);
        assert_eq!(call.pos.col, 2);
        assert_eq!(call.children()[0].pos.col, 3);
    }

    #[test]
    fn number_overflow_is_reported() {
        assert!(parse("99999999999999999999999", None).is_err());
        assert!(string_to_number("0xFFFFFFFFFFFFFFFFFF").is_err());
    }
}
