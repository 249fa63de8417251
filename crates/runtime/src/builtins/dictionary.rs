//! Dictionary construction

use crate::eval::eval;
use benzl_core::env::Env;
use benzl_core::interp::Interp;
use benzl_core::symtab::SymbolTable;
use benzl_core::value::{ErrKind, Kind, SourcePos, Value};
use std::cell::RefCell;
use std::rc::Rc;

/// `(dict k1:v1 k2:v2)` builds a dictionary, evaluating each value.
pub fn dict(interp: &mut Interp, env: &Env, args: &Rc<Value>) -> Rc<Value> {
    let children = args.children();
    for child in children {
        if !matches!(child.kind, Kind::Pair(..)) {
            return interp.error_at(
                ErrKind::Type,
                args,
                "Initial entries for a dictionary must take the form \
                 (dict key1:value1 key2:value2)",
            );
        }
    }

    let mut table = SymbolTable::new(children.len() * 2);
    for child in children {
        let Kind::Pair(key, value_expr) = &child.kind else {
            unreachable!("checked above");
        };
        let value = eval(interp, env, value_expr);
        if value.is_err() {
            return value;
        }
        table.insert(key.clone(), value);
    }
    Value::new(Kind::Dict(Rc::new(RefCell::new(table))), SourcePos::default())
}
