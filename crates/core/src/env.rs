//! Environments: chained scopes of bound variables and functions
//!
//! Evaluating `(my-function 1 2 3)` looks up `my-function` here. Lookup
//! walks from the innermost scope to the outermost; binding always writes
//! the innermost. A scope's backing table is shared (`Rc<RefCell<...>>`)
//! so that a record's or dictionary's own property table can be spliced
//! into the chain for the duration of one property lookup.
//!
//! The root environment additionally tracks the directory of the script
//! currently being loaded and the set of already-loaded module paths.

use crate::symtab::SymbolTable;
use crate::value::{Symbol, Value};
use std::cell::RefCell;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Failures of environment writes. Callers turn these into in-language
/// error values with position and trace attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvError {
    /// `def` of a name already bound in the innermost scope
    AlreadyDeclared,
    /// `set` of a name not bound anywhere in the chain
    Unbound,
}

struct EnvInner {
    parent: Option<Env>,
    items: Rc<RefCell<SymbolTable>>,
    script_dir: RefCell<Option<PathBuf>>,
    loaded_modules: RefCell<HashSet<String>>,
}

/// A handle to one scope in an environment chain. Cloning the handle
/// shares the scope.
#[derive(Clone)]
pub struct Env {
    inner: Rc<EnvInner>,
}

impl std::fmt::Debug for Env {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Chains are cyclic with captured lambdas; print the identity only
        write!(f, "Env({:p})", Rc::as_ptr(&self.inner))
    }
}

impl Env {
    /// A fresh root environment.
    pub fn new(bucket_count: usize) -> Env {
        Env {
            inner: Rc::new(EnvInner {
                parent: None,
                items: Rc::new(RefCell::new(SymbolTable::new(bucket_count))),
                script_dir: RefCell::new(None),
                loaded_modules: RefCell::new(HashSet::new()),
            }),
        }
    }

    /// A child scope (created for every function application).
    pub fn child(parent: &Env, bucket_count: usize) -> Env {
        Env {
            inner: Rc::new(EnvInner {
                parent: Some(parent.clone()),
                items: Rc::new(RefCell::new(SymbolTable::new(bucket_count))),
                script_dir: RefCell::new(None),
                loaded_modules: RefCell::new(HashSet::new()),
            }),
        }
    }

    /// A scope whose backing table is borrowed from a record instance or
    /// dictionary, so its properties resolve like bound variables. The
    /// frame lives only as long as the handle.
    pub fn spliced(parent: &Env, items: Rc<RefCell<SymbolTable>>) -> Env {
        Env {
            inner: Rc::new(EnvInner {
                parent: Some(parent.clone()),
                items,
                script_dir: RefCell::new(None),
                loaded_modules: RefCell::new(HashSet::new()),
            }),
        }
    }

    pub fn parent(&self) -> Option<Env> {
        self.inner.parent.clone()
    }

    /// The outermost scope of this chain.
    pub fn root(&self) -> Env {
        let mut env = self.clone();
        while let Some(parent) = env.parent() {
            env = parent;
        }
        env
    }

    pub fn table(&self) -> Rc<RefCell<SymbolTable>> {
        self.inner.items.clone()
    }

    /// Look up a symbol, innermost scope first. The found value is
    /// stamped with the name used at this lookup site (diagnostics only).
    pub fn get(&self, key: &Symbol) -> Option<Rc<Value>> {
        let mut env = Some(self.clone());
        while let Some(e) = env {
            if let Some(value) = e.inner.items.borrow().get(key) {
                value.set_bound_name(key);
                return Some(value);
            }
            env = e.parent();
        }
        None
    }

    /// The declared type attached to the nearest binding of `key`, if any.
    pub fn declared_type(&self, key: &Symbol) -> Option<Rc<Value>> {
        let mut env = Some(self.clone());
        while let Some(e) = env {
            let items = e.inner.items.borrow();
            if let Some(entry) = items.get_entry(key) {
                return entry.declared_type.clone();
            }
            drop(items);
            env = e.parent();
        }
        None
    }

    /// Bind a new name in this scope. Fails if the name is already bound
    /// here (shadowing an outer scope is fine).
    pub fn def(&self, key: &Symbol, value: Rc<Value>) -> Result<(), EnvError> {
        let mut items = self.inner.items.borrow_mut();
        if items.contains(key) {
            return Err(EnvError::AlreadyDeclared);
        }
        items.insert(key.clone(), value);
        Ok(())
    }

    /// Bind a new name with a declared type; later `set`s are checked
    /// against it.
    pub fn def_typed(
        &self,
        key: &Symbol,
        value: Rc<Value>,
        declared_type: Rc<Value>,
    ) -> Result<(), EnvError> {
        let mut items = self.inner.items.borrow_mut();
        if items.contains(key) {
            return Err(EnvError::AlreadyDeclared);
        }
        items.insert_typed(key.clone(), value, declared_type);
        Ok(())
    }

    /// Replace the nearest binding of `key`. Fails if unbound. A declared
    /// type on the entry is preserved by the replacement.
    pub fn set(&self, key: &Symbol, value: Rc<Value>) -> Result<(), EnvError> {
        let mut env = Some(self.clone());
        while let Some(e) = env {
            let mut items = e.inner.items.borrow_mut();
            if items.contains(key) {
                items.insert(key.clone(), value);
                return Ok(());
            }
            drop(items);
            env = e.parent();
        }
        Err(EnvError::Unbound)
    }

    /// Unconditionally bind in this scope (parameter binding).
    pub fn def_or_set(&self, key: &Symbol, value: Rc<Value>) {
        self.inner.items.borrow_mut().insert(key.clone(), value);
    }

    pub fn script_dir(&self) -> Option<PathBuf> {
        self.inner.script_dir.borrow().clone()
    }

    pub fn set_script_dir(&self, dir: &Path) {
        *self.inner.script_dir.borrow_mut() = Some(dir.to_path_buf());
    }

    pub fn is_module_loaded(&self, path: &str) -> bool {
        self.inner.loaded_modules.borrow().contains(path)
    }

    pub fn record_module_loaded(&self, path: &str) {
        self.inner.loaded_modules.borrow_mut().insert(path.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(name: &str) -> Symbol {
        Symbol::new(name)
    }

    #[test]
    fn def_then_get() {
        let env = Env::new(8);
        env.def(&sym("x"), Value::int(10)).unwrap();
        assert_eq!(*env.get(&sym("x")).unwrap(), *Value::int(10));
        assert!(env.get(&sym("y")).is_none());
    }

    #[test]
    fn def_twice_fails() {
        let env = Env::new(8);
        env.def(&sym("x"), Value::int(1)).unwrap();
        assert_eq!(env.def(&sym("x"), Value::int(2)), Err(EnvError::AlreadyDeclared));
    }

    #[test]
    fn set_requires_existing_binding() {
        let env = Env::new(8);
        assert_eq!(env.set(&sym("x"), Value::int(1)), Err(EnvError::Unbound));
        env.def(&sym("x"), Value::int(1)).unwrap();
        env.set(&sym("x"), Value::int(2)).unwrap();
        assert_eq!(*env.get(&sym("x")).unwrap(), *Value::int(2));
    }

    #[test]
    fn inner_scopes_shadow_and_set_reaches_outward() {
        let outer = Env::new(8);
        outer.def(&sym("x"), Value::int(1)).unwrap();
        let inner = Env::child(&outer, 4);
        inner.def(&sym("x"), Value::int(2)).unwrap();
        assert_eq!(*inner.get(&sym("x")).unwrap(), *Value::int(2));
        assert_eq!(*outer.get(&sym("x")).unwrap(), *Value::int(1));

        // A set from the inner scope with no local binding writes outward
        let inner2 = Env::child(&outer, 4);
        inner2.set(&sym("x"), Value::int(3)).unwrap();
        assert_eq!(*outer.get(&sym("x")).unwrap(), *Value::int(3));
    }

    #[test]
    fn lookup_stamps_bound_name() {
        let env = Env::new(8);
        env.def(&sym("answer"), Value::int(42)).unwrap();
        let v = env.get(&sym("answer")).unwrap();
        assert_eq!(v.bound_name_str(), "answer");
    }

    #[test]
    fn spliced_frame_exposes_borrowed_table() {
        let env = Env::new(8);
        env.def(&sym("x"), Value::int(1)).unwrap();
        let mut table = SymbolTable::new(4);
        table.insert(sym("y"), Value::int(7));
        let shared = Rc::new(RefCell::new(table));
        let frame = Env::spliced(&env, shared.clone());
        assert_eq!(*frame.get(&sym("y")).unwrap(), *Value::int(7));
        // The outer chain stays visible through the frame
        assert_eq!(*frame.get(&sym("x")).unwrap(), *Value::int(1));
        // Writes through the frame land in the borrowed table
        frame.def_or_set(&sym("y"), Value::int(8));
        assert_eq!(*shared.borrow().get(&sym("y")).unwrap(), *Value::int(8));
    }

    #[test]
    fn root_walks_to_outermost() {
        let outer = Env::new(8);
        let mid = Env::child(&outer, 4);
        let inner = Env::child(&mid, 4);
        inner.root().def(&sym("g"), Value::int(1)).unwrap();
        assert_eq!(*outer.get(&sym("g")).unwrap(), *Value::int(1));
    }
}
