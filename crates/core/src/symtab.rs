//! Separate-chaining hash table from symbols to values
//!
//! Environments store bound variables and functions in one of these, and
//! record instances use one for their property values. Keys hash with the
//! symbol byte-sum reduced modulo the bucket count; colliding keys chain
//! within the bucket.
//!
//! An entry can carry a declared type alongside its value. Replacing an
//! entry's value preserves that type, so later `set`s keep being checked
//! against the type attached by a typed `def`.

use crate::value::{Symbol, Value, values_equal};
use std::rc::Rc;

#[derive(Debug, Clone)]
pub struct Entry {
    pub key: Symbol,
    pub value: Rc<Value>,
    /// Type the entry's values are required to have, or `None` if untyped
    pub declared_type: Option<Rc<Value>>,
}

#[derive(Debug, Clone)]
pub struct SymbolTable {
    buckets: Vec<Vec<Entry>>,
    count: usize,
    /// Bucket count never shrinks below this
    min_buckets: usize,
}

impl SymbolTable {
    pub fn new(bucket_count: usize) -> SymbolTable {
        let size = bucket_count.max(2);
        SymbolTable {
            buckets: vec![Vec::new(); size],
            count: 0,
            min_buckets: size,
        }
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    fn bucket_index(&self, key: &Symbol) -> usize {
        (key.hash % self.buckets.len() as u64) as usize
    }

    /// Insert a value, replacing any entry with the same key. A replaced
    /// entry's declared type carries over to the new entry.
    pub fn insert(&mut self, key: Symbol, value: Rc<Value>) {
        self.insert_entry(Entry {
            key,
            value,
            declared_type: None,
        });
        self.resize_if_needed();
    }

    /// Insert a value with a declared type attached.
    pub fn insert_typed(&mut self, key: Symbol, value: Rc<Value>, declared_type: Rc<Value>) {
        self.insert_entry(Entry {
            key,
            value,
            declared_type: Some(declared_type),
        });
        self.resize_if_needed();
    }

    fn insert_entry(&mut self, mut entry: Entry) {
        let index = self.bucket_index(&entry.key);
        let bucket = &mut self.buckets[index];
        if let Some(existing) = bucket.iter_mut().find(|e| e.key == entry.key) {
            if entry.declared_type.is_none() {
                entry.declared_type = existing.declared_type.take();
            }
            *existing = entry;
        } else {
            bucket.push(entry);
            self.count += 1;
        }
    }

    pub fn get(&self, key: &Symbol) -> Option<Rc<Value>> {
        if self.count == 0 {
            return None;
        }
        let index = self.bucket_index(key);
        self.buckets[index]
            .iter()
            .find(|e| e.key == *key)
            .map(|e| e.value.clone())
    }

    pub fn get_entry(&self, key: &Symbol) -> Option<&Entry> {
        if self.count == 0 {
            return None;
        }
        let index = self.bucket_index(key);
        self.buckets[index].iter().find(|e| e.key == *key)
    }

    pub fn contains(&self, key: &Symbol) -> bool {
        self.get_entry(key).is_some()
    }

    pub fn remove(&mut self, key: &Symbol) {
        let index = self.bucket_index(key);
        let bucket = &mut self.buckets[index];
        if let Some(pos) = bucket.iter().position(|e| e.key == *key) {
            bucket.remove(pos);
            self.count -= 1;
            self.resize_if_needed();
        }
    }

    /// Snapshot of all entries in bucket-then-chain order. The order is
    /// stable for a given table state but unrelated to insertion order.
    pub fn entries(&self) -> Vec<(Symbol, Rc<Value>)> {
        let mut out = Vec::with_capacity(self.count);
        for bucket in &self.buckets {
            for entry in bucket {
                out.push((entry.key.clone(), entry.value.clone()));
            }
        }
        out
    }

    /// True when both tables hold the same keys bound to equal values.
    pub fn equal(&self, other: &SymbolTable) -> bool {
        if self.count != other.count {
            return false;
        }
        for bucket in &self.buckets {
            for entry in bucket {
                match other.get(&entry.key) {
                    Some(value) => {
                        if !values_equal(&entry.value, &value) {
                            return false;
                        }
                    }
                    None => return false,
                }
            }
        }
        true
    }

    fn resize_if_needed(&mut self) {
        let buckets = self.buckets.len();
        if self.count >= buckets / 2 {
            self.rehash(self.count * 4);
        } else if self.count.max(self.min_buckets) < buckets / 4 {
            self.rehash((self.count * 4).max(self.min_buckets));
        }
    }

    fn rehash(&mut self, new_bucket_count: usize) {
        let size = new_bucket_count.max(2);
        let old = std::mem::replace(&mut self.buckets, vec![Vec::new(); size]);
        for bucket in old {
            for entry in bucket {
                let index = (entry.key.hash % self.buckets.len() as u64) as usize;
                self.buckets[index].push(entry);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(name: &str) -> Symbol {
        Symbol::new(name)
    }

    #[test]
    fn insert_get_remove() {
        let mut table = SymbolTable::new(4);
        table.insert(sym("x"), Value::int(1));
        table.insert(sym("y"), Value::int(2));
        assert_eq!(table.len(), 2);
        assert_eq!(*table.get(&sym("x")).unwrap(), *Value::int(1));
        table.remove(&sym("x"));
        assert!(table.get(&sym("x")).is_none());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn replacing_preserves_declared_type() {
        let mut table = SymbolTable::new(4);
        table.insert_typed(
            sym("x"),
            Value::int(1),
            Value::prim_type(crate::value::PrimType::Integer),
        );
        table.insert(sym("x"), Value::int(2));
        let entry = table.get_entry(&sym("x")).unwrap();
        assert_eq!(*entry.value, *Value::int(2));
        assert!(entry.declared_type.is_some());
    }

    #[test]
    fn grows_and_survives_many_inserts() {
        let mut table = SymbolTable::new(2);
        for i in 0..200 {
            table.insert(sym(&format!("key-{}", i)), Value::int(i));
        }
        assert_eq!(table.len(), 200);
        for i in 0..200 {
            assert_eq!(*table.get(&sym(&format!("key-{}", i))).unwrap(), *Value::int(i));
        }
    }

    #[test]
    fn colliding_keys_chain() {
        // "ab" and "ba" have the same byte-sum hash
        let mut table = SymbolTable::new(2);
        table.insert(sym("ab"), Value::int(1));
        table.insert(sym("ba"), Value::int(2));
        assert_eq!(*table.get(&sym("ab")).unwrap(), *Value::int(1));
        assert_eq!(*table.get(&sym("ba")).unwrap(), *Value::int(2));
    }

    #[test]
    fn equal_ignores_bucket_layout() {
        let mut a = SymbolTable::new(2);
        let mut b = SymbolTable::new(32);
        for i in 0..10 {
            a.insert(sym(&format!("k{}", i)), Value::int(i));
        }
        for i in (0..10).rev() {
            b.insert(sym(&format!("k{}", i)), Value::int(i));
        }
        assert!(a.equal(&b));
        b.insert(sym("k0"), Value::int(99));
        assert!(!a.equal(&b));
    }

    #[test]
    fn entries_are_deterministic() {
        let mut table = SymbolTable::new(8);
        table.insert(sym("a"), Value::int(1));
        table.insert(sym("b"), Value::int(2));
        let first = table.entries();
        let second = table.entries();
        assert_eq!(first.len(), 2);
        for ((k1, _), (k2, _)) in first.iter().zip(&second) {
            assert_eq!(k1, k2);
        }
    }
}
