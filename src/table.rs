use crate::value::{ObjRef, Value};

/// A single slot in a [`Table`]'s backing array.
///
/// `Tombstone` marks a deleted entry so that probe sequences that passed
/// through it before the delete remain valid. `count` (see [`Table`])
/// includes tombstones, which is what lets repeated insert/delete cycles
/// eventually trigger a resize instead of filling the table with dead slots
/// forever.
enum Slot {
    Empty,
    Tombstone,
    Occupied { key: ObjRef, hash: u32, value: Value },
}

const INITIAL_CAPACITY: usize = 8;
const MAX_LOAD_FACTOR: f64 = 0.75;

/// An open-addressed hash table keyed by interned strings, used both as the
/// VM's `globals` map and as the string-intern set (see spec §4.4).
///
/// Every key is an [`ObjRef`] that has already been interned, so ordinary
/// `get`/`set`/`delete` compare keys by reference identity and never touch
/// the heap. Only [`Table::find_string`] — used to decide whether a
/// freshly-scanned or freshly-concatenated string already has an interned
/// twin — needs to compare raw bytes, and for that it walks the probe
/// sequence comparing against each candidate's bytes on the heap.
pub struct Table {
    slots: Vec<Slot>,
    /// Occupied entries plus tombstones. Used for load-factor resize
    /// decisions so tombstones amortize into a resize rather than
    /// accumulating forever.
    count: usize,
}

impl Table {
    pub fn new() -> Self {
        Self { slots: Vec::new(), count: 0 }
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| matches!(s, Slot::Occupied { .. })).count()
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Finds the slot index for `key`/`hash`, per the probe rule in spec
    /// §4.4: walk linearly from `hash mod capacity`, stop at a matching
    /// occupied slot or at an empty slot (returning the first tombstone
    /// seen along the way instead, if any).
    fn find_slot(&self, key: ObjRef, hash: u32) -> usize {
        let capacity = self.capacity();
        let mut index = (hash as usize) % capacity;
        let mut tombstone: Option<usize> = None;

        loop {
            match &self.slots[index] {
                Slot::Empty => return tombstone.unwrap_or(index),
                Slot::Tombstone => {
                    if tombstone.is_none() {
                        tombstone = Some(index);
                    }
                }
                Slot::Occupied { key: k, .. } if *k == key => return index,
                Slot::Occupied { .. } => {}
            }
            index = (index + 1) % capacity;
        }
    }

    fn grow(&mut self) {
        let new_capacity = if self.capacity() == 0 { INITIAL_CAPACITY } else { self.capacity() * 2 };

        let old_slots = std::mem::replace(&mut self.slots, {
            let mut v = Vec::with_capacity(new_capacity);
            v.resize_with(new_capacity, || Slot::Empty);
            v
        });

        self.count = 0;
        for slot in old_slots {
            if let Slot::Occupied { key, hash, value } = slot {
                self.insert_no_grow(key, hash, value);
            }
        }
    }

    fn insert_no_grow(&mut self, key: ObjRef, hash: u32, value: Value) -> bool {
        let index = self.find_slot(key, hash);
        let is_new_key = !matches!(self.slots[index], Slot::Occupied { .. });
        if is_new_key {
            // A tombstone slot is already counted, so only bump `count`
            // when we are replacing a genuinely empty slot.
            if matches!(self.slots[index], Slot::Empty) {
                self.count += 1;
            }
        }
        self.slots[index] = Slot::Occupied { key, hash, value };
        is_new_key
    }

    /// Inserts or overwrites `key => value`. Returns `true` if `key` was not
    /// already present.
    pub fn set(&mut self, key: ObjRef, hash: u32, value: Value) -> bool {
        if self.capacity() == 0 || (self.count + 1) as f64 > self.capacity() as f64 * MAX_LOAD_FACTOR {
            self.grow();
        }
        self.insert_no_grow(key, hash, value)
    }

    pub fn get(&self, key: ObjRef, hash: u32) -> Option<Value> {
        if self.capacity() == 0 {
            return None;
        }
        match &self.slots[self.find_slot(key, hash)] {
            Slot::Occupied { value, .. } => Some(*value),
            _ => None,
        }
    }

    pub fn contains(&self, key: ObjRef, hash: u32) -> bool {
        self.get(key, hash).is_some()
    }

    /// Deletes `key`, leaving a tombstone so later probes through this slot
    /// still reach entries placed after it. Does not decrement `count`.
    pub fn delete(&mut self, key: ObjRef, hash: u32) -> bool {
        if self.capacity() == 0 {
            return false;
        }
        let index = self.find_slot(key, hash);
        if matches!(self.slots[index], Slot::Occupied { .. }) {
            self.slots[index] = Slot::Tombstone;
            true
        } else {
            false
        }
    }

    /// Looks for an already-interned string with the given bytes, comparing
    /// length, then hash, then bytes, against each candidate reached via
    /// `lookup_bytes`. Used to dedupe string allocation (spec §4.4).
    pub fn find_string<'h>(&self, bytes: &[u8], hash: u32, lookup_bytes: impl Fn(ObjRef) -> &'h [u8]) -> Option<ObjRef> {
        if self.capacity() == 0 {
            return None;
        }

        let capacity = self.capacity();
        let mut index = (hash as usize) % capacity;

        loop {
            match &self.slots[index] {
                Slot::Empty => return None,
                Slot::Occupied { key, hash: h, .. } => {
                    if *h == hash && lookup_bytes(*key).len() == bytes.len() && lookup_bytes(*key) == bytes {
                        return Some(*key);
                    }
                }
                Slot::Tombstone => {}
            }
            index = (index + 1) % capacity;
        }
    }
}

impl Default for Table {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience used by tests and debug tooling to assert the invariant from
/// spec §8: load factor never exceeds 0.75 right after a count-growing
/// insert.
pub fn load_factor(table: &Table) -> f64 {
    if table.capacity() == 0 {
        0.0
    } else {
        table.count as f64 / table.capacity() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_reports_whether_key_is_new() {
        let mut table = Table::new();
        assert!(table.set(ObjRef(0), 100, Value::Number(1.0)));
        assert!(!table.set(ObjRef(0), 100, Value::Number(2.0)));
        assert_eq!(table.get(ObjRef(0), 100), Some(Value::Number(2.0)));
    }

    #[test]
    fn get_on_empty_table_is_none() {
        let table = Table::new();
        assert_eq!(table.get(ObjRef(0), 42), None);
    }

    #[test]
    fn delete_then_get_is_none_but_other_keys_survive_the_tombstone() {
        let mut table = Table::new();
        table.set(ObjRef(1), 1, Value::Bool(true));
        table.set(ObjRef(2), 2, Value::Bool(false));
        assert!(table.delete(ObjRef(1), 1));
        assert_eq!(table.get(ObjRef(1), 1), None);
        assert_eq!(table.get(ObjRef(2), 2), Some(Value::Bool(false)));
    }

    #[test]
    fn load_factor_never_exceeds_threshold_after_growth() {
        let mut table = Table::new();
        for i in 0..200u32 {
            table.set(ObjRef(i), i, Value::Number(i as f64));
            assert!(load_factor(&table) <= MAX_LOAD_FACTOR);
        }
    }

    #[test]
    fn find_string_matches_on_hash_length_and_bytes() {
        let mut table = Table::new();
        let corpus: Vec<&[u8]> = vec![b"hi", b"hello", b"hola"];
        for (i, bytes) in corpus.iter().enumerate() {
            let hash = crate::value::fnv1a_hash(bytes);
            table.set(ObjRef(i as u32), hash, Value::Nil);
        }

        let lookup = |r: ObjRef| corpus[r.0 as usize];
        let hash = crate::value::fnv1a_hash(b"hello");
        assert_eq!(table.find_string(b"hello", hash, lookup), Some(ObjRef(1)));
        assert_eq!(table.find_string(b"nope", crate::value::fnv1a_hash(b"nope"), lookup), None);
    }
}
