use std::cell::Cell;

use crate::table::Table;
use crate::value::{fnv1a_hash, ObjRef, ObjString, Value};

/// Owns every heap-allocated object for one [`crate::vm::Vm`] run.
///
/// Objects are linked into an intrusive list via [`ObjString::next`], in
/// allocation order, with `head` pointing at the most recently allocated
/// object. Nothing outside `Heap` holds a strong reference; [`Value::Object`]
/// handles are bare indices, so dropping a `Heap` frees every object it ever
/// allocated in one pass — there is no separate "teardown the object list"
/// step to forget.
///
/// `strings` doubles as the string-intern set described in spec §4.4: before
/// any string is allocated, its bytes are looked up here so that two equal
/// string literals become the very same [`ObjRef`].
pub struct Heap {
    objects: Vec<ObjString>,
    head: Option<ObjRef>,
    strings: Table,
}

impl Heap {
    pub fn new() -> Self {
        Self { objects: Vec::new(), head: None, strings: Table::new() }
    }

    pub fn get(&self, r: ObjRef) -> &ObjString {
        &self.objects[r.0 as usize]
    }

    /// The number of objects ever allocated on this heap (teardown simply
    /// drops this list, so this also bounds how much gets freed at once).
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Interns `bytes`, allocating a new [`ObjString`] only if an identical
    /// string is not already live. This is the single routing point
    /// required by spec §3's interning invariant: every string creation —
    /// literal, concatenation result, anything — must go through here.
    pub fn intern(&mut self, bytes: &[u8]) -> ObjRef {
        let hash = fnv1a_hash(bytes);

        if let Some(existing) = self.strings.find_string(bytes, hash, |r| self.objects[r.0 as usize].bytes.as_ref()) {
            return existing;
        }

        self.intern_new(bytes, hash)
    }

    fn intern_new(&mut self, bytes: &[u8], hash: u32) -> ObjRef {
        let next = self.head;
        let obj = ObjString { bytes: bytes.to_vec().into_boxed_slice(), hash, marked: Cell::new(false), next };
        let handle = self.push(obj);
        self.strings.set(handle, hash, Value::Object(handle));
        handle
    }

    fn push(&mut self, obj: ObjString) -> ObjRef {
        let index = self.objects.len() as u32;
        self.objects.push(obj);
        let handle = ObjRef(index);
        self.head = Some(handle);
        handle
    }
}

impl Default for Heap {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_the_same_bytes_twice_returns_the_same_handle() {
        let mut heap = Heap::new();
        let a = heap.intern(b"hello");
        let b = heap.intern(b"hello");
        assert_eq!(a, b);
        assert_eq!(heap.object_count(), 1);
    }

    #[test]
    fn interning_different_bytes_allocates_distinct_objects() {
        let mut heap = Heap::new();
        let a = heap.intern(b"hello");
        let b = heap.intern(b"world");
        assert_ne!(a, b);
        assert_eq!(heap.object_count(), 2);
    }

    #[test]
    fn get_returns_the_original_bytes() {
        let mut heap = Heap::new();
        let r = heap.intern(b"wisp");
        assert_eq!(heap.get(r).as_str(), "wisp");
    }
}
