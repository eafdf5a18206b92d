//! Slot arena with free-slot reuse

use std::ops::{Index, IndexMut};

/// Vector of slots addressed by `usize` handles.
///
/// Removed slots go on a free list and are handed out again by the next
/// `insert`, so handles stay small and storage is not compacted.
#[derive(Debug, Clone)]
pub struct Arena<T> {
    slots: Vec<Option<T>>,
    free: Vec<usize>,
}

impl<T> Arena<T> {
    /// Create an empty arena
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    /// Create an arena with room for `size` values before reallocating
    pub fn with_capacity(size: usize) -> Self {
        Self {
            slots: Vec::with_capacity(size),
            free: Vec::new(),
        }
    }

    /// Store a value and return its handle
    pub fn insert(&mut self, value: T) -> usize {
        match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = Some(value);
                idx
            }
            None => {
                self.slots.push(Some(value));
                self.slots.len() - 1
            }
        }
    }

    /// Remove the value at `idx`, freeing the slot for reuse
    pub fn remove(&mut self, idx: usize) -> Option<T> {
        let value = self.slots.get_mut(idx)?.take()?;
        self.free.push(idx);
        Some(value)
    }

    pub fn get(&self, idx: usize) -> Option<&T> {
        self.slots.get(idx)?.as_ref()
    }

    pub fn get_mut(&mut self, idx: usize) -> Option<&mut T> {
        self.slots.get_mut(idx)?.as_mut()
    }

    /// Number of live values
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of slots ever allocated, live or free
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Index<usize> for Arena<T> {
    type Output = T;

    fn index(&self, index: usize) -> &Self::Output {
        match self.get(index) {
            Some(value) => value,
            None => panic!("arena slot {} is vacant", index),
        }
    }
}

impl<T> IndexMut<usize> for Arena<T> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        match self.get_mut(index) {
            Some(value) => value,
            None => panic!("arena slot {} is vacant", index),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_index() {
        let mut arena = Arena::new();
        let a = arena.insert("a");
        let b = arena.insert("b");
        assert_eq!(arena[a], "a");
        assert_eq!(arena[b], "b");
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn test_removed_slot_is_reused() {
        let mut arena = Arena::with_capacity(4);
        let a = arena.insert(1);
        let _b = arena.insert(2);
        assert_eq!(arena.remove(a), Some(1));
        assert!(arena.get(a).is_none());
        assert_eq!(arena.len(), 1);

        let c = arena.insert(3);
        assert_eq!(c, a);
        assert_eq!(arena.capacity(), 2);
        assert_eq!(arena[c], 3);
    }

    #[test]
    fn test_double_remove_is_noop() {
        let mut arena = Arena::new();
        let a = arena.insert(1);
        assert_eq!(arena.remove(a), Some(1));
        assert_eq!(arena.remove(a), None);
        assert!(arena.is_empty());
        // The slot must only be on the free list once
        let x = arena.insert(10);
        let y = arena.insert(11);
        assert_ne!(x, y);
    }

    #[test]
    #[should_panic(expected = "vacant")]
    fn test_index_vacant_panics() {
        let mut arena = Arena::new();
        let a = arena.insert(1);
        arena.remove(a);
        let _ = arena[a];
    }
}
