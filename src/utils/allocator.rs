use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Slot index with generation tracking to prevent stale references.
///
/// A handle stays valid until its slot is removed; a later insertion into the
/// same slot bumps the generation so the old handle no longer resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct Handle {
    pub index: usize,
    pub generation: u32,
}

impl Handle {
    pub fn new(index: usize, generation: u32) -> Self {
        Self { index, generation }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

/// Generational arena that hands out stable handles while preventing use-after-free.
///
/// Backs both the software device's texture storage and the persistent
/// history buffers, where a recycled slot must never be mistaken for the
/// buffer an effect allocated frames ago.
pub struct Arena<T> {
    items: Vec<Option<T>>,
    generations: Vec<u32>,
    free_list: VecDeque<usize>,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            generations: Vec::new(),
            free_list: VecDeque::new(),
        }
    }

    pub fn insert(&mut self, item: T) -> Handle {
        if let Some(index) = self.free_list.pop_front() {
            let generation = self.generations[index];
            self.items[index] = Some(item);
            return Handle::new(index, generation);
        }

        let index = self.items.len();
        self.items.push(Some(item));
        self.generations.push(0);
        Handle::new(index, 0)
    }

    pub fn get(&self, handle: Handle) -> Option<&T> {
        if self.is_valid(handle) {
            self.items.get(handle.index()).and_then(|slot| slot.as_ref())
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        if self.is_valid(handle) {
            self.items
                .get_mut(handle.index())
                .and_then(|slot| slot.as_mut())
        } else {
            None
        }
    }

    /// Temporarily moves an item out of its slot so it can be mutated while the
    /// rest of the arena is borrowed immutably. Pair with [`Arena::restore`].
    pub fn take(&mut self, handle: Handle) -> Option<T> {
        if self.is_valid(handle) {
            self.items.get_mut(handle.index()).and_then(|slot| slot.take())
        } else {
            None
        }
    }

    /// Puts back an item previously moved out with [`Arena::take`].
    pub fn restore(&mut self, handle: Handle, item: T) {
        if self.is_valid(handle) {
            if let Some(slot) = self.items.get_mut(handle.index()) {
                *slot = Some(item);
            }
        }
    }

    pub fn remove(&mut self, handle: Handle) -> Option<T> {
        if !self.is_valid(handle) {
            return None;
        }
        let slot = self.items.get_mut(handle.index())?;
        let item = slot.take();
        if item.is_some() {
            self.generations[handle.index()] = self.generations[handle.index()].wrapping_add(1);
            self.free_list.push_back(handle.index());
        }
        item
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.get(handle).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Handle, &T)> + '_ {
        self.items.iter().enumerate().filter_map(|(index, slot)| {
            slot.as_ref()
                .map(|item| (Handle::new(index, self.generations[index]), item))
        })
    }

    pub fn handles(&self) -> impl Iterator<Item = Handle> + '_ {
        self.iter().map(|(handle, _)| handle)
    }

    /// Removes every item, returning them in slot order.
    pub fn drain(&mut self) -> Vec<T> {
        let handles: Vec<Handle> = self.handles().collect();
        handles
            .into_iter()
            .filter_map(|handle| self.remove(handle))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.items.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_valid(&self, handle: Handle) -> bool {
        self.generations
            .get(handle.index())
            .copied()
            .map(|gen| gen == handle.generation())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removed_handle_does_not_resolve_after_reuse() {
        let mut arena = Arena::new();
        let first = arena.insert("history-a");
        arena.remove(first);
        let second = arena.insert("history-b");

        assert_eq!(first.index(), second.index());
        assert_ne!(first.generation(), second.generation());
        assert!(arena.get(first).is_none());
        assert_eq!(arena.get(second), Some(&"history-b"));
    }

    #[test]
    fn take_and_restore_keep_handle_valid() {
        let mut arena = Arena::new();
        let handle = arena.insert(vec![1, 2, 3]);
        let mut item = arena.take(handle).expect("item present");
        assert!(arena.get(handle).is_none());
        item.push(4);
        arena.restore(handle, item);
        assert_eq!(arena.get(handle).map(Vec::len), Some(4));
    }

    #[test]
    fn drain_empties_arena() {
        let mut arena = Arena::new();
        arena.insert(1);
        arena.insert(2);
        assert_eq!(arena.drain(), vec![1, 2]);
        assert!(arena.is_empty());
    }
}
