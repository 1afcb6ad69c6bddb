//! Arena of prioritized entries with lazy deletion.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// An entry that can be ranked in an [`EntryQueue`].
pub trait Prioritized {
    /// Total order key; smaller keys pop first.
    type Key: Ord + Copy;

    /// Current key of the entry.
    fn key(&self) -> Self::Key;
}

/// Handle to an entry stored in an [`EntryQueue`].
pub type EntryId = usize;

/// Entries live in an arena and are addressed by [`EntryId`]. Requeueing an
/// entry after changing it supersedes its previous heap slot; superseded and
/// removed slots are skipped on pop.
///
/// # Examples
///
/// ```
/// use u_routing_init::construction::{EntryQueue, Prioritized};
///
/// #[derive(Clone, Copy)]
/// struct Job(i64);
///
/// impl Prioritized for Job {
///     type Key = i64;
///     fn key(&self) -> i64 { self.0 }
/// }
///
/// let mut queue = EntryQueue::new();
/// let a = queue.insert(Job(5));
/// let b = queue.insert(Job(3));
/// queue.get_mut(a).0 = 1;
/// queue.push(a);
/// assert_eq!(queue.pop(), Some(a));
/// assert_eq!(queue.pop(), Some(b));
/// assert_eq!(queue.pop(), None);
/// ```
pub struct EntryQueue<E: Prioritized> {
    entries: Vec<E>,
    generation: Vec<u32>,
    queued: Vec<bool>,
    free: Vec<EntryId>,
    heap: BinaryHeap<Reverse<(E::Key, EntryId, u32)>>,
    len: usize,
}

impl<E: Prioritized> EntryQueue<E> {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            generation: Vec::new(),
            queued: Vec::new(),
            free: Vec::new(),
            heap: BinaryHeap::new(),
            len: 0,
        }
    }

    /// Stores an entry and queues it.
    pub fn insert(&mut self, entry: E) -> EntryId {
        let id = match self.free.pop() {
            Some(id) => {
                self.entries[id] = entry;
                id
            }
            None => {
                self.entries.push(entry);
                self.generation.push(0);
                self.queued.push(false);
                self.entries.len() - 1
            }
        };
        self.push(id);
        id
    }

    /// Entry behind a handle.
    pub fn get(&self, id: EntryId) -> &E {
        &self.entries[id]
    }

    /// Mutable entry behind a handle. Call [`push`](Self::push) afterwards
    /// for a key change to take effect.
    pub fn get_mut(&mut self, id: EntryId) -> &mut E {
        &mut self.entries[id]
    }

    /// (Re)queues an entry with its current key.
    pub fn push(&mut self, id: EntryId) {
        self.generation[id] = self.generation[id].wrapping_add(1);
        if !self.queued[id] {
            self.queued[id] = true;
            self.len += 1;
        }
        let key = self.entries[id].key();
        self.heap.push(Reverse((key, id, self.generation[id])));
    }

    /// `true` if the entry is queued.
    pub fn contains(&self, id: EntryId) -> bool {
        self.queued.get(id).copied().unwrap_or(false)
    }

    /// Dequeues an entry and frees its slot.
    pub fn remove(&mut self, id: EntryId) {
        if self.queued[id] {
            self.queued[id] = false;
            self.len -= 1;
        }
        self.generation[id] = self.generation[id].wrapping_add(1);
        self.free.push(id);
    }

    /// Dequeues the entry with the smallest key. Its slot stays allocated
    /// until [`remove`](Self::remove).
    pub fn pop(&mut self) -> Option<EntryId> {
        while let Some(Reverse((_, id, generation))) = self.heap.pop() {
            if self.queued[id] && self.generation[id] == generation {
                self.queued[id] = false;
                self.len -= 1;
                return Some(id);
            }
        }
        None
    }

    /// Number of queued entries.
    pub fn len(&self) -> usize {
        self.len
    }

    /// `true` if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl<E: Prioritized> Default for EntryQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy)]
    struct Entry {
        value: i64,
        node: usize,
    }

    impl Prioritized for Entry {
        type Key = (i64, usize);
        fn key(&self) -> (i64, usize) {
            (self.value, self.node)
        }
    }

    #[test]
    fn test_ties_break_on_key() {
        let mut q = EntryQueue::new();
        let a = q.insert(Entry { value: 4, node: 7 });
        let b = q.insert(Entry { value: 4, node: 2 });
        assert_eq!(q.len(), 2);
        assert_eq!(q.pop(), Some(b));
        assert_eq!(q.pop(), Some(a));
        assert!(q.is_empty());
    }

    #[test]
    fn test_update_and_remove() {
        let mut q = EntryQueue::new();
        let a = q.insert(Entry { value: 1, node: 0 });
        let b = q.insert(Entry { value: 2, node: 1 });
        let c = q.insert(Entry { value: 3, node: 2 });

        q.get_mut(a).value = 10;
        q.push(a);
        q.remove(b);
        assert!(!q.contains(b));
        assert_eq!(q.len(), 2);

        // The freed slot is reused.
        let d = q.insert(Entry { value: 0, node: 3 });
        assert_eq!(d, b);

        assert_eq!(q.pop(), Some(d));
        assert_eq!(q.pop(), Some(c));
        assert_eq!(q.pop(), Some(a));
        assert_eq!(q.pop(), None);
    }

    #[test]
    fn test_popped_entry_can_be_requeued() {
        let mut q = EntryQueue::new();
        let a = q.insert(Entry { value: 1, node: 0 });
        assert_eq!(q.pop(), Some(a));
        assert!(!q.contains(a));
        q.push(a);
        assert_eq!(q.pop(), Some(a));
    }
}
