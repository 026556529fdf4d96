//! LRU List Module
//!
//! Recency-ordered sequence used for LRU eviction.

/// Null link in the arena.
const NIL: usize = usize::MAX;

/// Arena slot. `value` is `None` while the slot sits on the free list.
#[derive(Debug)]
struct Node<T> {
    value: Option<T>,
    prev: usize,
    next: usize,
}

// == LRU List ==
/// Doubly-linked list of values ordered by recency of use.
///
/// Nodes live in a `Vec` arena and link to each other by index, so a slot
/// index handed out by [`push_front`](Self::push_front) stays valid until that
/// node is removed. Freed slots are recycled.
///
/// - Front = Most recently used
/// - Back = Least recently used
#[derive(Debug)]
pub struct LruList<T> {
    nodes: Vec<Node<T>>,
    head: usize,
    tail: usize,
    free: usize,
    len: usize,
}

impl<T> Default for LruList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> LruList<T> {
    // == Constructor ==
    /// Creates a new empty list.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates a new empty list with room for `capacity` nodes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            head: NIL,
            tail: NIL,
            free: NIL,
            len: 0,
        }
    }

    // == Push Front ==
    /// Inserts a value as most recently used and returns its slot.
    pub fn push_front(&mut self, value: T) -> usize {
        let idx = if self.free != NIL {
            let idx = self.free;
            self.free = self.nodes[idx].next;
            self.nodes[idx] = Node {
                value: Some(value),
                prev: NIL,
                next: NIL,
            };
            idx
        } else {
            self.nodes.push(Node {
                value: Some(value),
                prev: NIL,
                next: NIL,
            });
            self.nodes.len() - 1
        };

        self.link_front(idx);
        self.len += 1;
        idx
    }

    // == Move To Front ==
    /// Marks the node at `idx` as most recently used.
    pub fn move_to_front(&mut self, idx: usize) {
        debug_assert!(self.is_occupied(idx), "move_to_front on a free slot");
        if self.head == idx {
            return;
        }
        self.unlink(idx);
        self.link_front(idx);
    }

    // == Remove ==
    /// Removes the node at `idx` and returns its value.
    ///
    /// Returns None if the slot is not occupied.
    pub fn remove(&mut self, idx: usize) -> Option<T> {
        if !self.is_occupied(idx) {
            return None;
        }
        self.unlink(idx);
        let value = self.nodes[idx].value.take();
        self.nodes[idx].next = self.free;
        self.free = idx;
        self.len -= 1;
        value
    }

    // == Pop Back ==
    /// Removes and returns the least recently used value.
    ///
    /// Returns None if the list is empty.
    pub fn pop_back(&mut self) -> Option<T> {
        match self.tail {
            NIL => None,
            tail => self.remove(tail),
        }
    }

    // == Peek Back ==
    /// Returns the least recently used value without removing it.
    pub fn back(&self) -> Option<&T> {
        self.get(self.tail)
    }

    // == Accessors ==
    /// Returns the value at `idx`, if occupied.
    pub fn get(&self, idx: usize) -> Option<&T> {
        self.nodes.get(idx).and_then(|node| node.value.as_ref())
    }

    /// Returns a mutable reference to the value at `idx`, if occupied.
    pub fn get_mut(&mut self, idx: usize) -> Option<&mut T> {
        self.nodes.get_mut(idx).and_then(|node| node.value.as_mut())
    }

    /// Iterates values from most to least recently used, with their slots.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            cursor: self.head,
        }
    }

    // == Length ==
    /// Returns the number of linked values.
    pub fn len(&self) -> usize {
        self.len
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    // == Clear ==
    /// Drops every value and resets the links.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.head = NIL;
        self.tail = NIL;
        self.free = NIL;
        self.len = 0;
    }

    fn is_occupied(&self, idx: usize) -> bool {
        self.nodes
            .get(idx)
            .map(|node| node.value.is_some())
            .unwrap_or(false)
    }

    fn link_front(&mut self, idx: usize) {
        self.nodes[idx].prev = NIL;
        self.nodes[idx].next = self.head;
        if self.head != NIL {
            self.nodes[self.head].prev = idx;
        }
        self.head = idx;
        if self.tail == NIL {
            self.tail = idx;
        }
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = (self.nodes[idx].prev, self.nodes[idx].next);
        if prev != NIL {
            self.nodes[prev].next = next;
        } else {
            self.head = next;
        }
        if next != NIL {
            self.nodes[next].prev = prev;
        } else {
            self.tail = prev;
        }
        self.nodes[idx].prev = NIL;
        self.nodes[idx].next = NIL;
    }
}

// == Iterator ==
/// Front-to-back iterator over an [`LruList`].
pub struct Iter<'a, T> {
    list: &'a LruList<T>,
    cursor: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = (usize, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor == NIL {
            return None;
        }
        let idx = self.cursor;
        let node = &self.list.nodes[idx];
        self.cursor = node.next;
        node.value.as_ref().map(|value| (idx, value))
    }
}
