// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Index-linked task deque.
//!
//! A [`TaskList`] threads through nodes that belong to other objects. Each node
//! is identified by the owner's slot index (a view slot, a task slot, ...), and
//! the list stores the `prev`/`next` links for every key it has ever seen in
//! parallel arrays. The list never owns the objects; it only records order.
//!
//! Every queue in the crate is one of these: the redraw queue, the idle and
//! commit queues, each pointer's entered chain, the motion-tracking set and the
//! frame waiters.
//!
//! # Contract
//!
//! - Linking a key that is already linked is a programmer error and panics.
//! - [`remove`](TaskList::remove) on an unlinked key is a no-op.
//! - Indexed access walks from whichever end is closer.

use alloc::vec::Vec;

/// Sentinel value indicating "no node" in link fields.
pub const INVALID: u32 = u32::MAX;

/// Ordered deque of externally owned nodes, addressed by slot index.
#[derive(Clone, Debug, Default)]
pub struct TaskList {
    head: u32,
    tail: u32,
    len: usize,
    prev: Vec<u32>,
    next: Vec<u32>,
}

impl TaskList {
    /// Creates an empty list.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            head: INVALID,
            tail: INVALID,
            len: 0,
            prev: Vec::new(),
            next: Vec::new(),
        }
    }

    /// Returns the number of linked nodes.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` when no node is linked.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns whether `key` is currently linked into this list.
    #[must_use]
    pub fn is_linked(&self, key: u32) -> bool {
        (key as usize) < self.prev.len() && (self.head == key || self.prev[key as usize] != INVALID)
    }

    /// Returns the first key, if any.
    #[must_use]
    pub fn front(&self) -> Option<u32> {
        (self.head != INVALID).then_some(self.head)
    }

    /// Returns the last key, if any.
    #[must_use]
    pub fn back(&self) -> Option<u32> {
        (self.tail != INVALID).then_some(self.tail)
    }

    /// Returns the key following `key`, if `key` is linked and not last.
    #[must_use]
    pub fn next(&self, key: u32) -> Option<u32> {
        if !self.is_linked(key) {
            return None;
        }
        let n = self.next[key as usize];
        (n != INVALID).then_some(n)
    }

    /// Returns the key preceding `key`, if `key` is linked and not first.
    #[must_use]
    pub fn prev(&self, key: u32) -> Option<u32> {
        if !self.is_linked(key) {
            return None;
        }
        let p = self.prev[key as usize];
        (p != INVALID).then_some(p)
    }

    /// Links `key` at the front.
    ///
    /// # Panics
    ///
    /// Panics if `key` is already linked.
    pub fn push_front(&mut self, key: u32) {
        self.prepare(key);
        self.next[key as usize] = self.head;
        if self.head == INVALID {
            self.tail = key;
        } else {
            self.prev[self.head as usize] = key;
        }
        self.head = key;
        self.len += 1;
    }

    /// Links `key` at the back.
    ///
    /// # Panics
    ///
    /// Panics if `key` is already linked.
    pub fn push_back(&mut self, key: u32) {
        self.prepare(key);
        self.prev[key as usize] = self.tail;
        if self.tail == INVALID {
            self.head = key;
        } else {
            self.next[self.tail as usize] = key;
        }
        self.tail = key;
        self.len += 1;
    }

    /// Links `key` so that it ends up at position `index`.
    ///
    /// An `index` at or past the end appends.
    ///
    /// # Panics
    ///
    /// Panics if `key` is already linked.
    pub fn insert(&mut self, index: usize, key: u32) {
        match self.get(index) {
            Some(anchor) => self.insert_before(key, anchor),
            None => self.push_back(key),
        }
    }

    /// Links `key` immediately before `anchor`.
    ///
    /// # Panics
    ///
    /// Panics if `key` is already linked or `anchor` is not.
    pub fn insert_before(&mut self, key: u32, anchor: u32) {
        assert!(self.is_linked(anchor), "anchor task is not linked");
        self.prepare(key);
        let before = self.prev[anchor as usize];
        self.prev[key as usize] = before;
        self.next[key as usize] = anchor;
        self.prev[anchor as usize] = key;
        if before == INVALID {
            self.head = key;
        } else {
            self.next[before as usize] = key;
        }
        self.len += 1;
    }

    /// Links `key` immediately after `anchor`.
    ///
    /// # Panics
    ///
    /// Panics if `key` is already linked or `anchor` is not.
    pub fn insert_after(&mut self, key: u32, anchor: u32) {
        assert!(self.is_linked(anchor), "anchor task is not linked");
        self.prepare(key);
        let after = self.next[anchor as usize];
        self.prev[key as usize] = anchor;
        self.next[key as usize] = after;
        self.next[anchor as usize] = key;
        if after == INVALID {
            self.tail = key;
        } else {
            self.prev[after as usize] = key;
        }
        self.len += 1;
    }

    /// Unlinks `key`. Returns `false` if it was not linked.
    pub fn remove(&mut self, key: u32) -> bool {
        if !self.is_linked(key) {
            return false;
        }
        let p = self.prev[key as usize];
        let n = self.next[key as usize];
        if p == INVALID {
            self.head = n;
        } else {
            self.next[p as usize] = n;
        }
        if n == INVALID {
            self.tail = p;
        } else {
            self.prev[n as usize] = p;
        }
        self.prev[key as usize] = INVALID;
        self.next[key as usize] = INVALID;
        self.len -= 1;
        true
    }

    /// Unlinks and returns the first key.
    pub fn pop_front(&mut self) -> Option<u32> {
        let key = self.front()?;
        self.remove(key);
        Some(key)
    }

    /// Returns the key at position `index`.
    ///
    /// Walks from the head or the tail, whichever is closer.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<u32> {
        if index >= self.len {
            return None;
        }
        if index <= self.len / 2 {
            self.iter().nth(index)
        } else {
            self.iter().rev().nth(self.len - 1 - index)
        }
    }

    /// Returns the position of `key`, if linked.
    #[must_use]
    pub fn position(&self, key: u32) -> Option<usize> {
        if !self.is_linked(key) {
            return None;
        }
        self.iter().position(|k| k == key)
    }

    /// Unlinks every node.
    pub fn clear(&mut self) {
        while self.pop_front().is_some() {}
    }

    /// Returns a front-to-back iterator over linked keys.
    #[must_use]
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            list: self,
            front: self.head,
            back: self.tail,
            remaining: self.len,
        }
    }

    /// Grows link storage to cover `key` and checks that it is unlinked.
    fn prepare(&mut self, key: u32) {
        assert!(key != INVALID, "invalid task key");
        assert!(!self.is_linked(key), "task already linked");
        let needed = key as usize + 1;
        if self.prev.len() < needed {
            self.prev.resize(needed, INVALID);
            self.next.resize(needed, INVALID);
        }
    }
}

/// Double-ended iterator over the keys of a [`TaskList`].
#[derive(Debug)]
pub struct Iter<'a> {
    list: &'a TaskList,
    front: u32,
    back: u32,
    remaining: usize,
}

impl Iterator for Iter<'_> {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        if self.remaining == 0 {
            return None;
        }
        let key = self.front;
        self.front = self.list.next[key as usize];
        self.remaining -= 1;
        Some(key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl DoubleEndedIterator for Iter<'_> {
    fn next_back(&mut self) -> Option<u32> {
        if self.remaining == 0 {
            return None;
        }
        let key = self.back;
        self.back = self.list.prev[key as usize];
        self.remaining -= 1;
        Some(key)
    }
}

impl ExactSizeIterator for Iter<'_> {}

impl<'a> IntoIterator for &'a TaskList {
    type Item = u32;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}
