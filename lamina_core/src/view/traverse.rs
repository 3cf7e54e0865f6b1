// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree traversal utilities.

use super::id::ViewId;
use super::tree::ViewTree;
use crate::task::INVALID;

/// An iterator over the direct children of a view in paint order.
///
/// Forward iteration starts at the backmost child; iterating with
/// [`rev`](Iterator::rev) yields the frontmost child first.
/// Created by [`ViewTree::children`].
#[derive(Debug)]
pub struct Children<'a> {
    tree: &'a ViewTree,
    front: u32,
    back: u32,
}

impl<'a> Children<'a> {
    pub(crate) fn new(tree: &'a ViewTree, first: u32, last: u32) -> Self {
        Self {
            tree,
            front: first,
            back: last,
        }
    }

    fn handle(&self, idx: u32) -> ViewId {
        ViewId {
            idx,
            generation: self.tree.generation[idx as usize],
        }
    }
}

impl Iterator for Children<'_> {
    type Item = ViewId;

    fn next(&mut self) -> Option<ViewId> {
        if self.front == INVALID {
            return None;
        }
        let idx = self.front;
        if idx == self.back {
            self.front = INVALID;
            self.back = INVALID;
        } else {
            self.front = self.tree.next_sibling[idx as usize];
        }
        Some(self.handle(idx))
    }
}

impl DoubleEndedIterator for Children<'_> {
    fn next_back(&mut self) -> Option<ViewId> {
        if self.back == INVALID {
            return None;
        }
        let idx = self.back;
        if idx == self.front {
            self.front = INVALID;
            self.back = INVALID;
        } else {
            self.back = self.tree.prev_sibling[idx as usize];
        }
        Some(self.handle(idx))
    }
}
