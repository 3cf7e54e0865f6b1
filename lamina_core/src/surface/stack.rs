// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays surface storage with block stacking and shared ownership.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use kurbo::{Insets, Point, Vec2};
use understory_dirty::{CycleHandling, DirtyTracker, EagerPolicy};

use super::id::{DropQueue, SurfaceHolder, SurfaceId};
use crate::dirty;
use crate::output::OutputId;
use crate::protocol::{CanvasId, SurfaceRole};
use crate::task::INVALID;
use crate::view::ViewId;

type Observer = Box<dyn FnOnce(SurfaceId)>;

/// Struct-of-arrays storage for all surfaces of a session.
pub struct SurfaceStack {
    // -- Sibling chain --
    pub(crate) parent: Vec<u32>,
    pub(crate) above: Vec<u32>,
    pub(crate) below: Vec<u32>,

    // -- Shell chain --
    pub(crate) up: Vec<u32>,
    pub(crate) down: Vec<u32>,
    top: u32,
    bottom: u32,
    shell_count: usize,

    // -- Properties --
    pub(crate) shell: Vec<bool>,
    pub(crate) margin: Vec<Insets>,
    pub(crate) position: Vec<Point>,
    pub(crate) root_view: Vec<Option<ViewId>>,
    pub(crate) canvas: Vec<Option<CanvasId>>,
    pub(crate) outputs: Vec<Vec<OutputId>>,
    pub(crate) frame_pending: Vec<bool>,

    // -- Ownership --
    pub(crate) refcount: Vec<u32>,
    observers: Vec<Vec<Observer>>,
    dropped: DropQueue,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) alive: Vec<bool>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,

    // -- Dirty tracking --
    pub(crate) dirty: DirtyTracker<u32>,
}

impl fmt::Debug for SurfaceStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SurfaceStack")
            .field("len", &self.len)
            .field("parent", &self.parent)
            .field("above", &self.above)
            .field("below", &self.below)
            .field("top", &self.top)
            .field("bottom", &self.bottom)
            .field("shell_count", &self.shell_count)
            .field("refcount", &self.refcount)
            .finish_non_exhaustive()
    }
}

impl Default for SurfaceStack {
    fn default() -> Self {
        Self::new()
    }
}

impl SurfaceStack {
    /// Creates an empty stack.
    #[must_use]
    pub fn new() -> Self {
        Self {
            parent: Vec::new(),
            above: Vec::new(),
            below: Vec::new(),
            up: Vec::new(),
            down: Vec::new(),
            top: INVALID,
            bottom: INVALID,
            shell_count: 0,
            shell: Vec::new(),
            margin: Vec::new(),
            position: Vec::new(),
            root_view: Vec::new(),
            canvas: Vec::new(),
            outputs: Vec::new(),
            frame_pending: Vec::new(),
            refcount: Vec::new(),
            observers: Vec::new(),
            dropped: DropQueue::default(),
            generation: Vec::new(),
            alive: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
        }
    }

    // -- Ownership API --

    /// Creates a surface with a reference count of one.
    ///
    /// Shell surfaces go on top of the shell chain; sub-surfaces are attached
    /// with [`set_parent`](Self::set_parent).
    ///
    /// # Panics
    ///
    /// Panics if a sub-surface's parent handle is stale.
    pub fn create(&mut self, role: SurfaceRole) -> SurfaceHolder {
        let idx = if let Some(idx) = self.free_list.pop() {
            let i = idx as usize;
            self.parent[i] = INVALID;
            self.above[i] = INVALID;
            self.below[i] = INVALID;
            self.up[i] = INVALID;
            self.down[i] = INVALID;
            self.margin[i] = Insets::ZERO;
            self.position[i] = Point::ZERO;
            self.root_view[i] = None;
            self.canvas[i] = None;
            self.outputs[i].clear();
            self.frame_pending[i] = false;
            self.alive[i] = true;
            idx
        } else {
            let idx = self.len;
            self.len += 1;
            self.parent.push(INVALID);
            self.above.push(INVALID);
            self.below.push(INVALID);
            self.up.push(INVALID);
            self.down.push(INVALID);
            self.shell.push(false);
            self.margin.push(Insets::ZERO);
            self.position.push(Point::ZERO);
            self.root_view.push(None);
            self.canvas.push(None);
            self.outputs.push(Vec::new());
            self.frame_pending.push(false);
            self.refcount.push(0);
            self.observers.push(Vec::new());
            self.generation.push(0);
            self.alive.push(true);
            idx
        };
        self.refcount[idx as usize] = 1;
        let id = self.id_at(idx);

        match role {
            SurfaceRole::Shell => {
                self.shell[idx as usize] = true;
                self.push_shell_surface(idx);
            }
            SurfaceRole::Sub { parent } => {
                self.shell[idx as usize] = false;
                self.set_parent(id, parent);
            }
        }
        SurfaceHolder::new(id, &self.dropped)
    }

    /// Makes another holder for the same surface.
    ///
    /// # Panics
    ///
    /// Panics if the holder's surface is gone.
    pub fn share(&mut self, holder: &SurfaceHolder) -> SurfaceHolder {
        self.validate(holder.id);
        self.refcount[holder.id.idx as usize] += 1;
        SurfaceHolder::new(holder.id, &self.dropped)
    }

    /// Gives a holder back. Returns `true` if this was the last holder and the
    /// surface was destroyed.
    ///
    /// Destruction runs the destroying observers, detaches the surface's direct
    /// sub-surfaces (each keeps its own block and becomes an orphan), and
    /// removes the surface from both chains.
    ///
    /// # Panics
    ///
    /// Panics if the holder's surface is gone.
    pub fn release(&mut self, holder: SurfaceHolder) -> bool {
        let id = holder.disarm();
        self.validate(id);
        self.release_reference(id)
    }

    /// Takes the ids of holders dropped since the last call.
    pub(crate) fn take_dropped(&mut self) -> Vec<SurfaceId> {
        core::mem::take(&mut *self.dropped.borrow_mut())
    }

    /// Drops one reference to a live surface, destroying it on the last one.
    pub(crate) fn release_reference(&mut self, id: SurfaceId) -> bool {
        let count = &mut self.refcount[id.idx as usize];
        *count -= 1;
        if *count > 0 {
            return false;
        }
        self.destroy(id.idx);
        true
    }

    /// Destroys a surface regardless of outstanding holders.
    pub(crate) fn force_destroy(&mut self, id: SurfaceId) {
        self.validate(id);
        self.refcount[id.idx as usize] = 0;
        self.destroy(id.idx);
    }

    /// Returns the number of live holders.
    #[must_use]
    pub fn refcount(&self, id: SurfaceId) -> u32 {
        self.validate(id);
        self.refcount[id.idx as usize]
    }

    /// Registers `observer` to run once just before the surface is destroyed.
    pub fn observe_destroying(
        &mut self,
        id: SurfaceId,
        observer: impl FnOnce(SurfaceId) + 'static,
    ) {
        self.validate(id);
        self.observers[id.idx as usize].push(Box::new(observer));
    }

    /// Returns whether the given handle refers to a live surface.
    #[must_use]
    pub fn is_alive(&self, id: SurfaceId) -> bool {
        id.idx < self.len
            && self.generation[id.idx as usize] == id.generation
            && self.alive[id.idx as usize]
    }

    /// Returns every live surface, parents before their descendants.
    #[must_use]
    pub fn surfaces(&self) -> Vec<SurfaceId> {
        let mut live: Vec<(usize, u32)> = (0..self.len)
            .filter(|&idx| self.alive[idx as usize])
            .map(|idx| (self.depth(idx), idx))
            .collect();
        live.sort_unstable();
        live.into_iter().map(|(_, idx)| self.id_at(idx)).collect()
    }

    // -- Sibling chain API --

    /// Attaches `id` (with its block) as the frontmost child of `parent`,
    /// directly above the topmost descendant of `parent`.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale, if `id` is a shell surface or already
    /// has a parent, or if `parent` lies inside `id`'s block.
    pub fn set_parent(&mut self, id: SurfaceId, parent: SurfaceId) {
        self.validate(id);
        self.validate(parent);
        let s = id.idx;
        let p = parent.idx;
        assert!(!self.shell[s as usize], "shell surface cannot have a parent");
        assert!(
            self.parent[s as usize] == INVALID,
            "surface already has a parent"
        );
        assert!(
            s != p && !self.is_descendant(p, s),
            "cannot parent a surface beneath itself"
        );

        let (bottom, top) = self.block(s);
        self.splice_out(bottom, top);
        let anchor = self.block_top(p);
        self.parent[s as usize] = p;
        self.splice_above(bottom, top, anchor);

        // The parent's commit publishes the child's state.
        let _ = self.dirty.add_dependency(p, s, dirty::COMMIT);
    }

    /// Moves `id`'s block directly above `target`.
    ///
    /// A sibling target places the block above the sibling's whole block; the
    /// parent as target places it directly above the parent node. Any other
    /// target is rejected and `false` is returned.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale.
    pub fn move_above(&mut self, id: SurfaceId, target: SurfaceId) -> bool {
        let Some(anchor) = self.move_anchor(id, target, true) else {
            return false;
        };
        let (bottom, top) = self.block(id.idx);
        self.splice_out(bottom, top);
        self.splice_above(bottom, top, anchor);
        true
    }

    /// Moves `id`'s block directly below `target`. See
    /// [`move_above`](Self::move_above).
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale.
    pub fn move_below(&mut self, id: SurfaceId, target: SurfaceId) -> bool {
        let Some(anchor) = self.move_anchor(id, target, false) else {
            return false;
        };
        let (bottom, top) = self.block(id.idx);
        self.splice_out(bottom, top);
        self.splice_below(bottom, top, anchor);
        true
    }

    /// Returns the parent surface, if any.
    #[must_use]
    pub fn parent(&self, id: SurfaceId) -> Option<SurfaceId> {
        self.validate(id);
        self.handle(self.parent[id.idx as usize])
    }

    /// Returns the surface directly above in the sibling chain.
    #[must_use]
    pub fn above(&self, id: SurfaceId) -> Option<SurfaceId> {
        self.validate(id);
        self.handle(self.above[id.idx as usize])
    }

    /// Returns the surface directly below in the sibling chain.
    #[must_use]
    pub fn below(&self, id: SurfaceId) -> Option<SurfaceId> {
        self.validate(id);
        self.handle(self.below[id.idx as usize])
    }

    /// Returns the whole sibling chain containing `id`, bottom to top.
    #[must_use]
    pub fn chain(&self, id: SurfaceId) -> Vec<SurfaceId> {
        self.validate(id);
        let mut idx = id.idx;
        while self.below[idx as usize] != INVALID {
            idx = self.below[idx as usize];
        }
        let mut out = Vec::new();
        while idx != INVALID {
            out.push(self.id_at(idx));
            idx = self.above[idx as usize];
        }
        out
    }

    /// Returns whether `ancestor` is a strict ancestor of `id`.
    #[must_use]
    pub fn is_ancestor(&self, ancestor: SurfaceId, id: SurfaceId) -> bool {
        self.validate(ancestor);
        self.validate(id);
        self.is_descendant(id.idx, ancestor.idx)
    }

    // -- Shell chain API --

    /// Returns whether the surface is a shell surface.
    #[must_use]
    pub fn is_shell(&self, id: SurfaceId) -> bool {
        self.validate(id);
        self.shell[id.idx as usize]
    }

    /// Returns the number of live shell surfaces.
    #[must_use]
    pub fn shell_count(&self) -> usize {
        self.shell_count
    }

    /// Returns the shell surfaces, topmost first.
    #[must_use]
    pub fn shell_surfaces(&self) -> Vec<SurfaceId> {
        let mut out = Vec::with_capacity(self.shell_count);
        let mut idx = self.top;
        while idx != INVALID {
            out.push(self.id_at(idx));
            idx = self.down[idx as usize];
        }
        out
    }

    /// Moves a shell surface to the top of the shell chain. Returns `false` for
    /// sub-surfaces and for a surface already on top.
    pub fn raise_shell(&mut self, id: SurfaceId) -> bool {
        self.validate(id);
        let idx = id.idx;
        if !self.shell[idx as usize] || self.top == idx {
            return false;
        }
        self.remove_shell_surface(idx);
        self.push_shell_surface(idx);
        true
    }

    // -- Properties --

    /// Returns the position relative to the parent's content origin.
    #[must_use]
    pub fn position(&self, id: SurfaceId) -> Point {
        self.validate(id);
        self.position[id.idx as usize]
    }

    /// Stores the position relative to the parent's content origin and returns
    /// the offset to send to the compositor.
    pub fn set_position(&mut self, id: SurfaceId, position: Point) -> Point {
        self.validate(id);
        self.position[id.idx as usize] = position;
        self.wire_position(id)
    }

    /// Returns the compositor offset: the relative position shifted by the
    /// parent's margin origin and back by this surface's own margin origin.
    #[must_use]
    pub fn wire_position(&self, id: SurfaceId) -> Point {
        self.validate(id);
        let i = id.idx as usize;
        let own = margin_origin(self.margin[i]);
        let parent = match self.parent[i] {
            INVALID => Vec2::ZERO,
            p => margin_origin(self.margin[p as usize]),
        };
        self.position[i] + parent - own
    }

    /// Returns the margin around the surface's content.
    #[must_use]
    pub fn margin(&self, id: SurfaceId) -> Insets {
        self.validate(id);
        self.margin[id.idx as usize]
    }

    /// Sets the margin around the surface's content.
    pub fn set_margin(&mut self, id: SurfaceId, margin: Insets) {
        self.validate(id);
        self.margin[id.idx as usize] = margin;
    }

    /// Returns the root view bound to the surface.
    #[must_use]
    pub fn root_view(&self, id: SurfaceId) -> Option<ViewId> {
        self.validate(id);
        self.root_view[id.idx as usize]
    }

    /// Returns the canvas handed to views drawing into this surface.
    #[must_use]
    pub fn canvas(&self, id: SurfaceId) -> Option<CanvasId> {
        self.validate(id);
        self.canvas[id.idx as usize]
    }

    /// Sets the canvas handed to views drawing into this surface.
    pub fn set_canvas(&mut self, id: SurfaceId, canvas: Option<CanvasId>) {
        self.validate(id);
        self.canvas[id.idx as usize] = canvas;
    }

    /// Returns the outputs the surface is currently shown on.
    #[must_use]
    pub fn outputs(&self, id: SurfaceId) -> &[OutputId] {
        self.validate(id);
        &self.outputs[id.idx as usize]
    }

    pub(crate) fn enter_output(&mut self, id: SurfaceId, output: OutputId) -> bool {
        self.validate(id);
        let outputs = &mut self.outputs[id.idx as usize];
        if outputs.contains(&output) {
            return false;
        }
        outputs.push(output);
        true
    }

    pub(crate) fn leave_output(&mut self, id: SurfaceId, output: OutputId) -> bool {
        self.validate(id);
        let outputs = &mut self.outputs[id.idx as usize];
        let before = outputs.len();
        outputs.retain(|&o| o != output);
        outputs.len() != before
    }

    pub(crate) fn forget_output(&mut self, output: OutputId) {
        for outputs in &mut self.outputs {
            outputs.retain(|&o| o != output);
        }
    }

    // -- Commit tracking --

    /// Records that `id` committed, so its ancestors must commit as well.
    /// Returns `true` if any ancestor was marked.
    pub(crate) fn mark_commit(&mut self, id: SurfaceId) -> bool {
        self.validate(id);
        let p = self.parent[id.idx as usize];
        if p == INVALID {
            return false;
        }
        self.dirty.mark_with(p, dirty::COMMIT, &EagerPolicy);
        true
    }

    /// Drains the surfaces awaiting a commit, children before parents.
    pub(crate) fn drain_commits(&mut self) -> Vec<SurfaceId> {
        let pending: Vec<u32> = self
            .dirty
            .drain(dirty::COMMIT)
            .affected()
            .deterministic()
            .run()
            .collect();
        pending
            .into_iter()
            .filter(|&idx| idx < self.len && self.alive[idx as usize])
            .map(|idx| self.id_at(idx))
            .collect()
    }

    // -- Internal helpers --

    pub(crate) fn id_at(&self, idx: u32) -> SurfaceId {
        SurfaceId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    fn handle(&self, idx: u32) -> Option<SurfaceId> {
        (idx != INVALID).then(|| self.id_at(idx))
    }

    /// Panics if the handle is stale.
    pub(crate) fn validate(&self, id: SurfaceId) {
        assert!(
            self.is_alive(id),
            "stale SurfaceId: {id:?} (current gen: {})",
            if id.idx < self.len {
                self.generation[id.idx as usize]
            } else {
                u32::MAX
            }
        );
    }

    fn depth(&self, mut idx: u32) -> usize {
        let mut depth = 0;
        while self.parent[idx as usize] != INVALID {
            idx = self.parent[idx as usize];
            depth += 1;
        }
        depth
    }

    /// Returns whether `ancestor` is a strict ancestor of `idx`.
    fn is_descendant(&self, idx: u32, ancestor: u32) -> bool {
        let mut p = self.parent[idx as usize];
        while p != INVALID {
            if p == ancestor {
                return true;
            }
            p = self.parent[p as usize];
        }
        false
    }

    fn block_top(&self, idx: u32) -> u32 {
        let mut top = idx;
        loop {
            let next = self.above[top as usize];
            if next == INVALID || !self.is_descendant(next, idx) {
                return top;
            }
            top = next;
        }
    }

    fn block_bottom(&self, idx: u32) -> u32 {
        let mut bottom = idx;
        loop {
            let next = self.below[bottom as usize];
            if next == INVALID || !self.is_descendant(next, idx) {
                return bottom;
            }
            bottom = next;
        }
    }

    /// Returns `(bottom, top)` of the block rooted at `idx`.
    fn block(&self, idx: u32) -> (u32, u32) {
        (self.block_bottom(idx), self.block_top(idx))
    }

    fn move_anchor(&self, id: SurfaceId, target: SurfaceId, above: bool) -> Option<u32> {
        self.validate(id);
        self.validate(target);
        let p = self.parent[id.idx as usize];
        if p == INVALID || id == target {
            return None;
        }
        if self.parent[target.idx as usize] == p {
            Some(if above {
                self.block_top(target.idx)
            } else {
                self.block_bottom(target.idx)
            })
        } else if target.idx == p {
            Some(p)
        } else {
            None
        }
    }

    fn splice_out(&mut self, bottom: u32, top: u32) {
        let over = self.above[top as usize];
        let under = self.below[bottom as usize];
        if over != INVALID {
            self.below[over as usize] = under;
        }
        if under != INVALID {
            self.above[under as usize] = over;
        }
        self.above[top as usize] = INVALID;
        self.below[bottom as usize] = INVALID;
    }

    /// Links a detached run `bottom..=top` directly above `anchor`.
    fn splice_above(&mut self, bottom: u32, top: u32, anchor: u32) {
        let over = self.above[anchor as usize];
        self.above[anchor as usize] = bottom;
        self.below[bottom as usize] = anchor;
        self.above[top as usize] = over;
        if over != INVALID {
            self.below[over as usize] = top;
        }
    }

    /// Links a detached run `bottom..=top` directly below `anchor`.
    fn splice_below(&mut self, bottom: u32, top: u32, anchor: u32) {
        let under = self.below[anchor as usize];
        self.below[anchor as usize] = top;
        self.above[top as usize] = anchor;
        self.below[bottom as usize] = under;
        if under != INVALID {
            self.above[under as usize] = bottom;
        }
    }

    fn push_shell_surface(&mut self, idx: u32) {
        self.up[idx as usize] = INVALID;
        self.down[idx as usize] = self.top;
        if self.top == INVALID {
            self.bottom = idx;
        } else {
            self.up[self.top as usize] = idx;
        }
        self.top = idx;
        self.shell_count += 1;
    }

    fn remove_shell_surface(&mut self, idx: u32) {
        assert!(self.shell_count > 0, "shell surface count underflow");
        let up = self.up[idx as usize];
        let down = self.down[idx as usize];
        if up == INVALID {
            self.top = down;
        } else {
            self.down[up as usize] = down;
        }
        if down == INVALID {
            self.bottom = up;
        } else {
            self.up[down as usize] = up;
        }
        self.up[idx as usize] = INVALID;
        self.down[idx as usize] = INVALID;
        self.shell_count -= 1;
    }

    fn destroy(&mut self, idx: u32) {
        let id = self.id_at(idx);
        for observer in core::mem::take(&mut self.observers[idx as usize]) {
            observer(id);
        }

        // Direct children keep their blocks and become orphans.
        let children: Vec<u32> = (0..self.len)
            .filter(|&c| self.alive[c as usize] && self.parent[c as usize] == idx)
            .collect();
        for child in children {
            let (bottom, top) = self.block(child);
            self.splice_out(bottom, top);
            self.parent[child as usize] = INVALID;
            self.dirty.remove_dependency(idx, child, dirty::COMMIT);
        }

        let p = self.parent[idx as usize];
        if p != INVALID {
            self.dirty.remove_dependency(p, idx, dirty::COMMIT);
            self.parent[idx as usize] = INVALID;
        }
        self.splice_out(idx, idx);
        if self.shell[idx as usize] {
            self.remove_shell_surface(idx);
        }
        self.dirty.remove_key(idx);

        let i = idx as usize;
        self.root_view[i] = None;
        self.outputs[i].clear();
        self.alive[i] = false;
        self.generation[i] = self.generation[i].wrapping_add(1);
        self.free_list.push(idx);
    }
}

fn margin_origin(margin: Insets) -> Vec2 {
    Vec2::new(margin.x0, margin.y0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::rc::Rc;
    use alloc::vec;
    use core::cell::Cell;

    // A bare stack never applies dropped holders, so these surfaces live on.
    fn sub(stack: &mut SurfaceStack, parent: SurfaceId) -> SurfaceId {
        stack.create(SurfaceRole::Sub { parent }).id()
    }

    fn shell(stack: &mut SurfaceStack) -> SurfaceId {
        stack.create(SurfaceRole::Shell).id()
    }

    fn assert_blocks_contiguous(stack: &SurfaceStack, root: SurfaceId) {
        let chain = stack.chain(root);
        for &s in &chain {
            let members: Vec<usize> = chain
                .iter()
                .enumerate()
                .filter(|&(_, &x)| x == s || stack.is_ancestor(s, x))
                .map(|(i, _)| i)
                .collect();
            let first = members[0];
            let last = members[members.len() - 1];
            assert_eq!(last - first + 1, members.len(), "block of {s:?} is split");
        }
    }

    #[test]
    fn set_parent_goes_above_parent_block() {
        let mut stack = SurfaceStack::new();
        let root = shell(&mut stack);
        let a = sub(&mut stack, root);
        let a1 = sub(&mut stack, a);
        let b = sub(&mut stack, root);
        assert_eq!(stack.chain(root), vec![root, a, a1, b]);
        assert_eq!(stack.parent(a1), Some(a));
        assert_blocks_contiguous(&stack, root);
    }

    #[test]
    fn move_above_sibling_carries_block() {
        let mut stack = SurfaceStack::new();
        let root = shell(&mut stack);
        let a = sub(&mut stack, root);
        let b = sub(&mut stack, root);
        let c = sub(&mut stack, b);
        assert!(stack.move_below(b, a));
        assert_eq!(stack.chain(root), vec![root, b, c, a]);
        assert!(stack.move_above(b, a));
        assert_eq!(stack.chain(root), vec![root, a, b, c]);
        assert_eq!(stack.above(b), Some(c));
        assert_blocks_contiguous(&stack, root);
    }

    #[test]
    fn move_relative_to_parent() {
        let mut stack = SurfaceStack::new();
        let root = shell(&mut stack);
        let a = sub(&mut stack, root);
        let b = sub(&mut stack, root);
        assert!(stack.move_below(b, root));
        assert_eq!(stack.chain(root), vec![b, root, a]);
        assert!(stack.move_above(b, root));
        assert_eq!(stack.chain(root), vec![root, b, a]);
    }

    #[test]
    fn unrelated_targets_are_rejected() {
        let mut stack = SurfaceStack::new();
        let root = shell(&mut stack);
        let a = sub(&mut stack, root);
        let a1 = sub(&mut stack, a);
        let b = sub(&mut stack, root);
        let before = stack.chain(root);
        assert!(!stack.move_above(a1, b));
        assert!(!stack.move_below(b, a1));
        assert!(!stack.move_above(root, a));
        assert!(!stack.move_above(a, a));
        assert_eq!(stack.chain(root), before);
    }

    #[test]
    fn last_release_destroys_once() {
        let mut stack = SurfaceStack::new();
        let first = stack.create(SurfaceRole::Shell);
        let id = first.id();
        let destroyed = Rc::new(Cell::new(0));
        let seen = destroyed.clone();
        stack.observe_destroying(id, move |_| seen.set(seen.get() + 1));

        let second = stack.share(&first);
        let third = stack.share(&second);
        assert_eq!(stack.refcount(id), 3);
        assert!(!stack.release(second));
        assert!(!stack.release(first));
        assert_eq!(destroyed.get(), 0);
        assert!(stack.release(third));
        assert_eq!(destroyed.get(), 1);
        assert!(!stack.is_alive(id));
        assert_eq!(stack.shell_count(), 0);
    }

    #[test]
    fn destroying_parent_orphans_child_blocks() {
        let mut stack = SurfaceStack::new();
        let root = shell(&mut stack);
        let holder = stack.create(SurfaceRole::Sub { parent: root });
        let a = holder.id();
        let a1 = sub(&mut stack, a);
        let a2 = sub(&mut stack, a1);
        let b = sub(&mut stack, root);

        assert!(stack.release(holder));
        assert_eq!(stack.chain(root), vec![root, b]);
        assert_eq!(stack.parent(a1), None);
        assert_eq!(stack.chain(a1), vec![a1, a2]);

        stack.set_parent(a1, b);
        assert_eq!(stack.chain(root), vec![root, b, a1, a2]);
        assert_blocks_contiguous(&stack, root);
    }

    #[test]
    fn shell_chain_order() {
        let mut stack = SurfaceStack::new();
        let a = shell(&mut stack);
        let b = shell(&mut stack);
        let c = shell(&mut stack);
        assert_eq!(stack.shell_surfaces(), vec![c, b, a]);
        assert!(stack.raise_shell(a));
        assert!(!stack.raise_shell(a));
        assert_eq!(stack.shell_surfaces(), vec![a, c, b]);
        stack.force_destroy(c);
        assert_eq!(stack.shell_surfaces(), vec![a, b]);
        assert_eq!(stack.shell_count(), 2);
    }

    #[test]
    fn wire_position_accounts_for_margins() {
        let mut stack = SurfaceStack::new();
        let root = shell(&mut stack);
        let child = sub(&mut stack, root);
        stack.set_margin(root, Insets::new(10.0, 20.0, 10.0, 10.0));
        stack.set_margin(child, Insets::uniform(4.0));
        let wire = stack.set_position(child, Point::new(5.0, 5.0));
        assert_eq!(wire, Point::new(11.0, 21.0));
        assert_eq!(stack.position(child), Point::new(5.0, 5.0));
    }

    #[test]
    fn commit_marks_reach_every_ancestor() {
        let mut stack = SurfaceStack::new();
        let root = shell(&mut stack);
        let a = sub(&mut stack, root);
        let a1 = sub(&mut stack, a);
        let other = shell(&mut stack);

        assert!(!stack.mark_commit(other));
        assert!(stack.mark_commit(a1));
        let pending = stack.drain_commits();
        assert_eq!(pending, vec![a, root]);
        assert!(stack.drain_commits().is_empty());
    }

    #[test]
    fn surfaces_lists_parents_first() {
        let mut stack = SurfaceStack::new();
        let root = shell(&mut stack);
        let a = sub(&mut stack, root);
        let a1 = sub(&mut stack, a);
        let order = stack.surfaces();
        let pos = |s| order.iter().position(|&x| x == s);
        assert!(pos(root) < pos(a));
        assert!(pos(a) < pos(a1));
    }

    #[test]
    #[should_panic(expected = "surface already has a parent")]
    fn reparenting_attached_surface_panics() {
        let mut stack = SurfaceStack::new();
        let root = shell(&mut stack);
        let other = shell(&mut stack);
        let a = sub(&mut stack, root);
        stack.set_parent(a, other);
    }

    #[test]
    #[should_panic(expected = "stale SurfaceId")]
    fn released_surface_is_stale() {
        let mut stack = SurfaceStack::new();
        let holder = stack.create(SurfaceRole::Shell);
        let id = holder.id();
        stack.release(holder);
        let _ = stack.position(id);
    }
}
