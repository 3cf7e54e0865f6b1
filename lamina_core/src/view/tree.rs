// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays view storage with allocation, topology and geometry.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use kurbo::{Point, Rect, Size};

use super::id::ViewId;
use super::traverse::Children;
use super::widget::Widget;
use crate::surface::SurfaceId;
use crate::task::INVALID;

/// Struct-of-arrays storage for all views of a session.
///
/// Views are addressed by [`ViewId`] handles. Destroyed views are recycled via
/// a free list, and generation counters prevent stale handle access.
pub struct ViewTree {
    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) first_child: Vec<u32>,
    pub(crate) last_child: Vec<u32>,
    pub(crate) prev_sibling: Vec<u32>,
    pub(crate) next_sibling: Vec<u32>,
    pub(crate) children_count: Vec<u32>,

    // -- Geometry --
    pub(crate) geometry: Vec<Rect>,
    pub(crate) pending_geometry: Vec<Rect>,
    pub(crate) geometry_dirty: Vec<bool>,

    // -- State --
    pub(crate) visible: Vec<bool>,
    pub(crate) surface: Vec<Option<SurfaceId>>,
    pub(crate) widget: Vec<Option<Box<dyn Widget>>>,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) alive: Vec<bool>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,
}

impl fmt::Debug for ViewTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewTree")
            .field("len", &self.len)
            .field("live", &self.view_count())
            .field("parent", &self.parent)
            .field("geometry", &self.geometry)
            .finish_non_exhaustive()
    }
}

impl Default for ViewTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewTree {
    /// Creates an empty tree.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            parent: Vec::new(),
            first_child: Vec::new(),
            last_child: Vec::new(),
            prev_sibling: Vec::new(),
            next_sibling: Vec::new(),
            children_count: Vec::new(),
            geometry: Vec::new(),
            pending_geometry: Vec::new(),
            geometry_dirty: Vec::new(),
            visible: Vec::new(),
            surface: Vec::new(),
            widget: Vec::new(),
            generation: Vec::new(),
            alive: Vec::new(),
            free_list: Vec::new(),
            len: 0,
        }
    }

    // -- Allocation API --

    /// Creates a detached, visible view with zero geometry.
    pub fn create_view(&mut self, widget: Box<dyn Widget>) -> ViewId {
        let idx = if let Some(idx) = self.free_list.pop() {
            let i = idx as usize;
            self.parent[i] = INVALID;
            self.first_child[i] = INVALID;
            self.last_child[i] = INVALID;
            self.prev_sibling[i] = INVALID;
            self.next_sibling[i] = INVALID;
            self.children_count[i] = 0;
            self.geometry[i] = Rect::ZERO;
            self.pending_geometry[i] = Rect::ZERO;
            self.geometry_dirty[i] = false;
            self.visible[i] = true;
            self.surface[i] = None;
            self.widget[i] = Some(widget);
            self.alive[i] = true;
            idx
        } else {
            let idx = self.len;
            self.len += 1;
            self.parent.push(INVALID);
            self.first_child.push(INVALID);
            self.last_child.push(INVALID);
            self.prev_sibling.push(INVALID);
            self.next_sibling.push(INVALID);
            self.children_count.push(0);
            self.geometry.push(Rect::ZERO);
            self.pending_geometry.push(Rect::ZERO);
            self.geometry_dirty.push(false);
            self.visible.push(true);
            self.surface.push(None);
            self.widget.push(Some(widget));
            self.generation.push(0);
            self.alive.push(true);
            idx
        };

        ViewId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Destroys a view, freeing its slot for reuse.
    ///
    /// The view is unlinked from its parent and its direct children become
    /// detached roots. Returns the widget unless it is currently running a
    /// callback.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn destroy_view(&mut self, id: ViewId) -> Option<Box<dyn Widget>> {
        self.validate(id);
        let idx = id.idx;
        if self.parent[idx as usize] != INVALID {
            self.unlink_from_parent(idx);
        }
        self.detach_children(idx);

        let i = idx as usize;
        self.surface[i] = None;
        self.alive[i] = false;
        // Bump generation so old handles immediately fail validation.
        self.generation[i] = self.generation[i].wrapping_add(1);
        self.free_list.push(idx);
        self.widget[i].take()
    }

    /// Returns whether the given handle refers to a live view.
    #[must_use]
    pub fn is_alive(&self, id: ViewId) -> bool {
        id.idx < self.len
            && self.generation[id.idx as usize] == id.generation
            && self.alive[id.idx as usize]
    }

    /// Returns the number of live views.
    #[must_use]
    pub fn view_count(&self) -> usize {
        self.len as usize - self.free_list.len()
    }

    // -- Topology API --

    /// Adds `child` as the frontmost child of `parent`.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale, if `child` already has a parent, or
    /// if `child` is `parent` or one of its ancestors.
    pub fn push_back_child(&mut self, parent: ViewId, child: ViewId) {
        self.check_attach(parent, child);
        let last = self.last_child[parent.idx as usize];
        self.link(parent.idx, child.idx, last, INVALID);
    }

    /// Adds `child` as the backmost child of `parent`.
    ///
    /// # Panics
    ///
    /// Same conditions as [`push_back_child`](Self::push_back_child).
    pub fn push_front_child(&mut self, parent: ViewId, child: ViewId) {
        self.check_attach(parent, child);
        let first = self.first_child[parent.idx as usize];
        self.link(parent.idx, child.idx, INVALID, first);
    }

    /// Inserts `child` so that it ends up at position `index` among the
    /// children of `parent`. An `index` past the end appends.
    ///
    /// # Panics
    ///
    /// Same conditions as [`push_back_child`](Self::push_back_child).
    pub fn insert_child(&mut self, parent: ViewId, child: ViewId, index: usize) {
        self.check_attach(parent, child);
        let p = parent.idx;
        if index >= self.children_count[p as usize] as usize {
            let last = self.last_child[p as usize];
            self.link(p, child.idx, last, INVALID);
        } else {
            let anchor = self.child_slot_at(p, index);
            let prev = self.prev_sibling[anchor as usize];
            self.link(p, child.idx, prev, anchor);
        }
    }

    /// Removes `child` from `parent`, leaving it a detached root.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale or `child` is not a child of `parent`.
    pub fn remove_child(&mut self, parent: ViewId, child: ViewId) {
        self.validate(parent);
        self.validate(child);
        assert!(
            self.parent[child.idx as usize] == parent.idx,
            "view is not a child of this parent"
        );
        self.unlink_from_parent(child.idx);
    }

    /// Detaches every child of `parent`.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn clear_children(&mut self, parent: ViewId) {
        self.validate(parent);
        self.detach_children(parent.idx);
    }

    /// Returns the parent of a view, if any.
    #[must_use]
    pub fn parent(&self, id: ViewId) -> Option<ViewId> {
        self.validate(id);
        self.handle(self.parent[id.idx as usize])
    }

    /// Returns the topmost ancestor of `id` (itself when detached).
    #[must_use]
    pub fn root(&self, id: ViewId) -> ViewId {
        self.validate(id);
        let mut idx = id.idx;
        while self.parent[idx as usize] != INVALID {
            idx = self.parent[idx as usize];
        }
        self.id_at(idx)
    }

    /// Returns whether `ancestor` is `id` or one of its ancestors.
    #[must_use]
    pub fn is_ancestor(&self, ancestor: ViewId, id: ViewId) -> bool {
        self.validate(ancestor);
        self.validate(id);
        let mut idx = id.idx;
        while idx != INVALID {
            if idx == ancestor.idx {
                return true;
            }
            idx = self.parent[idx as usize];
        }
        false
    }

    /// Returns an iterator over the direct children of a view in paint order.
    #[must_use]
    pub fn children(&self, id: ViewId) -> Children<'_> {
        self.validate(id);
        let i = id.idx as usize;
        Children::new(self, self.first_child[i], self.last_child[i])
    }

    /// Returns the number of direct children.
    #[must_use]
    pub fn children_count(&self, id: ViewId) -> usize {
        self.validate(id);
        self.children_count[id.idx as usize] as usize
    }

    /// Returns the child at position `index`, probing from the closer end.
    #[must_use]
    pub fn child_at(&self, id: ViewId, index: usize) -> Option<ViewId> {
        self.validate(id);
        if index >= self.children_count[id.idx as usize] as usize {
            return None;
        }
        Some(self.id_at(self.child_slot_at(id.idx, index)))
    }

    // -- Geometry API --

    /// Returns the committed geometry.
    #[must_use]
    pub fn geometry(&self, id: ViewId) -> Rect {
        self.validate(id);
        self.geometry[id.idx as usize]
    }

    /// Returns the geometry that the next redraw flush will commit.
    #[must_use]
    pub fn pending_geometry(&self, id: ViewId) -> Rect {
        self.validate(id);
        self.pending_geometry[id.idx as usize]
    }

    /// Returns whether a geometry mutation awaits the next flush.
    #[must_use]
    pub fn has_pending_geometry(&self, id: ViewId) -> bool {
        self.validate(id);
        self.geometry_dirty[id.idx as usize]
    }

    /// Replaces the pending geometry.
    pub fn set_geometry(&mut self, id: ViewId, rect: Rect) {
        self.validate(id);
        self.pending_geometry[id.idx as usize] = rect;
        self.geometry_dirty[id.idx as usize] = true;
    }

    /// Moves the pending geometry's origin, keeping its size.
    pub fn move_to(&mut self, id: ViewId, origin: Point) {
        let rect = self.pending_geometry(id).with_origin(origin);
        self.set_geometry(id, rect);
    }

    /// Resizes the pending geometry, keeping its origin.
    pub fn resize(&mut self, id: ViewId, size: Size) {
        let rect = self.pending_geometry(id).with_size(size);
        self.set_geometry(id, rect);
    }

    /// Commits pending geometry. Returns `(old, new)` if it differed from the
    /// committed value.
    pub(crate) fn commit_geometry(&mut self, id: ViewId) -> Option<(Rect, Rect)> {
        self.validate(id);
        let i = id.idx as usize;
        if !core::mem::take(&mut self.geometry_dirty[i]) {
            return None;
        }
        let new = self.pending_geometry[i];
        let old = core::mem::replace(&mut self.geometry[i], new);
        (old != new).then_some((old, new))
    }

    // -- Visibility --

    /// Returns whether the view is drawn and hit-tested.
    #[must_use]
    pub fn is_visible(&self, id: ViewId) -> bool {
        self.validate(id);
        self.visible[id.idx as usize]
    }

    /// Shows or hides a view. Returns `true` if the flag changed.
    pub fn set_visible(&mut self, id: ViewId, visible: bool) -> bool {
        self.validate(id);
        let slot = &mut self.visible[id.idx as usize];
        let changed = *slot != visible;
        *slot = visible;
        changed
    }

    // -- Surface binding --

    /// Returns the surface this view is the root of, if any.
    #[must_use]
    pub fn bound_surface(&self, id: ViewId) -> Option<SurfaceId> {
        self.validate(id);
        self.surface[id.idx as usize]
    }

    pub(crate) fn set_bound_surface(&mut self, id: ViewId, surface: Option<SurfaceId>) {
        self.validate(id);
        self.surface[id.idx as usize] = surface;
    }

    /// Returns the surface of the nearest bound ancestor-or-self.
    #[must_use]
    pub fn surface_of(&self, id: ViewId) -> Option<SurfaceId> {
        self.validate(id);
        let mut idx = id.idx;
        while idx != INVALID {
            if let Some(surface) = self.surface[idx as usize] {
                return Some(surface);
            }
            idx = self.parent[idx as usize];
        }
        None
    }

    // -- Widgets and hit-testing --

    /// Returns the view's widget, unless it is running a callback.
    #[must_use]
    pub fn widget(&self, id: ViewId) -> Option<&dyn Widget> {
        self.validate(id);
        self.widget[id.idx as usize].as_deref()
    }

    pub(crate) fn take_widget(&mut self, id: ViewId) -> Option<Box<dyn Widget>> {
        if !self.is_alive(id) {
            return None;
        }
        self.widget[id.idx as usize].take()
    }

    /// Puts a widget back after a callback. Dropped if the view died meanwhile.
    pub(crate) fn restore_widget(&mut self, id: ViewId, widget: Box<dyn Widget>) {
        if self.is_alive(id) && self.widget[id.idx as usize].is_none() {
            self.widget[id.idx as usize] = Some(widget);
        }
    }

    /// Returns whether `point` hits the view: it must be visible and its widget
    /// must accept the point within the committed geometry.
    ///
    /// While the view's own widget is out of its slot for a callback, its
    /// [`Widget::contains`] cannot be asked and the plain geometry test is
    /// used instead.
    #[must_use]
    pub fn hit(&self, id: ViewId, point: Point) -> bool {
        self.validate(id);
        let i = id.idx as usize;
        if !self.visible[i] {
            return false;
        }
        let geometry = self.geometry[i];
        match &self.widget[i] {
            Some(widget) => widget.contains(geometry, point),
            None => geometry.contains(point),
        }
    }

    /// Tests the children of `id` front to back and returns the first hit.
    #[must_use]
    pub fn hit_child(&self, id: ViewId, point: Point) -> Option<ViewId> {
        self.children(id).rev().find(|&child| self.hit(child, point))
    }

    // -- Internal helpers --

    /// Returns the live handle for a slot index.
    pub(crate) fn id_at(&self, idx: u32) -> ViewId {
        debug_assert!(self.alive[idx as usize], "slot {idx} is not live");
        ViewId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    fn handle(&self, idx: u32) -> Option<ViewId> {
        (idx != INVALID).then(|| self.id_at(idx))
    }

    /// Panics if the handle is stale.
    pub(crate) fn validate(&self, id: ViewId) {
        assert!(
            self.is_alive(id),
            "stale ViewId: {id:?} (current gen: {})",
            if id.idx < self.len {
                self.generation[id.idx as usize]
            } else {
                u32::MAX
            }
        );
    }

    fn check_attach(&self, parent: ViewId, child: ViewId) {
        self.validate(parent);
        self.validate(child);
        assert!(
            self.parent[child.idx as usize] == INVALID,
            "child already has a parent"
        );
        assert!(
            !self.is_ancestor(child, parent),
            "cannot attach a view beneath itself"
        );
    }

    fn child_slot_at(&self, parent: u32, index: usize) -> u32 {
        let count = self.children_count[parent as usize] as usize;
        if index <= count / 2 {
            let mut idx = self.first_child[parent as usize];
            for _ in 0..index {
                idx = self.next_sibling[idx as usize];
            }
            idx
        } else {
            let mut idx = self.last_child[parent as usize];
            for _ in index + 1..count {
                idx = self.prev_sibling[idx as usize];
            }
            idx
        }
    }

    fn link(&mut self, parent: u32, child: u32, prev: u32, next: u32) {
        let c = child as usize;
        self.parent[c] = parent;
        self.prev_sibling[c] = prev;
        self.next_sibling[c] = next;
        if prev == INVALID {
            self.first_child[parent as usize] = child;
        } else {
            self.next_sibling[prev as usize] = child;
        }
        if next == INVALID {
            self.last_child[parent as usize] = child;
        } else {
            self.prev_sibling[next as usize] = child;
        }
        self.children_count[parent as usize] += 1;
    }

    fn unlink_from_parent(&mut self, idx: u32) {
        let i = idx as usize;
        let p = self.parent[i] as usize;
        let prev = self.prev_sibling[i];
        let next = self.next_sibling[i];

        if prev == INVALID {
            self.first_child[p] = next;
        } else {
            self.next_sibling[prev as usize] = next;
        }
        if next == INVALID {
            self.last_child[p] = prev;
        } else {
            self.prev_sibling[next as usize] = prev;
        }
        self.children_count[p] -= 1;

        self.parent[i] = INVALID;
        self.prev_sibling[i] = INVALID;
        self.next_sibling[i] = INVALID;
    }

    fn detach_children(&mut self, idx: u32) {
        let i = idx as usize;
        let mut child = self.first_child[i];
        while child != INVALID {
            let c = child as usize;
            let next = self.next_sibling[c];
            self.parent[c] = INVALID;
            self.prev_sibling[c] = INVALID;
            self.next_sibling[c] = INVALID;
            child = next;
        }
        self.first_child[i] = INVALID;
        self.last_child[i] = INVALID;
        self.children_count[i] = 0;
    }
}
