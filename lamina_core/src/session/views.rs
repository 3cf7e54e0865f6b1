// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! View lifecycle, geometry and surface binding.

use alloc::boxed::Box;
use alloc::vec::Vec;

use kurbo::{Point, Rect, Size};

use super::Session;
use crate::surface::SurfaceId;
use crate::input::PointerId;
use crate::trace::{ChainChange, SurfaceChange};
use crate::view::{ViewId, Widget};

impl Session {
    /// Creates a detached view owning `widget`.
    pub fn create_view(&mut self, widget: impl Widget) -> ViewId {
        self.views.create_view(Box::new(widget))
    }

    /// Destroys a view.
    ///
    /// The view is unlinked from the redraw queue, the motion set, the frame
    /// waiters and every pointer's entered chain before its slot is freed. Its
    /// direct children are detached, not destroyed.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn destroy_view(&mut self, view: ViewId) {
        self.views.validate(view);
        let idx = view.idx;
        self.redraw.forget(idx);
        self.motion.remove(idx);
        self.frames.remove(idx);

        let mut left = Vec::new();
        for (router, pointer) in self.pointers.iter_mut().zip(0_u32..) {
            if let Some(router) = router {
                if router.chain.remove(idx) {
                    left.push(PointerId(pointer));
                }
            }
        }
        for pointer in left {
            self.trace_chain(pointer, idx, ChainChange::Left);
        }
        if self.keyboard.focus == Some(view) {
            self.keyboard.focus = None;
        }
        if let Some(surface) = self.views.bound_surface(view) {
            if self.surfaces.is_alive(surface) {
                self.surfaces.root_view[surface.idx as usize] = None;
            }
        }

        let widget = self.views.destroy_view(view);
        drop(widget);
    }

    /// Destroys a view and all of its descendants, deepest first.
    pub fn destroy_subtree(&mut self, view: ViewId) {
        self.views.validate(view);
        let mut order = Vec::new();
        let mut stack = alloc::vec![view];
        while let Some(next) = stack.pop() {
            order.push(next);
            stack.extend(self.views.children(next));
        }
        for id in order.into_iter().rev() {
            self.destroy_view(id);
        }
    }

    /// Makes `view` the root view of `surface` and schedules its redraw.
    ///
    /// A previous root of the surface is unbound, as is a previous binding of
    /// the view.
    pub fn bind_surface(&mut self, surface: SurfaceId, view: ViewId) {
        self.surfaces.validate(surface);
        self.views.validate(view);
        if let Some(old) = self.surfaces.root_view(surface) {
            if self.views.is_alive(old) {
                self.views.set_bound_surface(old, None);
            }
        }
        if let Some(previous) = self.views.bound_surface(view) {
            if self.surfaces.is_alive(previous) {
                self.surfaces.root_view[previous.idx as usize] = None;
            }
        }
        self.surfaces.root_view[surface.idx as usize] = Some(view);
        self.views.set_bound_surface(view, Some(surface));
        self.update(view);
    }

    /// Removes the root view binding of `surface`.
    pub fn unbind_surface(&mut self, surface: SurfaceId) {
        self.surfaces.validate(surface);
        if let Some(view) = self.surfaces.root_view[surface.idx as usize].take() {
            if self.views.is_alive(view) {
                self.views.set_bound_surface(view, None);
            }
        }
    }

    /// Returns the surface `view` draws into.
    #[must_use]
    pub fn surface_of(&self, view: ViewId) -> Option<SurfaceId> {
        self.views.surface_of(view)
    }

    // -- Geometry --

    /// Moves the view's pending origin and schedules a redraw.
    pub fn move_to(&mut self, view: ViewId, origin: Point) {
        self.views.move_to(view, origin);
        self.update(view);
    }

    /// Resizes the view's pending geometry and schedules a redraw.
    pub fn resize(&mut self, view: ViewId, size: Size) {
        self.views.resize(view, size);
        self.update(view);
    }

    /// Replaces the view's pending geometry and schedules a redraw.
    pub fn set_geometry(&mut self, view: ViewId, rect: Rect) {
        self.views.set_geometry(view, rect);
        self.update(view);
    }

    /// Shows or hides a view, scheduling a redraw when the flag changes.
    pub fn set_visible(&mut self, view: ViewId, visible: bool) {
        if self.views.set_visible(view, visible) {
            self.update(view);
        }
    }

    /// Returns whether the view is visible.
    #[must_use]
    pub fn is_visible(&self, view: ViewId) -> bool {
        self.views.is_visible(view)
    }

    // -- Frame pacing --

    /// Parks `view` until the next frame callback of its surface, requesting
    /// one if none is outstanding. The request takes effect with the surface's
    /// next commit. Returns `false` if the view draws into no surface.
    pub fn request_frame(&mut self, view: ViewId) -> bool {
        let Some(surface) = self.views.surface_of(view) else {
            return false;
        };
        if !self.frames.is_linked(view.idx) {
            self.frames.push_back(view.idx);
        }
        let pending = &mut self.surfaces.frame_pending[surface.idx as usize];
        if !*pending {
            *pending = true;
            self.protocol.request_frame(surface);
        }
        true
    }

    /// Delivers a frame callback: every view parked on `surface` is unparked
    /// and scheduled for redraw.
    pub fn frame_done(&mut self, surface: SurfaceId, serial: u32) {
        if !self.surfaces.is_alive(surface) {
            return;
        }
        self.surfaces.frame_pending[surface.idx as usize] = false;
        self.trace_surface(surface, SurfaceChange::FrameDone { serial });

        let parked: Vec<u32> = self
            .frames
            .iter()
            .filter(|&idx| self.views.surface_of(self.views.id_at(idx)) == Some(surface))
            .collect();
        for idx in parked {
            self.frames.remove(idx);
            let view = self.views.id_at(idx);
            self.update(view);
        }
    }

    /// Turns move events on or off for `view` while it is a non-root member of
    /// an entered chain.
    pub fn track_motion(&mut self, view: ViewId, enabled: bool) {
        self.views.validate(view);
        if enabled {
            if !self.motion.is_linked(view.idx) {
                self.motion.push_back(view.idx);
            }
        } else {
            self.motion.remove(view.idx);
        }
    }
}

#[cfg(test)]
mod tests {
    use kurbo::{Rect, Size};

    use crate::protocol::{NullProtocol, SurfaceRole};
    use crate::session::Session;
    use crate::testing::{Call, Plain, count, recording_session};

    #[test]
    fn destroy_view_clears_bindings() {
        let mut session = Session::new(NullProtocol);
        let holder = session.create_surface(SurfaceRole::Shell);
        let root = session.create_view(Plain);
        let child = session.create_view(Plain);
        session.views_mut().push_back_child(root, child);
        session.bind_surface(holder.id(), root);
        assert_eq!(session.surface_of(child), Some(holder.id()));

        session.destroy_view(root);
        assert_eq!(session.surfaces().root_view(holder.id()), None);
        assert_eq!(session.surface_of(child), None);
        assert!(session.views().is_alive(child));
        assert!(session.release_surface(holder));
    }

    #[test]
    fn destroy_subtree_removes_descendants() {
        let mut session = Session::new(NullProtocol);
        let a = session.create_view(Plain);
        let b = session.create_view(Plain);
        let c = session.create_view(Plain);
        session.views_mut().push_back_child(a, b);
        session.views_mut().push_back_child(b, c);
        session.destroy_subtree(a);
        assert_eq!(session.views().view_count(), 0);
    }

    #[test]
    fn rebinding_moves_root() {
        let mut session = Session::new(NullProtocol);
        let s1 = session.create_surface(SurfaceRole::Shell);
        let s2 = session.create_surface(SurfaceRole::Shell);
        let view = session.create_view(Plain);
        session.bind_surface(s1.id(), view);
        session.bind_surface(s2.id(), view);
        assert_eq!(session.surfaces().root_view(s1.id()), None);
        assert_eq!(session.surfaces().root_view(s2.id()), Some(view));
        session.unbind_surface(s2.id());
        assert_eq!(session.surface_of(view), None);
        session.release_surface(s1);
        session.release_surface(s2);
    }

    #[test]
    fn frame_done_unparks_views_of_that_surface() {
        let (mut session, log) = recording_session();
        let holder = session.create_surface(SurfaceRole::Shell);
        let surface = holder.id();
        let root = session.create_view(Plain);
        session.bind_surface(surface, root);
        session.run_idle_tasks();

        assert!(session.request_frame(root));
        assert!(session.request_frame(root));
        assert_eq!(count(&log, |c| matches!(c, Call::RequestFrame(_))), 1);
        assert!(!session.is_redraw_queued(root));

        session.frame_done(surface, 16);
        assert!(session.is_redraw_queued(root));
        assert!(session.request_frame(root));
        assert_eq!(count(&log, |c| matches!(c, Call::RequestFrame(_))), 2);

        let detached = session.create_view(Plain);
        assert!(!session.request_frame(detached));
        session.release_surface(holder);
    }

    #[test]
    fn geometry_mutations_schedule_one_redraw() {
        let mut session = Session::new(NullProtocol);
        let view = session.create_view(Plain);
        session.run_idle_tasks();
        session.set_geometry(view, Rect::new(0.0, 0.0, 5.0, 5.0));
        session.resize(view, Size::new(9.0, 9.0));
        assert!(session.is_redraw_queued(view));
        assert_eq!(session.pending_redraws(), 1);
        session.run_idle_tasks();
        assert_eq!(session.views().geometry(view), Rect::new(0.0, 0.0, 9.0, 9.0));
    }
}
