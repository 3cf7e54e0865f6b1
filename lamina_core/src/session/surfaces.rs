// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Surface lifecycle, stacking, protocol pass-through and outputs.

use alloc::vec::Vec;

use kurbo::{Insets, Point, Rect, Size};

use super::Session;
use crate::output::OutputId;
use crate::protocol::{BufferId, CanvasId, SurfaceRole};
use crate::surface::{SurfaceHolder, SurfaceId};
use crate::trace::{SurfaceChange, SurfaceEvent};
use crate::view::ViewId;

impl Session {
    /// Creates a surface and its protocol objects. The returned holder is the
    /// first reference.
    pub fn create_surface(&mut self, role: SurfaceRole) -> SurfaceHolder {
        let holder = self.surfaces.create(role);
        self.protocol.create_surface(holder.id(), role);
        self.trace_surface(holder.id(), SurfaceChange::Created);
        holder
    }

    /// Makes another holder for the same surface.
    pub fn share_surface(&mut self, holder: &SurfaceHolder) -> SurfaceHolder {
        self.surfaces.share(holder)
    }

    /// Gives a holder back. Returns `true` if the surface was destroyed.
    ///
    /// On destruction the destroying observers run, the root view is unbound,
    /// pointer and keyboard state on the surface is dropped without callbacks,
    /// direct sub-surfaces become orphans and the protocol objects are
    /// destroyed.
    pub fn release_surface(&mut self, holder: SurfaceHolder) -> bool {
        let id = holder.id();
        let root = self.surfaces.root_view(id);
        if !self.surfaces.release(holder) {
            return false;
        }
        self.forget_surface(id, root);
        true
    }

    /// Applies the releases of holders that were dropped instead of handed
    /// back. Returns the number of surfaces destroyed.
    ///
    /// Runs at the start of every commit phase. Holders dropped by destroying
    /// observers are applied in the same call.
    pub fn release_dropped_surfaces(&mut self) -> u32 {
        let mut destroyed = 0;
        loop {
            let dropped = self.surfaces.take_dropped();
            if dropped.is_empty() {
                return destroyed;
            }
            for id in dropped {
                // Torn down, or already destroyed through another path.
                if !self.surfaces.is_alive(id) {
                    continue;
                }
                let root = self.surfaces.root_view(id);
                if self.surfaces.release_reference(id) {
                    self.forget_surface(id, root);
                    destroyed += 1;
                }
            }
        }
    }

    /// Registers `observer` to run once just before `surface` is destroyed.
    pub fn observe_destroying(
        &mut self,
        surface: SurfaceId,
        observer: impl FnOnce(SurfaceId) + 'static,
    ) {
        self.surfaces.observe_destroying(surface, observer);
    }

    /// Cleans up session state referring to a surface that was just destroyed.
    pub(crate) fn forget_surface(&mut self, id: SurfaceId, root: Option<ViewId>) {
        if let Some(root) = root {
            if self.views.is_alive(root) && self.views.bound_surface(root) == Some(id) {
                self.views.set_bound_surface(root, None);
            }
        }

        for router in self.pointers.iter_mut().flatten() {
            if router.surface == Some(id) {
                router.surface = None;
                router.chain.clear();
            }
        }
        if self.keyboard.surface == Some(id) {
            self.keyboard.surface = None;
        }

        let orphaned: Vec<u32> = self
            .frames
            .iter()
            .filter(|&idx| self.views.surface_of(self.views.id_at(idx)).is_none())
            .collect();
        for idx in orphaned {
            self.frames.remove(idx);
        }

        self.protocol.destroy_surface(id);
        self.trace_surface(id, SurfaceChange::Destroyed);
    }

    // -- Stacking --

    /// Restacks `surface` (with its sub-surfaces) directly above `target`, a
    /// sibling or the parent. Returns `false` for any other target.
    pub fn move_above(&mut self, surface: SurfaceId, target: SurfaceId) -> bool {
        if !self.surfaces.move_above(surface, target) {
            return false;
        }
        self.protocol.place_above(surface, target);
        self.restacked(surface);
        true
    }

    /// Restacks `surface` (with its sub-surfaces) directly below `target`, a
    /// sibling or the parent. Returns `false` for any other target.
    pub fn move_below(&mut self, surface: SurfaceId, target: SurfaceId) -> bool {
        if !self.surfaces.move_below(surface, target) {
            return false;
        }
        self.protocol.place_below(surface, target);
        self.restacked(surface);
        true
    }

    fn restacked(&mut self, surface: SurfaceId) {
        self.trace_surface(surface, SurfaceChange::Restacked);
        self.request_parent_commit(surface);
    }

    /// Raises a shell surface to the top of the window stack.
    pub fn raise_shell(&mut self, surface: SurfaceId) -> bool {
        self.surfaces.raise_shell(surface)
    }

    /// Positions a sub-surface relative to its parent's content origin.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "surface offsets fit comfortably in i32"
    )]
    pub fn set_position(&mut self, surface: SurfaceId, position: Point) {
        let wire = self.surfaces.set_position(surface, position).round();
        self.protocol.set_position(surface, wire.x as i32, wire.y as i32);
        self.request_parent_commit(surface);
    }

    /// Sets the margin around a surface's content. The wire position of the
    /// surface and of its direct sub-surfaces is resent.
    pub fn set_margin(&mut self, surface: SurfaceId, margin: Insets) {
        self.surfaces.set_margin(surface, margin);
        let children: Vec<SurfaceId> = self
            .surfaces
            .surfaces()
            .into_iter()
            .filter(|&s| self.surfaces.parent(s) == Some(surface))
            .collect();
        if self.surfaces.parent(surface).is_some() {
            let position = self.surfaces.position(surface);
            self.set_position(surface, position);
        }
        for child in children {
            let position = self.surfaces.position(child);
            self.set_position(child, position);
        }
    }

    /// Marks the ancestors of `surface` for commit and schedules the commit
    /// task if any was marked.
    pub(crate) fn request_parent_commit(&mut self, surface: SurfaceId) {
        if self.surfaces.mark_commit(surface) {
            self.schedule_commit(self.commit_task);
        }
    }

    /// The commit-phase task: commits every marked surface, children first.
    pub(crate) fn commit_surfaces(&mut self) {
        for surface in self.surfaces.drain_commits() {
            self.protocol.commit(surface);
            self.stats.commits += 1;
            self.trace_surface(surface, SurfaceChange::Committed);
        }
    }

    // -- Protocol pass-through --

    /// Attaches a buffer (or detaches with `None`).
    pub fn attach(&mut self, surface: SurfaceId, buffer: Option<BufferId>, x: i32, y: i32) {
        self.surfaces.validate(surface);
        self.protocol.attach(surface, buffer, x, y);
    }

    /// Sets the input region, or resets it to the whole surface with `None`.
    pub fn set_input_region(&mut self, surface: SurfaceId, region: Option<Rect>) {
        self.surfaces.validate(surface);
        self.protocol.set_input_region(surface, region);
    }

    /// Sets the title of a shell surface.
    pub fn set_title(&mut self, surface: SurfaceId, title: &str) {
        self.surfaces.validate(surface);
        self.protocol.set_title(surface, title);
    }

    /// Sets the canvas handed to views drawing into `surface`.
    pub fn set_canvas(&mut self, surface: SurfaceId, canvas: Option<CanvasId>) {
        self.surfaces.set_canvas(surface, canvas);
    }

    // -- Shell events --

    /// Applies a shell configure: a non-zero size resizes the root view.
    pub fn configure_shell(&mut self, surface: SurfaceId, size: Size) {
        if !self.surfaces.is_alive(surface) || size.width <= 0.0 || size.height <= 0.0 {
            return;
        }
        if let Some(root) = self.surfaces.root_view(surface) {
            self.resize(root, size);
        }
    }

    /// Forwards a close request to the root widget; without a root view the
    /// session exits.
    pub fn request_close(&mut self, surface: SurfaceId) {
        let root = if self.surfaces.is_alive(surface) {
            self.surfaces.root_view(surface)
        } else {
            None
        };
        let handled =
            root.and_then(|view| self.with_widget(view, |w, cx| w.on_close_request(cx)));
        if handled.is_none() {
            self.exit();
        }
    }

    // -- Outputs --

    /// Registers a new output.
    pub fn add_output(&mut self) -> OutputId {
        self.allocate_output()
    }

    /// Removes an output from the session and from every surface.
    pub fn remove_output(&mut self, output: OutputId) {
        self.outputs.retain(|&o| o != output);
        self.surfaces.forget_output(output);
    }

    /// Returns the registered outputs.
    #[must_use]
    pub fn outputs(&self) -> &[OutputId] {
        &self.outputs
    }

    /// Records that `surface` is now shown on `output`.
    pub fn surface_enter_output(&mut self, surface: SurfaceId, output: OutputId) {
        if self.surfaces.is_alive(surface) && self.outputs.contains(&output) {
            self.surfaces.enter_output(surface, output);
        }
    }

    /// Records that `surface` is no longer shown on `output`.
    pub fn surface_leave_output(&mut self, surface: SurfaceId, output: OutputId) {
        if self.surfaces.is_alive(surface) {
            self.surfaces.leave_output(surface, output);
        }
    }

    /// Returns the outputs `surface` is shown on.
    #[must_use]
    pub fn surface_outputs(&self, surface: SurfaceId) -> &[OutputId] {
        self.surfaces.outputs(surface)
    }

    pub(crate) fn trace_surface(&mut self, surface: SurfaceId, change: SurfaceChange) {
        self.tracer.surface_change(&SurfaceEvent {
            iteration: self.iteration,
            surface_index: surface.idx,
            change,
        });
    }
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;
    use alloc::vec;
    use core::cell::Cell;

    use kurbo::{Insets, Point, Size};

    use crate::protocol::SurfaceRole;
    use crate::testing::{Call, Plain, count, recording_session};

    #[test]
    fn restack_requests_parent_commit() {
        let (mut session, log) = recording_session();
        let root = session.create_surface(SurfaceRole::Shell);
        let a = session.create_surface(SurfaceRole::Sub { parent: root.id() });
        let b = session.create_surface(SurfaceRole::Sub { parent: root.id() });

        assert!(session.move_below(b.id(), a.id()));
        assert!(!session.move_above(root.id(), a.id()));
        assert_eq!(session.run_commit_tasks(), 1);
        assert_eq!(
            log.borrow()
                .iter()
                .filter(|c| matches!(c, Call::PlaceBelow(..) | Call::Commit(_)))
                .cloned()
                .collect::<alloc::vec::Vec<_>>(),
            vec![Call::PlaceBelow(b.id(), a.id()), Call::Commit(root.id())]
        );
        for holder in [b, a, root] {
            session.release_surface(holder);
        }
    }

    #[test]
    fn set_position_sends_margin_adjusted_offset() {
        let (mut session, log) = recording_session();
        let root = session.create_surface(SurfaceRole::Shell);
        let child = session.create_surface(SurfaceRole::Sub { parent: root.id() });
        session.set_margin(root.id(), Insets::new(8.0, 8.0, 8.0, 8.0));
        session.set_position(child.id(), Point::new(10.0, 4.0));
        assert!(log.borrow().contains(&Call::Position(child.id(), 18, 12)));
        session.release_surface(child);
        session.release_surface(root);
    }

    #[test]
    fn release_runs_observers_and_destroys_once() {
        let (mut session, log) = recording_session();
        let first = session.create_surface(SurfaceRole::Shell);
        let id = first.id();
        let fired = Rc::new(Cell::new(0));
        let seen = fired.clone();
        session.observe_destroying(id, move |_| seen.set(seen.get() + 1));
        let second = session.share_surface(&first);

        assert!(!session.release_surface(first));
        assert_eq!(count(&log, |c| matches!(c, Call::Destroy(_))), 0);
        assert!(session.release_surface(second));
        assert_eq!(fired.get(), 1);
        assert_eq!(count(&log, |c| matches!(c, Call::Destroy(_))), 1);
    }

    #[test]
    fn configure_resizes_root_and_close_exits() {
        let (mut session, _log) = recording_session();
        let holder = session.create_surface(SurfaceRole::Shell);
        let root = session.create_view(Plain);
        session.bind_surface(holder.id(), root);
        session.configure_shell(holder.id(), Size::new(0.0, 0.0));
        session.configure_shell(holder.id(), Size::new(640.0, 480.0));
        session.run_idle_tasks();
        assert_eq!(session.views().geometry(root).size(), Size::new(640.0, 480.0));

        assert!(session.is_running());
        session.request_close(holder.id());
        assert!(!session.is_running());
        session.release_surface(holder);
    }

    #[test]
    fn outputs_follow_surfaces() {
        let (mut session, _log) = recording_session();
        let holder = session.create_surface(SurfaceRole::Shell);
        let left = session.add_output();
        let right = session.add_output();
        session.surface_enter_output(holder.id(), left);
        session.surface_enter_output(holder.id(), right);
        session.surface_enter_output(holder.id(), left);
        assert_eq!(session.surface_outputs(holder.id()), &[left, right]);
        session.surface_leave_output(holder.id(), left);
        session.remove_output(right);
        assert!(session.surface_outputs(holder.id()).is_empty());
        assert_eq!(session.outputs(), &[left]);
        session.release_surface(holder);
    }

    #[test]
    fn teardown_destroys_children_first() {
        let (mut session, log) = recording_session();
        let root = session.create_surface(SurfaceRole::Shell);
        let child = session.create_surface(SurfaceRole::Sub { parent: root.id() });
        let (root_id, child_id) = (root.id(), child.id());
        session.teardown();
        drop((root, child));
        assert_eq!(session.release_dropped_surfaces(), 0);
        let destroyed: alloc::vec::Vec<_> = log
            .borrow()
            .iter()
            .filter_map(|c| match c {
                Call::Destroy(id) => Some(*id),
                _ => None,
            })
            .collect();
        assert_eq!(destroyed, vec![child_id, root_id]);
        assert_eq!(session.surfaces().shell_count(), 0);
        assert!(!session.is_running());
    }
}
