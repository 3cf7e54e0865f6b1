// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pointer routing: entered chains, motion sweeps and button propagation.

use alloc::vec::Vec;

use kurbo::Point;

use super::event::{Axis, AxisEvent, ButtonState, MouseEvent, PointerId};
use crate::session::Session;
use crate::surface::SurfaceId;
use crate::task::TaskList;
use crate::trace::{ChainChange, ChainEvent};
use crate::view::ViewId;

/// Per-device routing state.
#[derive(Debug, Default)]
pub(crate) struct PointerRouter {
    pub(crate) surface: Option<SurfaceId>,
    pub(crate) position: Point,
    pub(crate) serial: u32,
    pub(crate) time: u32,
    pub(crate) chain: TaskList,
}

#[derive(Clone, Copy, Debug)]
enum MouseKind {
    Enter,
    Leave,
    Move,
    Button,
}

impl Session {
    /// Registers a pointer device.
    pub fn add_pointer(&mut self) -> PointerId {
        let router = PointerRouter::default();
        if let Some(slot) = self.pointers.iter().position(Option::is_none) {
            self.pointers[slot] = Some(router);
            return PointerId(u32::try_from(slot).unwrap_or(u32::MAX));
        }
        self.pointers.push(Some(router));
        PointerId(u32::try_from(self.pointers.len() - 1).unwrap_or(u32::MAX))
    }

    /// Removes a pointer device, leaving its surface first.
    ///
    /// # Panics
    ///
    /// Panics if the pointer is unknown.
    pub fn remove_pointer(&mut self, pointer: PointerId) {
        let serial = self.router(pointer).serial;
        self.pointer_leave(pointer, serial);
        self.pointers[pointer.0 as usize] = None;
    }

    /// Returns the surface the pointer is on.
    #[must_use]
    pub fn pointer_surface(&self, pointer: PointerId) -> Option<SurfaceId> {
        self.router(pointer).surface
    }

    /// Returns the last surface-local pointer position.
    #[must_use]
    pub fn pointer_position(&self, pointer: PointerId) -> Point {
        self.router(pointer).position
    }

    /// Returns the entered chain, root first.
    #[must_use]
    pub fn entered_chain(&self, pointer: PointerId) -> Vec<ViewId> {
        self.router(pointer)
            .chain
            .iter()
            .map(|idx| self.views.id_at(idx))
            .collect()
    }

    /// The pointer crossed into `surface` at `position`.
    ///
    /// The surface's root view receives enter; if it accepts, the pointer
    /// descends into the frontmost hit child, linking every view that accepts
    /// enter onto the chain, until a view declines or no child is hit.
    ///
    /// # Panics
    ///
    /// Panics if the pointer is unknown or the surface handle is stale.
    pub fn pointer_enter(
        &mut self,
        pointer: PointerId,
        surface: SurfaceId,
        position: Point,
        serial: u32,
    ) {
        self.surfaces.validate(surface);
        if self.router(pointer).surface.is_some() {
            self.pointer_leave(pointer, serial);
        }
        let router = self.router_mut(pointer);
        router.surface = Some(surface);
        router.position = position;
        router.serial = serial;

        let Some(root) = self.surfaces.root_view(surface) else {
            return;
        };
        if !self.deliver(root, pointer, MouseKind::Enter, None) {
            return;
        }
        if !self.still_on(pointer, surface) || !self.views.is_alive(root) {
            return;
        }
        if !self.router(pointer).chain.is_empty() {
            return;
        }
        self.router_mut(pointer).chain.push_back(root.idx);
        self.trace_chain(pointer, root.idx, ChainChange::Entered);
        self.descend(pointer, surface, root);
    }

    /// The pointer moved within its surface.
    ///
    /// The root view receives a move event. Then the chain is swept from the
    /// tail: views no longer containing the pointer are unlinked and receive
    /// leave, stopping at the first view that still contains it (the root is
    /// never swept). Descent then resumes from the retained tail. Finally, every
    /// other chain member tracking motion receives a move event.
    ///
    /// Motion never starts a chain. If the chain is empty because no root view
    /// was bound at enter time, or because the root declined enter, nothing is
    /// delivered until the next [`pointer_enter`](Self::pointer_enter). Since
    /// the root is never swept, it stays entered while the pointer is outside
    /// its geometry, for example over a surface margin.
    ///
    /// # Panics
    ///
    /// Panics if the pointer is unknown.
    pub fn pointer_motion(&mut self, pointer: PointerId, time: u32, position: Point) {
        let router = self.router_mut(pointer);
        router.position = position;
        router.time = time;
        let Some(surface) = router.surface else {
            return;
        };
        let Some(head) = router.chain.front() else {
            return;
        };

        let root = self.views.id_at(head);
        self.deliver(root, pointer, MouseKind::Move, None);

        loop {
            let Some(router) = self.router_on(pointer, surface) else {
                return;
            };
            let (Some(head), Some(tail)) = (router.chain.front(), router.chain.back()) else {
                return;
            };
            if head == tail {
                break;
            }
            let view = self.views.id_at(tail);
            if self.views.hit(view, position) {
                break;
            }
            self.router_mut(pointer).chain.remove(tail);
            self.trace_chain(pointer, tail, ChainChange::Left);
            self.deliver(view, pointer, MouseKind::Leave, None);
        }

        let Some(tail) = self.router_on(pointer, surface).and_then(|r| r.chain.back()) else {
            return;
        };
        self.descend(pointer, surface, self.views.id_at(tail));

        let trackers: Vec<u32> = self
            .router(pointer)
            .chain
            .iter()
            .skip(1)
            .filter(|&idx| self.motion.is_linked(idx))
            .collect();
        for idx in trackers {
            let linked = self
                .router_on(pointer, surface)
                .is_some_and(|r| r.chain.is_linked(idx));
            if linked {
                self.deliver(self.views.id_at(idx), pointer, MouseKind::Move, None);
            }
        }
    }

    /// The pointer left its surface.
    ///
    /// The chain is walked from the root: each view is unlinked and receives
    /// leave. Once a view declines, the remaining members are unlinked without
    /// a callback.
    ///
    /// # Panics
    ///
    /// Panics if the pointer is unknown.
    pub fn pointer_leave(&mut self, pointer: PointerId, serial: u32) {
        let router = self.router_mut(pointer);
        router.serial = serial;
        let Some(surface) = router.surface else {
            return;
        };

        let mut propagate = true;
        while let Some(idx) = self.router_on(pointer, surface).and_then(|r| r.chain.front()) {
            self.router_mut(pointer).chain.remove(idx);
            self.trace_chain(pointer, idx, ChainChange::Left);
            if propagate {
                let view = self.views.id_at(idx);
                propagate = self.deliver(view, pointer, MouseKind::Leave, None);
            }
        }
        if let Some(router) = self.router_on_mut(pointer, surface) {
            router.surface = None;
        }
    }

    /// A button changed state. The event travels down the chain from the root
    /// and stops at the first view that declines it.
    ///
    /// # Panics
    ///
    /// Panics if the pointer is unknown.
    pub fn pointer_button(
        &mut self,
        pointer: PointerId,
        serial: u32,
        time: u32,
        button: u32,
        state: ButtonState,
    ) {
        let router = self.router_mut(pointer);
        router.serial = serial;
        router.time = time;
        let Some(surface) = router.surface else {
            return;
        };
        let mut next = router.chain.front();
        while let Some(idx) = next {
            let accepted = self.deliver(
                self.views.id_at(idx),
                pointer,
                MouseKind::Button,
                Some((button, state)),
            );
            if !accepted {
                break;
            }
            next = self
                .router_on(pointer, surface)
                .filter(|r| r.chain.is_linked(idx))
                .and_then(|r| r.chain.next(idx));
        }
    }

    /// A scroll axis changed. Propagates like [`pointer_button`](Self::pointer_button).
    ///
    /// # Panics
    ///
    /// Panics if the pointer is unknown.
    pub fn pointer_axis(&mut self, pointer: PointerId, time: u32, axis: Axis, value: f64) {
        let router = self.router_mut(pointer);
        router.time = time;
        let Some(surface) = router.surface else {
            return;
        };
        let position = router.position;
        let mut next = router.chain.front();
        while let Some(idx) = next {
            let mut event = AxisEvent::new(pointer, surface, position, axis, value);
            event.time = time;
            let delivered = self.with_widget(self.views.id_at(idx), |w, cx| {
                w.on_mouse_axis(cx, &mut event);
            });
            if delivered.is_none() || !event.is_accepted() {
                break;
            }
            next = self
                .router_on(pointer, surface)
                .filter(|r| r.chain.is_linked(idx))
                .and_then(|r| r.chain.next(idx));
        }
    }

    // -- Internal helpers --

    /// Extends the chain below `from` while hit children accept enter.
    fn descend(&mut self, pointer: PointerId, surface: SurfaceId, from: ViewId) {
        let mut current = from;
        loop {
            let position = self.router(pointer).position;
            let Some(child) = self.views.hit_child(current, position) else {
                return;
            };
            if self.router(pointer).chain.is_linked(child.idx) {
                return;
            }
            if !self.deliver(child, pointer, MouseKind::Enter, None) {
                return;
            }
            if !self.views.is_alive(child) || !self.views.is_alive(current) {
                return;
            }
            let Some(router) = self.router_on_mut(pointer, surface) else {
                return;
            };
            // Only grow the chain from its tail.
            if router.chain.back() != Some(current.idx) || router.chain.is_linked(child.idx) {
                return;
            }
            router.chain.push_back(child.idx);
            self.trace_chain(pointer, child.idx, ChainChange::Entered);
            current = child;
        }
    }

    /// Calls the mouse callback for `kind` and returns whether it accepted.
    fn deliver(
        &mut self,
        view: ViewId,
        pointer: PointerId,
        kind: MouseKind,
        button: Option<(u32, ButtonState)>,
    ) -> bool {
        let Some(router) = self.router_opt(pointer) else {
            return false;
        };
        let Some(surface) = router.surface else {
            return false;
        };
        let mut event = MouseEvent::new(pointer, surface, router.position);
        event.serial = router.serial;
        event.time = router.time;
        if let Some((button, state)) = button {
            event.button = button;
            event.state = state;
        }
        let delivered = self.with_widget(view, |w, cx| match kind {
            MouseKind::Enter => w.on_mouse_enter(cx, &mut event),
            MouseKind::Leave => w.on_mouse_leave(cx, &mut event),
            MouseKind::Move => w.on_mouse_move(cx, &mut event),
            MouseKind::Button => w.on_mouse_button(cx, &mut event),
        });
        delivered.is_some() && event.is_accepted()
    }

    fn router_opt(&self, pointer: PointerId) -> Option<&PointerRouter> {
        self.pointers.get(pointer.0 as usize)?.as_ref()
    }

    /// Returns the router only while it is still on `surface`.
    fn router_on(&self, pointer: PointerId, surface: SurfaceId) -> Option<&PointerRouter> {
        self.router_opt(pointer).filter(|r| r.surface == Some(surface))
    }

    fn router_on_mut(
        &mut self,
        pointer: PointerId,
        surface: SurfaceId,
    ) -> Option<&mut PointerRouter> {
        self.pointers
            .get_mut(pointer.0 as usize)?
            .as_mut()
            .filter(|r| r.surface == Some(surface))
    }

    fn still_on(&self, pointer: PointerId, surface: SurfaceId) -> bool {
        self.router_on(pointer, surface).is_some()
    }

    fn router(&self, pointer: PointerId) -> &PointerRouter {
        match self.router_opt(pointer) {
            Some(router) => router,
            None => panic!("unknown PointerId: {pointer:?}"),
        }
    }

    fn router_mut(&mut self, pointer: PointerId) -> &mut PointerRouter {
        match self.pointers.get_mut(pointer.0 as usize).and_then(Option::as_mut) {
            Some(router) => router,
            None => panic!("unknown PointerId: {pointer:?}"),
        }
    }

    pub(crate) fn trace_chain(
        &mut self,
        pointer: PointerId,
        view_index: u32,
        change: ChainChange,
    ) {
        let depth = self
            .router_opt(pointer)
            .map_or(0, |r| u32::try_from(r.chain.len()).unwrap_or(u32::MAX));
        self.tracer.chain_change(&ChainEvent {
            iteration: self.iteration(),
            pointer: pointer.0,
            view_index,
            change,
            depth,
        });
    }
}
