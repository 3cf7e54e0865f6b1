// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Redraw batching.
//!
//! [`Session::update`] links a view into the redraw queue unless it is already
//! queued, so any number of updates between two flushes produce one paint. The
//! queue is flushed by a built-in idle task, which for each view in FIFO order:
//!
//! 1. commits pending geometry and reports it through
//!    [`Widget::on_geometry_changed`](crate::view::Widget::on_geometry_changed),
//! 2. draws the view if it is visible,
//! 3. if damage was recorded, damages and commits the surface, then marks the
//!    surface's ancestors for the commit phase,
//! 4. unlinks the view.
//!
//! The view stays linked while its callbacks run, so an `update()` from inside
//! the draw is absorbed by the paint in progress. Children are never queued on
//! behalf of their parent.

use alloc::vec::Vec;

use kurbo::Rect;

use crate::protocol::CanvasId;
use crate::session::Session;
use crate::surface::SurfaceId;
use crate::task::TaskList;
use crate::trace::{DamageRect, RedrawEvent, SurfaceChange};
use crate::view::ViewId;

/// Drawing state handed to [`Widget::on_draw`](crate::view::Widget::on_draw).
#[derive(Clone, Copy, Debug, Default)]
pub struct RenderContext {
    surface: Option<SurfaceId>,
    canvas: Option<CanvasId>,
    geometry: Rect,
    damage: Option<Rect>,
}

impl RenderContext {
    /// Returns the surface being drawn into.
    #[must_use]
    pub fn surface(&self) -> Option<SurfaceId> {
        self.surface
    }

    /// Returns the canvas associated with the surface.
    #[must_use]
    pub fn canvas(&self) -> Option<CanvasId> {
        self.canvas
    }

    /// Returns the view's committed geometry.
    #[must_use]
    pub fn geometry(&self) -> Rect {
        self.geometry
    }

    /// Adds `rect` (surface-local) to the damage.
    pub fn damage(&mut self, rect: Rect) {
        self.damage = Some(match self.damage {
            Some(existing) => existing.union(rect),
            None => rect,
        });
    }

    /// Damages the view's whole geometry.
    pub fn damage_all(&mut self) {
        self.damage(self.geometry);
    }

    /// Returns the damage recorded so far.
    #[must_use]
    pub fn damaged(&self) -> Option<Rect> {
        self.damage
    }
}

/// The redraw queue plus one reusable context per view slot.
#[derive(Debug, Default)]
pub(crate) struct RedrawQueue {
    pub(crate) tasks: TaskList,
    contexts: Vec<RenderContext>,
}

impl RedrawQueue {
    pub(crate) const fn new() -> Self {
        Self {
            tasks: TaskList::new(),
            contexts: Vec::new(),
        }
    }

    fn context_mut(&mut self, idx: u32) -> &mut RenderContext {
        let i = idx as usize;
        if i >= self.contexts.len() {
            self.contexts.resize(i + 1, RenderContext::default());
        }
        &mut self.contexts[i]
    }

    /// Unlinks a dying view and drops its accumulated damage.
    pub(crate) fn forget(&mut self, idx: u32) {
        self.tasks.remove(idx);
        if let Some(context) = self.contexts.get_mut(idx as usize) {
            *context = RenderContext::default();
        }
    }
}

impl Session {
    /// Schedules a redraw of `view`. A no-op if one is already pending.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn update(&mut self, view: ViewId) {
        self.views.validate(view);
        if !self.redraw.tasks.is_linked(view.idx) {
            self.redraw.tasks.push_back(view.idx);
        }
        self.schedule_idle(self.redraw_task);
    }

    /// Adds `rect` to the damage of `view`'s next paint and schedules it.
    pub fn damage(&mut self, view: ViewId, rect: Rect) {
        self.views.validate(view);
        self.redraw.context_mut(view.idx).damage(rect);
        self.update(view);
    }

    /// Returns whether a redraw of `view` is pending.
    #[must_use]
    pub fn is_redraw_queued(&self, view: ViewId) -> bool {
        self.views.is_alive(view) && self.redraw.tasks.is_linked(view.idx)
    }

    /// Returns the number of views waiting to be drawn.
    #[must_use]
    pub fn pending_redraws(&self) -> usize {
        self.redraw.tasks.len()
    }

    /// Paints every queued view. Runs as the built-in idle task.
    ///
    /// A view whose own callbacks changed its geometry goes back on the queue
    /// and is painted again in the same drain.
    pub(crate) fn flush_redraw(&mut self) {
        while let Some(idx) = self.redraw.tasks.front() {
            let view = self.views.id_at(idx);

            let change = self.views.commit_geometry(view);
            if let Some((old, new)) = change {
                self.with_widget(view, |w, cx| w.on_geometry_changed(cx, old, new));
                // Destroying the view also unlinked it.
                if !self.views.is_alive(view) {
                    continue;
                }
            }

            let surface = self.views.surface_of(view);
            let mut damage = None;
            if self.views.is_visible(view) {
                let mut context = *self.redraw.context_mut(idx);
                context.surface = surface;
                context.canvas = surface.and_then(|s| self.surfaces.canvas(s));
                context.geometry = self.views.geometry(view);
                self.with_widget(view, |w, cx| w.on_draw(cx, &mut context));
                if !self.views.is_alive(view) {
                    continue;
                }
                damage = context.damage;
            }
            *self.redraw.context_mut(idx) = RenderContext::default();

            if let (Some(rect), Some(surface)) = (damage, surface) {
                if self.surfaces.is_alive(surface) {
                    self.protocol.damage(surface, rect);
                    self.protocol.commit(surface);
                    self.stats.commits += 1;
                    self.trace_surface(surface, SurfaceChange::Committed);
                    self.request_parent_commit(surface);
                }
            }

            self.redraw.tasks.remove(idx);
            // Geometry set from the view's own callbacks is applied in this drain.
            if self.views.has_pending_geometry(view) {
                self.redraw.tasks.push_back(idx);
            }
            self.stats.redraws += 1;
            self.tracer.redraw(&RedrawEvent {
                iteration: self.iteration(),
                view_index: idx,
                surface_index: surface.map(SurfaceId::index),
                geometry_changed: change.is_some(),
                damage: damage.map(DamageRect::from_rect),
            });
        }
    }
}
