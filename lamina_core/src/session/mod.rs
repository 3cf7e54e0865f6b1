// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The session: one explicit owner for every store, queue and router.
//!
//! A [`Session`] replaces process-wide state. It owns the [`ViewTree`], the
//! [`SurfaceStack`], the idle and commit task queues, the redraw queue, the
//! pointer and keyboard routers, the output list, the boxed
//! [`Protocol`] collaborator and the trace sink. Several sessions may coexist.
//!
//! Operations are split by concern:
//!
//! - tasks and queue draining (this module and `tasks`),
//! - view lifecycle and geometry (`views`),
//! - surface lifecycle, stacking and outputs (`surfaces`),
//! - redraw scheduling ([`crate::redraw`]),
//! - pointer and keyboard routing ([`crate::input`]).

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use crate::input::{KeyboardState, PointerRouter};
use crate::output::OutputId;
use crate::protocol::Protocol;
use crate::redraw::RedrawQueue;
use crate::surface::SurfaceStack;
use crate::task::TaskList;
use crate::time::HostTime;
use crate::trace::{
    IterationSummary, PhaseBeginEvent, PhaseEndEvent, PhaseKind, TraceSink, Tracer,
};
use crate::view::{ViewId, ViewTree, Widget};

mod cx;
mod surfaces;
mod tasks;
mod views;

pub use cx::ViewCx;
pub use tasks::TaskId;

pub(crate) use tasks::TaskRegistry;

/// Owner of all compositing and routing state for one display connection.
pub struct Session {
    pub(crate) views: ViewTree,
    pub(crate) surfaces: SurfaceStack,

    // -- Tasks --
    pub(crate) tasks: TaskRegistry,
    pub(crate) idle: TaskList,
    pub(crate) commit: TaskList,
    pub(crate) redraw: RedrawQueue,
    pub(crate) redraw_task: TaskId,
    pub(crate) commit_task: TaskId,

    // -- Input --
    pub(crate) pointers: Vec<Option<PointerRouter>>,
    pub(crate) motion: TaskList,
    pub(crate) keyboard: KeyboardState,

    // -- Frames and outputs --
    pub(crate) frames: TaskList,
    pub(crate) outputs: Vec<OutputId>,
    next_output: u32,

    // -- Collaborators --
    pub(crate) protocol: Box<dyn Protocol>,
    pub(crate) tracer: Tracer,

    // -- Loop state --
    running: bool,
    iteration: u64,
    pub(crate) stats: IterationSummary,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("running", &self.running)
            .field("iteration", &self.iteration)
            .field("views", &self.views.view_count())
            .field("shell_surfaces", &self.surfaces.shell_count())
            .field("idle", &self.idle.len())
            .field("commit", &self.commit.len())
            .field("redraw", &self.redraw.tasks.len())
            .field("tracer", &self.tracer)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Creates a running session issuing requests through `protocol`.
    pub fn new(protocol: impl Protocol + 'static) -> Self {
        let mut tasks = TaskRegistry::new();
        let redraw_task = tasks.create(Box::new(|session: &mut Self| session.flush_redraw()));
        let commit_task =
            tasks.create(Box::new(|session: &mut Self| session.commit_surfaces()));
        Self {
            views: ViewTree::new(),
            surfaces: SurfaceStack::new(),
            tasks,
            idle: TaskList::new(),
            commit: TaskList::new(),
            redraw: RedrawQueue::new(),
            redraw_task,
            commit_task,
            pointers: Vec::new(),
            motion: TaskList::new(),
            keyboard: KeyboardState::default(),
            frames: TaskList::new(),
            outputs: Vec::new(),
            next_output: 0,
            protocol: Box::new(protocol),
            tracer: Tracer::none(),
            running: true,
            iteration: 0,
            stats: IterationSummary::default(),
        }
    }

    /// Returns the view tree.
    #[must_use]
    pub fn views(&self) -> &ViewTree {
        &self.views
    }

    /// Returns the view tree for topology edits.
    ///
    /// Geometry and visibility changes should go through the session
    /// ([`move_to`](Self::move_to), [`set_visible`](Self::set_visible), ...)
    /// so that a redraw is scheduled.
    pub fn views_mut(&mut self) -> &mut ViewTree {
        &mut self.views
    }

    /// Returns the surface stack.
    #[must_use]
    pub fn surfaces(&self) -> &SurfaceStack {
        &self.surfaces
    }

    // -- Loop state --

    /// Asks the event loop to stop after the current phase.
    pub fn exit(&mut self) {
        self.running = false;
    }

    /// Returns `false` once [`exit`](Self::exit) was called.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Returns the number of completed loop iterations.
    #[must_use]
    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    /// Installs a trace sink. Without the `trace` feature the sink is dropped.
    pub fn set_trace_sink(&mut self, sink: Box<dyn TraceSink>) {
        self.tracer = Tracer::new(sink);
    }

    /// Removes the trace sink.
    pub fn clear_trace_sink(&mut self) {
        self.tracer = Tracer::none();
    }

    /// Destroys every remaining surface (children before parents), clears the
    /// input routers and the output list, and cancels all queued work.
    ///
    /// Views and their widgets stay alive until the session is dropped.
    pub fn teardown(&mut self) {
        self.running = false;
        self.idle.clear();
        self.commit.clear();
        self.redraw.tasks.clear();
        self.frames.clear();
        self.motion.clear();
        self.pointers.clear();
        self.keyboard = KeyboardState::default();

        for surface in self.surfaces.surfaces().into_iter().rev() {
            if self.surfaces.is_alive(surface) {
                let root = self.surfaces.root_view(surface);
                self.surfaces.force_destroy(surface);
                self.forget_surface(surface, root);
            }
        }
        self.outputs.clear();
    }

    // -- Trace plumbing for the loop driver --

    pub(crate) fn phase_begin(&mut self, phase: PhaseKind, timestamp: HostTime) {
        self.tracer.phase_begin(&PhaseBeginEvent {
            iteration: self.iteration,
            phase,
            timestamp,
        });
    }

    pub(crate) fn phase_end(&mut self, phase: PhaseKind, timestamp: HostTime) {
        self.tracer.phase_end(&PhaseEndEvent {
            iteration: self.iteration,
            phase,
            timestamp,
        });
    }

    pub(crate) fn begin_iteration(&mut self, started: HostTime) {
        self.stats = IterationSummary {
            iteration: self.iteration,
            started,
            ..IterationSummary::default()
        };
    }

    pub(crate) fn finish_iteration(&mut self, finished: HostTime) {
        self.stats.finished = finished;
        let summary = self.stats;
        self.tracer.iteration(&summary);
        self.iteration += 1;
    }

    /// Runs `f` with the view's widget moved out of its slot.
    ///
    /// Returns `None` without calling `f` if the view is dead or its widget is
    /// already running a callback. The widget is put back only if the view
    /// survived the callback.
    pub(crate) fn with_widget<R>(
        &mut self,
        view: ViewId,
        f: impl FnOnce(&mut dyn Widget, &mut ViewCx<'_>) -> R,
    ) -> Option<R> {
        let mut widget = self.views.take_widget(view)?;
        let result = f(widget.as_mut(), &mut ViewCx::new(self, view));
        self.views.restore_widget(view, widget);
        Some(result)
    }

    pub(crate) fn allocate_output(&mut self) -> OutputId {
        let id = OutputId(self.next_output);
        self.next_output += 1;
        self.outputs.push(id);
        id
    }
}
