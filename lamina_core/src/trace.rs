// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the event loop.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that the
//! loop driver, the redraw flush, the pointer router and the surface stack
//! call as they work. All method bodies default to no-ops, so implementing
//! only the events you care about is fine.
//!
//! [`Tracer`] wraps an optional boxed sink and lives in the
//! [`Session`](crate::session::Session). When the `trace` feature is **off**,
//! every `Tracer` method compiles to nothing. When **on**, each method performs
//! a single `Option` branch before dispatching.
//!
//! A sink is moved into the session, so sinks whose output must be read back
//! afterwards are usually installed as `Rc<RefCell<S>>`, which implements
//! [`TraceSink`] by forwarding.

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::cell::RefCell;

use kurbo::Rect;

use crate::time::HostTime;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Which phase of a loop iteration is being measured.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PhaseKind {
    /// Draining the idle queue (redraw flush and user idle tasks).
    Idle,
    /// Draining the commit queue.
    Commit,
    /// Dispatching already-buffered protocol events.
    Dispatch,
    /// Flushing outgoing requests.
    Flush,
    /// Blocking for new events.
    Wait,
}

/// How a view's membership in an entered chain changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChainChange {
    /// The view accepted enter and was linked.
    Entered,
    /// The view was unlinked.
    Left,
}

/// What happened to a surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SurfaceChange {
    /// The surface was created.
    Created,
    /// The last holder was released and the surface destroyed.
    Destroyed,
    /// The surface was restacked relative to a sibling or its parent.
    Restacked,
    /// The surface was committed.
    Committed,
    /// A frame callback fired.
    FrameDone {
        /// Timestamp carried by the callback.
        serial: u32,
    },
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Marks the beginning of a loop phase.
#[derive(Clone, Copy, Debug)]
pub struct PhaseBeginEvent {
    /// Loop iteration counter.
    pub iteration: u64,
    /// Which phase is starting.
    pub phase: PhaseKind,
    /// Host time at the start of the phase.
    pub timestamp: HostTime,
}

/// Marks the end of a loop phase.
#[derive(Clone, Copy, Debug)]
pub struct PhaseEndEvent {
    /// Loop iteration counter.
    pub iteration: u64,
    /// Which phase is ending.
    pub phase: PhaseKind,
    /// Host time at the end of the phase.
    pub timestamp: HostTime,
}

/// An axis-aligned damage rectangle in whole surface pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DamageRect {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width.
    pub width: u32,
    /// Height.
    pub height: u32,
}

impl DamageRect {
    /// Rounds `rect` outwards to whole pixels.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "surface coordinates fit comfortably in i32"
    )]
    pub fn from_rect(rect: Rect) -> Self {
        let rect = rect.abs().expand();
        Self {
            x: rect.x0 as i32,
            y: rect.y0 as i32,
            width: rect.width() as u32,
            height: rect.height() as u32,
        }
    }
}

/// Emitted once per view drawn by the redraw flush.
#[derive(Clone, Copy, Debug)]
pub struct RedrawEvent {
    /// Loop iteration counter.
    pub iteration: u64,
    /// Slot index of the view.
    pub view_index: u32,
    /// Slot index of the surface drawn into, if the view is bound.
    pub surface_index: Option<u32>,
    /// Whether pending geometry was committed first.
    pub geometry_changed: bool,
    /// Damage recorded while drawing, if any.
    pub damage: Option<DamageRect>,
}

/// Emitted when a view joins or leaves a pointer's entered chain.
#[derive(Clone, Copy, Debug)]
pub struct ChainEvent {
    /// Loop iteration counter.
    pub iteration: u64,
    /// Pointer device the chain belongs to.
    pub pointer: u32,
    /// Slot index of the view.
    pub view_index: u32,
    /// What happened.
    pub change: ChainChange,
    /// Chain length after the change.
    pub depth: u32,
}

/// Emitted on surface lifecycle and stacking changes.
#[derive(Clone, Copy, Debug)]
pub struct SurfaceEvent {
    /// Loop iteration counter.
    pub iteration: u64,
    /// Slot index of the surface.
    pub surface_index: u32,
    /// What happened.
    pub change: SurfaceChange,
}

/// Per-iteration totals, emitted after the wait phase returns.
#[derive(Clone, Copy, Debug, Default)]
pub struct IterationSummary {
    /// Loop iteration counter.
    pub iteration: u64,
    /// Host time when the iteration started.
    pub started: HostTime,
    /// Host time when the iteration finished.
    pub finished: HostTime,
    /// Idle tasks run.
    pub idle_tasks: u32,
    /// Commit tasks run.
    pub commit_tasks: u32,
    /// Views drawn.
    pub redraws: u32,
    /// Surfaces committed.
    pub commits: u32,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the event loop.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called at the beginning of a loop phase.
    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        _ = e;
    }

    /// Called at the end of a loop phase.
    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        _ = e;
    }

    /// Called for every view the redraw flush processes.
    fn on_redraw(&mut self, e: &RedrawEvent) {
        _ = e;
    }

    /// Called when an entered chain gains or loses a view.
    fn on_chain_change(&mut self, e: &ChainEvent) {
        _ = e;
    }

    /// Called on surface lifecycle and stacking changes.
    fn on_surface_change(&mut self, e: &SurfaceEvent) {
        _ = e;
    }

    /// Called at the end of every loop iteration.
    fn on_iteration(&mut self, s: &IterationSummary) {
        _ = s;
    }
}

impl<S: TraceSink + ?Sized> TraceSink for Rc<RefCell<S>> {
    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        self.borrow_mut().on_phase_begin(e);
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        self.borrow_mut().on_phase_end(e);
    }

    fn on_redraw(&mut self, e: &RedrawEvent) {
        self.borrow_mut().on_redraw(e);
    }

    fn on_chain_change(&mut self, e: &ChainEvent) {
        self.borrow_mut().on_chain_change(e);
    }

    fn on_surface_change(&mut self, e: &SurfaceEvent) {
        self.borrow_mut().on_surface_change(e);
    }

    fn on_iteration(&mut self, s: &IterationSummary) {
        self.borrow_mut().on_iteration(s);
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional boxed [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing and
/// installed sinks are dropped immediately.
#[derive(Default)]
pub struct Tracer {
    #[cfg(feature = "trace")]
    sink: Option<Box<dyn TraceSink>>,
}

impl core::fmt::Debug for Tracer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer")
            .field("enabled", &self.is_enabled())
            .finish_non_exhaustive()
    }
}

macro_rules! dispatch {
    ($self:ident, $method:ident, $e:expr) => {{
        #[cfg(feature = "trace")]
        if let Some(s) = &mut $self.sink {
            s.$method($e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = $e;
        }
    }};
}

impl Tracer {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: Box<dyn TraceSink>) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            drop(sink);
            Self {}
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Returns whether events reach a sink.
    #[inline]
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        #[cfg(feature = "trace")]
        {
            self.sink.is_some()
        }
        #[cfg(not(feature = "trace"))]
        {
            false
        }
    }

    /// Emits a [`PhaseBeginEvent`].
    #[inline]
    pub fn phase_begin(&mut self, e: &PhaseBeginEvent) {
        dispatch!(self, on_phase_begin, e);
    }

    /// Emits a [`PhaseEndEvent`].
    #[inline]
    pub fn phase_end(&mut self, e: &PhaseEndEvent) {
        dispatch!(self, on_phase_end, e);
    }

    /// Emits a [`RedrawEvent`].
    #[inline]
    pub fn redraw(&mut self, e: &RedrawEvent) {
        dispatch!(self, on_redraw, e);
    }

    /// Emits a [`ChainEvent`].
    #[inline]
    pub fn chain_change(&mut self, e: &ChainEvent) {
        dispatch!(self, on_chain_change, e);
    }

    /// Emits a [`SurfaceEvent`].
    #[inline]
    pub fn surface_change(&mut self, e: &SurfaceEvent) {
        dispatch!(self, on_surface_change, e);
    }

    /// Emits an [`IterationSummary`].
    #[inline]
    pub fn iteration(&mut self, s: &IterationSummary) {
        dispatch!(self, on_iteration, s);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn damage_rect_rounds_outwards() {
        let d = DamageRect::from_rect(Rect::new(1.5, 2.2, 10.1, 4.0));
        assert_eq!(
            d,
            DamageRect {
                x: 1,
                y: 2,
                width: 10,
                height: 2
            }
        );
    }

    #[test]
    fn noop_tracer_accepts_everything() {
        let mut tracer = Tracer::none();
        assert!(!tracer.is_enabled());
        tracer.phase_begin(&PhaseBeginEvent {
            iteration: 0,
            phase: PhaseKind::Idle,
            timestamp: HostTime(1),
        });
        tracer.iteration(&IterationSummary::default());
    }

    #[cfg(feature = "trace")]
    #[test]
    fn shared_sink_sees_events() {
        #[derive(Default)]
        struct Count(u32);
        impl TraceSink for Count {
            fn on_chain_change(&mut self, _e: &ChainEvent) {
                self.0 += 1;
            }
        }

        let shared = Rc::new(RefCell::new(Count::default()));
        let mut tracer = Tracer::new(Box::new(shared.clone()));
        assert!(tracer.is_enabled());
        let e = ChainEvent {
            iteration: 3,
            pointer: 0,
            view_index: 1,
            change: ChainChange::Entered,
            depth: 1,
        };
        tracer.chain_change(&e);
        tracer.chain_change(&e);
        assert_eq!(shared.borrow().0, 2);
    }
}
