// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! View tree, surface stacking, redraw batching and pointer routing for
//! client-side compositing.
//!
//! `lamina_core` is the protocol-independent half of a Wayland-style client
//! toolkit. It is `no_std` compatible (with `alloc`), stores views and surfaces
//! in struct-of-arrays slots addressed by generational handles, and threads all
//! of its queues through index-linked [`TaskList`](task::TaskList)s so that
//! enqueueing never allocates per item.
//!
//! # Architecture
//!
//! ```text
//!   EventSource (backend) ──► event_loop::run()
//!                                  │
//!        ┌─────────────────────────┼──────────────────────────────┐
//!        ▼                         ▼                              ▼
//!   idle queue                commit queue                 dispatch_pending
//!   (redraw flush,            (surface commits,            (pointer / keyboard /
//!    user tasks)               parents after children)      frame / configure)
//!        │                         │                              │
//!        ▼                         ▼                              ▼
//!   ViewTree ──draw──► RenderContext ──damage──► Protocol ◄── SurfaceStack
//! ```
//!
//! **[`view`]**: Struct-of-arrays view tree. Each view owns a
//! [`Widget`](view::Widget) that receives drawing, geometry and input
//! callbacks.
//!
//! **[`surface`]**: Reference-counted surfaces and the global stacking order,
//! with sub-surfaces kept contiguous above or below their parents.
//!
//! **[`redraw`]**: The coalescing redraw queue flushed from the idle phase.
//!
//! **[`input`]**: Per-pointer entered chains, motion tracking and keyboard
//! focus.
//!
//! **[`session`]**: The [`Session`](session::Session) that owns every store
//! and queue, plus the task registry.
//!
//! **[`event_loop`]**: The [`EventSource`](event_loop::EventSource) trait and
//! the iteration driver.
//!
//! **[`protocol`]**: The [`Protocol`](protocol::Protocol) trait that backends
//! implement to issue requests on real surfaces.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types for
//! loop instrumentation.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod dirty;
pub mod event_loop;
pub mod input;
pub mod output;
pub mod protocol;
pub mod redraw;
pub mod session;
pub mod surface;
pub mod task;
pub mod time;
pub mod trace;
pub mod view;

#[cfg(test)]
pub(crate) mod testing;
