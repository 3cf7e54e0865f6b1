// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! View tree data model.
//!
//! A *view* is a node in a widget hierarchy. Each view has:
//!
//! - An identity ([`ViewId`]), a generational handle that becomes stale when
//!   the view is destroyed.
//! - Topology: parent, first/last child and sibling links forming an ordered
//!   tree, plus a child count so indexed access can walk from either end.
//! - Geometry in surface-local coordinates, split into a *committed* rectangle
//!   and a *pending* one. [`move_to`](ViewTree::move_to) and
//!   [`resize`](ViewTree::resize) only touch the pending value; the redraw
//!   flush commits it and reports the change once.
//! - A visibility flag. Hidden views are skipped by drawing and hit-testing.
//! - An optional surface binding. A view bound to a surface is that surface's
//!   root view; every descendant draws into the nearest bound ancestor.
//! - A boxed [`Widget`] receiving callbacks.
//!
//! # Paint and hit order
//!
//! Children paint first to last, so the last child is the frontmost.
//! Hit-testing walks children from last to first and stops at the first match.

mod id;
mod traverse;
mod tree;
mod widget;

pub use id::ViewId;
pub use traverse::Children;
pub use tree::ViewTree;
pub use widget::Widget;
