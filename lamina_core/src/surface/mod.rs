// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Surfaces and their stacking order.
//!
//! A *surface* is one compositor-visible drawable. Surfaces are kept in two
//! independent orders:
//!
//! - The **sibling chain** (`above`/`below`): every parented surface sits in
//!   the same chain as its parent, and a surface together with all of its
//!   descendants always forms one contiguous run of that chain (its *block*).
//!   Stacking requests move whole blocks.
//! - The **shell chain** (`up`/`down`): top-level surfaces in window stacking
//!   order, newest on top.
//!
//! Surfaces are shared through [`SurfaceHolder`]s. The surface is destroyed
//! exactly when the last holder is released; observers registered with
//! [`observe_destroying`](SurfaceStack::observe_destroying) run first.

mod id;
mod stack;

pub use id::{SurfaceHolder, SurfaceId};
pub use stack::SurfaceStack;
