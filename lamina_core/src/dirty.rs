// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-tracking channel constants.
//!
//! The surface stack keeps a [`understory_dirty`] tracker with one dependency
//! edge per parented surface: the parent depends on each of its children. A
//! child's pending state becomes visible only once its parent commits, so when
//! a sub-surface commits, its parent is marked on [`COMMIT`] with
//! [`EagerPolicy`](understory_dirty::EagerPolicy) and every ancestor up to the
//! shell surface is marked with it.
//!
//! Draining the channel in deterministic order yields children before their
//! parents, which is the order in which the commit task issues commits.

use understory_dirty::Channel;

/// A surface has state that still needs a commit to take effect.
pub const COMMIT: Channel = Channel::new(0);
