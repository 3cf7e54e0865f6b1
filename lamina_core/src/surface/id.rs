// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Surface identity and shared ownership handles.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;

/// A handle to a surface in a [`SurfaceStack`](super::SurfaceStack).
///
/// Copying a `SurfaceId` does not keep the surface alive; only
/// [`SurfaceHolder`]s do.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceId {
    pub(crate) idx: u32,
    pub(crate) generation: u32,
}

impl SurfaceId {
    /// Returns the raw slot index (for diagnostics only).
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.idx
    }

    /// Returns the generation counter.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SurfaceId({}@gen{})", self.idx, self.generation)
    }
}

/// Ids of holders dropped without being handed back, shared between a
/// [`SurfaceStack`](super::SurfaceStack) and its holders.
pub(crate) type DropQueue = Rc<RefCell<Vec<SurfaceId>>>;

/// One counted reference to a surface.
///
/// Holders are neither `Copy` nor `Clone`: a new reference is made with
/// [`SurfaceStack::share`](super::SurfaceStack::share).
/// [`SurfaceStack::release`](super::SurfaceStack::release) gives a holder back
/// immediately. Dropping a holder instead queues its release, which the
/// session applies at the start of the next commit phase.
pub struct SurfaceHolder {
    pub(crate) id: SurfaceId,
    dropped: Option<DropQueue>,
}

impl SurfaceHolder {
    pub(crate) fn new(id: SurfaceId, dropped: &DropQueue) -> Self {
        Self {
            id,
            dropped: Some(Rc::clone(dropped)),
        }
    }

    /// Returns the surface this holder refers to.
    #[inline]
    #[must_use]
    pub fn id(&self) -> SurfaceId {
        self.id
    }

    /// Consumes the holder without queueing a release; the caller accounts for
    /// the reference.
    pub(crate) fn disarm(mut self) -> SurfaceId {
        self.dropped = None;
        self.id
    }
}

impl Drop for SurfaceHolder {
    fn drop(&mut self) {
        if let Some(dropped) = self.dropped.take() {
            dropped.borrow_mut().push(self.id);
        }
    }
}

impl PartialEq for SurfaceHolder {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for SurfaceHolder {}

impl fmt::Debug for SurfaceHolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SurfaceHolder({:?})", self.id)
    }
}
