// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The protocol seam between core and a display-server backend.
//!
//! Core decides *what* happens to surfaces (creation, stacking, damage,
//! commits); the [`Protocol`] implementation turns those decisions into wire
//! requests. Every method is fire-and-forget: requests are buffered by the
//! backend and flushed by the event loop.

use core::fmt;

use kurbo::Rect;

use crate::surface::SurfaceId;

/// How a surface is presented by the display server.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SurfaceRole {
    /// A top-level window managed by the shell.
    Shell,
    /// A sub-surface positioned relative to `parent`.
    Sub {
        /// The surface this one is attached to.
        parent: SurfaceId,
    },
}

/// An opaque reference to a pixel buffer registered with the backend.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(pub u32);

impl fmt::Debug for BufferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BufferId({})", self.0)
    }
}

/// An opaque reference to a drawing target owned by the application.
///
/// Core associates at most one canvas with each surface and hands it to
/// [`Widget::on_draw`](crate::view::Widget::on_draw) through the
/// [`RenderContext`](crate::redraw::RenderContext).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CanvasId(pub u32);

impl fmt::Debug for CanvasId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CanvasId({})", self.0)
    }
}

/// Issues surface requests to the display server.
///
/// Implementations must tolerate any call order core produces; in particular
/// [`destroy_surface`](Self::destroy_surface) may be called for a sub-surface
/// after its parent was destroyed.
pub trait Protocol {
    /// Creates the server-side objects backing `id` with the given role.
    fn create_surface(&mut self, id: SurfaceId, role: SurfaceRole);

    /// Destroys the server-side objects backing `id`.
    fn destroy_surface(&mut self, id: SurfaceId);

    /// Attaches `buffer` (or detaches with `None`) at offset `(x, y)`.
    fn attach(&mut self, id: SurfaceId, buffer: Option<BufferId>, x: i32, y: i32);

    /// Marks `rect` (surface-local) as damaged.
    fn damage(&mut self, id: SurfaceId, rect: Rect);

    /// Commits pending state on `id`.
    fn commit(&mut self, id: SurfaceId);

    /// Sets the input region, or resets it to the whole surface with `None`.
    fn set_input_region(&mut self, id: SurfaceId, region: Option<Rect>);

    /// Positions a sub-surface relative to its parent's origin.
    fn set_position(&mut self, id: SurfaceId, x: i32, y: i32);

    /// Restacks a sub-surface directly above `sibling` (a sibling or the parent).
    fn place_above(&mut self, id: SurfaceId, sibling: SurfaceId);

    /// Restacks a sub-surface directly below `sibling` (a sibling or the parent).
    fn place_below(&mut self, id: SurfaceId, sibling: SurfaceId);

    /// Requests a frame callback for `id`.
    fn request_frame(&mut self, id: SurfaceId);

    /// Sets the title of a shell surface.
    fn set_title(&mut self, id: SurfaceId, title: &str) {
        _ = (id, title);
    }
}

/// A [`Protocol`] that discards every request.
///
/// Useful for driving a [`Session`](crate::session::Session) without a display
/// server.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullProtocol;

impl Protocol for NullProtocol {
    fn create_surface(&mut self, _id: SurfaceId, _role: SurfaceRole) {}
    fn destroy_surface(&mut self, _id: SurfaceId) {}
    fn attach(&mut self, _id: SurfaceId, _buffer: Option<BufferId>, _x: i32, _y: i32) {}
    fn damage(&mut self, _id: SurfaceId, _rect: Rect) {}
    fn commit(&mut self, _id: SurfaceId) {}
    fn set_input_region(&mut self, _id: SurfaceId, _region: Option<Rect>) {}
    fn set_position(&mut self, _id: SurfaceId, _x: i32, _y: i32) {}
    fn place_above(&mut self, _id: SurfaceId, _sibling: SurfaceId) {}
    fn place_below(&mut self, _id: SurfaceId, _sibling: SurfaceId) {}
    fn request_frame(&mut self, _id: SurfaceId) {}
}
