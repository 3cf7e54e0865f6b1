// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Callback context handed to widgets.

use kurbo::{Point, Rect, Size};

use super::Session;
use crate::surface::SurfaceId;
use crate::view::ViewId;

/// The calling view plus mutable access to its session.
#[derive(Debug)]
pub struct ViewCx<'a> {
    session: &'a mut Session,
    view: ViewId,
}

impl<'a> ViewCx<'a> {
    pub(crate) fn new(session: &'a mut Session, view: ViewId) -> Self {
        Self { session, view }
    }

    /// Returns the view whose callback is running.
    #[must_use]
    pub fn id(&self) -> ViewId {
        self.view
    }

    /// Returns the whole session.
    pub fn session(&mut self) -> &mut Session {
        self.session
    }

    /// Returns whether the view is still alive (a callback may destroy it).
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.session.views.is_alive(self.view)
    }

    /// Returns the committed geometry.
    #[must_use]
    pub fn geometry(&self) -> Rect {
        self.session.views.geometry(self.view)
    }

    /// Returns the surface the view draws into.
    #[must_use]
    pub fn surface(&self) -> Option<SurfaceId> {
        self.session.views.surface_of(self.view)
    }

    /// Schedules a redraw of this view.
    pub fn update(&mut self) {
        self.session.update(self.view);
    }

    /// Adds `rect` to the damage of the next redraw and schedules it.
    pub fn damage(&mut self, rect: Rect) {
        self.session.damage(self.view, rect);
    }

    /// Moves the view; see [`Session::move_to`].
    pub fn move_to(&mut self, origin: Point) {
        self.session.move_to(self.view, origin);
    }

    /// Resizes the view; see [`Session::resize`].
    pub fn resize(&mut self, size: Size) {
        self.session.resize(self.view, size);
    }

    /// Replaces the view's geometry; see [`Session::set_geometry`].
    pub fn set_geometry(&mut self, rect: Rect) {
        self.session.set_geometry(self.view, rect);
    }

    /// Parks the view until the next frame callback of its surface.
    pub fn request_frame(&mut self) -> bool {
        self.session.request_frame(self.view)
    }

    /// Opts the view in or out of move events while it is entered but not the
    /// root of its chain.
    pub fn track_motion(&mut self, enabled: bool) {
        self.session.track_motion(self.view, enabled);
    }

    /// Gives this view keyboard focus.
    pub fn set_focus(&mut self) {
        self.session.set_focus(Some(self.view));
    }
}
