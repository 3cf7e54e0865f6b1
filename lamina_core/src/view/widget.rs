// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The callback interface implemented by concrete widgets.

use kurbo::{Point, Rect};

use crate::input::{AxisEvent, KeyEvent, MouseEvent};
use crate::redraw::RenderContext;
use crate::session::ViewCx;

/// Callbacks a view receives from the session.
///
/// Every method has a default. A widget is moved out of its slot while one of
/// its callbacks runs, so `cx` may freely mutate the rest of the session,
/// including destroying the calling view.
///
/// Events arrive with their accepted flag set; call `ignore()` on the event to
/// decline it. What declining means depends on the event:
///
/// - enter: the view is not linked into the entered chain and the descent
///   stops there,
/// - leave: deeper chain members are unlinked without a callback,
/// - button and axis: deeper chain members do not see the event,
/// - key: the event bubbles to the parent view.
pub trait Widget: 'static {
    /// Paints the view. Record damage on `context` for anything that changed.
    fn on_draw(&mut self, cx: &mut ViewCx<'_>, context: &mut RenderContext) {
        _ = (cx, context);
    }

    /// Called from the redraw flush after pending geometry was committed.
    ///
    /// `old` is the geometry before the first mutation since the last flush and
    /// `new` the latest one.
    fn on_geometry_changed(&mut self, cx: &mut ViewCx<'_>, old: Rect, new: Rect) {
        _ = (cx, old, new);
    }

    /// Returns whether `point` (surface-local) hits this view.
    ///
    /// Not consulted while this widget runs one of its own callbacks; hit tests
    /// on the view then use `geometry.contains(point)`.
    fn contains(&self, geometry: Rect, point: Point) -> bool {
        geometry.contains(point)
    }

    /// The pointer entered the view.
    fn on_mouse_enter(&mut self, cx: &mut ViewCx<'_>, event: &mut MouseEvent) {
        _ = (cx, event);
    }

    /// The pointer left the view, or the surface.
    fn on_mouse_leave(&mut self, cx: &mut ViewCx<'_>, event: &mut MouseEvent) {
        _ = (cx, event);
    }

    /// The pointer moved. Root views always receive this; other views only
    /// while tracking motion.
    fn on_mouse_move(&mut self, cx: &mut ViewCx<'_>, event: &mut MouseEvent) {
        _ = (cx, event);
    }

    /// A pointer button changed state.
    fn on_mouse_button(&mut self, cx: &mut ViewCx<'_>, event: &mut MouseEvent) {
        _ = (cx, event);
    }

    /// A scroll axis changed.
    fn on_mouse_axis(&mut self, cx: &mut ViewCx<'_>, event: &mut AxisEvent) {
        _ = (cx, event);
    }

    /// A key changed state. The default declines so the key bubbles up.
    fn on_keyboard_key(&mut self, cx: &mut ViewCx<'_>, event: &mut KeyEvent) {
        _ = cx;
        event.ignore();
    }

    /// Keyboard focus moved onto (`true`) or off (`false`) this view.
    fn on_focus_changed(&mut self, cx: &mut ViewCx<'_>, focused: bool) {
        _ = (cx, focused);
    }

    /// The shell asked to close the window this root view is bound to.
    fn on_close_request(&mut self, cx: &mut ViewCx<'_>) {
        cx.session().exit();
    }
}
