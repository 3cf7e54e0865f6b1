// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared fixtures for unit tests.

use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::RefCell;

use kurbo::Rect;

use crate::input::{AxisEvent, KeyEvent, MouseEvent};
use crate::protocol::{BufferId, Protocol, SurfaceRole};
use crate::session::{Session, ViewCx};
use crate::surface::SurfaceId;
use crate::view::Widget;

/// One protocol request, as seen by [`Recorder`].
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Call {
    Create(SurfaceId, SurfaceRole),
    Destroy(SurfaceId),
    Attach(SurfaceId, Option<BufferId>, i32, i32),
    Damage(SurfaceId, Rect),
    Commit(SurfaceId),
    InputRegion(SurfaceId, Option<Rect>),
    Position(SurfaceId, i32, i32),
    PlaceAbove(SurfaceId, SurfaceId),
    PlaceBelow(SurfaceId, SurfaceId),
    RequestFrame(SurfaceId),
    Title(SurfaceId, String),
}

pub(crate) type Log = Rc<RefCell<Vec<Call>>>;

/// Protocol that appends every request to a shared log.
pub(crate) struct Recorder(pub(crate) Log);

impl Protocol for Recorder {
    fn create_surface(&mut self, id: SurfaceId, role: SurfaceRole) {
        self.0.borrow_mut().push(Call::Create(id, role));
    }

    fn destroy_surface(&mut self, id: SurfaceId) {
        self.0.borrow_mut().push(Call::Destroy(id));
    }

    fn attach(&mut self, id: SurfaceId, buffer: Option<BufferId>, x: i32, y: i32) {
        self.0.borrow_mut().push(Call::Attach(id, buffer, x, y));
    }

    fn damage(&mut self, id: SurfaceId, rect: Rect) {
        self.0.borrow_mut().push(Call::Damage(id, rect));
    }

    fn commit(&mut self, id: SurfaceId) {
        self.0.borrow_mut().push(Call::Commit(id));
    }

    fn set_input_region(&mut self, id: SurfaceId, region: Option<Rect>) {
        self.0.borrow_mut().push(Call::InputRegion(id, region));
    }

    fn set_position(&mut self, id: SurfaceId, x: i32, y: i32) {
        self.0.borrow_mut().push(Call::Position(id, x, y));
    }

    fn place_above(&mut self, id: SurfaceId, sibling: SurfaceId) {
        self.0.borrow_mut().push(Call::PlaceAbove(id, sibling));
    }

    fn place_below(&mut self, id: SurfaceId, sibling: SurfaceId) {
        self.0.borrow_mut().push(Call::PlaceBelow(id, sibling));
    }

    fn request_frame(&mut self, id: SurfaceId) {
        self.0.borrow_mut().push(Call::RequestFrame(id));
    }

    fn set_title(&mut self, id: SurfaceId, title: &str) {
        self.0.borrow_mut().push(Call::Title(id, title.into()));
    }
}

pub(crate) fn recording_session() -> (Session, Log) {
    let log = Log::default();
    (Session::new(Recorder(Rc::clone(&log))), log)
}

pub(crate) fn count(log: &Log, pred: impl Fn(&Call) -> bool) -> usize {
    log.borrow().iter().filter(|c| pred(c)).count()
}

/// Widget with only default callbacks.
pub(crate) struct Plain;

impl Widget for Plain {}

pub(crate) type Events = Rc<RefCell<Vec<(&'static str, &'static str)>>>;

/// Widget that logs `(name, event)` pairs and accepts or declines on demand.
pub(crate) struct Tracer {
    name: &'static str,
    events: Events,
    accept_enter: bool,
    accept_leave: bool,
    accept_button: bool,
    accept_key: bool,
}

impl Tracer {
    pub(crate) fn new(name: &'static str, events: &Events) -> Self {
        Self {
            name,
            events: Rc::clone(events),
            accept_enter: true,
            accept_leave: true,
            accept_button: true,
            accept_key: false,
        }
    }

    pub(crate) fn declining_enter(mut self) -> Self {
        self.accept_enter = false;
        self
    }

    pub(crate) fn declining_leave(mut self) -> Self {
        self.accept_leave = false;
        self
    }

    pub(crate) fn declining_button(mut self) -> Self {
        self.accept_button = false;
        self
    }

    pub(crate) fn accepting_keys(mut self) -> Self {
        self.accept_key = true;
        self
    }

    fn log(&self, event: &'static str) {
        self.events.borrow_mut().push((self.name, event));
    }
}

impl Widget for Tracer {
    fn on_mouse_enter(&mut self, _cx: &mut ViewCx<'_>, event: &mut MouseEvent) {
        self.log("enter");
        if !self.accept_enter {
            event.ignore();
        }
    }

    fn on_mouse_leave(&mut self, _cx: &mut ViewCx<'_>, event: &mut MouseEvent) {
        self.log("leave");
        if !self.accept_leave {
            event.ignore();
        }
    }

    fn on_mouse_move(&mut self, _cx: &mut ViewCx<'_>, _event: &mut MouseEvent) {
        self.log("move");
    }

    fn on_mouse_button(&mut self, _cx: &mut ViewCx<'_>, event: &mut MouseEvent) {
        self.log("button");
        if !self.accept_button {
            event.ignore();
        }
    }

    fn on_mouse_axis(&mut self, _cx: &mut ViewCx<'_>, _event: &mut AxisEvent) {
        self.log("axis");
    }

    fn on_keyboard_key(&mut self, _cx: &mut ViewCx<'_>, event: &mut KeyEvent) {
        self.log("key");
        if !self.accept_key {
            event.ignore();
        }
    }

    fn on_focus_changed(&mut self, _cx: &mut ViewCx<'_>, focused: bool) {
        self.log(if focused { "focus" } else { "blur" });
    }
}

/// Drains and returns the logged events.
pub(crate) fn take(events: &Events) -> Vec<(&'static str, &'static str)> {
    core::mem::take(&mut *events.borrow_mut())
}
