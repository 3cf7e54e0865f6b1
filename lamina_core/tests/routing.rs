// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Redraw batching, pointer chains and key bubbling through the public API.

use std::cell::RefCell;
use std::rc::Rc;

use kurbo::{Point, Rect};
use lamina_core::input::{KeyEvent, KeyState, MouseEvent};
use lamina_core::protocol::{NullProtocol, SurfaceRole};
use lamina_core::redraw::RenderContext;
use lamina_core::session::{Session, ViewCx};
use lamina_core::view::{ViewId, Widget};

type Journal = Rc<RefCell<Vec<String>>>;

struct Recorder {
    name: &'static str,
    journal: Journal,
    takes_keys: bool,
}

impl Recorder {
    fn new(name: &'static str, journal: &Journal) -> Self {
        Self {
            name,
            journal: journal.clone(),
            takes_keys: false,
        }
    }

    fn note(&self, what: &str) {
        self.journal.borrow_mut().push(format!("{} {what}", self.name));
    }
}

impl Widget for Recorder {
    fn on_draw(&mut self, _cx: &mut ViewCx<'_>, _context: &mut RenderContext) {
        self.note("draw");
    }

    fn on_mouse_enter(&mut self, _cx: &mut ViewCx<'_>, _event: &mut MouseEvent) {
        self.note("enter");
    }

    fn on_mouse_leave(&mut self, _cx: &mut ViewCx<'_>, _event: &mut MouseEvent) {
        self.note("leave");
    }

    fn on_keyboard_key(&mut self, _cx: &mut ViewCx<'_>, event: &mut KeyEvent) {
        self.note("key");
        if !self.takes_keys {
            event.ignore();
        }
    }
}

fn drain(journal: &Journal) -> Vec<String> {
    std::mem::take(&mut *journal.borrow_mut())
}

#[test]
fn repeated_updates_paint_once() {
    let journal = Journal::default();
    let mut session = Session::new(NullProtocol);
    let view = session.create_view(Recorder::new("view", &journal));
    for _ in 0..5 {
        session.update(view);
    }
    assert_eq!(session.pending_redraws(), 1);
    session.run_idle_tasks();
    assert_eq!(drain(&journal), ["view draw"]);
    assert_eq!(session.pending_redraws(), 0);
}

#[test]
fn window_with_button_grows_and_shrinks_the_chain() {
    let journal = Journal::default();
    let mut session = Session::new(NullProtocol);
    let window = session.create_surface(SurfaceRole::Shell);
    let root = session.create_view(Recorder::new("root", &journal));
    let button = session.create_view(Recorder::new("button", &journal));
    session.views_mut().push_back_child(root, button);
    session.set_geometry(root, Rect::new(0.0, 0.0, 400.0, 300.0));
    session.set_geometry(button, Rect::new(10.0, 10.0, 100.0, 30.0));
    session.bind_surface(window.id(), root);
    session.run_idle_tasks();
    drain(&journal);

    let pointer = session.add_pointer();
    session.pointer_enter(pointer, window.id(), Point::ZERO, 1);
    assert_eq!(session.entered_chain(pointer), [root]);

    session.pointer_motion(pointer, 10, Point::new(20.0, 20.0));
    assert_eq!(session.entered_chain(pointer), [root, button]);

    session.pointer_motion(pointer, 20, Point::ZERO);
    assert_eq!(session.entered_chain(pointer), [root]);
    assert_eq!(
        drain(&journal),
        ["root enter", "button enter", "button leave"]
    );
}

#[test]
fn destroying_a_chain_member_relinks_its_neighbors() {
    let journal = Journal::default();
    let mut session = Session::new(NullProtocol);
    let window = session.create_surface(SurfaceRole::Shell);
    let mut views: Vec<ViewId> = Vec::new();
    for (name, inset) in [("outer", 0.0), ("middle", 10.0), ("inner", 20.0)] {
        let view = session.create_view(Recorder::new(name, &journal));
        if let Some(&parent) = views.last() {
            session.views_mut().push_back_child(parent, view);
        }
        session.set_geometry(view, Rect::new(inset, inset, 200.0 - inset, 200.0 - inset));
        views.push(view);
    }
    session.bind_surface(window.id(), views[0]);
    session.run_idle_tasks();

    let pointer = session.add_pointer();
    session.pointer_enter(pointer, window.id(), Point::new(100.0, 100.0), 1);
    assert_eq!(session.entered_chain(pointer), views);

    session.destroy_view(views[1]);
    assert_eq!(session.entered_chain(pointer), [views[0], views[2]]);
    assert!(!session.views().is_alive(views[1]));
}

#[test]
fn ignored_keys_bubble_to_the_root() {
    let journal = Journal::default();
    let mut session = Session::new(NullProtocol);
    let window = session.create_surface(SurfaceRole::Shell);
    let mut root = Recorder::new("root", &journal);
    root.takes_keys = true;
    let root = session.create_view(root);
    let panel = session.create_view(Recorder::new("panel", &journal));
    let field = session.create_view(Recorder::new("field", &journal));
    session.views_mut().push_back_child(root, panel);
    session.views_mut().push_back_child(panel, field);
    session.bind_surface(window.id(), root);

    session.keyboard_enter(window.id());
    session.set_focus(Some(field));
    assert!(session.keyboard_key(KeyEvent::new(30, KeyState::Pressed)));
    assert_eq!(drain(&journal), ["field key", "panel key", "root key"]);
}
