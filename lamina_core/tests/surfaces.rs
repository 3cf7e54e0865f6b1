// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Surface ownership and stacking through the public session API.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use kurbo::{Point, Rect};
use lamina_core::protocol::{BufferId, Protocol, SurfaceRole};
use lamina_core::session::Session;
use lamina_core::surface::{SurfaceHolder, SurfaceId};

#[derive(Clone, Debug, PartialEq)]
enum Request {
    Create(SurfaceId),
    Destroy(SurfaceId),
    Commit(SurfaceId),
    Position(SurfaceId, i32, i32),
    PlaceAbove(SurfaceId, SurfaceId),
    PlaceBelow(SurfaceId, SurfaceId),
    Other,
}

#[derive(Clone, Default)]
struct Wire(Rc<RefCell<Vec<Request>>>);

impl Wire {
    fn take(&self) -> Vec<Request> {
        std::mem::take(&mut *self.0.borrow_mut())
    }

    fn push(&self, request: Request) {
        self.0.borrow_mut().push(request);
    }
}

impl Protocol for Wire {
    fn create_surface(&mut self, id: SurfaceId, _role: SurfaceRole) {
        self.push(Request::Create(id));
    }
    fn destroy_surface(&mut self, id: SurfaceId) {
        self.push(Request::Destroy(id));
    }
    fn attach(&mut self, _id: SurfaceId, _buffer: Option<BufferId>, _x: i32, _y: i32) {
        self.push(Request::Other);
    }
    fn damage(&mut self, _id: SurfaceId, _rect: Rect) {
        self.push(Request::Other);
    }
    fn commit(&mut self, id: SurfaceId) {
        self.push(Request::Commit(id));
    }
    fn set_input_region(&mut self, _id: SurfaceId, _region: Option<Rect>) {
        self.push(Request::Other);
    }
    fn set_position(&mut self, id: SurfaceId, x: i32, y: i32) {
        self.push(Request::Position(id, x, y));
    }
    fn place_above(&mut self, id: SurfaceId, sibling: SurfaceId) {
        self.push(Request::PlaceAbove(id, sibling));
    }
    fn place_below(&mut self, id: SurfaceId, sibling: SurfaceId) {
        self.push(Request::PlaceBelow(id, sibling));
    }
    fn request_frame(&mut self, _id: SurfaceId) {
        self.push(Request::Other);
    }
}

fn sub(session: &mut Session, parent: SurfaceId) -> SurfaceHolder {
    session.create_surface(SurfaceRole::Sub { parent })
}

/// Every surface and its descendants occupy one contiguous run of the chain.
fn assert_contiguous(session: &Session, any: SurfaceId) {
    let stack = session.surfaces();
    let chain = stack.chain(any);
    for &surface in &chain {
        let members: Vec<usize> = chain
            .iter()
            .enumerate()
            .filter(|&(_, &s)| s == surface || stack.is_ancestor(surface, s))
            .map(|(i, _)| i)
            .collect();
        let first = members[0];
        let last = members[members.len() - 1];
        assert_eq!(
            last - first + 1,
            members.len(),
            "block of {surface:?} is split in {chain:?}"
        );
    }
}

#[test]
fn moves_keep_blocks_contiguous() {
    let wire = Wire::default();
    let mut session = Session::new(wire.clone());
    let p = session.create_surface(SurfaceRole::Shell);
    let a = sub(&mut session, p.id());
    let b = sub(&mut session, p.id());
    let a1 = sub(&mut session, a.id());
    let a2 = sub(&mut session, a.id());
    let b1 = sub(&mut session, b.id());
    let (p, a, b, a1, a2, b1) = (p.id(), a.id(), b.id(), a1.id(), a2.id(), b1.id());

    assert_eq!(session.surfaces().chain(p), vec![p, a, a1, a2, b, b1]);
    assert_contiguous(&session, p);

    assert!(session.move_above(a, b));
    assert_eq!(session.surfaces().chain(p), vec![p, b, b1, a, a1, a2]);
    assert_contiguous(&session, p);

    assert!(session.move_below(a1, a));
    assert_eq!(session.surfaces().chain(p), vec![p, b, b1, a1, a, a2]);
    assert_contiguous(&session, p);

    assert!(session.move_above(b, a));
    assert_eq!(session.surfaces().chain(p), vec![p, a1, a, a2, b, b1]);
    assert_contiguous(&session, p);

    wire.take();
    assert!(!session.move_above(a1, b));
    assert!(!session.move_below(b1, p));
    assert!(wire.take().is_empty());
    assert_eq!(session.surfaces().chain(p), vec![p, a1, a, a2, b, b1]);
}

#[test]
fn accepted_moves_commit_the_parent() {
    let wire = Wire::default();
    let mut session = Session::new(wire.clone());
    let p = session.create_surface(SurfaceRole::Shell);
    let a = sub(&mut session, p.id());
    let b = sub(&mut session, p.id());
    wire.take();

    assert!(session.move_below(b.id(), a.id()));
    session.run_commit_tasks();
    assert_eq!(
        wire.take(),
        vec![Request::PlaceBelow(b.id(), a.id()), Request::Commit(p.id())]
    );

    session.set_position(a.id(), Point::new(3.4, 7.6));
    session.run_commit_tasks();
    assert_eq!(
        wire.take(),
        vec![Request::Position(a.id(), 3, 8), Request::Commit(p.id())]
    );
}

#[test]
fn many_holders_delete_once() {
    let wire = Wire::default();
    let mut session = Session::new(wire.clone());
    let first = session.create_surface(SurfaceRole::Shell);
    let id = first.id();
    let mut holders = vec![first];
    for _ in 0..5 {
        let next = session.share_surface(&holders[0]);
        holders.push(next);
    }
    let notified = Rc::new(Cell::new(0));
    let counter = Rc::clone(&notified);
    session.observe_destroying(id, move |_| counter.set(counter.get() + 1));

    for index in [3, 0, 4, 1, 2] {
        let holder = holders.remove(index.min(holders.len() - 1));
        assert!(!session.release_surface(holder));
        assert!(session.surfaces().is_alive(id));
    }
    assert_eq!(notified.get(), 0);

    let last = holders.pop().expect("one holder left");
    assert!(session.release_surface(last));
    assert_eq!(notified.get(), 1);
    assert!(!session.surfaces().is_alive(id));
    let destroys = wire
        .take()
        .into_iter()
        .filter(|r| *r == Request::Destroy(id))
        .count();
    assert_eq!(destroys, 1);
}

#[test]
fn dropped_holders_delete_once_on_the_last_drop() {
    let wire = Wire::default();
    let mut session = Session::new(wire.clone());
    let first = session.create_surface(SurfaceRole::Shell);
    let id = first.id();
    let mut holders = vec![first];
    for _ in 0..4 {
        let next = session.share_surface(&holders[0]);
        holders.push(next);
    }
    let notified = Rc::new(Cell::new(0));
    let counter = Rc::clone(&notified);
    session.observe_destroying(id, move |_| counter.set(counter.get() + 1));
    wire.take();

    for index in [2, 0, 1, 0] {
        drop(holders.remove(index));
        session.run_commit_tasks();
        assert!(session.surfaces().is_alive(id));
        assert_eq!(session.surfaces().refcount(id) as usize, holders.len());
    }
    assert_eq!(notified.get(), 0);
    assert!(wire.take().is_empty());

    drop(holders);
    assert!(session.surfaces().is_alive(id));
    session.run_commit_tasks();
    assert_eq!(notified.get(), 1);
    assert!(!session.surfaces().is_alive(id));
    assert_eq!(wire.take(), vec![Request::Destroy(id)]);

    session.run_commit_tasks();
    assert_eq!(notified.get(), 1);
}

#[test]
fn releasing_a_parent_orphans_its_children() {
    let mut session = Session::new(Wire::default());
    let p = session.create_surface(SurfaceRole::Shell);
    let a = sub(&mut session, p.id());
    let a1 = sub(&mut session, a.id());
    let (a_id, a1_id) = (a.id(), a1.id());

    assert!(session.release_surface(p));
    assert_eq!(session.surfaces().parent(a_id), None);
    assert_eq!(session.surfaces().chain(a_id), vec![a_id, a1_id]);
    assert!(session.release_surface(a1));
    assert!(session.release_surface(a));
}

#[test]
fn teardown_destroys_children_before_parents() {
    let wire = Wire::default();
    let mut session = Session::new(wire.clone());
    let p = session.create_surface(SurfaceRole::Shell);
    let a = sub(&mut session, p.id());
    let (p_id, a_id) = (p.id(), a.id());
    wire.take();

    session.teardown();
    let destroys: Vec<_> = wire
        .take()
        .into_iter()
        .filter(|r| matches!(r, Request::Destroy(_)))
        .collect();
    assert_eq!(destroys, vec![Request::Destroy(a_id), Request::Destroy(p_id)]);
    assert_eq!(session.surfaces().shell_count(), 0);
}
