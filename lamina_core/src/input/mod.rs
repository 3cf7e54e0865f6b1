// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Input routing.
//!
//! Each pointer device keeps an *entered chain*: the views currently considered
//! to contain the pointer, from the surface's root view down to the deepest
//! view that accepted enter. The chain is a [`TaskList`](crate::task::TaskList)
//! keyed by view slot, grown lazily as the pointer descends and shrunk from the
//! tail as it moves out. See [`Session::pointer_enter`],
//! [`Session::pointer_motion`], [`Session::pointer_leave`] and
//! [`Session::pointer_button`].
//!
//! Keyboard events go to the focused view and bubble to its ancestors while
//! ignored; see [`Session::keyboard_key`].
//!
//! [`Session::pointer_enter`]: crate::session::Session::pointer_enter
//! [`Session::pointer_motion`]: crate::session::Session::pointer_motion
//! [`Session::pointer_leave`]: crate::session::Session::pointer_leave
//! [`Session::pointer_button`]: crate::session::Session::pointer_button
//! [`Session::keyboard_key`]: crate::session::Session::keyboard_key

mod event;
mod keyboard;
mod pointer;

pub use event::{
    Axis, AxisEvent, ButtonState, KeyEvent, KeyState, Modifiers, MouseEvent, PointerId,
};

pub(crate) use keyboard::KeyboardState;
pub(crate) use pointer::PointerRouter;
