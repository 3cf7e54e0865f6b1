// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Event payloads handed to widget callbacks.

use core::fmt;

use kurbo::Point;

use crate::surface::SurfaceId;

/// Identifies a pointer device registered with
/// [`Session::add_pointer`](crate::session::Session::add_pointer).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PointerId(pub u32);

impl fmt::Debug for PointerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PointerId({})", self.0)
    }
}

/// State of a pointer button.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ButtonState {
    /// The button went down.
    Pressed,
    /// The button came up.
    #[default]
    Released,
}

/// A scroll axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Vertical scrolling.
    Vertical,
    /// Horizontal scrolling.
    Horizontal,
}

/// State of a keyboard key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyState {
    /// The key went down.
    Pressed,
    /// The key came up.
    Released,
    /// The key is auto-repeating.
    Repeated,
}

/// Pointer enter, leave, motion and button event.
#[derive(Clone, Copy, Debug)]
pub struct MouseEvent {
    /// Device that produced the event.
    pub pointer: PointerId,
    /// Surface the pointer is on.
    pub surface: SurfaceId,
    /// Surface-local pointer position.
    pub position: Point,
    /// Serial of the most recent enter or button event.
    pub serial: u32,
    /// Timestamp in milliseconds.
    pub time: u32,
    /// Button code for button events, zero otherwise.
    pub button: u32,
    /// Button state for button events.
    pub state: ButtonState,
    accepted: bool,
}

impl MouseEvent {
    /// Creates an accepted event with no button.
    #[must_use]
    pub fn new(pointer: PointerId, surface: SurfaceId, position: Point) -> Self {
        Self {
            pointer,
            surface,
            position,
            serial: 0,
            time: 0,
            button: 0,
            state: ButtonState::Released,
            accepted: true,
        }
    }

    /// Accepts the event.
    pub fn accept(&mut self) {
        self.accepted = true;
    }

    /// Declines the event.
    pub fn ignore(&mut self) {
        self.accepted = false;
    }

    /// Returns whether the event is accepted.
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        self.accepted
    }
}

/// Scroll event.
#[derive(Clone, Copy, Debug)]
pub struct AxisEvent {
    /// Device that produced the event.
    pub pointer: PointerId,
    /// Surface the pointer is on.
    pub surface: SurfaceId,
    /// Surface-local pointer position.
    pub position: Point,
    /// Timestamp in milliseconds.
    pub time: u32,
    /// Which axis scrolled.
    pub axis: Axis,
    /// Scroll distance in surface units.
    pub value: f64,
    accepted: bool,
}

impl AxisEvent {
    /// Creates an accepted axis event.
    #[must_use]
    pub fn new(
        pointer: PointerId,
        surface: SurfaceId,
        position: Point,
        axis: Axis,
        value: f64,
    ) -> Self {
        Self {
            pointer,
            surface,
            position,
            time: 0,
            axis,
            value,
            accepted: true,
        }
    }

    /// Accepts the event.
    pub fn accept(&mut self) {
        self.accepted = true;
    }

    /// Declines the event.
    pub fn ignore(&mut self) {
        self.accepted = false;
    }

    /// Returns whether the event is accepted.
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        self.accepted
    }
}

/// Keyboard modifier masks as reported by the compositor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Modifiers {
    /// Modifiers physically held.
    pub depressed: u32,
    /// Modifiers latched until the next key.
    pub latched: u32,
    /// Modifiers locked on.
    pub locked: u32,
    /// Active layout group.
    pub group: u32,
}

/// Keyboard key event.
#[derive(Clone, Copy, Debug)]
pub struct KeyEvent {
    /// Hardware key code.
    pub key: u32,
    /// Key state.
    pub state: KeyState,
    /// Event serial.
    pub serial: u32,
    /// Timestamp in milliseconds.
    pub time: u32,
    /// Modifiers in effect; filled in by the session.
    pub modifiers: Modifiers,
    accepted: bool,
}

impl KeyEvent {
    /// Creates an accepted key event.
    #[must_use]
    pub fn new(key: u32, state: KeyState) -> Self {
        Self {
            key,
            state,
            serial: 0,
            time: 0,
            modifiers: Modifiers::default(),
            accepted: true,
        }
    }

    /// Accepts the event.
    pub fn accept(&mut self) {
        self.accepted = true;
    }

    /// Declines the event, letting it bubble to the parent view.
    pub fn ignore(&mut self) {
        self.accepted = false;
    }

    /// Returns whether the event is accepted.
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        self.accepted
    }
}
