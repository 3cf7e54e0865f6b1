// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Keyboard focus and key bubbling.

use super::event::{KeyEvent, Modifiers};
use crate::session::Session;
use crate::surface::SurfaceId;
use crate::view::ViewId;

/// Seat keyboard state.
#[derive(Debug, Default)]
pub(crate) struct KeyboardState {
    /// Surface holding keyboard focus at the compositor level.
    pub(crate) surface: Option<SurfaceId>,
    /// View that receives keys first.
    pub(crate) focus: Option<ViewId>,
    pub(crate) modifiers: Modifiers,
}

impl Session {
    /// The keyboard focus moved onto `surface`.
    ///
    /// # Panics
    ///
    /// Panics if the surface handle is stale.
    pub fn keyboard_enter(&mut self, surface: SurfaceId) {
        self.surfaces.validate(surface);
        self.keyboard.surface = Some(surface);
        if let Some(view) = self.focus_target() {
            self.with_widget(view, |w, cx| w.on_focus_changed(cx, true));
        }
    }

    /// The keyboard focus left `surface`. Ignored if the keyboard is elsewhere.
    pub fn keyboard_leave(&mut self, surface: SurfaceId) {
        if self.keyboard.surface != Some(surface) {
            return;
        }
        let target = self.focus_target();
        self.keyboard.surface = None;
        if let Some(view) = target {
            self.with_widget(view, |w, cx| w.on_focus_changed(cx, false));
        }
    }

    /// Records the modifier state stamped onto subsequent key events.
    pub fn keyboard_modifiers(&mut self, modifiers: Modifiers) {
        self.keyboard.modifiers = modifiers;
    }

    /// Delivers a key to the focused view, bubbling to ancestors while ignored.
    ///
    /// Returns whether some view accepted the key.
    pub fn keyboard_key(&mut self, mut event: KeyEvent) -> bool {
        event.modifiers = self.keyboard.modifiers;
        let mut next = self.focus_target();
        while let Some(view) = next {
            let mut delivered = event;
            delivered.accept();
            let called =
                self.with_widget(view, |w, cx| w.on_keyboard_key(cx, &mut delivered));
            if called.is_some() && delivered.is_accepted() {
                return true;
            }
            next = if self.views.is_alive(view) {
                self.views.parent(view)
            } else {
                None
            };
        }
        false
    }

    /// Moves keyboard focus to `view`, or clears it.
    ///
    /// While the keyboard is on a surface, the previous target is told it lost
    /// focus and the new one that it gained it.
    ///
    /// # Panics
    ///
    /// Panics if `view` is a stale handle.
    pub fn set_focus(&mut self, view: Option<ViewId>) {
        if let Some(view) = view {
            self.views.validate(view);
        }
        if self.keyboard.focus == view {
            return;
        }
        let before = self.focus_target();
        self.keyboard.focus = view;
        let after = self.focus_target();
        if before == after || self.keyboard.surface.is_none() {
            return;
        }
        if let Some(old) = before {
            self.with_widget(old, |w, cx| w.on_focus_changed(cx, false));
        }
        if let Some(new) = after.filter(|&v| self.views.is_alive(v)) {
            self.with_widget(new, |w, cx| w.on_focus_changed(cx, true));
        }
    }

    /// Returns the explicitly focused view.
    #[must_use]
    pub fn focused_view(&self) -> Option<ViewId> {
        self.keyboard.focus
    }

    /// Returns the surface holding keyboard focus.
    #[must_use]
    pub fn keyboard_surface(&self) -> Option<SurfaceId> {
        self.keyboard.surface
    }

    /// Focused view, falling back to the keyboard surface's root view.
    fn focus_target(&self) -> Option<ViewId> {
        self.keyboard
            .focus
            .or_else(|| self.surfaces.root_view(self.keyboard.surface?))
    }
}
