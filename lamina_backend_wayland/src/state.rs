// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `Dispatch` glue: compositor events into [`Session`] calls.
//!
//! Every backend object is created on the `EventQueue<WaylandState>` and
//! carries the id the session knows it by as user data:
//!
//! | Object | User data |
//! |---|---|
//! | `wl_surface`, `xdg_surface`, `xdg_toplevel`, frame `wl_callback` | [`SurfaceId`] |
//! | `wl_pointer` | [`PointerId`] |
//! | `wl_output` | [`OutputId`] |
//!
//! Events naming a surface the session already destroyed are dropped.

use kurbo::{Point, Size};
use lamina_core::input::{Axis, ButtonState, KeyEvent, KeyState, Modifiers, PointerId};
use lamina_core::output::OutputId;
use lamina_core::session::Session;
use lamina_core::surface::SurfaceId;
use wayland_client::globals::GlobalListContents;
use wayland_client::protocol::{
    wl_buffer, wl_callback, wl_compositor, wl_keyboard, wl_output, wl_pointer, wl_region,
    wl_registry, wl_seat, wl_subcompositor, wl_subsurface, wl_surface,
};
use wayland_client::{Connection, Dispatch, Proxy, QueueHandle, WEnum, delegate_noop};
use wayland_protocols::xdg::shell::client::{xdg_surface, xdg_toplevel, xdg_wm_base};

/// Highest `wl_output` version the backend binds.
const OUTPUT_VERSION: u32 = 4;

/// Backend state dispatched by the event queue.
#[derive(Debug)]
pub struct WaylandState {
    pub(crate) session: Session,
    outputs: Vec<(u32, wl_output::WlOutput, OutputId)>,
    /// Sizes from `xdg_toplevel.configure`, applied on the matching
    /// `xdg_surface.configure`.
    configures: Vec<(SurfaceId, Size)>,
    pointer: Option<(wl_pointer::WlPointer, PointerId)>,
    keyboard: Option<wl_keyboard::WlKeyboard>,
}

impl WaylandState {
    pub(crate) fn new(session: Session) -> Self {
        Self {
            session,
            outputs: Vec::new(),
            configures: Vec::new(),
            pointer: None,
            keyboard: None,
        }
    }

    /// Returns the session.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Returns the session mutably.
    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub(crate) fn bind_output(
        &mut self,
        registry: &wl_registry::WlRegistry,
        name: u32,
        version: u32,
        qh: &QueueHandle<Self>,
    ) {
        let id = self.session.add_output();
        let output = registry.bind(name, version.min(OUTPUT_VERSION), qh, id);
        tracing::debug!(name, ?id, "bound wl_output");
        self.outputs.push((name, output, id));
    }

    fn remove_global(&mut self, name: u32) {
        let Some(slot) = self.outputs.iter().position(|(n, ..)| *n == name) else {
            return;
        };
        let (_, output, id) = self.outputs.swap_remove(slot);
        self.session.remove_output(id);
        if output.version() >= 3 {
            output.release();
        }
    }

    /// Returns the session surface for a compositor-provided `wl_surface`.
    fn live_surface(&self, surface: &wl_surface::WlSurface) -> Option<SurfaceId> {
        let id = *surface.data::<SurfaceId>()?;
        self.session.surfaces().is_alive(id).then_some(id)
    }

    fn is_alive(&self, id: SurfaceId) -> bool {
        self.session.surfaces().is_alive(id)
    }

    fn set_capabilities(
        &mut self,
        seat: &wl_seat::WlSeat,
        capabilities: wl_seat::Capability,
        qh: &QueueHandle<Self>,
    ) {
        let has_pointer = capabilities.contains(wl_seat::Capability::Pointer);
        match self.pointer.take() {
            None if has_pointer => {
                let id = self.session.add_pointer();
                self.pointer = Some((seat.get_pointer(qh, id), id));
            }
            Some((pointer, id)) if !has_pointer => {
                self.session.remove_pointer(id);
                if pointer.version() >= 3 {
                    pointer.release();
                }
            }
            current => self.pointer = current,
        }

        let has_keyboard = capabilities.contains(wl_seat::Capability::Keyboard);
        match self.keyboard.take() {
            None if has_keyboard => self.keyboard = Some(seat.get_keyboard(qh, ())),
            Some(keyboard) if !has_keyboard => {
                if let Some(surface) = self.session.keyboard_surface() {
                    self.session.keyboard_leave(surface);
                }
                if keyboard.version() >= 3 {
                    keyboard.release();
                }
            }
            current => self.keyboard = current,
        }
    }
}

// -- Registry --

impl Dispatch<wl_registry::WlRegistry, GlobalListContents> for WaylandState {
    fn event(
        state: &mut Self,
        registry: &wl_registry::WlRegistry,
        event: wl_registry::Event,
        _data: &GlobalListContents,
        _conn: &Connection,
        qh: &QueueHandle<Self>,
    ) {
        match event {
            wl_registry::Event::Global {
                name,
                interface,
                version,
            } => {
                if interface == wl_output::WlOutput::interface().name {
                    state.bind_output(registry, name, version, qh);
                } else {
                    tracing::debug!(name, %interface, version, "ignoring late global");
                }
            }
            wl_registry::Event::GlobalRemove { name } => state.remove_global(name),
            _ => {}
        }
    }
}

// -- Surfaces --

impl Dispatch<wl_surface::WlSurface, SurfaceId> for WaylandState {
    fn event(
        state: &mut Self,
        _surface: &wl_surface::WlSurface,
        event: wl_surface::Event,
        id: &SurfaceId,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        if !state.is_alive(*id) {
            return;
        }
        match event {
            wl_surface::Event::Enter { output } => {
                if let Some(&output) = output.data::<OutputId>() {
                    state.session.surface_enter_output(*id, output);
                }
            }
            wl_surface::Event::Leave { output } => {
                if let Some(&output) = output.data::<OutputId>() {
                    state.session.surface_leave_output(*id, output);
                }
            }
            _ => {}
        }
    }
}

impl Dispatch<wl_callback::WlCallback, SurfaceId> for WaylandState {
    fn event(
        state: &mut Self,
        _callback: &wl_callback::WlCallback,
        event: wl_callback::Event,
        id: &SurfaceId,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        if let wl_callback::Event::Done { callback_data } = event {
            if state.is_alive(*id) {
                state.session.frame_done(*id, callback_data);
            }
        }
    }
}

impl Dispatch<wl_output::WlOutput, OutputId> for WaylandState {
    fn event(
        _state: &mut Self,
        _output: &wl_output::WlOutput,
        event: wl_output::Event,
        id: &OutputId,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        if let wl_output::Event::Name { name } = event {
            tracing::debug!(?id, %name, "output named");
        }
    }
}

// -- Shell --

impl Dispatch<xdg_wm_base::XdgWmBase, ()> for WaylandState {
    fn event(
        _state: &mut Self,
        wm_base: &xdg_wm_base::XdgWmBase,
        event: xdg_wm_base::Event,
        _data: &(),
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        if let xdg_wm_base::Event::Ping { serial } = event {
            wm_base.pong(serial);
        }
    }
}

impl Dispatch<xdg_surface::XdgSurface, SurfaceId> for WaylandState {
    fn event(
        state: &mut Self,
        xdg: &xdg_surface::XdgSurface,
        event: xdg_surface::Event,
        id: &SurfaceId,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        if let xdg_surface::Event::Configure { serial } = event {
            xdg.ack_configure(serial);
            let pending = state.configures.iter().position(|(s, _)| s == id);
            let size = pending.map(|slot| state.configures.swap_remove(slot).1);
            if let Some(size) = size.filter(|_| state.is_alive(*id)) {
                state.session.configure_shell(*id, size);
            }
        }
    }
}

impl Dispatch<xdg_toplevel::XdgToplevel, SurfaceId> for WaylandState {
    fn event(
        state: &mut Self,
        _toplevel: &xdg_toplevel::XdgToplevel,
        event: xdg_toplevel::Event,
        id: &SurfaceId,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        match event {
            xdg_toplevel::Event::Configure { width, height, .. } => {
                let size = Size::new(f64::from(width.max(0)), f64::from(height.max(0)));
                state.configures.retain(|(s, _)| s != id);
                state.configures.push((*id, size));
            }
            xdg_toplevel::Event::Close => {
                if state.is_alive(*id) {
                    state.session.request_close(*id);
                }
            }
            _ => {}
        }
    }
}

// -- Seat --

impl Dispatch<wl_seat::WlSeat, ()> for WaylandState {
    fn event(
        state: &mut Self,
        seat: &wl_seat::WlSeat,
        event: wl_seat::Event,
        _data: &(),
        _conn: &Connection,
        qh: &QueueHandle<Self>,
    ) {
        if let wl_seat::Event::Capabilities {
            capabilities: WEnum::Value(capabilities),
        } = event
        {
            state.set_capabilities(seat, capabilities, qh);
        }
    }
}

impl Dispatch<wl_pointer::WlPointer, PointerId> for WaylandState {
    fn event(
        state: &mut Self,
        _pointer: &wl_pointer::WlPointer,
        event: wl_pointer::Event,
        pointer: &PointerId,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        let pointer = *pointer;
        match event {
            wl_pointer::Event::Enter {
                serial,
                surface,
                surface_x,
                surface_y,
            } => {
                if let Some(id) = state.live_surface(&surface) {
                    let position = Point::new(surface_x, surface_y);
                    state.session.pointer_enter(pointer, id, position, serial);
                }
            }
            wl_pointer::Event::Leave { serial, .. } => {
                state.session.pointer_leave(pointer, serial);
            }
            wl_pointer::Event::Motion {
                time,
                surface_x,
                surface_y,
            } => {
                let position = Point::new(surface_x, surface_y);
                state.session.pointer_motion(pointer, time, position);
            }
            wl_pointer::Event::Button {
                serial,
                time,
                button,
                state: WEnum::Value(button_state),
            } => {
                let button_state = match button_state {
                    wl_pointer::ButtonState::Pressed => ButtonState::Pressed,
                    _ => ButtonState::Released,
                };
                state
                    .session
                    .pointer_button(pointer, serial, time, button, button_state);
            }
            wl_pointer::Event::Axis {
                time,
                axis: WEnum::Value(axis),
                value,
            } => {
                let axis = match axis {
                    wl_pointer::Axis::HorizontalScroll => Axis::Horizontal,
                    _ => Axis::Vertical,
                };
                state.session.pointer_axis(pointer, time, axis, value);
            }
            _ => {}
        }
    }
}

impl Dispatch<wl_keyboard::WlKeyboard, ()> for WaylandState {
    fn event(
        state: &mut Self,
        _keyboard: &wl_keyboard::WlKeyboard,
        event: wl_keyboard::Event,
        _data: &(),
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        match event {
            wl_keyboard::Event::Keymap { fd, size, .. } => {
                // Key codes are forwarded raw; the keymap is the widget's concern.
                tracing::trace!(size, "keymap received");
                drop(fd);
            }
            wl_keyboard::Event::Enter { surface, .. } => {
                if let Some(id) = state.live_surface(&surface) {
                    state.session.keyboard_enter(id);
                }
            }
            wl_keyboard::Event::Leave { surface, .. } => {
                if let Some(&id) = surface.data::<SurfaceId>() {
                    state.session.keyboard_leave(id);
                }
            }
            wl_keyboard::Event::Key {
                serial,
                time,
                key,
                state: WEnum::Value(key_state),
            } => {
                let key_state = match key_state {
                    wl_keyboard::KeyState::Pressed => KeyState::Pressed,
                    wl_keyboard::KeyState::Released => KeyState::Released,
                    _ => KeyState::Repeated,
                };
                let mut event = KeyEvent::new(key, key_state);
                event.serial = serial;
                event.time = time;
                state.session.keyboard_key(event);
            }
            wl_keyboard::Event::Modifiers {
                mods_depressed,
                mods_latched,
                mods_locked,
                group,
                ..
            } => {
                state.session.keyboard_modifiers(Modifiers {
                    depressed: mods_depressed,
                    latched: mods_latched,
                    locked: mods_locked,
                    group,
                });
            }
            _ => {}
        }
    }
}

delegate_noop!(WaylandState: ignore wl_compositor::WlCompositor);
delegate_noop!(WaylandState: ignore wl_subcompositor::WlSubcompositor);
delegate_noop!(WaylandState: ignore wl_subsurface::WlSubsurface);
delegate_noop!(WaylandState: ignore wl_region::WlRegion);
delegate_noop!(WaylandState: ignore wl_buffer::WlBuffer);
