// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `Protocol` implementation over `wl_surface`, `wl_subsurface` and
//! `xdg_toplevel`.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use kurbo::Rect;
use lamina_core::protocol::{BufferId, Protocol, SurfaceRole};
use lamina_core::surface::SurfaceId;
use wayland_client::QueueHandle;
use wayland_client::protocol::{
    wl_buffer::WlBuffer, wl_compositor::WlCompositor, wl_subcompositor::WlSubcompositor,
    wl_subsurface::WlSubsurface, wl_surface::WlSurface,
};
use wayland_protocols::xdg::shell::client::{
    xdg_surface::XdgSurface, xdg_toplevel::XdgToplevel, xdg_wm_base::XdgWmBase,
};

use crate::state::WaylandState;

/// Client buffers registered for use with
/// [`Session::attach`](lamina_core::session::Session::attach).
#[derive(Debug, Default)]
pub(crate) struct BufferTable {
    buffers: Vec<Option<WlBuffer>>,
    free_list: Vec<u32>,
}

impl BufferTable {
    pub(crate) fn insert(&mut self, buffer: WlBuffer) -> BufferId {
        if let Some(slot) = self.free_list.pop() {
            self.buffers[slot as usize] = Some(buffer);
            return BufferId(slot);
        }
        let slot = u32::try_from(self.buffers.len()).unwrap_or(u32::MAX);
        self.buffers.push(Some(buffer));
        BufferId(slot)
    }

    pub(crate) fn remove(&mut self, id: BufferId) -> Option<WlBuffer> {
        let buffer = self.buffers.get_mut(id.0 as usize)?.take()?;
        self.free_list.push(id.0);
        Some(buffer)
    }

    fn get(&self, id: BufferId) -> Option<&WlBuffer> {
        self.buffers.get(id.0 as usize)?.as_ref()
    }
}

enum Role {
    /// Shell surface without `xdg_wm_base`, or a sub-surface whose parent was
    /// already gone.
    Bare,
    Sub(WlSubsurface),
    Shell {
        xdg: XdgSurface,
        toplevel: XdgToplevel,
    },
}

struct SurfaceObjects {
    id: SurfaceId,
    surface: WlSurface,
    role: Role,
}

/// Issues protocol requests for the surfaces of one session.
///
/// Objects are created on the [`WaylandState`] queue and carry their
/// [`SurfaceId`] as user data, so `Dispatch` can route events back.
pub struct WaylandProtocol {
    qh: QueueHandle<WaylandState>,
    compositor: WlCompositor,
    subcompositor: WlSubcompositor,
    wm_base: Option<XdgWmBase>,
    surfaces: Vec<Option<SurfaceObjects>>,
    buffers: Rc<RefCell<BufferTable>>,
}

impl fmt::Debug for WaylandProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaylandProtocol")
            .field("shell", &self.wm_base.is_some())
            .field("surfaces", &self.surfaces.iter().flatten().count())
            .finish_non_exhaustive()
    }
}

impl WaylandProtocol {
    pub(crate) fn new(
        qh: QueueHandle<WaylandState>,
        compositor: WlCompositor,
        subcompositor: WlSubcompositor,
        wm_base: Option<XdgWmBase>,
        buffers: Rc<RefCell<BufferTable>>,
    ) -> Self {
        Self {
            qh,
            compositor,
            subcompositor,
            wm_base,
            surfaces: Vec::new(),
            buffers,
        }
    }

    fn objects(&self, id: SurfaceId) -> Option<&SurfaceObjects> {
        self.surfaces
            .get(id.index() as usize)?
            .as_ref()
            .filter(|o| o.id == id)
    }

    fn wl_surface(&self, id: SurfaceId) -> Option<&WlSurface> {
        self.objects(id).map(|o| &o.surface)
    }

    fn subsurface(&self, id: SurfaceId) -> Option<&WlSubsurface> {
        match &self.objects(id)?.role {
            Role::Sub(sub) => Some(sub),
            _ => None,
        }
    }

    fn shell_role(&self, surface: &WlSurface, id: SurfaceId) -> Role {
        let Some(wm_base) = &self.wm_base else {
            tracing::warn!(?id, "xdg_wm_base is unavailable, shell surface stays unmapped");
            return Role::Bare;
        };
        let xdg = wm_base.get_xdg_surface(surface, &self.qh, id);
        let toplevel = xdg.get_toplevel(&self.qh, id);
        // The first commit without a buffer asks for the initial configure.
        surface.commit();
        Role::Shell { xdg, toplevel }
    }
}

/// Converts a logical rectangle to the integer `x, y, width, height` the
/// protocol expects, rounding outwards.
#[expect(
    clippy::cast_possible_truncation,
    reason = "surface coordinates fit comfortably in i32"
)]
fn wire_rect(rect: Rect) -> (i32, i32, i32, i32) {
    let rect = rect.abs().expand();
    (
        rect.x0 as i32,
        rect.y0 as i32,
        rect.width() as i32,
        rect.height() as i32,
    )
}

impl Protocol for WaylandProtocol {
    fn create_surface(&mut self, id: SurfaceId, role: SurfaceRole) {
        let surface = self.compositor.create_surface(&self.qh, id);
        let role = match role {
            SurfaceRole::Shell => self.shell_role(&surface, id),
            SurfaceRole::Sub { parent } => match self.wl_surface(parent) {
                Some(parent) => Role::Sub(self.subcompositor.get_subsurface(
                    &surface,
                    parent,
                    &self.qh,
                    (),
                )),
                None => Role::Bare,
            },
        };
        let slot = id.index() as usize;
        if self.surfaces.len() <= slot {
            self.surfaces.resize_with(slot + 1, || None);
        }
        self.surfaces[slot] = Some(SurfaceObjects { id, surface, role });
    }

    fn destroy_surface(&mut self, id: SurfaceId) {
        if self.objects(id).is_none() {
            return;
        }
        let Some(objects) = self.surfaces[id.index() as usize].take() else {
            return;
        };
        match objects.role {
            Role::Bare => {}
            Role::Sub(sub) => sub.destroy(),
            Role::Shell { xdg, toplevel } => {
                toplevel.destroy();
                xdg.destroy();
            }
        }
        objects.surface.destroy();
    }

    fn attach(&mut self, id: SurfaceId, buffer: Option<BufferId>, x: i32, y: i32) {
        let Some(surface) = self.wl_surface(id) else {
            return;
        };
        let buffers = self.buffers.borrow();
        let buffer = buffer.and_then(|b| buffers.get(b));
        if surface.version() >= 5 {
            surface.attach(buffer, 0, 0);
            if x != 0 || y != 0 {
                surface.offset(x, y);
            }
        } else {
            surface.attach(buffer, x, y);
        }
    }

    fn damage(&mut self, id: SurfaceId, rect: Rect) {
        if let Some(surface) = self.wl_surface(id) {
            let (x, y, width, height) = wire_rect(rect);
            surface.damage(x, y, width, height);
        }
    }

    fn commit(&mut self, id: SurfaceId) {
        if let Some(surface) = self.wl_surface(id) {
            surface.commit();
        }
    }

    fn set_input_region(&mut self, id: SurfaceId, region: Option<Rect>) {
        let Some(surface) = self.wl_surface(id) else {
            return;
        };
        match region {
            Some(rect) => {
                let (x, y, width, height) = wire_rect(rect);
                let region = self.compositor.create_region(&self.qh, ());
                region.add(x, y, width, height);
                surface.set_input_region(Some(&region));
                region.destroy();
            }
            None => surface.set_input_region(None),
        }
    }

    fn set_position(&mut self, id: SurfaceId, x: i32, y: i32) {
        if let Some(sub) = self.subsurface(id) {
            sub.set_position(x, y);
        }
    }

    fn place_above(&mut self, id: SurfaceId, sibling: SurfaceId) {
        if let (Some(sub), Some(sibling)) = (self.subsurface(id), self.wl_surface(sibling)) {
            sub.place_above(sibling);
        }
    }

    fn place_below(&mut self, id: SurfaceId, sibling: SurfaceId) {
        if let (Some(sub), Some(sibling)) = (self.subsurface(id), self.wl_surface(sibling)) {
            sub.place_below(sibling);
        }
    }

    fn request_frame(&mut self, id: SurfaceId) {
        if let Some(surface) = self.wl_surface(id) {
            surface.frame(&self.qh, id);
        }
    }

    fn set_title(&mut self, id: SurfaceId, title: &str) {
        if let Some(Role::Shell { toplevel, .. }) = self.objects(id).map(|o| &o.role) {
            toplevel.set_title(title.to_owned());
        }
    }
}
