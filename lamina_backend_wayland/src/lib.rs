// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Wayland backend for lamina.
//!
//! This crate binds a [`Session`](lamina_core::session::Session) to a live
//! compositor connection:
//!
//! - [`WaylandProtocol`] issues `wl_surface`, `wl_subsurface` and
//!   `xdg_toplevel` requests for the session's surfaces.
//! - `Dispatch` implementations on [`WaylandState`] feed pointer, keyboard,
//!   output, frame-callback and shell events back into the session.
//! - [`EventLoop`] multiplexes the connection and a wake `eventfd` with epoll
//!   and drives [`lamina_core::event_loop::run`].
//!
//! ```no_run
//! use lamina_backend_wayland::{EventLoop, LoopConfig};
//! use lamina_core::event_loop::EventSource;
//! use lamina_core::protocol::SurfaceRole;
//!
//! let mut event_loop = EventLoop::new(LoopConfig::default())?;
//! let _window = event_loop.session().create_surface(SurfaceRole::Shell);
//! event_loop.run()?;
//! # Ok::<(), lamina_backend_wayland::LoopError>(())
//! ```

mod config;
mod error;
mod event_loop;
mod protocol;
mod state;
mod time;

pub use config::LoopConfig;
pub use error::LoopError;
pub use event_loop::EventLoop;
pub use protocol::WaylandProtocol;
pub use state::WaylandState;
pub use time::now;
