// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The epoll-driven event loop.
//!
//! [`EventLoop`] owns the compositor connection, the backend event queue and
//! the [`Session`] (inside [`WaylandState`]). Two descriptors are watched:
//!
//! | Token | Descriptor | Meaning |
//! |---|---|---|
//! | `CONNECTION` | the Wayland socket | events to read, or room to flush |
//! | `WAKE` | an `eventfd` | an interrupt asked the loop to stop |
//!
//! Reads go through `prepare_read` so events are only pulled off the socket
//! while no other reader holds the queue.

use std::cell::RefCell;
use std::io::ErrorKind;
use std::os::fd::OwnedFd;
use std::rc::Rc;
use std::sync::Arc;

use lamina_core::event_loop::{self, EventSource, Flush};
use lamina_core::protocol::BufferId;
use lamina_core::session::Session;
use lamina_core::time::HostTime;
use rustix::event::epoll::{self, EventData, EventFlags};
use rustix::event::{EventfdFlags, eventfd};
use rustix::io::Errno;
use wayland_client::backend::WaylandError;
use wayland_client::globals::registry_queue_init;
use wayland_client::protocol::{wl_buffer, wl_compositor, wl_seat, wl_subcompositor};
use wayland_client::{Connection, EventQueue, QueueHandle};
use wayland_protocols::xdg::shell::client::xdg_wm_base;

use crate::config::LoopConfig;
use crate::error::LoopError;
use crate::protocol::{BufferTable, WaylandProtocol};
use crate::state::WaylandState;

const CONNECTION: u64 = 0;
const WAKE: u64 = 1;

/// Backend-owned event loop for one compositor connection.
#[derive(Debug)]
pub struct EventLoop {
    connection: Connection,
    queue: EventQueue<WaylandState>,
    state: WaylandState,
    seat: Option<wl_seat::WlSeat>,
    buffers: Rc<RefCell<BufferTable>>,
    epoll: OwnedFd,
    wake: Arc<OwnedFd>,
    events: Vec<epoll::Event>,
    write_armed: bool,
}

impl EventLoop {
    /// Connects to the compositor named by the environment and binds the
    /// globals the session needs.
    ///
    /// `wl_compositor` and `wl_subcompositor` are required. Without
    /// `xdg_wm_base` shell surfaces stay bare; without `wl_seat` no input
    /// arrives.
    ///
    /// # Errors
    ///
    /// Fails if the connection, the registry roundtrip, a required bind, or
    /// the epoll setup fails.
    pub fn new(config: LoopConfig) -> Result<Self, LoopError> {
        let connection = Connection::connect_to_env()?;
        let (globals, queue) = registry_queue_init::<WaylandState>(&connection)?;
        let qh = queue.handle();

        let compositor: wl_compositor::WlCompositor = globals.bind(&qh, 1..=6, ())?;
        let subcompositor: wl_subcompositor::WlSubcompositor = globals.bind(&qh, 1..=1, ())?;
        let wm_base: Option<xdg_wm_base::XdgWmBase> = globals.bind(&qh, 1..=6, ()).ok();
        if wm_base.is_none() {
            tracing::warn!("compositor lacks xdg_wm_base; shell surfaces will not be mapped");
        }
        let seat: Option<wl_seat::WlSeat> = globals.bind(&qh, 1..=7, ()).ok();
        if seat.is_none() {
            tracing::info!("compositor has no wl_seat; input is disabled");
        }

        let buffers = Rc::new(RefCell::new(BufferTable::default()));
        let protocol =
            WaylandProtocol::new(qh.clone(), compositor, subcompositor, wm_base, buffers.clone());
        let mut state = WaylandState::new(Session::new(protocol));

        let outputs: Vec<_> = globals
            .contents()
            .clone_list()
            .into_iter()
            .filter(|g| g.interface == "wl_output")
            .collect();
        for global in outputs {
            state.bind_output(globals.registry(), global.name, global.version, &qh);
        }

        let epoll = epoll::create(epoll::CreateFlags::CLOEXEC)?;
        epoll::add(
            &epoll,
            connection.backend().poll_fd(),
            EventData::new_u64(CONNECTION),
            EventFlags::IN,
        )?;
        let wake = Arc::new(eventfd(0, EventfdFlags::CLOEXEC | EventfdFlags::NONBLOCK)?);
        epoll::add(&epoll, &*wake, EventData::new_u64(WAKE), EventFlags::IN)?;

        if config.handle_sigint {
            let wake = Arc::clone(&wake);
            ctrlc::set_handler(move || {
                // A full counter already means a wake is pending.
                let _ = rustix::io::write(&*wake, &1_u64.to_ne_bytes());
            })?;
        }

        tracing::debug!(
            outputs = state.session().outputs().len(),
            seat = seat.is_some(),
            "event loop ready"
        );
        Ok(Self {
            connection,
            queue,
            state,
            seat,
            buffers,
            epoll,
            wake,
            events: Vec::with_capacity(config.event_capacity.max(1)),
            write_armed: false,
        })
    }

    /// Runs the session until it exits, then tears it down and flushes the
    /// resulting destroy requests.
    ///
    /// # Errors
    ///
    /// Returns the first fatal connection or system-call error.
    pub fn run(&mut self) -> Result<(), LoopError> {
        let result = event_loop::run(self);
        if let Err(err) = self.connection.flush() {
            tracing::debug!(%err, "final flush failed");
        }
        result
    }

    /// Makes a client buffer attachable through
    /// [`Session::attach`](lamina_core::session::Session::attach).
    pub fn register_buffer(&mut self, buffer: wl_buffer::WlBuffer) -> BufferId {
        self.buffers.borrow_mut().insert(buffer)
    }

    /// Forgets a registered buffer, returning it to the caller.
    pub fn unregister_buffer(&mut self, id: BufferId) -> Option<wl_buffer::WlBuffer> {
        self.buffers.borrow_mut().remove(id)
    }

    /// Returns the queue handle client objects (buffers, pools) must be
    /// created with.
    #[must_use]
    pub fn queue_handle(&self) -> QueueHandle<WaylandState> {
        self.queue.handle()
    }

    /// Returns the compositor connection.
    #[must_use]
    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Returns the backend state.
    #[must_use]
    pub fn state(&self) -> &WaylandState {
        &self.state
    }

    /// Returns whether the compositor advertised a seat.
    #[must_use]
    pub fn has_seat(&self) -> bool {
        self.seat.is_some()
    }

    fn arm_write(&mut self, want_write: bool) -> Result<(), LoopError> {
        if want_write == self.write_armed {
            return Ok(());
        }
        let flags = if want_write {
            EventFlags::IN | EventFlags::OUT
        } else {
            EventFlags::IN
        };
        epoll::modify(
            &self.epoll,
            self.connection.backend().poll_fd(),
            EventData::new_u64(CONNECTION),
            flags,
        )?;
        self.write_armed = want_write;
        Ok(())
    }

    fn drain_wake(&self) {
        let mut counter = [0_u8; 8];
        if let Err(err) = rustix::io::read(&*self.wake, &mut counter) {
            if err != Errno::AGAIN {
                tracing::warn!(%err, "failed to drain wake eventfd");
            }
        }
    }
}

impl EventSource for EventLoop {
    type Error = LoopError;

    fn session(&mut self) -> &mut Session {
        self.state.session_mut()
    }

    fn dispatch_pending(&mut self) -> Result<(), LoopError> {
        let dispatched = self.queue.dispatch_pending(&mut self.state)?;
        if dispatched > 0 {
            tracing::trace!(dispatched, "dispatched events");
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<Flush, LoopError> {
        match self.queue.flush() {
            Ok(()) => Ok(Flush::Done),
            Err(WaylandError::Io(err)) if err.kind() == ErrorKind::WouldBlock => {
                Ok(Flush::WouldBlock)
            }
            Err(err) => {
                tracing::error!(%err, "flush failed");
                Err(err.into())
            }
        }
    }

    fn wait(&mut self, want_write: bool) -> Result<(), LoopError> {
        self.arm_write(want_write)?;
        let Some(guard) = self.queue.prepare_read() else {
            // Events are already queued; dispatch them first.
            return Ok(());
        };

        self.events.clear();
        match epoll::wait(
            &self.epoll,
            rustix::buffer::spare_capacity(&mut self.events),
            None,
        ) {
            Ok(_) => {}
            Err(Errno::INTR) => return Ok(()),
            Err(err) => return Err(err.into()),
        }

        let mut readable = false;
        for event in &self.events {
            let flags = event.flags;
            match event.data.u64() {
                CONNECTION => {
                    if flags.intersects(EventFlags::ERR | EventFlags::HUP) {
                        tracing::error!(?flags, "compositor connection closed");
                        return Err(LoopError::Hangup);
                    }
                    readable |= flags.contains(EventFlags::IN);
                }
                WAKE => {
                    self.drain_wake();
                    tracing::info!("interrupted; stopping");
                    self.state.session_mut().exit();
                }
                other => tracing::warn!(token = other, "unexpected epoll token"),
            }
        }

        if readable {
            match guard.read() {
                Ok(_) => {}
                Err(WaylandError::Io(err)) if err.kind() == ErrorKind::WouldBlock => {}
                Err(err) => return Err(err.into()),
            }
        }
        Ok(())
    }

    fn now(&self) -> HostTime {
        crate::time::now()
    }
}
