// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The iteration driver shared by every backend.
//!
//! A backend implements [`EventSource`] on top of its connection and file
//! descriptors; [`run`] then repeats one fixed iteration until the session
//! stops running:
//!
//! 1. drain the idle queue (redraw flush, user idle tasks),
//! 2. drain the commit queue (surface commits),
//! 3. dispatch protocol events that are already buffered,
//! 4. stop if [`Session::exit`] was called,
//! 5. flush outgoing requests, remembering whether the socket was full,
//! 6. block until the connection (or a wake source) is ready.
//!
//! Idle work always finishes before commit work, and both finish before the
//! loop can block.

use crate::session::Session;
use crate::time::HostTime;
use crate::trace::PhaseKind;

/// Outcome of [`EventSource::flush`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Flush {
    /// Every queued request was written.
    Done,
    /// The socket is full; wait for write readiness and flush again.
    WouldBlock,
}

/// The backend half of the event loop.
pub trait EventSource {
    /// Fatal I/O error type.
    type Error;

    /// Returns the session this source feeds.
    fn session(&mut self) -> &mut Session;

    /// Dispatches events already read from the connection, without blocking.
    fn dispatch_pending(&mut self) -> Result<(), Self::Error>;

    /// Writes queued requests.
    fn flush(&mut self) -> Result<Flush, Self::Error>;

    /// Blocks until the connection is readable (or writable, if `want_write`),
    /// reading whatever arrived.
    fn wait(&mut self, want_write: bool) -> Result<(), Self::Error>;

    /// Returns the current host time.
    fn now(&self) -> HostTime;
}

/// Runs iterations until the session stops, then tears it down.
///
/// # Errors
///
/// Returns the first error from [`EventSource::dispatch_pending`],
/// [`EventSource::flush`] or [`EventSource::wait`]. The session has been told
/// to exit and torn down by then.
pub fn run<S: EventSource>(source: &mut S) -> Result<(), S::Error> {
    let result = drive(source);
    let session = source.session();
    if result.is_err() {
        session.exit();
    }
    session.teardown();
    result
}

fn drive<S: EventSource>(source: &mut S) -> Result<(), S::Error> {
    while source.session().is_running() {
        let started = source.now();
        source.session().begin_iteration(started);

        phase(source, PhaseKind::Idle, |s| s.session().run_idle_tasks());
        phase(source, PhaseKind::Commit, |s| s.session().run_commit_tasks());
        phase(source, PhaseKind::Dispatch, S::dispatch_pending)?;

        if !source.session().is_running() {
            let finished = source.now();
            source.session().finish_iteration(finished);
            break;
        }

        let want_write = match phase(source, PhaseKind::Flush, S::flush)? {
            Flush::Done => false,
            Flush::WouldBlock => true,
        };
        phase(source, PhaseKind::Wait, |s| s.wait(want_write))?;

        let finished = source.now();
        source.session().finish_iteration(finished);
    }
    Ok(())
}

fn phase<S: EventSource, R>(
    source: &mut S,
    kind: PhaseKind,
    f: impl FnOnce(&mut S) -> R,
) -> R {
    let begin = source.now();
    source.session().phase_begin(kind, begin);
    let result = f(source);
    let end = source.now();
    source.session().phase_end(kind, end);
    result
}
