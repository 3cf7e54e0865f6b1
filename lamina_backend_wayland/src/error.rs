// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Backend error type.

use wayland_client::backend::WaylandError;
use wayland_client::globals::{BindError, GlobalError};
use wayland_client::{ConnectError, DispatchError};

/// Fatal errors from setting up or running the [`EventLoop`](crate::EventLoop).
#[derive(Debug, thiserror::Error)]
pub enum LoopError {
    /// No compositor could be reached through the environment.
    #[error("failed to connect to the compositor")]
    Connect(#[from] ConnectError),
    /// The initial registry roundtrip failed.
    #[error("failed to read the compositor globals")]
    Global(#[from] GlobalError),
    /// A required global is missing or too old.
    #[error("a required global is unavailable")]
    Bind(#[from] BindError),
    /// An event handler failed.
    #[error("failed to dispatch compositor events")]
    Dispatch(#[from] DispatchError),
    /// Reading from or writing to the connection failed.
    #[error("compositor connection error")]
    Wayland(#[from] WaylandError),
    /// An epoll or eventfd call failed.
    #[error("system call failed")]
    Io(#[from] rustix::io::Errno),
    /// The compositor closed the connection.
    #[error("the compositor hung up")]
    Hangup,
    /// The `SIGINT` handler could not be installed.
    #[error("failed to install the interrupt handler")]
    Signal(#[from] ctrlc::Error),
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use super::LoopError;

    #[test]
    fn io_errors_keep_their_source() {
        let err = LoopError::from(rustix::io::Errno::BADF);
        assert_eq!(err.to_string(), "system call failed");
        assert!(err.source().is_some());
        assert!(LoopError::Hangup.source().is_none());
    }
}
