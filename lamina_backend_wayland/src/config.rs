// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Event loop configuration.

/// Settings for [`EventLoop::new`](crate::EventLoop::new).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoopConfig {
    /// Number of epoll events read per wait.
    pub event_capacity: usize,
    /// Install a `SIGINT` handler that stops the loop.
    pub handle_sigint: bool,
}

impl LoopConfig {
    /// Returns the default configuration.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            event_capacity: 32,
            handle_sigint: true,
        }
    }
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::LoopConfig;

    #[test]
    fn default_matches_const_constructor() {
        assert_eq!(LoopConfig::default(), LoopConfig::new());
        assert_eq!(LoopConfig::new().event_capacity, 32);
        assert!(LoopConfig::new().handle_sigint);
    }
}
