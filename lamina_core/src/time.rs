// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Monotonic timestamps for loop phases and trace events.
//!
//! [`HostTime`] is a point on the backend's monotonic clock, in nanoseconds.
//! Core never reads a clock itself; the
//! [`EventSource`](crate::event_loop::EventSource) supplies the current time.

use core::fmt;
use core::time::Duration;

/// A point in time on a monotonic clock, in nanoseconds.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct HostTime(pub u64);

impl HostTime {
    /// Creates a timestamp from a nanosecond count.
    #[inline]
    #[must_use]
    pub const fn from_nanos(nanos: u64) -> Self {
        Self(nanos)
    }

    /// Returns the raw nanosecond value.
    #[inline]
    #[must_use]
    pub const fn nanos(self) -> u64 {
        self.0
    }

    /// Returns the time elapsed since `earlier`, or zero if `earlier` is
    /// after `self`.
    #[inline]
    #[must_use]
    pub const fn saturating_duration_since(self, earlier: Self) -> Duration {
        Duration::from_nanos(self.0.saturating_sub(earlier.0))
    }

    /// Returns this timestamp in microseconds, truncating.
    #[inline]
    #[must_use]
    pub const fn micros(self) -> u64 {
        self.0 / 1_000
    }
}

impl fmt::Debug for HostTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostTime({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_since_saturates() {
        let early = HostTime::from_nanos(1_000);
        let late = HostTime::from_nanos(4_500);
        assert_eq!(
            late.saturating_duration_since(early),
            Duration::from_nanos(3_500)
        );
        assert_eq!(early.saturating_duration_since(late), Duration::ZERO);
    }

    #[test]
    fn micros_truncates() {
        assert_eq!(HostTime::from_nanos(2_999).micros(), 2);
        assert_eq!(HostTime(0).micros(), 0);
    }

    #[test]
    fn ordering_follows_ticks() {
        assert!(HostTime(5) < HostTime(6));
        assert_eq!(alloc::format!("{:?}", HostTime(42)), "HostTime(42)");
    }
}
