// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Timestamps
//! are printed in microseconds.

use std::io::Write;

use lamina_core::time::HostTime;
use lamina_core::trace::{
    ChainChange, ChainEvent, IterationSummary, PhaseBeginEvent, PhaseEndEvent, PhaseKind,
    RedrawEvent, SurfaceChange, SurfaceEvent, TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the sink and returns its writer.
    pub fn into_writer(self) -> W {
        self.writer
    }
}

fn us(t: HostTime) -> f64 {
    t.nanos() as f64 / 1000.0
}

fn phase_name(phase: PhaseKind) -> &'static str {
    match phase {
        PhaseKind::Idle => "idle",
        PhaseKind::Commit => "commit",
        PhaseKind::Dispatch => "dispatch",
        PhaseKind::Flush => "flush",
        PhaseKind::Wait => "wait",
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[phase:begin] iter={} {} at {:.1}µs",
            e.iteration,
            phase_name(e.phase),
            us(e.timestamp),
        );
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        let _ = writeln!(
            self.writer,
            "[phase:end] iter={} {} at {:.1}µs",
            e.iteration,
            phase_name(e.phase),
            us(e.timestamp),
        );
    }

    fn on_redraw(&mut self, e: &RedrawEvent) {
        let surface = e
            .surface_index
            .map_or_else(|| "-".to_owned(), |s| s.to_string());
        let damage = e.damage.map_or_else(
            || "none".to_owned(),
            |d| format!("{}x{}+{}+{}", d.width, d.height, d.x, d.y),
        );
        let _ = writeln!(
            self.writer,
            "[redraw] iter={} view={} surface={surface} geometry={} damage={damage}",
            e.iteration,
            e.view_index,
            if e.geometry_changed { "changed" } else { "same" },
        );
    }

    fn on_chain_change(&mut self, e: &ChainEvent) {
        let change = match e.change {
            ChainChange::Entered => "enter",
            ChainChange::Left => "leave",
        };
        let _ = writeln!(
            self.writer,
            "[chain:{change}] iter={} pointer={} view={} depth={}",
            e.iteration, e.pointer, e.view_index, e.depth,
        );
    }

    fn on_surface_change(&mut self, e: &SurfaceEvent) {
        let _ = match e.change {
            SurfaceChange::FrameDone { serial } => writeln!(
                self.writer,
                "[surface] iter={} surface={} frame-done serial={serial}",
                e.iteration, e.surface_index,
            ),
            change => writeln!(
                self.writer,
                "[surface] iter={} surface={} {}",
                e.iteration,
                e.surface_index,
                format!("{change:?}").to_lowercase(),
            ),
        };
    }

    fn on_iteration(&mut self, s: &IterationSummary) {
        let _ = writeln!(
            self.writer,
            "[iteration] iter={} took={:.1}µs idle={} commit={} redraws={} commits={}",
            s.iteration,
            s.finished.saturating_duration_since(s.started).as_nanos() as f64 / 1000.0,
            s.idle_tasks,
            s.commit_tasks,
            s.redraws,
            s.commits,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(sink: PrettyPrintSink<Vec<u8>>) -> String {
        String::from_utf8(sink.into_writer()).unwrap()
    }

    #[test]
    fn pretty_print_phases() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_phase_begin(&PhaseBeginEvent {
            iteration: 3,
            phase: PhaseKind::Commit,
            timestamp: HostTime(1_500),
        });
        let output = text(sink);
        assert!(output.contains("[phase:begin]"), "got: {output}");
        assert!(output.contains("iter=3 commit at 1.5µs"), "got: {output}");
    }

    #[test]
    fn pretty_print_surface_and_chain() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_surface_change(&SurfaceEvent {
            iteration: 1,
            surface_index: 2,
            change: SurfaceChange::Restacked,
        });
        sink.on_chain_change(&ChainEvent {
            iteration: 1,
            pointer: 0,
            view_index: 9,
            change: ChainChange::Left,
            depth: 1,
        });
        let output = text(sink);
        let lines: Vec<_> = output.lines().collect();
        assert_eq!(lines.len(), 2, "got: {output}");
        assert!(lines[0].ends_with("restacked"), "got: {output}");
        assert!(lines[1].starts_with("[chain:leave]"), "got: {output}");
    }
}
