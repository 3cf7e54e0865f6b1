// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][format] JSON to the given writer.
//!
//! Loop phases become duration events on thread 0, pointer chain changes are
//! instants on thread `1 + pointer`, and surface changes are instants on a
//! per-surface process.
//!
//! [format]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use lamina_core::time::HostTime;

use crate::recorder::{RecordedEvent, decode};

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
///
/// Instant events carry no timestamp of their own, so they are placed at the
/// most recent phase boundary seen before them.
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();
    let mut last_ts = 0.0;

    for recorded in decode(bytes) {
        match recorded {
            RecordedEvent::PhaseBegin(e) => {
                last_ts = us(e.timestamp);
                events.push(json!({
                    "ph": "B",
                    "name": format!("{:?}", e.phase),
                    "cat": "Loop",
                    "ts": last_ts,
                    "pid": 0,
                    "tid": 0,
                    "args": {
                        "iteration": e.iteration,
                    }
                }));
            }
            RecordedEvent::PhaseEnd(e) => {
                last_ts = us(e.timestamp);
                events.push(json!({
                    "ph": "E",
                    "name": format!("{:?}", e.phase),
                    "cat": "Loop",
                    "ts": last_ts,
                    "pid": 0,
                    "tid": 0,
                    "args": {
                        "iteration": e.iteration,
                    }
                }));
            }
            RecordedEvent::Redraw(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "Redraw",
                    "cat": "Redraw",
                    "ts": last_ts,
                    "pid": 0,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "iteration": e.iteration,
                        "view": e.view_index,
                        "surface": e.surface_index,
                        "geometry_changed": e.geometry_changed,
                        "damage": e.damage.map(|d| json!({
                            "x": d.x,
                            "y": d.y,
                            "width": d.width,
                            "height": d.height,
                        })),
                    }
                }));
            }
            RecordedEvent::Chain(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": format!("{:?}", e.change),
                    "cat": "Pointer",
                    "ts": last_ts,
                    "pid": 0,
                    "tid": 1 + e.pointer,
                    "s": "t",
                    "args": {
                        "iteration": e.iteration,
                        "view": e.view_index,
                        "depth": e.depth,
                    }
                }));
            }
            RecordedEvent::Surface(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": format!("{:?}", e.change),
                    "cat": "Surface",
                    "ts": last_ts,
                    "pid": 1 + e.surface_index,
                    "tid": 0,
                    "s": "p",
                    "args": {
                        "iteration": e.iteration,
                    }
                }));
            }
            RecordedEvent::Iteration(s) => {
                events.push(json!({
                    "ph": "i",
                    "name": "Iteration",
                    "cat": "Summary",
                    "ts": us(s.finished),
                    "pid": 0,
                    "tid": 0,
                    "s": "g",
                    "args": {
                        "iteration": s.iteration,
                        "duration_us": us(s.finished) - us(s.started),
                        "idle_tasks": s.idle_tasks,
                        "commit_tasks": s.commit_tasks,
                        "redraws": s.redraws,
                        "commits": s.commits,
                    }
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn us(t: HostTime) -> f64 {
    t.nanos() as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::RecorderSink;
    use lamina_core::trace::{
        PhaseBeginEvent, PhaseEndEvent, PhaseKind, SurfaceChange, SurfaceEvent, TraceSink,
    };

    #[test]
    fn export_produces_valid_json() {
        let mut rec = RecorderSink::new();
        rec.on_phase_begin(&PhaseBeginEvent {
            iteration: 0,
            phase: PhaseKind::Commit,
            timestamp: HostTime(1_000_000),
        });
        rec.on_surface_change(&SurfaceEvent {
            iteration: 0,
            surface_index: 4,
            change: SurfaceChange::Committed,
        });
        rec.on_phase_end(&PhaseEndEvent {
            iteration: 0,
            phase: PhaseKind::Commit,
            timestamp: HostTime(1_000_100),
        });

        let mut out = Vec::new();
        export(rec.as_bytes(), &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();

        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        assert_eq!(parsed.len(), 3);

        assert_eq!(parsed[0]["ph"], "B");
        assert_eq!(parsed[0]["name"], "Commit");

        // The instant inherits the preceding phase timestamp.
        assert_eq!(parsed[1]["ph"], "i");
        assert_eq!(parsed[1]["name"], "Committed");
        assert_eq!(parsed[1]["pid"], 5);
        assert_eq!(parsed[1]["ts"], 1000.0);

        assert_eq!(parsed[2]["ph"], "E");
        assert_eq!(parsed[2]["name"], "Commit");
    }

    #[test]
    fn export_empty_recording() {
        let mut out = Vec::new();
        export(&[], &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();
        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        assert!(parsed.is_empty());
    }
}
