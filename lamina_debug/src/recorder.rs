// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as fixed-size little-endian records. [`decode`] reads them back
//! as an iterator of [`RecordedEvent`].

use lamina_core::time::HostTime;
use lamina_core::trace::{
    ChainChange, ChainEvent, DamageRect, IterationSummary, PhaseBeginEvent, PhaseEndEvent,
    PhaseKind, RedrawEvent, SurfaceChange, SurfaceEvent, TraceSink,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_PHASE_BEGIN: u8 = 1;
const TAG_PHASE_END: u8 = 2;
const TAG_REDRAW: u8 = 3;
const TAG_CHAIN: u8 = 4;
const TAG_SURFACE: u8 = 5;
const TAG_ITERATION: u8 = 6;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_i32(&mut self, v: i32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_option_u32(&mut self, v: Option<u32>) {
        self.write_u8(u8::from(v.is_some()));
        self.write_u32(v.unwrap_or(0));
    }

    fn write_damage(&mut self, v: Option<DamageRect>) {
        self.write_u8(u8::from(v.is_some()));
        let rect = v.unwrap_or(DamageRect {
            x: 0,
            y: 0,
            width: 0,
            height: 0,
        });
        self.write_i32(rect.x);
        self.write_i32(rect.y);
        self.write_u32(rect.width);
        self.write_u32(rect.height);
    }

    fn write_phase(&mut self, p: PhaseKind) {
        self.write_u8(match p {
            PhaseKind::Idle => 0,
            PhaseKind::Commit => 1,
            PhaseKind::Dispatch => 2,
            PhaseKind::Flush => 3,
            PhaseKind::Wait => 4,
        });
    }
}

impl TraceSink for RecorderSink {
    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        self.write_u8(TAG_PHASE_BEGIN);
        self.write_u64(e.iteration);
        self.write_phase(e.phase);
        self.write_u64(e.timestamp.nanos());
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        self.write_u8(TAG_PHASE_END);
        self.write_u64(e.iteration);
        self.write_phase(e.phase);
        self.write_u64(e.timestamp.nanos());
    }

    fn on_redraw(&mut self, e: &RedrawEvent) {
        self.write_u8(TAG_REDRAW);
        self.write_u64(e.iteration);
        self.write_u32(e.view_index);
        self.write_option_u32(e.surface_index);
        self.write_u8(u8::from(e.geometry_changed));
        self.write_damage(e.damage);
    }

    fn on_chain_change(&mut self, e: &ChainEvent) {
        self.write_u8(TAG_CHAIN);
        self.write_u64(e.iteration);
        self.write_u32(e.pointer);
        self.write_u32(e.view_index);
        self.write_u8(match e.change {
            ChainChange::Entered => 0,
            ChainChange::Left => 1,
        });
        self.write_u32(e.depth);
    }

    fn on_surface_change(&mut self, e: &SurfaceEvent) {
        self.write_u8(TAG_SURFACE);
        self.write_u64(e.iteration);
        self.write_u32(e.surface_index);
        let (kind, serial) = match e.change {
            SurfaceChange::Created => (0, 0),
            SurfaceChange::Destroyed => (1, 0),
            SurfaceChange::Restacked => (2, 0),
            SurfaceChange::Committed => (3, 0),
            SurfaceChange::FrameDone { serial } => (4, serial),
        };
        self.write_u8(kind);
        self.write_u32(serial);
    }

    fn on_iteration(&mut self, s: &IterationSummary) {
        self.write_u8(TAG_ITERATION);
        self.write_u64(s.iteration);
        self.write_u64(s.started.nanos());
        self.write_u64(s.finished.nanos());
        self.write_u32(s.idle_tasks);
        self.write_u32(s.commit_tasks);
        self.write_u32(s.redraws);
        self.write_u32(s.commits);
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug)]
pub enum RecordedEvent {
    /// A [`PhaseBeginEvent`].
    PhaseBegin(PhaseBeginEvent),
    /// A [`PhaseEndEvent`].
    PhaseEnd(PhaseEndEvent),
    /// A [`RedrawEvent`].
    Redraw(RedrawEvent),
    /// A [`ChainEvent`].
    Chain(ChainEvent),
    /// A [`SurfaceEvent`].
    Surface(SurfaceEvent),
    /// An [`IterationSummary`].
    Iteration(IterationSummary),
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn read_array<const N: usize>(&mut self) -> Option<[u8; N]> {
        let bytes = self.data.get(self.pos..self.pos + N)?.try_into().ok()?;
        self.pos += N;
        Some(bytes)
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.read_array::<1>().map(|[v]| v)
    }

    fn read_u32(&mut self) -> Option<u32> {
        self.read_array().map(u32::from_le_bytes)
    }

    fn read_i32(&mut self) -> Option<i32> {
        self.read_array().map(i32::from_le_bytes)
    }

    fn read_u64(&mut self) -> Option<u64> {
        self.read_array().map(u64::from_le_bytes)
    }

    fn read_option_u32(&mut self) -> Option<Option<u32>> {
        let present = self.read_u8()?;
        let val = self.read_u32()?;
        Some((present != 0).then_some(val))
    }

    fn read_damage(&mut self) -> Option<Option<DamageRect>> {
        let present = self.read_u8()?;
        let rect = DamageRect {
            x: self.read_i32()?,
            y: self.read_i32()?,
            width: self.read_u32()?,
            height: self.read_u32()?,
        };
        Some((present != 0).then_some(rect))
    }

    fn read_phase(&mut self) -> Option<PhaseKind> {
        Some(match self.read_u8()? {
            0 => PhaseKind::Idle,
            1 => PhaseKind::Commit,
            2 => PhaseKind::Dispatch,
            3 => PhaseKind::Flush,
            _ => PhaseKind::Wait,
        })
    }

    fn decode_phase_begin(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PhaseBegin(PhaseBeginEvent {
            iteration: self.read_u64()?,
            phase: self.read_phase()?,
            timestamp: HostTime(self.read_u64()?),
        }))
    }

    fn decode_phase_end(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PhaseEnd(PhaseEndEvent {
            iteration: self.read_u64()?,
            phase: self.read_phase()?,
            timestamp: HostTime(self.read_u64()?),
        }))
    }

    fn decode_redraw(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Redraw(RedrawEvent {
            iteration: self.read_u64()?,
            view_index: self.read_u32()?,
            surface_index: self.read_option_u32()?,
            geometry_changed: self.read_u8()? != 0,
            damage: self.read_damage()?,
        }))
    }

    fn decode_chain(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Chain(ChainEvent {
            iteration: self.read_u64()?,
            pointer: self.read_u32()?,
            view_index: self.read_u32()?,
            change: match self.read_u8()? {
                0 => ChainChange::Entered,
                _ => ChainChange::Left,
            },
            depth: self.read_u32()?,
        }))
    }

    fn decode_surface(&mut self) -> Option<RecordedEvent> {
        let iteration = self.read_u64()?;
        let surface_index = self.read_u32()?;
        let kind = self.read_u8()?;
        let serial = self.read_u32()?;
        let change = match kind {
            0 => SurfaceChange::Created,
            1 => SurfaceChange::Destroyed,
            2 => SurfaceChange::Restacked,
            3 => SurfaceChange::Committed,
            _ => SurfaceChange::FrameDone { serial },
        };
        Some(RecordedEvent::Surface(SurfaceEvent {
            iteration,
            surface_index,
            change,
        }))
    }

    fn decode_iteration(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Iteration(IterationSummary {
            iteration: self.read_u64()?,
            started: HostTime(self.read_u64()?),
            finished: HostTime(self.read_u64()?),
            idle_tasks: self.read_u32()?,
            commit_tasks: self.read_u32()?,
            redraws: self.read_u32()?,
            commits: self.read_u32()?,
        }))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        match self.read_u8()? {
            TAG_PHASE_BEGIN => self.decode_phase_begin(),
            TAG_PHASE_END => self.decode_phase_end(),
            TAG_REDRAW => self.decode_redraw(),
            TAG_CHAIN => self.decode_chain(),
            TAG_SURFACE => self.decode_surface(),
            TAG_ITERATION => self.decode_iteration(),
            // Unknown tag: the rest of the buffer cannot be framed.
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redraw_keeps_optional_fields() {
        let mut rec = RecorderSink::new();
        rec.on_redraw(&RedrawEvent {
            iteration: 4,
            view_index: 2,
            surface_index: Some(1),
            geometry_changed: true,
            damage: Some(DamageRect {
                x: -3,
                y: 5,
                width: 40,
                height: 10,
            }),
        });
        rec.on_redraw(&RedrawEvent {
            iteration: 4,
            view_index: 3,
            surface_index: None,
            geometry_changed: false,
            damage: None,
        });

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 2);
        match &events[0] {
            RecordedEvent::Redraw(e) => {
                assert_eq!(e.view_index, 2);
                assert_eq!(e.surface_index, Some(1));
                assert!(e.geometry_changed);
                assert_eq!(e.damage.map(|d| (d.x, d.width)), Some((-3, 40)));
            }
            other => panic!("expected Redraw, got {other:?}"),
        }
        match &events[1] {
            RecordedEvent::Redraw(e) => {
                assert_eq!(e.surface_index, None);
                assert_eq!(e.damage, None);
            }
            other => panic!("expected Redraw, got {other:?}"),
        }
    }

    #[test]
    fn surface_frame_done_keeps_serial() {
        let mut rec = RecorderSink::new();
        rec.on_surface_change(&SurfaceEvent {
            iteration: 1,
            surface_index: 7,
            change: SurfaceChange::FrameDone { serial: 99 },
        });
        rec.on_surface_change(&SurfaceEvent {
            iteration: 1,
            surface_index: 7,
            change: SurfaceChange::Committed,
        });

        let changes: Vec<_> = decode(rec.as_bytes())
            .map(|e| match e {
                RecordedEvent::Surface(s) => s.change,
                other => panic!("expected Surface, got {other:?}"),
            })
            .collect();
        assert_eq!(
            changes,
            vec![
                SurfaceChange::FrameDone { serial: 99 },
                SurfaceChange::Committed
            ]
        );
    }

    #[test]
    fn mixed_stream_decodes_in_order() {
        let mut rec = RecorderSink::new();
        rec.on_phase_begin(&PhaseBeginEvent {
            iteration: 0,
            phase: PhaseKind::Idle,
            timestamp: HostTime(1_000),
        });
        rec.on_chain_change(&ChainEvent {
            iteration: 0,
            pointer: 0,
            view_index: 5,
            change: ChainChange::Entered,
            depth: 2,
        });
        rec.on_phase_end(&PhaseEndEvent {
            iteration: 0,
            phase: PhaseKind::Idle,
            timestamp: HostTime(2_000),
        });
        rec.on_iteration(&IterationSummary {
            iteration: 0,
            started: HostTime(1_000),
            finished: HostTime(3_000),
            idle_tasks: 1,
            commit_tasks: 1,
            redraws: 2,
            commits: 1,
        });

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 4);
        assert!(matches!(events[0], RecordedEvent::PhaseBegin(_)));
        assert!(matches!(
            events[1],
            RecordedEvent::Chain(ChainEvent { depth: 2, .. })
        ));
        assert!(matches!(events[2], RecordedEvent::PhaseEnd(_)));
        match &events[3] {
            RecordedEvent::Iteration(s) => {
                assert_eq!(s.finished, HostTime(3_000));
                assert_eq!(s.redraws, 2);
            }
            other => panic!("expected Iteration, got {other:?}"),
        }
    }

    #[test]
    fn records_a_live_session() {
        use std::cell::RefCell;
        use std::rc::Rc;

        use lamina_core::protocol::{NullProtocol, SurfaceRole};
        use lamina_core::session::Session;
        use lamina_core::view::Widget;

        struct Blank;
        impl Widget for Blank {}

        let rec = Rc::new(RefCell::new(RecorderSink::new()));
        let mut session = Session::new(NullProtocol);
        session.set_trace_sink(Box::new(Rc::clone(&rec)));
        let holder = session.create_surface(SurfaceRole::Shell);
        let view = session.create_view(Blank);
        session.bind_surface(holder.id(), view);
        session.run_idle_tasks();
        session.clear_trace_sink();

        let events: Vec<_> = decode(rec.borrow().as_bytes()).collect();
        assert!(matches!(
            events[0],
            RecordedEvent::Surface(SurfaceEvent {
                change: SurfaceChange::Created,
                ..
            })
        ));
        assert!(matches!(
            events[1],
            RecordedEvent::Redraw(RedrawEvent {
                surface_index: Some(0),
                ..
            })
        ));
        assert!(session.release_surface(holder));
    }

    #[test]
    fn truncated_record_stops_decoding() {
        let mut rec = RecorderSink::new();
        rec.on_phase_begin(&PhaseBeginEvent {
            iteration: 0,
            phase: PhaseKind::Wait,
            timestamp: HostTime(1),
        });
        let bytes = rec.into_bytes();
        assert_eq!(decode(&bytes[..bytes.len() - 1]).count(), 0);
        assert_eq!(decode(&[]).count(), 0);
    }
}
