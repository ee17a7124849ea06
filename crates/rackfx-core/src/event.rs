//! Sample-accurate control events.
//!
//! An [`EventList`] carries the events for one processing block, kept sorted
//! by `sample_offset`. The chain splits each block at event offsets so a
//! parameter change lands exactly on its sample.

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use crate::param_info::ParamId;

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EventKind {
    /// Note started.
    NoteOn {
        /// MIDI note number.
        note: u8,
        /// Velocity in `0.0..=1.0`.
        velocity: f32,
    },
    /// Note released.
    NoteOff {
        /// MIDI note number.
        note: u8,
    },
    /// Parameter change addressed by stable id. Units that do not own the
    /// id ignore it, so one list can serve a whole chain.
    ParamChange {
        /// Stable id of the target parameter.
        param: ParamId,
        /// New plain value (clamped by the receiver).
        value: f32,
    },
}

/// An event positioned inside the current block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlEvent {
    /// Offset from the block start, in samples.
    pub sample_offset: usize,
    /// Payload.
    pub kind: EventKind,
}

impl ControlEvent {
    /// Creates an event at `sample_offset`.
    pub const fn new(sample_offset: usize, kind: EventKind) -> Self {
        Self {
            sample_offset,
            kind,
        }
    }
}

/// Block-scoped event queue sorted by offset.
///
/// Capacity is reserved up front; [`push`](Self::push) refuses events once
/// full rather than growing on the audio thread.
#[derive(Debug, Clone, Default)]
pub struct EventList {
    events: Vec<ControlEvent>,
}

impl EventList {
    /// Empty list with no capacity.
    pub const fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Empty list able to hold `capacity` events.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: Vec::with_capacity(capacity),
        }
    }

    /// Inserts an event, keeping offset order. Events with equal offsets keep
    /// insertion order.
    ///
    /// Returns `false` when the list is at capacity.
    pub fn push(&mut self, event: ControlEvent) -> bool {
        if self.events.len() == self.events.capacity() {
            return false;
        }
        let pos = self
            .events
            .partition_point(|e| e.sample_offset <= event.sample_offset);
        self.events.insert(pos, event);
        true
    }

    /// Removes all events, keeping capacity.
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Number of queued events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events in offset order.
    pub fn as_slice(&self) -> &[ControlEvent] {
        &self.events
    }

    /// Iterator over events in offset order.
    pub fn iter(&self) -> core::slice::Iter<'_, ControlEvent> {
        self.events.iter()
    }
}

impl<'a> IntoIterator for &'a EventList {
    type Item = &'a ControlEvent;
    type IntoIter = core::slice::Iter<'a, ControlEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}
