//! Chronological merge of per-track note streams.

use std::iter::Peekable;
use std::vec::IntoIter;

use ls_ir::{RawEvent, Tick};

/// Keep only note events of each track, re-basing deltas so that each
/// kept event's delta is measured from the previous kept event.
///
/// Tracks without notes are omitted. Absolute ticks are preserved.
pub fn note_streams(tracks: &[Vec<RawEvent>]) -> Vec<Vec<RawEvent>> {
    tracks
        .iter()
        .map(|track| {
            let mut carry: u32 = 0;
            track
                .iter()
                .filter_map(|event| {
                    let delta = carry.saturating_add(event.delta);
                    if event.is_note() {
                        carry = 0;
                        Some(RawEvent {
                            delta,
                            ..event.clone()
                        })
                    } else {
                        carry = delta;
                        None
                    }
                })
                .collect::<Vec<_>>()
        })
        .filter(|stream| !stream.is_empty())
        .collect()
}

/// Read head over one delta-time stream.
struct StreamCursor {
    events: Peekable<IntoIter<RawEvent>>,
    /// Absolute tick of the last event taken
    tick: Tick,
}

impl StreamCursor {
    fn new(events: Vec<RawEvent>) -> Self {
        Self {
            events: events.into_iter().peekable(),
            tick: 0,
        }
    }

    /// Absolute tick of the head event.
    fn peek_tick(&mut self) -> Option<Tick> {
        let tick = self.tick;
        self.events.peek().map(|e| tick + e.delta as Tick)
    }

    fn take(&mut self) -> Option<RawEvent> {
        let event = self.events.next()?;
        self.tick += event.delta as Tick;
        Some(event)
    }
}

/// Merge several delta-time streams into one chronological note stream.
///
/// The head with the smallest absolute tick is taken next; ties go to the
/// stream with the lowest index, so each stream keeps its internal order.
/// Only note events are emitted. Output deltas are relative to the
/// previously emitted event, so a dropped event never shifts the
/// absolute tick of a later one.
pub fn merge_note_streams(streams: Vec<Vec<RawEvent>>) -> Vec<RawEvent> {
    let total = streams.iter().map(Vec::len).sum();
    let mut cursors: Vec<StreamCursor> = streams.into_iter().map(StreamCursor::new).collect();
    let mut merged = Vec::with_capacity(total);
    let mut last_emitted: Tick = 0;

    loop {
        let mut next: Option<(usize, Tick)> = None;
        for (index, cursor) in cursors.iter_mut().enumerate() {
            if let Some(tick) = cursor.peek_tick() {
                if next.map_or(true, |(_, best)| tick < best) {
                    next = Some((index, tick));
                }
            }
        }
        let Some((index, tick)) = next else {
            break;
        };
        let Some(mut event) = cursors[index].take() else {
            break;
        };
        if !event.is_note() {
            continue;
        }
        event.delta = u32::try_from(tick - last_emitted).unwrap_or(u32::MAX);
        last_emitted = tick;
        merged.push(event);
    }

    tracing::debug!(events = merged.len(), "merged note streams");
    merged
}
