//! Wire-level (delta-time) events, as exchanged with the binary codec.

use serde::{Deserialize, Serialize};

use crate::event::{ChannelEvent, Lights, MetaEvent};

/// An event in a delta-time encoded stream.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    /// Ticks since the previous event in the same stream
    pub delta: u32,
    pub kind: RawEventKind,
}

impl RawEvent {
    pub fn new(delta: u32, kind: RawEventKind) -> Self {
        Self { delta, kind }
    }

    pub fn note_on(delta: u32, channel: u8, note: u8, velocity: u8) -> Self {
        Self::new(delta, RawEventKind::NoteOn(RawNote::new(channel, note, velocity)))
    }

    pub fn note_off(delta: u32, channel: u8, note: u8) -> Self {
        Self::new(delta, RawEventKind::NoteOff(RawNote::new(channel, note, 0)))
    }

    pub fn meta(delta: u32, meta: MetaEvent) -> Self {
        Self::new(delta, RawEventKind::Meta(meta))
    }

    pub fn end_of_track() -> Self {
        Self::meta(0, MetaEvent::EndOfTrack)
    }

    /// MIDI channel for channel events, `None` for meta events.
    pub fn channel(&self) -> Option<u8> {
        match &self.kind {
            RawEventKind::NoteOn(n) | RawEventKind::NoteOff(n) => Some(n.channel),
            RawEventKind::Channel(c) => Some(c.channel),
            RawEventKind::Meta(_) => None,
        }
    }

    pub fn set_channel(&mut self, channel: u8) {
        match &mut self.kind {
            RawEventKind::NoteOn(n) | RawEventKind::NoteOff(n) => n.channel = channel,
            RawEventKind::Channel(c) => c.channel = channel,
            RawEventKind::Meta(_) => {}
        }
    }

    pub fn is_channel_event(&self) -> bool {
        self.channel().is_some()
    }

    /// Tempo and time signature events belong on the control track.
    pub fn is_conductor_event(&self) -> bool {
        matches!(
            self.kind,
            RawEventKind::Meta(MetaEvent::Tempo { .. } | MetaEvent::TimeSignature { .. })
        )
    }

    /// True for note-on and note-off.
    pub fn is_note(&self) -> bool {
        matches!(self.kind, RawEventKind::NoteOn(_) | RawEventKind::NoteOff(_))
    }

    /// Lights attached to a note-on/note-off; empty for anything else.
    pub fn lights(&self) -> &[u8] {
        match &self.kind {
            RawEventKind::NoteOn(n) | RawEventKind::NoteOff(n) => &n.lights,
            _ => &[],
        }
    }

    pub fn with_lights(mut self, lights: &[u8]) -> Self {
        if let RawEventKind::NoteOn(n) | RawEventKind::NoteOff(n) = &mut self.kind {
            n.lights = lights.to_vec();
        }
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum RawEventKind {
    NoteOn(RawNote),
    NoteOff(RawNote),
    Channel(ChannelEvent),
    Meta(MetaEvent),
}

/// Payload shared by note-on and note-off.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawNote {
    pub channel: u8,
    pub note: u8,
    pub velocity: u8,
    pub lights: Lights,
}

impl RawNote {
    pub fn new(channel: u8, note: u8, velocity: u8) -> Self {
        Self {
            channel,
            note,
            velocity,
            lights: Lights::new(),
        }
    }
}

/// A decoded file before normalization: a layout discriminator, the
/// timebase, and one or more delta-time streams.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawSong {
    /// 0 = single interleaved stream, 1 = parallel streams
    pub format: u16,
    /// Ticks per quarter note
    pub timebase: u16,
    pub tracks: Vec<Vec<RawEvent>>,
}
