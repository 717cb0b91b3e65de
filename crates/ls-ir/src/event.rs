//! Canonical event types.

use serde::{Deserialize, Serialize};

/// Absolute time in ticks from song start.
pub type Tick = u64;

/// Light-channel indices assigned to a note (indices into a `ChannelSet`).
pub type Lights = Vec<u8>;

/// A timed event in a track.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Absolute tick from song start
    pub tick: Tick,
    /// What the event is
    pub kind: EventKind,
}

impl Event {
    /// Create a new event.
    pub fn new(tick: Tick, kind: EventKind) -> Self {
        Self { tick, kind }
    }

    /// Create a note event with no lights assigned.
    pub fn note(tick: Tick, channel: u8, note: u8, velocity: u8, duration: Tick) -> Self {
        Self::new(
            tick,
            EventKind::Note(Note {
                channel,
                note,
                velocity,
                off_velocity: 0,
                duration,
                lights: Vec::new(),
            }),
        )
    }

    /// Create a meta event.
    pub fn meta(tick: Tick, meta: MetaEvent) -> Self {
        Self::new(tick, EventKind::Meta(meta))
    }

    /// Create a tempo event.
    pub fn tempo(tick: Tick, microseconds_per_beat: u32) -> Self {
        Self::meta(tick, MetaEvent::Tempo { microseconds_per_beat })
    }

    /// MIDI channel for channel events, `None` for meta events.
    pub fn channel(&self) -> Option<u8> {
        match &self.kind {
            EventKind::Note(n) => Some(n.channel),
            EventKind::Channel(c) => Some(c.channel),
            EventKind::Meta(_) => None,
        }
    }

    /// Rewrite the channel of a channel event. Meta events are untouched.
    pub fn set_channel(&mut self, channel: u8) {
        match &mut self.kind {
            EventKind::Note(n) => n.channel = channel,
            EventKind::Channel(c) => c.channel = channel,
            EventKind::Meta(_) => {}
        }
    }

    pub fn is_channel_event(&self) -> bool {
        self.channel().is_some()
    }

    /// Tempo and time signature events belong on the control track.
    pub fn is_conductor_event(&self) -> bool {
        matches!(
            self.kind,
            EventKind::Meta(MetaEvent::Tempo { .. } | MetaEvent::TimeSignature { .. })
        )
    }

    pub fn as_note(&self) -> Option<&Note> {
        match &self.kind {
            EventKind::Note(n) => Some(n),
            _ => None,
        }
    }

    /// Tick at which the event stops sounding (`tick + duration` for notes).
    pub fn end_tick(&self) -> Tick {
        match &self.kind {
            EventKind::Note(n) => self.tick + n.duration,
            _ => self.tick,
        }
    }
}

/// What an event does.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum EventKind {
    /// A note with a known duration
    Note(Note),
    /// Any other channel message
    Channel(ChannelEvent),
    /// Channel-less meta information
    Meta(MetaEvent),
}

/// A sounding note. Note-on/note-off pairs are folded into one record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub channel: u8,
    /// MIDI note number (0-127)
    pub note: u8,
    /// Note-on velocity (1-127)
    pub velocity: u8,
    /// Note-off velocity
    pub off_velocity: u8,
    /// Length in ticks
    pub duration: Tick,
    /// Assigned light channels
    pub lights: Lights,
}

/// A non-note channel message bound to a channel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelEvent {
    pub channel: u8,
    pub message: ChannelMessage,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelMessage {
    Controller { controller: u8, value: u8 },
    ProgramChange { program: u8 },
    /// 14-bit bend, 0x2000 = center
    PitchBend(u16),
    KeyPressure { note: u8, pressure: u8 },
    ChannelPressure(u8),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetaEvent {
    /// Microseconds per quarter note
    Tempo { microseconds_per_beat: u32 },
    TimeSignature {
        numerator: u8,
        /// Power of two (2 = quarter note)
        denominator: u8,
        clocks_per_click: u8,
        thirty_seconds_per_quarter: u8,
    },
    KeySignature { sharps: i8, minor: bool },
    TrackName(String),
    Text(String),
    Marker(String),
    Lyric(String),
    /// Never stored in a track; synthesized by the serializer.
    EndOfTrack,
    /// Any other meta type, kept as raw bytes
    Other { kind: u8, data: Vec<u8> },
}
