//! Standard MIDI file bridge.
//!
//! Binary decode/encode is delegated to `midly`; this module only maps
//! between its event types and the IR's wire form. Light assignments have
//! no SMF representation and are not written.

use ls_ir::{
    ChannelEvent, ChannelMessage, MetaEvent, RawEvent, RawEventKind, RawNote, RawSong, Song, Tick,
};
use midly::num::{u14, u15, u24, u28, u4, u7};
use midly::{
    Format, Fps, Header, MetaMessage, MidiMessage, PitchBend, Smf, SmpteTime, Timing, TrackEvent,
    TrackEventKind,
};

use crate::{normalize, serialize, FormatError};

/// Load a MIDI file from bytes into a canonical song.
pub fn load_midi(data: &[u8]) -> Result<Song, FormatError> {
    let raw = read_smf(data)?;
    normalize(&raw)
}

/// Encode a canonical song as a format 1 MIDI file.
pub fn save_midi(song: &Song) -> Result<Vec<u8>, FormatError> {
    write_smf(&serialize(song)?)
}

/// Decode MIDI bytes into delta-time streams.
pub fn read_smf(data: &[u8]) -> Result<RawSong, FormatError> {
    let smf = Smf::parse(data)?;

    let timebase = match smf.header.timing {
        Timing::Metrical(ticks) => ticks.as_int(),
        Timing::Timecode(fps, sub) => {
            return Err(FormatError::UnsupportedTiming(format!(
                "SMPTE timecode ({:?}, {} subframes)",
                fps, sub
            )))
        }
    };
    let format = match smf.header.format {
        Format::SingleTrack => 0,
        Format::Parallel => 1,
        Format::Sequential => 2,
    };

    let tracks = smf
        .tracks
        .iter()
        .enumerate()
        .map(|(index, t)| read_track(index, t))
        .collect::<Result<Vec<_>, _>>()?;
    tracing::debug!(format, timebase, tracks = tracks.len(), "decoded SMF");

    Ok(RawSong {
        format,
        timebase,
        tracks,
    })
}

fn read_track(index: usize, track: &[TrackEvent]) -> Result<Vec<RawEvent>, FormatError> {
    let mut events = Vec::with_capacity(track.len());
    let mut tick: Tick = 0;
    // Delta of skipped events carries over to the next kept one
    let mut carry: Tick = 0;
    for event in track {
        let delta = event.delta.as_int() as Tick;
        tick += delta;
        carry += delta;
        let Some(kind) = read_kind(event.kind) else {
            continue;
        };
        let delta = u32::try_from(carry).map_err(|_| FormatError::MalformedEvent {
            track: index,
            tick,
            reason: format!("gap of {} ticks after skipped events exceeds a delta time", carry),
        })?;
        events.push(RawEvent::new(delta, kind));
        carry = 0;
    }
    Ok(events)
}

fn read_kind(kind: TrackEventKind) -> Option<RawEventKind> {
    match kind {
        TrackEventKind::Midi { channel, message } => Some(read_message(channel.as_int(), message)),
        TrackEventKind::Meta(meta) => Some(RawEventKind::Meta(read_meta(meta))),
        TrackEventKind::SysEx(data) | TrackEventKind::Escape(data) => {
            tracing::warn!(len = data.len(), "skipping system exclusive event");
            None
        }
    }
}

fn read_message(channel: u8, message: MidiMessage) -> RawEventKind {
    let channel_event = |message| RawEventKind::Channel(ChannelEvent { channel, message });
    match message {
        MidiMessage::NoteOn { key, vel } => {
            RawEventKind::NoteOn(RawNote::new(channel, key.as_int(), vel.as_int()))
        }
        MidiMessage::NoteOff { key, vel } => {
            RawEventKind::NoteOff(RawNote::new(channel, key.as_int(), vel.as_int()))
        }
        MidiMessage::Aftertouch { key, vel } => channel_event(ChannelMessage::KeyPressure {
            note: key.as_int(),
            pressure: vel.as_int(),
        }),
        MidiMessage::Controller { controller, value } => channel_event(ChannelMessage::Controller {
            controller: controller.as_int(),
            value: value.as_int(),
        }),
        MidiMessage::ProgramChange { program } => channel_event(ChannelMessage::ProgramChange {
            program: program.as_int(),
        }),
        MidiMessage::ChannelAftertouch { vel } => {
            channel_event(ChannelMessage::ChannelPressure(vel.as_int()))
        }
        MidiMessage::PitchBend { bend } => channel_event(ChannelMessage::PitchBend(bend.0.as_int())),
    }
}

fn read_meta(meta: MetaMessage) -> MetaEvent {
    let text = |bytes: &[u8]| String::from_utf8_lossy(bytes).into_owned();
    let other = |kind: u8, data: &[u8]| MetaEvent::Other {
        kind,
        data: data.to_vec(),
    };
    match meta {
        MetaMessage::Tempo(t) => MetaEvent::Tempo {
            microseconds_per_beat: t.as_int(),
        },
        MetaMessage::TimeSignature(numerator, denominator, clocks_per_click, thirty_seconds) => {
            MetaEvent::TimeSignature {
                numerator,
                denominator,
                clocks_per_click,
                thirty_seconds_per_quarter: thirty_seconds,
            }
        }
        MetaMessage::KeySignature(sharps, minor) => MetaEvent::KeySignature { sharps, minor },
        MetaMessage::TrackName(b) => MetaEvent::TrackName(text(b)),
        MetaMessage::Text(b) => MetaEvent::Text(text(b)),
        MetaMessage::Marker(b) => MetaEvent::Marker(text(b)),
        MetaMessage::Lyric(b) => MetaEvent::Lyric(text(b)),
        MetaMessage::EndOfTrack => MetaEvent::EndOfTrack,
        // Everything else is kept as its raw meta type and payload
        MetaMessage::TrackNumber(n) => {
            other(0x00, &n.map(|n| n.to_be_bytes().to_vec()).unwrap_or_default())
        }
        MetaMessage::Copyright(b) => other(0x02, b),
        MetaMessage::InstrumentName(b) => other(0x04, b),
        MetaMessage::CuePoint(b) => other(0x07, b),
        MetaMessage::ProgramName(b) => other(0x08, b),
        MetaMessage::DeviceName(b) => other(0x09, b),
        MetaMessage::MidiChannel(ch) => other(0x20, &[ch.as_int()]),
        MetaMessage::MidiPort(port) => other(0x21, &[port.as_int()]),
        MetaMessage::SmpteOffset(time) => other(0x54, &smpte_bytes(time)),
        MetaMessage::SequencerSpecific(b) => other(0x7F, b),
        MetaMessage::Unknown(kind, b) => other(kind, b),
    }
}

fn smpte_bytes(time: SmpteTime) -> [u8; 5] {
    let rate = match time.fps() {
        Fps::Fps24 => 0,
        Fps::Fps25 => 1,
        Fps::Fps29 => 2,
        Fps::Fps30 => 3,
    };
    [
        (rate << 5) | time.hour(),
        time.minute(),
        time.second(),
        time.frame(),
        time.subframe(),
    ]
}

/// Encode delta-time streams as MIDI bytes.
pub fn write_smf(raw: &RawSong) -> Result<Vec<u8>, FormatError> {
    let format = match raw.format {
        0 => Format::SingleTrack,
        1 => Format::Parallel,
        2 => Format::Sequential,
        other => return Err(FormatError::UnsupportedFormat(other)),
    };
    if raw.timebase == 0 || raw.timebase > 0x7FFF {
        return Err(FormatError::UnsupportedTiming(format!(
            "timebase {} outside 1..=32767",
            raw.timebase
        )));
    }

    let mut smf = Smf::new(Header::new(format, Timing::Metrical(u15::new(raw.timebase))));
    for track in &raw.tracks {
        smf.tracks.push(track.iter().map(write_event).collect());
    }

    let mut buf = Vec::new();
    smf.write_std(&mut buf)?;
    Ok(buf)
}

fn write_event(event: &RawEvent) -> TrackEvent<'_> {
    let kind = match &event.kind {
        RawEventKind::NoteOn(n) => midi(n.channel, MidiMessage::NoteOn {
            key: u7::new(n.note),
            vel: u7::new(n.velocity),
        }),
        RawEventKind::NoteOff(n) => midi(n.channel, MidiMessage::NoteOff {
            key: u7::new(n.note),
            vel: u7::new(n.velocity),
        }),
        RawEventKind::Channel(c) => midi(c.channel, write_message(c.message)),
        RawEventKind::Meta(m) => TrackEventKind::Meta(write_meta(m)),
    };
    TrackEvent {
        delta: u28::new(event.delta),
        kind,
    }
}

fn midi<'a>(channel: u8, message: MidiMessage) -> TrackEventKind<'a> {
    TrackEventKind::Midi {
        channel: u4::new(channel),
        message,
    }
}

fn write_message(message: ChannelMessage) -> MidiMessage {
    match message {
        ChannelMessage::Controller { controller, value } => MidiMessage::Controller {
            controller: u7::new(controller),
            value: u7::new(value),
        },
        ChannelMessage::ProgramChange { program } => MidiMessage::ProgramChange {
            program: u7::new(program),
        },
        ChannelMessage::PitchBend(bend) => MidiMessage::PitchBend {
            bend: PitchBend(u14::new(bend)),
        },
        ChannelMessage::KeyPressure { note, pressure } => MidiMessage::Aftertouch {
            key: u7::new(note),
            vel: u7::new(pressure),
        },
        ChannelMessage::ChannelPressure(pressure) => MidiMessage::ChannelAftertouch {
            vel: u7::new(pressure),
        },
    }
}

fn write_meta(meta: &MetaEvent) -> MetaMessage<'_> {
    match meta {
        MetaEvent::Tempo {
            microseconds_per_beat,
        } => MetaMessage::Tempo(u24::new(*microseconds_per_beat)),
        MetaEvent::TimeSignature {
            numerator,
            denominator,
            clocks_per_click,
            thirty_seconds_per_quarter,
        } => MetaMessage::TimeSignature(
            *numerator,
            *denominator,
            *clocks_per_click,
            *thirty_seconds_per_quarter,
        ),
        MetaEvent::KeySignature { sharps, minor } => MetaMessage::KeySignature(*sharps, *minor),
        MetaEvent::TrackName(s) => MetaMessage::TrackName(s.as_bytes()),
        MetaEvent::Text(s) => MetaMessage::Text(s.as_bytes()),
        MetaEvent::Marker(s) => MetaMessage::Marker(s.as_bytes()),
        MetaEvent::Lyric(s) => MetaMessage::Lyric(s.as_bytes()),
        MetaEvent::EndOfTrack => MetaMessage::EndOfTrack,
        MetaEvent::Other { kind, data } => MetaMessage::Unknown(*kind, data),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_keeps_events() {
        let raw = RawSong {
            format: 1,
            timebase: 96,
            tracks: vec![
                vec![
                    RawEvent::meta(0, MetaEvent::TrackName("conductor".into())),
                    RawEvent::meta(0, MetaEvent::Tempo { microseconds_per_beat: 600_000 }),
                    RawEvent::end_of_track(),
                ],
                vec![
                    RawEvent::note_on(0, 4, 60, 100),
                    RawEvent::note_off(96, 4, 60),
                    RawEvent::end_of_track(),
                ],
            ],
        };

        let bytes = write_smf(&raw).unwrap();
        assert_eq!(&bytes[0..4], b"MThd");

        let back = read_smf(&bytes).unwrap();
        assert_eq!(back, raw);
    }

    #[test]
    fn unknown_meta_round_trips_as_raw_bytes() {
        let raw = RawSong {
            format: 1,
            timebase: 480,
            tracks: vec![vec![
                RawEvent::meta(0, MetaEvent::Other { kind: 0x02, data: b"(c) me".to_vec() }),
                RawEvent::end_of_track(),
            ]],
        };
        let back = read_smf(&write_smf(&raw).unwrap()).unwrap();
        assert_eq!(back, raw);
    }

    #[test]
    fn rejects_format_outside_smf() {
        let raw = RawSong {
            format: 7,
            timebase: 480,
            tracks: vec![],
        };
        assert!(matches!(write_smf(&raw), Err(FormatError::UnsupportedFormat(7))));
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(read_smf(b"not a midi file"), Err(FormatError::Smf(_))));
    }
}
