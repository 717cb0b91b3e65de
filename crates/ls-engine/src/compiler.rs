//! Compile a song into timed light commands.
//!
//! The song is serialized, every track's notes are merged into one
//! chronological stream, and the stream is walked once. Events that share
//! a tick are coalesced into one command; each non-zero delta closes the
//! open command and starts the next one's delay.

use ls_ir::{ChannelSet, EventKind, MetaEvent, RawEvent, RawEventKind, Song, Tick};

use crate::command::{Change, Command, LightState};
use crate::merge::{merge_note_streams, note_streams};
use crate::CompileError;

/// Fixed tempo and resolution used to convert ticks to seconds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Timing {
    pub microseconds_per_beat: u32,
    pub timebase: u16,
}

impl Timing {
    pub fn new(microseconds_per_beat: u32, timebase: u16) -> Result<Self, CompileError> {
        if microseconds_per_beat == 0 || timebase == 0 {
            return Err(CompileError::InvalidTiming {
                microseconds_per_beat,
                timebase,
            });
        }
        Ok(Self {
            microseconds_per_beat,
            timebase,
        })
    }

    pub fn bpm(&self) -> f64 {
        60_000_000.0 / self.microseconds_per_beat as f64
    }

    pub fn seconds_per_tick(&self) -> f64 {
        60.0 / (self.bpm() * self.timebase as f64)
    }
}

/// Compile a song against a channel set.
///
/// Tempo comes from the first tempo event of the control track. Later
/// tempo changes are not honoured.
pub fn compile(song: &Song, channels: &ChannelSet) -> Result<Vec<Command>, CompileError> {
    let tempo = song.tempo().ok_or(CompileError::MissingTempo)?;

    let tempo_events = song
        .control_track()
        .map(|t| {
            t.events()
                .filter(|e| matches!(e.kind, EventKind::Meta(MetaEvent::Tempo { .. })))
                .count()
        })
        .unwrap_or(0);
    if tempo_events > 1 {
        tracing::warn!(
            tempo_events,
            microseconds_per_beat = tempo,
            "ignoring tempo changes after the first"
        );
    }

    let merged = merged_notes(song)?;
    compile_merged(&merged, tempo, song.timebase, channels)
}

/// Serialize a song and merge the note events of all tracks.
pub fn merged_notes(song: &Song) -> Result<Vec<RawEvent>, CompileError> {
    let raw = ls_formats::serialize(song)?;
    Ok(merge_note_streams(note_streams(&raw.tracks)))
}

/// Compile an already merged stream.
///
/// Non-note events still advance time but change no channel. Fails on the
/// first light index outside `channels`.
pub fn compile_merged(
    merged: &[RawEvent],
    microseconds_per_beat: u32,
    timebase: u16,
    channels: &ChannelSet,
) -> Result<Vec<Command>, CompileError> {
    let seconds_per_tick = Timing::new(microseconds_per_beat, timebase)?.seconds_per_tick();

    let mut commands = Vec::new();
    let mut open = Command::default();
    let mut tick: Tick = 0;

    for event in merged {
        tick += event.delta as Tick;
        if event.delta != 0 {
            let gap = event.delta as f64 * seconds_per_tick;
            if open.is_empty() {
                open.increase_timeout(gap);
            } else {
                commands.push(std::mem::replace(&mut open, Command::new(gap)));
            }
        }

        // A note-on with velocity 0 is a release
        let value = match &event.kind {
            RawEventKind::NoteOn(n) if n.velocity > 0 => LightState::On,
            RawEventKind::NoteOn(_) | RawEventKind::NoteOff(_) => LightState::Off,
            _ => continue,
        };
        for &index in event.lights() {
            let name = channels
                .name(index)
                .ok_or(CompileError::InvalidChannelIndex { index, tick })?;
            open.set(
                name,
                Change {
                    value,
                    source_tick: tick,
                    source_event: event.clone(),
                },
            );
        }
    }
    commands.push(open);

    tracing::debug!(
        events = merged.len(),
        commands = commands.len(),
        "compiled light commands"
    );
    Ok(commands)
}
