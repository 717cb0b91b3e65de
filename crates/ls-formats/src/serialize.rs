//! Canonical tracks back to delta-time streams.

use ls_ir::{
    delta_between, EventKind, ModelError, RawEvent, RawEventKind, RawNote, RawSong, Song, Tick,
    Track,
};

use crate::FormatError;

/// Serialize a song into one delta-time stream per track (format 1).
///
/// A gap too long for a delta time is reported as a malformed event of
/// the offending track.
pub fn serialize(song: &Song) -> Result<RawSong, FormatError> {
    let tracks = song
        .tracks
        .iter()
        .enumerate()
        .map(|(index, track)| serialize_track(track).map_err(|e| locate(index, e)))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RawSong {
        format: 1,
        timebase: song.timebase,
        tracks,
    })
}

fn locate(track: usize, error: FormatError) -> FormatError {
    let FormatError::Model(err) = error else {
        return error;
    };
    match &err {
        ModelError::DeltaOverflow { tick, .. } | ModelError::TickOrder { tick, .. } => {
            FormatError::MalformedEvent {
                track,
                tick: *tick,
                reason: err.to_string(),
            }
        }
        _ => FormatError::Model(err),
    }
}

/// Serialize one track.
///
/// Notes split into note-on at `tick` and note-off at `tick + duration`,
/// both carrying the note's lights. The track channel, if any, is
/// overlaid on every channel event, and an end-of-track marker closes
/// the stream.
pub fn serialize_track(track: &Track) -> Result<Vec<RawEvent>, FormatError> {
    let mut ticked: Vec<(Tick, RawEventKind)> = Vec::with_capacity(track.len() * 2);
    for event in track.events() {
        match &event.kind {
            EventKind::Note(n) => {
                let on = RawNote {
                    channel: n.channel,
                    note: n.note,
                    velocity: n.velocity,
                    lights: n.lights.clone(),
                };
                let off = RawNote {
                    velocity: n.off_velocity,
                    ..on.clone()
                };
                ticked.push((event.tick, RawEventKind::NoteOn(on)));
                ticked.push((event.tick + n.duration, RawEventKind::NoteOff(off)));
            }
            EventKind::Channel(c) => ticked.push((event.tick, RawEventKind::Channel(c.clone()))),
            EventKind::Meta(m) => ticked.push((event.tick, RawEventKind::Meta(m.clone()))),
        }
    }
    ticked.sort_by_key(|(tick, _)| *tick);

    let mut stream = Vec::with_capacity(ticked.len() + 1);
    let mut prev = 0;
    for (tick, kind) in ticked {
        let mut event = RawEvent::new(delta_between(prev, tick)?, kind);
        if let Some(channel) = track.channel {
            event.set_channel(channel);
        }
        stream.push(event);
        prev = tick;
    }
    stream.push(RawEvent::end_of_track());

    Ok(stream)
}
