//! Track layout normalization.
//!
//! Rebuilds a canonical [`Song`] from either legacy layout:
//!
//! * format 0: one interleaved stream, split into one track per channel
//! * format 1: one stream per track, with tempo and time signature events
//!   gathered onto a control track (synthesized if the file has none)

use std::collections::{BTreeMap, HashMap, VecDeque};

use ls_ir::{
    absolute_ticks, ChannelEvent, Event, EventKind, MetaEvent, Note, RawEvent, RawEventKind,
    RawSong, Song, Tick, Track,
};

use crate::FormatError;

type Ticked = Vec<(Tick, RawEvent)>;

/// Build a canonical song from a decoded track layout.
///
/// The result always has the control track at index 0.
pub fn normalize(raw: &RawSong) -> Result<Song, FormatError> {
    if raw.timebase == 0 {
        return Err(FormatError::UnsupportedTiming("timebase of zero".into()));
    }

    let tracks = match raw.format {
        0 => match raw.tracks.as_slice() {
            [stream] => tracks_from_single_stream(stream)?,
            other => return Err(FormatError::TrackCount(other.len())),
        },
        1 => tracks_from_parallel_streams(&raw.tracks)?,
        other => return Err(FormatError::UnsupportedFormat(other)),
    };

    let mut song = Song::default();
    song.timebase = raw.timebase;
    song.tracks = tracks;

    // Format 1 files carry the song title on the first track
    if raw.format == 1 {
        if let Some(name) = song.tracks.first().and_then(Track::name).map(str::to_owned) {
            song.set_title(&name);
        }
    }

    tracing::debug!(
        format = raw.format,
        tracks = song.tracks.len(),
        timebase = song.timebase,
        "normalized song"
    );
    Ok(song)
}

/// Attach absolute ticks to a delta-time stream.
fn with_ticks(stream: &[RawEvent]) -> Ticked {
    absolute_ticks(stream.iter().map(|e| e.delta))
        .zip(stream.iter().cloned())
        .collect()
}

/// Format 0: partition by channel key (`channel + 1`, or 0 for meta).
///
/// Tracks are created densely from key 0 up to the highest key seen, so a
/// gap in the channels used still produces an (empty) track.
fn tracks_from_single_stream(stream: &[RawEvent]) -> Result<Vec<Track>, FormatError> {
    let mut groups: BTreeMap<usize, Ticked> = BTreeMap::new();
    for (tick, event) in with_ticks(stream) {
        let key = event.channel().map_or(0, |ch| ch as usize + 1);
        groups.entry(key).or_default().push((tick, event));
    }

    let max_key = groups.keys().next_back().copied().unwrap_or(0);
    let mut tracks: Vec<Track> = (0..=max_key)
        .map(|key| match key {
            0 => Track::new(),
            k => Track::with_channel((k - 1) as u8),
        })
        .collect();

    for (key, events) in groups {
        let events = assemble_events(key, &events)?;
        tracks[key].add_events(events)?;
    }

    Ok(tracks)
}

/// Format 1: reorder control tracks first, synthesize one if missing, and
/// move every tempo / time signature event onto it.
fn tracks_from_parallel_streams(streams: &[Vec<RawEvent>]) -> Result<Vec<Track>, FormatError> {
    let (control, normal): (Vec<&Vec<RawEvent>>, Vec<&Vec<RawEvent>>) = streams
        .iter()
        .partition(|s| !s.iter().any(RawEvent::is_channel_event));

    let mut ticked: Vec<Ticked> = Vec::with_capacity(streams.len() + 1);
    if control.is_empty() {
        tracing::debug!("no control track found, synthesizing one");
        ticked.push(Vec::new());
    }
    ticked.extend(control.into_iter().chain(normal).map(|s| with_ticks(s)));

    if let Some((head, rest)) = ticked.split_first_mut() {
        let mut moved = 0;
        for track in rest {
            let (conductor, keep): (Ticked, Ticked) = std::mem::take(track)
                .into_iter()
                .partition(|(_, e)| e.is_conductor_event());
            moved += conductor.len();
            head.extend(conductor);
            *track = keep;
        }
        if moved > 0 {
            tracing::debug!(moved, "moved conductor events to the control track");
        }
        head.sort_by_key(|(tick, _)| *tick);
    }

    let mut tracks = Vec::with_capacity(ticked.len());
    for (index, events) in ticked.iter().enumerate() {
        let mut track = match events.iter().find_map(|(_, e)| e.channel()) {
            Some(channel) => Track::with_channel(channel),
            None => Track::new(),
        };
        track.add_events(assemble_events(index, events)?)?;
        tracks.push(track);
    }

    Ok(tracks)
}

/// Fold note-on/note-off pairs into notes and convert everything else.
///
/// Notes are matched first-in first-out per (channel, note). A note-on
/// with velocity 0 counts as a note-off. End-of-track markers are dropped.
fn assemble_events(track: usize, events: &[(Tick, RawEvent)]) -> Result<Vec<Event>, FormatError> {
    let mut out: Vec<Event> = Vec::with_capacity(events.len());
    let mut open: HashMap<(u8, u8), VecDeque<usize>> = HashMap::new();

    for (tick, event) in events {
        let tick = *tick;
        match &event.kind {
            RawEventKind::NoteOn(n) if n.velocity > 0 => {
                open.entry((n.channel, n.note)).or_default().push_back(out.len());
                out.push(Event::new(
                    tick,
                    EventKind::Note(Note {
                        channel: n.channel,
                        note: n.note,
                        velocity: n.velocity,
                        off_velocity: 0,
                        duration: 0,
                        lights: n.lights.clone(),
                    }),
                ));
            }
            RawEventKind::NoteOn(n) | RawEventKind::NoteOff(n) => {
                let Some(index) = open.get_mut(&(n.channel, n.note)).and_then(VecDeque::pop_front)
                else {
                    tracing::warn!(track, tick, note = n.note, "dropping note-off without note-on");
                    continue;
                };
                if let Some(Event { tick: start, kind: EventKind::Note(note) }) = out.get_mut(index) {
                    note.duration = tick - *start;
                    note.off_velocity = n.velocity;
                }
            }
            RawEventKind::Channel(c) => out.push(Event::new(
                tick,
                EventKind::Channel(ChannelEvent {
                    channel: c.channel,
                    message: c.message,
                }),
            )),
            RawEventKind::Meta(MetaEvent::EndOfTrack) => {}
            RawEventKind::Meta(m) => out.push(Event::meta(tick, m.clone())),
        }
    }

    if let Some(&index) = open.values().flatten().min() {
        let event = &out[index];
        let reason = match event.as_note() {
            Some(n) => format!("note {} on channel {} is never released", n.note, n.channel),
            None => "unterminated note".to_string(),
        };
        return Err(FormatError::MalformedEvent {
            track,
            tick: event.tick,
            reason,
        });
    }

    Ok(out)
}
