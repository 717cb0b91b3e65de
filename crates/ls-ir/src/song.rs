//! Song structure.

use arrayvec::ArrayString;

use crate::event::Tick;
use crate::track::Track;

/// Ticks per quarter note used when a song is created from scratch.
pub const DEFAULT_TIMEBASE: u16 = 480;

/// A complete song in canonical form.
///
/// After normalization `tracks[0]` is the control track holding tempo and
/// time signature events. Later tracks are bound to a MIDI channel, apart
/// from any extra channel-less tracks a file carried, which hold meta
/// events only.
#[derive(Clone, Debug)]
pub struct Song {
    /// Song title
    pub title: ArrayString<32>,
    /// Ticks per quarter note
    pub timebase: u16,
    pub tracks: Vec<Track>,
}

impl Default for Song {
    fn default() -> Self {
        Self {
            title: ArrayString::new(),
            timebase: DEFAULT_TIMEBASE,
            tracks: Vec::new(),
        }
    }
}

impl Song {
    /// Create a new empty song.
    pub fn new(title: &str) -> Self {
        let mut song = Self::default();
        song.set_title(title);
        song
    }

    /// Set the title, truncating at a character boundary if it is too long.
    pub fn set_title(&mut self, title: &str) {
        self.title.clear();
        for c in title.chars() {
            if self.title.try_push(c).is_err() {
                break;
            }
        }
    }

    pub fn add_track(&mut self, track: Track) {
        self.tracks.push(track);
    }

    /// The track tempo and time signature are read from.
    pub fn control_track(&self) -> Option<&Track> {
        self.tracks.first().filter(|t| t.is_control())
    }

    /// Microseconds per beat of the first tempo event on the control track.
    pub fn tempo(&self) -> Option<u32> {
        self.control_track().and_then(Track::tempo)
    }

    /// Tracks bound to a channel.
    pub fn channel_tracks(&self) -> impl Iterator<Item = &Track> {
        self.tracks.iter().filter(|t| !t.is_control())
    }

    /// Tick after the last event of any track has finished.
    pub fn end_tick(&self) -> Tick {
        self.tracks.iter().map(Track::end_tick).max().unwrap_or(0)
    }
}
