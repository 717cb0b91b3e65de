//! Light map configuration, read from RON.
//!
//! ```ron
//! (
//!     channels: Some(["garage", "porch"]),
//!     assignments: [
//!         (track: 1, note: Some(60), lights: [0]),
//!         (track: 2, lights: [0, 1]),
//!     ],
//! )
//! ```

use std::collections::BTreeMap;

use ls_ir::{ChannelSet, Edit, ModelError, Song};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid light config: {0}")]
    Parse(#[from] ron::error::SpannedError),

    #[error("assignment refers to track {0}, song has {1} tracks")]
    UnknownTrack(usize, usize),

    #[error("assignment for track {track} uses light {index} outside the channel set")]
    InvalidChannelIndex { track: usize, index: u8 },

    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Which lights follow which notes.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LightConfig {
    /// Replacement channel names; the built-in set when absent
    #[serde(default)]
    pub channels: Option<Vec<String>>,
    #[serde(default)]
    pub assignments: Vec<Assignment>,
}

/// Lights for the notes of one track, optionally only one pitch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub track: usize,
    #[serde(default)]
    pub note: Option<u8>,
    pub lights: Vec<u8>,
}

impl LightConfig {
    pub fn from_ron(text: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(text)?)
    }

    /// The configured channel set, if the config names one.
    pub fn channel_set(&self) -> Result<Option<ChannelSet>, ConfigError> {
        match &self.channels {
            Some(names) => Ok(Some(ChannelSet::from_names(names)?)),
            None => Ok(None),
        }
    }

    /// Write light assignments into `song`, returning the number of notes
    /// touched.
    ///
    /// All assignments are checked before any track is changed. Later
    /// assignments override earlier ones for the same note.
    pub fn apply(&self, song: &mut Song, channels: &ChannelSet) -> Result<usize, ConfigError> {
        let track_count = song.tracks.len();
        for a in &self.assignments {
            if a.track >= track_count {
                return Err(ConfigError::UnknownTrack(a.track, track_count));
            }
            if let Some(&index) = a.lights.iter().find(|&&i| !channels.contains(i)) {
                return Err(ConfigError::InvalidChannelIndex { track: a.track, index });
            }
        }

        let mut edits: BTreeMap<usize, Vec<Edit>> = BTreeMap::new();
        for a in &self.assignments {
            let track = &song.tracks[a.track];
            let batch = edits.entry(a.track).or_default();
            batch.extend(track.iter().filter_map(|(id, event)| {
                let note = event.as_note()?;
                a.note.map_or(true, |key| key == note.note).then(|| Edit::SetLights {
                    event: id,
                    lights: a.lights.clone(),
                })
            }));
        }

        let mut touched = 0;
        for (index, batch) in edits {
            song.tracks[index].apply(&batch)?;
            tracing::debug!(track = index, edits = batch.len(), "assigned lights");
            touched += batch.len();
        }
        Ok(touched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ls_ir::{Event, Track};

    fn song() -> Song {
        let mut song = Song::new("t");
        song.add_track(Track::new());
        let mut track = Track::with_channel(0);
        track.add_event(Event::note(0, 0, 60, 100, 10)).unwrap();
        track.add_event(Event::note(10, 0, 62, 100, 10)).unwrap();
        song.add_track(track);
        song
    }

    fn lights(song: &Song, track: usize) -> Vec<Vec<u8>> {
        song.tracks[track]
            .events()
            .filter_map(|e| e.as_note().map(|n| n.lights.clone()))
            .collect()
    }

    #[test]
    fn parses_ron() {
        let config = LightConfig::from_ron(
            r#"(
                channels: Some(["a", "b"]),
                assignments: [
                    (track: 1, note: Some(60), lights: [0]),
                    (track: 2, lights: [1]),
                ],
            )"#,
        )
        .unwrap();
        assert_eq!(config.assignments.len(), 2);
        assert_eq!(config.assignments[1].note, None);
        assert_eq!(config.channel_set().unwrap().unwrap().len(), 2);
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config = LightConfig::from_ron("(assignments: [])").unwrap();
        assert_eq!(config, LightConfig::default());
        assert!(config.channel_set().unwrap().is_none());
    }

    #[test]
    fn bad_ron_is_a_parse_error() {
        assert!(matches!(
            LightConfig::from_ron("(assignments: 3)"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn assigns_by_track_and_note() {
        let mut song = song();
        let config = LightConfig {
            channels: None,
            assignments: vec![
                Assignment { track: 1, note: None, lights: vec![1] },
                Assignment { track: 1, note: Some(62), lights: vec![2, 3] },
            ],
        };
        let touched = config.apply(&mut song, &ChannelSet::default()).unwrap();
        assert_eq!(touched, 3);
        assert_eq!(lights(&song, 1), vec![vec![1], vec![2, 3]]);
    }

    #[test]
    fn invalid_light_leaves_song_untouched() {
        let mut song = song();
        let config = LightConfig {
            channels: None,
            assignments: vec![
                Assignment { track: 1, note: None, lights: vec![1] },
                Assignment { track: 1, note: None, lights: vec![40] },
            ],
        };
        let err = config.apply(&mut song, &ChannelSet::default()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidChannelIndex { track: 1, index: 40 }));
        assert_eq!(lights(&song, 1), vec![Vec::<u8>::new(), Vec::new()]);
    }

    #[test]
    fn unknown_track_is_rejected() {
        let mut song = song();
        let config = LightConfig {
            channels: None,
            assignments: vec![Assignment { track: 5, note: None, lights: vec![0] }],
        };
        assert!(matches!(
            config.apply(&mut song, &ChannelSet::default()),
            Err(ConfigError::UnknownTrack(5, 2))
        ));
    }
}
