//! Headless controller for the lightshow compiler.
//!
//! Provides one API for loading songs, assigning lights and compiling
//! commands that the CLI and tests share.

pub mod config;
mod dump;

use ls_ir::{ChannelSet, Edit, ModelError, RawSong};
use thiserror::Error;

// Re-export common types so callers don't need the lower crates directly.
pub use config::{Assignment, ConfigError, LightConfig};
pub use dump::{commands_to_json, write_json};
pub use ls_engine::{Change, Command, CompileError, LightState};
pub use ls_formats::FormatError;
pub use ls_ir::Song;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("no track {0}")]
    UnknownTrack(usize),

    #[error("failed to write JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Owns a song and the channel set its lights refer to.
pub struct Controller {
    song: Song,
    channels: ChannelSet,
}

impl Controller {
    pub fn new() -> Self {
        Self {
            song: Song::new("Untitled"),
            channels: ChannelSet::default(),
        }
    }

    // --- Song management ---

    pub fn song(&self) -> &Song {
        &self.song
    }

    pub fn channels(&self) -> &ChannelSet {
        &self.channels
    }

    pub fn load_midi(&mut self, data: &[u8]) -> Result<(), Error> {
        self.song = ls_formats::load_midi(data)?;
        tracing::info!(
            title = self.song.title.as_str(),
            tracks = self.song.tracks.len(),
            "loaded MIDI file"
        );
        Ok(())
    }

    pub fn load_raw(&mut self, raw: &RawSong) -> Result<(), Error> {
        self.song = ls_formats::normalize(raw)?;
        Ok(())
    }

    // --- Light assignment ---

    /// Apply a light map. A channel list in the config replaces the
    /// current channel set, but only if the whole config applies.
    pub fn apply_config(&mut self, config: &LightConfig) -> Result<usize, Error> {
        let channels = config.channel_set()?.unwrap_or_else(|| self.channels.clone());
        let touched = config.apply(&mut self.song, &channels)?;
        self.channels = channels;
        tracing::info!(notes = touched, channels = self.channels.len(), "applied light config");
        Ok(touched)
    }

    /// Apply a batch of edits to one track atomically.
    pub fn edit_track(&mut self, track: usize, edits: &[Edit]) -> Result<(), Error> {
        let target = self.song.tracks.get_mut(track).ok_or(Error::UnknownTrack(track))?;
        target.apply(edits)?;
        Ok(())
    }

    // --- Output ---

    pub fn export_midi(&self) -> Result<Vec<u8>, Error> {
        Ok(ls_formats::save_midi(&self.song)?)
    }

    pub fn compile_lights(&self) -> Result<Vec<Command>, Error> {
        Ok(ls_engine::compile(&self.song, &self.channels)?)
    }

    pub fn lights_json(&self) -> Result<String, Error> {
        let commands = self.compile_lights()?;
        Ok(commands_to_json(&commands)?)
    }
}

impl Default for Controller {
    fn default() -> Self {
        Self::new()
    }
}
