//! Light compiler for lightshow.
//!
//! Merges the note streams of every track into one chronological stream
//! and compiles it into timed light-channel commands.

mod command;
pub mod compiler;
mod merge;

pub use command::{Change, Command, LightState};
pub use compiler::{compile, compile_merged, merged_notes, Timing};
pub use merge::{merge_note_streams, note_streams};

use ls_formats::FormatError;
use ls_ir::Tick;
use thiserror::Error;

/// Error type for light compilation.
#[derive(Debug, Error)]
pub enum CompileError {
    /// The control track has no tempo event
    #[error("no tempo event on the control track")]
    MissingTempo,

    /// Tempo or timebase of zero
    #[error("invalid timing: {microseconds_per_beat} us per beat at timebase {timebase}")]
    InvalidTiming {
        microseconds_per_beat: u32,
        timebase: u16,
    },

    /// A note refers to a light outside the channel set
    #[error("light index {index} at tick {tick} is outside the channel set")]
    InvalidChannelIndex { index: u8, tick: Tick },

    #[error(transparent)]
    Format(#[from] FormatError),
}
