//! Format handling for lightshow.
//!
//! Normalizes format 0 and format 1 track layouts into the canonical IR,
//! serializes the IR back into delta-time streams, and bridges both to
//! standard MIDI file bytes.

mod normalize;
mod serialize;
mod smf;

pub use normalize::normalize;
pub use serialize::{serialize, serialize_track};
pub use smf::{load_midi, read_smf, save_midi, write_smf};

use ls_ir::{ModelError, Tick};
use thiserror::Error;

/// Error type for format handling.
#[derive(Debug, Error)]
pub enum FormatError {
    /// Layout discriminator other than 0 or 1
    #[error("unsupported MIDI format {0}")]
    UnsupportedFormat(u16),

    /// Format 0 must carry exactly one stream
    #[error("format 0 expects a single track, found {0}")]
    TrackCount(usize),

    /// SMPTE timing, or a timebase of zero / out of range
    #[error("unsupported timing: {0}")]
    UnsupportedTiming(String),

    /// An event that cannot be represented in the IR
    #[error("malformed event in track {track} at tick {tick}: {reason}")]
    MalformedEvent {
        track: usize,
        tick: Tick,
        reason: String,
    },

    #[error(transparent)]
    Model(#[from] ModelError),

    /// Binary decode failure
    #[error("invalid MIDI data: {0}")]
    Smf(#[from] midly::Error),

    /// Binary encode failure, reported by `midly` as an I/O error
    #[error("failed to encode MIDI data: {0}")]
    Encode(#[from] std::io::Error),
}
