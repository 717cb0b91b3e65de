//! Core IR types for the lightshow compiler.
//!
//! This crate defines the intermediate representation used throughout
//! the workspace. The format bridge emits IR, the serializer turns it back
//! into delta-time streams, and the light compiler consumes it.
//!
//! Two event forms exist side by side: [`Event`] is the canonical form
//! (absolute tick, notes carry a duration) held in a [`Track`], and
//! [`RawEvent`] is the wire form (delta time, separate note-on/note-off)
//! exchanged with the binary codec.

mod channel_set;
mod edit;
mod error;
mod event;
mod raw;
pub mod song;
mod ticks;
mod track;

pub use channel_set::{ChannelName, ChannelSet, DEFAULT_CHANNELS, MAX_CHANNELS};
pub use edit::Edit;
pub use error::ModelError;
pub use event::{ChannelEvent, ChannelMessage, Event, EventKind, Lights, MetaEvent, Note, Tick};
pub use raw::{RawEvent, RawEventKind, RawNote, RawSong};
pub use song::{Song, DEFAULT_TIMEBASE};
pub use ticks::{absolute_ticks, delta_between, MAX_DELTA};
pub use track::{EventId, Track};
