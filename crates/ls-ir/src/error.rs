use thiserror::Error;

use crate::event::Tick;
use crate::track::EventId;

/// Errors raised by the data model itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("end-of-track markers cannot be stored in a track")]
    EndOfTrackInTrack,

    #[error("control track cannot hold channel events")]
    ChannelEventOnControlTrack,

    #[error("unknown event id {0:?}")]
    UnknownEvent(EventId),

    #[error("event {0:?} is not a note")]
    NotANote(EventId),

    #[error("events out of order: tick {tick} after {prev}")]
    TickOrder { prev: Tick, tick: Tick },

    #[error("delta of {delta} ticks before tick {tick} does not fit in 28 bits")]
    DeltaOverflow { tick: Tick, delta: u64 },

    #[error("channel set holds at most {max} channels, got {count}")]
    TooManyChannels { max: usize, count: usize },

    #[error("invalid channel name {0:?}")]
    InvalidChannelName(String),

    #[error("duplicate channel name {0:?}")]
    DuplicateChannel(String),
}
