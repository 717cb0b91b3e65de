//! Edit patches applied to a track's events.

use crate::event::{Lights, Tick};
use crate::track::EventId;

/// A patch to a single event, applied in batches by [`crate::Track::apply`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Edit {
    /// Replace the light assignment of a note.
    SetLights { event: EventId, lights: Lights },
    /// Move an event to another tick.
    SetTick { event: EventId, tick: Tick },
    /// Change a note's length.
    SetDuration { event: EventId, duration: Tick },
}

impl Edit {
    /// The event this edit targets.
    pub fn target(&self) -> EventId {
        match self {
            Edit::SetLights { event, .. }
            | Edit::SetTick { event, .. }
            | Edit::SetDuration { event, .. } => *event,
        }
    }

    pub(crate) fn needs_note(&self) -> bool {
        matches!(self, Edit::SetLights { .. } | Edit::SetDuration { .. })
    }
}
