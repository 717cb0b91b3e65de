//! Tracks: an arena of events addressed by stable ids, kept in tick order.

use slotmap::SlotMap;

use crate::edit::Edit;
use crate::error::ModelError;
use crate::event::{Event, EventKind, MetaEvent, Tick};

slotmap::new_key_type! {
    /// Stable handle to an event within its track.
    pub struct EventId;
}

/// A track: events sharing one optional MIDI channel.
///
/// A track without a channel is the control track; it only ever holds
/// meta events. Events keep their id for the lifetime of the track, and
/// iteration is always by ascending tick (ties keep insertion order).
#[derive(Clone, Debug, Default)]
pub struct Track {
    /// Channel for every channel event, `None` for the control track
    pub channel: Option<u8>,
    events: SlotMap<EventId, Event>,
    /// Ids in tick order
    order: Vec<EventId>,
}

impl Track {
    /// Create an empty control track.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty track bound to `channel`.
    pub fn with_channel(channel: u8) -> Self {
        Self {
            channel: Some(channel),
            ..Self::default()
        }
    }

    pub fn is_control(&self) -> bool {
        self.channel.is_none()
    }

    /// Add a single event and re-sort.
    pub fn add_event(&mut self, event: Event) -> Result<EventId, ModelError> {
        self.check_insertable(&event)?;
        let id = self.events.insert(event);
        self.order.push(id);
        self.sort_by_tick();
        Ok(id)
    }

    /// Add a batch of events. Channel events offered to a control track are
    /// skipped; end-of-track markers are rejected.
    pub fn add_events<I>(&mut self, events: I) -> Result<Vec<EventId>, ModelError>
    where
        I: IntoIterator<Item = Event>,
    {
        let mut ids = Vec::new();
        for event in events {
            if self.is_control() && event.is_channel_event() {
                tracing::warn!(tick = event.tick, "dropping channel event offered to control track");
                continue;
            }
            self.check_insertable(&event)?;
            let id = self.events.insert(event);
            self.order.push(id);
            ids.push(id);
        }
        self.sort_by_tick();
        Ok(ids)
    }

    fn check_insertable(&self, event: &Event) -> Result<(), ModelError> {
        if matches!(event.kind, EventKind::Meta(MetaEvent::EndOfTrack)) {
            return Err(ModelError::EndOfTrackInTrack);
        }
        if self.is_control() && event.is_channel_event() {
            return Err(ModelError::ChannelEventOnControlTrack);
        }
        Ok(())
    }

    pub fn remove_event(&mut self, id: EventId) -> Option<Event> {
        let event = self.events.remove(id)?;
        self.order.retain(|&i| i != id);
        Some(event)
    }

    pub fn get(&self, id: EventId) -> Option<&Event> {
        self.events.get(id)
    }

    /// Events in tick order.
    pub fn events(&self) -> impl Iterator<Item = &Event> + '_ {
        self.order.iter().filter_map(|&id| self.events.get(id))
    }

    /// Events with their ids, in tick order.
    pub fn iter(&self) -> impl Iterator<Item = (EventId, &Event)> + '_ {
        self.order
            .iter()
            .filter_map(|&id| self.events.get(id).map(|e| (id, e)))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Apply a batch of edits atomically, then re-sort by tick.
    ///
    /// Every edit is validated before any is applied; on error the track
    /// is left untouched.
    pub fn apply(&mut self, edits: &[Edit]) -> Result<(), ModelError> {
        for edit in edits {
            let id = edit.target();
            let event = self.events.get(id).ok_or(ModelError::UnknownEvent(id))?;
            if edit.needs_note() && event.as_note().is_none() {
                return Err(ModelError::NotANote(id));
            }
        }

        for edit in edits {
            let Some(event) = self.events.get_mut(edit.target()) else {
                continue;
            };
            match edit {
                Edit::SetLights { lights, .. } => {
                    if let EventKind::Note(n) = &mut event.kind {
                        n.lights = lights.clone();
                    }
                }
                Edit::SetDuration { duration, .. } => {
                    if let EventKind::Note(n) = &mut event.kind {
                        n.duration = *duration;
                    }
                }
                Edit::SetTick { tick, .. } => event.tick = *tick,
            }
        }

        self.sort_by_tick();
        Ok(())
    }

    fn sort_by_tick(&mut self) {
        let events = &self.events;
        self.order
            .sort_by_key(|&id| events.get(id).map_or(Tick::MAX, |e| e.tick));
    }

    // --- Selectors ---

    /// Text of the first track-name event.
    pub fn name(&self) -> Option<&str> {
        self.events().find_map(|e| match &e.kind {
            EventKind::Meta(MetaEvent::TrackName(name)) => Some(name.as_str()),
            _ => None,
        })
    }

    /// Microseconds per beat of the first tempo event.
    pub fn tempo(&self) -> Option<u32> {
        self.events().find_map(|e| match e.kind {
            EventKind::Meta(MetaEvent::Tempo { microseconds_per_beat }) => {
                Some(microseconds_per_beat)
            }
            _ => None,
        })
    }

    /// Tick after the last event has finished.
    pub fn end_tick(&self) -> Tick {
        self.events().map(Event::end_tick).max().unwrap_or(0)
    }

    pub fn has_channel_events(&self) -> bool {
        self.events().any(Event::is_channel_event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_iterate_in_tick_order() {
        let mut track = Track::with_channel(0);
        track.add_event(Event::note(480, 0, 62, 100, 10)).unwrap();
        track.add_event(Event::note(0, 0, 60, 100, 10)).unwrap();
        track.add_event(Event::note(240, 0, 61, 100, 10)).unwrap();

        let ticks: Vec<Tick> = track.events().map(|e| e.tick).collect();
        assert_eq!(ticks, vec![0, 240, 480]);
    }

    #[test]
    fn equal_ticks_keep_insertion_order() {
        let mut track = Track::with_channel(0);
        track
            .add_events([
                Event::note(10, 0, 64, 100, 5),
                Event::note(0, 0, 60, 100, 5),
                Event::note(10, 0, 67, 100, 5),
            ])
            .unwrap();

        let notes: Vec<u8> = track.events().filter_map(|e| e.as_note()).map(|n| n.note).collect();
        assert_eq!(notes, vec![60, 64, 67]);
    }

    #[test]
    fn control_track_rejects_channel_events() {
        let mut track = Track::new();
        assert_eq!(
            track.add_event(Event::note(0, 0, 60, 100, 10)),
            Err(ModelError::ChannelEventOnControlTrack)
        );
    }

    #[test]
    fn control_track_batch_skips_channel_events() {
        let mut track = Track::new();
        let ids = track
            .add_events([Event::tempo(0, 500_000), Event::note(0, 0, 60, 100, 10)])
            .unwrap();
        assert_eq!(ids.len(), 1);
        assert_eq!(track.len(), 1);
        assert!(!track.has_channel_events());
    }

    #[test]
    fn end_of_track_is_rejected() {
        let mut track = Track::new();
        assert_eq!(
            track.add_event(Event::meta(0, MetaEvent::EndOfTrack)),
            Err(ModelError::EndOfTrackInTrack)
        );
    }

    #[test]
    fn apply_sets_lights_and_resorts() {
        let mut track = Track::with_channel(0);
        let a = track.add_event(Event::note(0, 0, 60, 100, 10)).unwrap();
        let b = track.add_event(Event::note(100, 0, 62, 100, 10)).unwrap();

        track
            .apply(&[
                Edit::SetLights { event: a, lights: vec![3] },
                Edit::SetTick { event: b, tick: 0 },
                Edit::SetTick { event: a, tick: 50 },
            ])
            .unwrap();

        let order: Vec<EventId> = track.iter().map(|(id, _)| id).collect();
        assert_eq!(order, vec![b, a]);
        assert_eq!(track.get(a).unwrap().as_note().unwrap().lights, vec![3]);
    }

    #[test]
    fn apply_is_all_or_nothing() {
        let mut track = Track::with_channel(0);
        let note = track.add_event(Event::note(0, 0, 60, 100, 10)).unwrap();
        let mut other = Track::new();
        let tempo = other.add_event(Event::tempo(0, 500_000)).unwrap();
        let stale = track.add_event(Event::note(5, 0, 61, 100, 10)).unwrap();
        track.remove_event(stale);

        let err = track
            .apply(&[
                Edit::SetLights { event: note, lights: vec![1] },
                Edit::SetLights { event: stale, lights: vec![2] },
            ])
            .unwrap_err();
        assert_eq!(err, ModelError::UnknownEvent(stale));
        assert!(track.get(note).unwrap().as_note().unwrap().lights.is_empty());

        let err = other
            .apply(&[Edit::SetDuration { event: tempo, duration: 4 }])
            .unwrap_err();
        assert_eq!(err, ModelError::NotANote(tempo));
    }

    #[test]
    fn selectors_find_first_matches() {
        let mut track = Track::new();
        track
            .add_events([
                Event::tempo(960, 400_000),
                Event::meta(0, MetaEvent::TrackName("conductor".into())),
                Event::tempo(0, 500_000),
            ])
            .unwrap();
        assert_eq!(track.name(), Some("conductor"));
        assert_eq!(track.tempo(), Some(500_000));
        assert_eq!(track.end_tick(), 960);
    }
}
