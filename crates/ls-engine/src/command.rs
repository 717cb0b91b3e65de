//! Light commands: a delay followed by a batch of channel changes.

use heapless::LinearMap;
use ls_ir::{ChannelName, RawEvent, Tick, MAX_CHANNELS};

/// Output level of a light channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum LightState {
    Off = 0,
    On = 1,
}

impl LightState {
    /// Pin value sent to the hardware.
    pub fn value(self) -> u8 {
        self as u8
    }
}

/// One channel change and the event that caused it.
#[derive(Clone, Debug, PartialEq)]
pub struct Change {
    pub value: LightState,
    /// Absolute tick of the source event in the merged stream
    pub source_tick: Tick,
    pub source_event: RawEvent,
}

/// A batch of channel changes applied after `timeout` seconds.
///
/// The timeout is relative to the end of the previous command. Changes
/// iterate in the order their channels were first touched.
#[derive(Clone, Debug, PartialEq)]
pub struct Command {
    timeout: f64,
    changes: LinearMap<ChannelName, Change, MAX_CHANNELS>,
}

impl Default for Command {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl Command {
    pub(crate) fn new(timeout: f64) -> Self {
        Self {
            timeout,
            changes: LinearMap::new(),
        }
    }

    /// Delay in seconds before the changes take effect.
    pub fn timeout(&self) -> f64 {
        self.timeout
    }

    pub(crate) fn increase_timeout(&mut self, seconds: f64) {
        self.timeout += seconds;
    }

    /// Record a change; a later change to the same channel replaces it.
    ///
    /// Channel names come from a `ChannelSet`, which holds at most
    /// `MAX_CHANNELS` distinct names, so the map never runs out of room.
    pub(crate) fn set(&mut self, channel: ChannelName, change: Change) {
        let inserted = self.changes.insert(channel, change);
        debug_assert!(inserted.is_ok(), "more than MAX_CHANNELS channels in one command");
    }

    pub fn get(&self, channel: &str) -> Option<&Change> {
        self.changes.get(channel)
    }

    /// Channel value by name, if this command changes it.
    pub fn value(&self, channel: &str) -> Option<u8> {
        self.get(channel).map(|c| c.value.value())
    }

    pub fn changes(&self) -> impl Iterator<Item = (&str, &Change)> {
        self.changes.iter().map(|(name, change)| (name.as_str(), change))
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> ChannelName {
        ChannelName::from(s).unwrap()
    }

    fn change(value: LightState) -> Change {
        Change {
            value,
            source_tick: 0,
            source_event: RawEvent::note_on(0, 0, 60, 100),
        }
    }

    #[test]
    fn last_writer_wins() {
        let mut cmd = Command::default();
        cmd.set(name("garage"), change(LightState::On));
        cmd.set(name("tree"), change(LightState::On));
        cmd.set(name("garage"), change(LightState::Off));

        assert_eq!(cmd.len(), 2);
        assert_eq!(cmd.value("garage"), Some(0));
        assert_eq!(cmd.value("tree"), Some(1));
        assert_eq!(cmd.value("window"), None);
    }

    #[test]
    fn changes_keep_first_touch_order() {
        let mut cmd = Command::default();
        cmd.set(name("b"), change(LightState::On));
        cmd.set(name("a"), change(LightState::On));
        cmd.set(name("b"), change(LightState::Off));

        let order: Vec<&str> = cmd.changes().map(|(n, _)| n).collect();
        assert_eq!(order, vec!["b", "a"]);
    }

    #[test]
    fn holds_a_change_for_every_channel_of_a_full_set() {
        let names: Vec<String> = (0..MAX_CHANNELS).map(|i| format!("light-{i}")).collect();
        let set = ls_ir::ChannelSet::from_names(&names).unwrap();

        let mut cmd = Command::default();
        for index in 0..set.len() as u8 {
            cmd.set(set.name(index).unwrap(), change(LightState::On));
        }
        assert_eq!(cmd.len(), MAX_CHANNELS);
        assert_eq!(cmd.value("light-15"), Some(1));
    }

    #[test]
    fn timeout_accumulates() {
        let mut cmd = Command::new(0.5);
        cmd.increase_timeout(0.25);
        assert_eq!(cmd.timeout(), 0.75);
        assert!(cmd.is_empty());
    }
}
