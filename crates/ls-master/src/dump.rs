//! JSON dump of compiled light commands.
//!
//! Each command becomes `{ "timeout", "changes": {name: value}, "raw":
//! {name: {value, tick, event}} }`, channels in the order the command
//! first touched them.

use std::io::Write;

use ls_engine::Command;
use ls_ir::{RawEvent, Tick};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

#[derive(Serialize)]
struct CommandDump<'a> {
    timeout: f64,
    changes: Changes<'a>,
    raw: Sources<'a>,
}

struct Changes<'a>(&'a Command);

impl Serialize for Changes<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, change) in self.0.changes() {
            map.serialize_entry(name, &change.value.value())?;
        }
        map.end()
    }
}

#[derive(Serialize)]
struct Source<'a> {
    value: u8,
    tick: Tick,
    event: &'a RawEvent,
}

struct Sources<'a>(&'a Command);

impl Serialize for Sources<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, change) in self.0.changes() {
            let source = Source {
                value: change.value.value(),
                tick: change.source_tick,
                event: &change.source_event,
            };
            map.serialize_entry(name, &source)?;
        }
        map.end()
    }
}

fn dumps(commands: &[Command]) -> Vec<CommandDump<'_>> {
    commands
        .iter()
        .map(|c| CommandDump {
            timeout: c.timeout(),
            changes: Changes(c),
            raw: Sources(c),
        })
        .collect()
}

pub fn write_json(w: &mut impl Write, commands: &[Command]) -> serde_json::Result<()> {
    serde_json::to_writer_pretty(w, &dumps(commands))
}

pub fn commands_to_json(commands: &[Command]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&dumps(commands))
}
