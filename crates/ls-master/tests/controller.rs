//! End-to-end tests: MIDI bytes → controller → light commands.

use ls_ir::{Edit, RawEvent, RawSong};
use ls_master::{Controller, Error, LightConfig};
use midly::num::{u15, u24, u28, u4, u7};
use midly::{Format, Header, MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind};

fn key(delta: u32, channel: u8, key: u8, vel: u8) -> TrackEvent<'static> {
    TrackEvent {
        delta: u28::new(delta),
        kind: TrackEventKind::Midi {
            channel: u4::new(channel),
            message: MidiMessage::NoteOn {
                key: u7::new(key),
                vel: u7::new(vel),
            },
        },
    }
}

fn meta(delta: u32, m: MetaMessage<'static>) -> TrackEvent<'static> {
    TrackEvent {
        delta: u28::new(delta),
        kind: TrackEventKind::Meta(m),
    }
}

/// Conductor track plus two note tracks at timebase 480 and 120 bpm.
fn two_track_midi() -> Vec<u8> {
    let mut smf = Smf::new(Header::new(Format::Parallel, Timing::Metrical(u15::new(480))));
    smf.tracks = vec![
        vec![
            meta(0, MetaMessage::TrackName(b"Demo")),
            meta(0, MetaMessage::Tempo(u24::new(500_000))),
            meta(0, MetaMessage::EndOfTrack),
        ],
        vec![key(0, 0, 60, 100), key(480, 0, 60, 0), meta(0, MetaMessage::EndOfTrack)],
        vec![key(240, 1, 64, 100), key(240, 1, 64, 0), meta(0, MetaMessage::EndOfTrack)],
    ];
    let mut bytes = Vec::new();
    smf.write_std(&mut bytes).unwrap();
    bytes
}

const CONFIG: &str = r#"(
    assignments: [
        (track: 1, lights: [0]),
        (track: 2, note: Some(64), lights: [1]),
    ],
)"#;

fn loaded() -> Controller {
    let mut ctrl = Controller::new();
    ctrl.load_midi(&two_track_midi()).unwrap();
    ctrl
}

#[test]
fn compiles_assigned_lights() {
    let mut ctrl = loaded();
    let touched = ctrl.apply_config(&LightConfig::from_ron(CONFIG).unwrap()).unwrap();
    assert_eq!(touched, 2);

    let commands = ctrl.compile_lights().unwrap();
    assert_eq!(commands.len(), 3);
    assert_eq!(commands[0].timeout(), 0.0);
    assert_eq!(commands[0].value("garage"), Some(1));
    assert!((commands[1].timeout() - 0.25).abs() < 1e-9);
    assert_eq!(commands[1].value("top-right"), Some(1));
    assert!((commands[2].timeout() - 0.25).abs() < 1e-9);
    assert_eq!(commands[2].value("garage"), Some(0));
    assert_eq!(commands[2].value("top-right"), Some(0));
}

#[test]
fn unassigned_song_compiles_to_timing_only() {
    let commands = loaded().compile_lights().unwrap();
    assert_eq!(commands.len(), 1);
    assert!(commands[0].is_empty());
    assert!((commands[0].timeout() - 0.5).abs() < 1e-9);
}

#[test]
fn json_dump_lists_every_command() {
    let mut ctrl = loaded();
    ctrl.apply_config(&LightConfig::from_ron(CONFIG).unwrap()).unwrap();

    let json: serde_json::Value = serde_json::from_str(&ctrl.lights_json().unwrap()).unwrap();
    let list = json.as_array().unwrap();
    assert_eq!(list.len(), 3);
    assert_eq!(list[1]["changes"]["top-right"], 1);
    assert_eq!(list[2]["raw"]["garage"]["tick"], 480);
}

#[test]
fn custom_channels_rename_output() {
    let mut ctrl = loaded();
    let config = LightConfig::from_ron(
        r#"(channels: Some(["porch", "door"]), assignments: [(track: 2, lights: [1])])"#,
    )
    .unwrap();
    ctrl.apply_config(&config).unwrap();
    assert_eq!(ctrl.channels().len(), 2);

    let commands = ctrl.compile_lights().unwrap();
    assert_eq!(commands[0].value("door"), Some(1));
}

#[test]
fn failed_config_keeps_channels() {
    let mut ctrl = loaded();
    let config = LightConfig::from_ron(
        r#"(channels: Some(["porch"]), assignments: [(track: 1, lights: [3])])"#,
    )
    .unwrap();
    assert!(matches!(ctrl.apply_config(&config), Err(Error::Config(_))));
    assert_eq!(ctrl.channels().len(), 10);
}

#[test]
fn lights_survive_midi_export_only_in_memory() {
    let mut ctrl = loaded();
    ctrl.apply_config(&LightConfig::from_ron(CONFIG).unwrap()).unwrap();

    let mut reloaded = Controller::new();
    reloaded.load_midi(&ctrl.export_midi().unwrap()).unwrap();
    assert_eq!(reloaded.song().tracks.len(), 3);
    assert!(reloaded
        .song()
        .tracks
        .iter()
        .flat_map(|t| t.events())
        .filter_map(|e| e.as_note())
        .all(|n| n.lights.is_empty()));
}

#[test]
fn edit_track_moves_a_note() {
    let mut ctrl = loaded();
    ctrl.apply_config(&LightConfig::from_ron(CONFIG).unwrap()).unwrap();

    let (id, _) = ctrl.song().tracks[2].iter().find(|(_, e)| e.as_note().is_some()).unwrap();
    ctrl.edit_track(2, &[Edit::SetTick { event: id, tick: 0 }]).unwrap();

    let commands = ctrl.compile_lights().unwrap();
    assert_eq!(commands[0].value("garage"), Some(1));
    assert_eq!(commands[0].value("top-right"), Some(1));
    assert!(matches!(ctrl.edit_track(9, &[]), Err(Error::UnknownTrack(9))));
}

#[test]
fn missing_tempo_is_reported() {
    let raw = RawSong {
        format: 1,
        timebase: 480,
        tracks: vec![vec![
            RawEvent::note_on(0, 0, 60, 100),
            RawEvent::note_off(10, 0, 60),
            RawEvent::end_of_track(),
        ]],
    };
    let mut ctrl = Controller::new();
    ctrl.load_raw(&raw).unwrap();
    assert!(ctrl.export_midi().is_ok());
    assert!(matches!(
        ctrl.compile_lights(),
        Err(Error::Compile(ls_master::CompileError::MissingTempo))
    ));
}

#[test]
fn format2_is_unsupported() {
    let raw = RawSong {
        format: 2,
        timebase: 480,
        tracks: vec![],
    };
    assert!(matches!(
        Controller::new().load_raw(&raw),
        Err(Error::Format(ls_master::FormatError::UnsupportedFormat(2)))
    ));
}
