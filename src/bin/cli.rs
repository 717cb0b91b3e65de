//! lightshow CLI: compile a MIDI file into a light show.
//!
//! Usage:
//!   lightshow path/to/song.mid
//!   lightshow path/to/song.mid --config lights.ron --json show.json --midi out.mid
//!
//! Log verbosity follows `RUST_LOG` (default `warn`).

use ls_master::{Controller, LightConfig};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::env;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    let path = args.get(1).filter(|a| !a.starts_with("--")).unwrap_or_else(|| {
        eprintln!("Usage: lightshow <file.mid> [--config lights.ron] [--json out.json] [--midi out.mid]");
        std::process::exit(1);
    });

    let option = |flag: &str| {
        args.iter()
            .position(|a| a == flag)
            .and_then(|i| args.get(i + 1))
            .cloned()
    };
    let config_path = option("--config");
    let json_path = option("--json");
    let midi_path = option("--midi");
    tracing::debug!(?config_path, ?json_path, ?midi_path, "parsed arguments");

    let data = fs::read(path).unwrap_or_else(|e| fail(&format!("Failed to read {}: {}", path, e)));

    let mut ctrl = Controller::new();
    ctrl.load_midi(&data)
        .unwrap_or_else(|e| fail(&format!("Failed to load {}: {}", path, e)));

    if let Some(config_path) = &config_path {
        let text = fs::read_to_string(config_path)
            .unwrap_or_else(|e| fail(&format!("Failed to read {}: {}", config_path, e)));
        let config = LightConfig::from_ron(&text)
            .unwrap_or_else(|e| fail(&format!("{}: {}", config_path, e)));
        let touched = ctrl
            .apply_config(&config)
            .unwrap_or_else(|e| fail(&format!("{}: {}", config_path, e)));
        println!("Assigned lights to {} notes", touched);
    }

    let song = ctrl.song();
    println!("Title:    {}", song.title);
    println!("Timebase: {} ticks per beat", song.timebase);
    println!(
        "Tracks:   {} ({} with a channel)",
        song.tracks.len(),
        song.channel_tracks().count()
    );
    match song.tempo() {
        Some(us) => println!("Tempo:    {:.2} BPM", 60_000_000.0 / us as f64),
        None => println!("Tempo:    none"),
    }
    let notes: usize = song
        .tracks
        .iter()
        .map(|t| t.events().filter(|e| e.as_note().is_some()).count())
        .sum();
    println!("Notes:    {}", notes);
    println!("Length:   {} ticks", song.end_tick());

    let commands = ctrl
        .compile_lights()
        .unwrap_or_else(|e| fail(&format!("Failed to compile lights: {}", e)));
    let length: f64 = commands.iter().map(|c| c.timeout()).sum();
    println!("Commands: {} over {:.2}s", commands.len(), length);

    if let Some(json_path) = &json_path {
        let file = File::create(json_path)
            .unwrap_or_else(|e| fail(&format!("Failed to create {}: {}", json_path, e)));
        let mut writer = BufWriter::new(file);
        ls_master::write_json(&mut writer, &commands)
            .unwrap_or_else(|e| fail(&format!("Failed to write {}: {}", json_path, e)));
        writer
            .flush()
            .unwrap_or_else(|e| fail(&format!("Failed to write {}: {}", json_path, e)));
        println!("Wrote {}", json_path);
    }

    if let Some(midi_path) = &midi_path {
        let bytes = ctrl
            .export_midi()
            .unwrap_or_else(|e| fail(&format!("Failed to encode MIDI: {}", e)));
        fs::write(midi_path, &bytes)
            .unwrap_or_else(|e| fail(&format!("Failed to write {}: {}", midi_path, e)));
        println!("Wrote {} ({} bytes)", midi_path, bytes.len());
    }
}

fn fail(message: &str) -> ! {
    eprintln!("{}", message);
    std::process::exit(1);
}
