// Keyframer - MIDI performance to animation keyframes
// Module declarations

use clap::Parser;

pub mod commands;
pub mod composition;
pub mod config;
pub mod midi;
pub mod motion;
pub mod pipeline;

pub use composition::{Composition, CompositionSpec, GenerationOutcome, NoteRange, Session};
pub use config::BakeConfig;
pub use midi::{extract_events, extract_file, channel_ranges, MidiSource, NoteEvent, NoteFilter};
pub use motion::{AnimationHost, Archetype, Instrument, KeyframeRecord, SceneHost, SpringRig, Target};

pub fn run() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = commands::Cli::parse();

    match commands::execute(cli.command) {
        Ok(output) => println!("{}", output),
        Err(e) => {
            log::error!("{}", e.message());
            std::process::exit(1);
        }
    }
}
