// Channel Range Analysis - Lowest and highest note played on each MIDI channel
// Lenient by design: used for feedback only, so unreadable files yield an empty result

use std::collections::BTreeMap;
use std::path::Path;

use midly::{MidiMessage, Smf, TrackEventKind};
use serde::{Deserialize, Serialize};

/// Note span used on one channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRange {
    pub min_note: u8,
    pub max_note: u8,
}

/// Scan every track for sounding note-ons and report the note span per channel
///
/// Channels without any note-on are omitted. Parse failures return an empty map.
pub fn channel_ranges(data: &[u8]) -> BTreeMap<u8, ChannelRange> {
    let smf = match Smf::parse(data) {
        Ok(smf) => smf,
        Err(e) => {
            log::warn!("Channel range scan skipped, MIDI did not parse: {}", e);
            return BTreeMap::new();
        }
    };

    // (min, max) per channel; min > max marks an unused channel
    let mut bounds = [(127u8, 0u8); 16];

    for track in &smf.tracks {
        for event in track {
            if let TrackEventKind::Midi {
                channel,
                message: MidiMessage::NoteOn { key, vel },
            } = event.kind
            {
                if vel.as_int() == 0 {
                    continue;
                }

                let note = key.as_int();
                let (min, max) = &mut bounds[channel.as_int() as usize];
                *min = (*min).min(note);
                *max = (*max).max(note);
            }
        }
    }

    bounds
        .iter()
        .enumerate()
        .filter(|(_, (min, max))| min <= max)
        .map(|(channel, &(min_note, max_note))| {
            (channel as u8, ChannelRange { min_note, max_note })
        })
        .collect()
}

/// Read a MIDI file and scan its channel ranges; unreadable files yield an empty map
pub fn channel_ranges_from_path(path: &Path) -> BTreeMap<u8, ChannelRange> {
    match std::fs::read(path) {
        Ok(data) => channel_ranges(&data),
        Err(e) => {
            log::warn!("Channel range scan skipped, cannot read {}: {}", path.display(), e);
            BTreeMap::new()
        }
    }
}
