// MIDI Input - Standard MIDI File loading and note event extraction
// Parses files with midly, pairs note-on/note-off messages, reports channel note ranges

pub mod extract;
pub mod ranges;
pub mod source;

#[cfg(test)]
pub(crate) mod fixtures;

pub use extract::{extract_events, extract_file, NoteEvent, NoteFilter};
pub use ranges::{channel_ranges, channel_ranges_from_path, ChannelRange};
pub use source::{MessageKind, MidiError, MidiSource, TimedMessage, DEFAULT_TEMPO_US};
