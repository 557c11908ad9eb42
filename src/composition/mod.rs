// Composition - Note-indexed instrument sets and the sessions that own them

pub mod builder;
pub mod outcome;
pub mod session;

pub use builder::{instrument_name, Composition, CompositionError, CompositionSpec, NoteRange};
pub use outcome::{GenerationOutcome, InstrumentOutcome};
pub use session::Session;
