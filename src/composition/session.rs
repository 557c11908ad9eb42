// Session - Caller-owned collection of instruments and compositions
// Replaces any process-wide registry: whoever owns the session decides what gets generated

use super::builder::{Composition, CompositionError, CompositionSpec};
use super::outcome::GenerationOutcome;
use crate::midi::MidiSource;
use crate::motion::{AnimationHost, Instrument};

#[derive(Debug, Clone, Default)]
pub struct Session {
    instruments: Vec<Instrument>,
    compositions: Vec<Composition>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_instrument(&mut self, instrument: Instrument) {
        self.instruments.push(instrument);
    }

    pub fn add_composition(&mut self, composition: Composition) {
        self.compositions.push(composition);
    }

    /// Build a composition from `spec` and add it
    pub fn compose(&mut self, source: &MidiSource, spec: &CompositionSpec) -> Result<&Composition, CompositionError> {
        let composition = Composition::build(source, spec)?;
        self.compositions.push(composition);
        Ok(&self.compositions[self.compositions.len() - 1])
    }

    pub fn instruments(&self) -> &[Instrument] {
        &self.instruments
    }

    pub fn compositions(&self) -> &[Composition] {
        &self.compositions
    }

    /// Total instruments, including every note of every composition
    pub fn instrument_count(&self) -> usize {
        self.instruments.len()
            + self
                .compositions
                .iter()
                .map(|c| c.instruments().len())
                .sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.instrument_count() == 0
    }

    /// Generate standalone instruments (in insertion order), then compositions
    pub fn generate_all<H: AnimationHost + ?Sized>(&self, host: &mut H) -> GenerationOutcome {
        let mut outcome = GenerationOutcome::new();

        for instrument in &self.instruments {
            outcome.run(instrument, host);
        }
        for composition in &self.compositions {
            outcome.extend(composition.generate_all(host));
        }

        log::info!(
            "Generated {} keyframes for {} instruments ({} failed)",
            outcome.records.len(),
            outcome.outcomes.len(),
            outcome.failures().count()
        );

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composition::{CompositionSpec, NoteRange};
    use crate::midi::{MessageKind, NoteFilter, TimedMessage};
    use crate::motion::{Archetype, MovementParams, SceneHost, SpringParams, Target};

    fn source() -> MidiSource {
        MidiSource::from_messages(vec![
            TimedMessage::new(
                0.5,
                MessageKind::NoteOn {
                    channel: 9,
                    note: 36,
                    velocity: 127,
                },
            ),
            TimedMessage::new(
                0.25,
                MessageKind::NoteOff {
                    channel: 9,
                    note: 36,
                    velocity: 0,
                },
            ),
        ])
    }

    fn toggle() -> Archetype {
        Archetype::Movement(MovementParams {
            initial_position: 0.0,
            final_position: 1.0,
        })
    }

    #[test]
    fn test_session_runs_instruments_then_compositions() {
        let source = source();
        let mut session = Session::new();
        assert!(session.is_empty());

        session.add_instrument(
            Instrument::new(
                &source,
                Target::parse("Kick_Pedal", "rotation_euler.x").unwrap(),
                Archetype::Spring(SpringParams::new(0.0, 0.3)),
                NoteFilter::note(36),
            )
            .unwrap(),
        );
        session
            .compose(
                &source,
                &CompositionSpec::new("Pad", "location.z".parse().unwrap(), toggle())
                    .with_range(NoteRange::new(35, 38).unwrap()),
            )
            .unwrap();
        assert_eq!(session.instrument_count(), 4);

        let mut host = SceneHost::permissive(24.0);
        let outcome = session.generate_all(&mut host);

        let names: Vec<&str> = outcome.outcomes.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["Kick_Pedal", "Pad_35", "Pad_36", "Pad_37"]);
        assert!(outcome.is_complete());

        // Spring bakes frames 0..=ceil((0.75 + 1.0) * 24), movement adds 4
        assert_eq!(outcome.records.len(), 43 + 4);
    }

    #[test]
    fn test_session_generation_is_repeatable() {
        let source = source();
        let mut session = Session::new();
        session.add_instrument(
            Instrument::new(
                &source,
                Target::parse("Kick", "scale.z").unwrap(),
                toggle(),
                NoteFilter::all(),
            )
            .unwrap(),
        );

        let mut host = SceneHost::permissive(30.0);
        let first = session.generate_all(&mut host);
        let second = session.generate_all(&mut host);
        assert_eq!(first, second);
        assert_eq!(host.curves().count(), 1);
    }
}
