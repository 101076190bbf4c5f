//! This module defines the `Automaton` model shared by both machine variants: the
//! unbounded-tape Turing machine and the linear bounded automaton whose tape is fenced by two
//! boundary markers.

use crate::types::Transition;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// The two machine variants understood by the loader and the grammar builders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MachineKind {
    /// A Turing machine with an unbounded, blank-filled tape.
    Unbounded,
    /// A linear bounded automaton working between two boundary markers.
    Bounded,
}

impl MachineKind {
    /// The conventional descriptor file extension for this kind.
    pub fn extension(&self) -> &'static str {
        match self {
            MachineKind::Unbounded => "tm",
            MachineKind::Bounded => "lba",
        }
    }

    /// Maps a descriptor file extension back to its kind.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension {
            "tm" => Some(MachineKind::Unbounded),
            "lba" => Some(MachineKind::Bounded),
            _ => None,
        }
    }
}

impl fmt::Display for MachineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MachineKind::Unbounded => f.write_str("Turing machine"),
            MachineKind::Bounded => f.write_str("Linear bounded automaton"),
        }
    }
}

/// How the working tape is delimited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tape {
    /// Unwritten cells read as `blank`.
    Unbounded { blank: String },
    /// The input is enclosed in `left` and `right` markers that are never overwritten.
    Bounded { left: String, right: String },
}

/// A deterministic single-tape machine.
///
/// The transition function is partial: a missing `(state, symbol)` entry means the machine
/// halts in that configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Automaton {
    alphabet: BTreeSet<String>,
    tape_alphabet: BTreeSet<String>,
    tape: Tape,
    states: BTreeSet<String>,
    start_state: String,
    final_states: BTreeSet<String>,
    delta: BTreeMap<(String, String), Transition>,
}

impl Automaton {
    /// Creates an automaton. The state set is derived from the start state, the final states
    /// and every state mentioned by a transition.
    pub fn new(
        alphabet: BTreeSet<String>,
        tape_alphabet: BTreeSet<String>,
        tape: Tape,
        start_state: String,
        final_states: BTreeSet<String>,
        delta: BTreeMap<(String, String), Transition>,
    ) -> Self {
        let mut states = BTreeSet::new();
        states.insert(start_state.clone());
        states.extend(final_states.iter().cloned());
        for ((state, _), transition) in &delta {
            states.insert(state.clone());
            states.insert(transition.next_state.clone());
        }

        Self {
            alphabet,
            tape_alphabet,
            tape,
            states,
            start_state,
            final_states,
            delta,
        }
    }

    pub fn kind(&self) -> MachineKind {
        match self.tape {
            Tape::Unbounded { .. } => MachineKind::Unbounded,
            Tape::Bounded { .. } => MachineKind::Bounded,
        }
    }

    /// The input alphabet Σ as written in the descriptor.
    pub fn alphabet(&self) -> &BTreeSet<String> {
        &self.alphabet
    }

    /// The tape alphabet Γ as written in the descriptor.
    pub fn tape_alphabet(&self) -> &BTreeSet<String> {
        &self.tape_alphabet
    }

    pub fn tape(&self) -> &Tape {
        &self.tape
    }

    /// The blank symbol of an unbounded machine.
    pub fn blank(&self) -> Option<&str> {
        match &self.tape {
            Tape::Unbounded { blank } => Some(blank),
            Tape::Bounded { .. } => None,
        }
    }

    /// The `(left, right)` boundary markers of a bounded automaton.
    pub fn markers(&self) -> Option<(&str, &str)> {
        match &self.tape {
            Tape::Unbounded { .. } => None,
            Tape::Bounded { left, right } => Some((left, right)),
        }
    }

    /// Returns `true` if the symbol is one of the boundary markers.
    pub fn is_marker(&self, symbol: &str) -> bool {
        self.markers()
            .is_some_and(|(left, right)| symbol == left || symbol == right)
    }

    /// Σ without the boundary markers, i.e. the symbols a word may consist of.
    pub fn input_symbols(&self) -> Vec<&str> {
        self.alphabet
            .iter()
            .map(String::as_str)
            .filter(|symbol| !self.is_marker(symbol))
            .collect()
    }

    /// Γ without the boundary markers, i.e. the symbols a cell may hold.
    pub fn cell_symbols(&self) -> Vec<&str> {
        self.tape_alphabet
            .iter()
            .map(String::as_str)
            .filter(|symbol| !self.is_marker(symbol))
            .collect()
    }

    pub fn states(&self) -> &BTreeSet<String> {
        &self.states
    }

    pub fn is_state(&self, label: &str) -> bool {
        self.states.contains(label)
    }

    pub fn start_state(&self) -> &str {
        &self.start_state
    }

    pub fn final_states(&self) -> &BTreeSet<String> {
        &self.final_states
    }

    pub fn is_final(&self, state: &str) -> bool {
        self.final_states.contains(state)
    }

    /// Looks up `δ(state, symbol)`.
    pub fn transition(&self, state: &str, symbol: &str) -> Option<&Transition> {
        self.delta.get(&(state.to_string(), symbol.to_string()))
    }

    /// Iterates over every δ entry as `(state, read, transition)`, ordered by state and symbol.
    pub fn transitions(&self) -> impl Iterator<Item = (&str, &str, &Transition)> {
        self.delta
            .iter()
            .map(|((state, read), transition)| (state.as_str(), read.as_str(), transition))
    }

    /// Collects the summary printed when a machine is loaded.
    pub fn info(&self) -> AutomatonInfo {
        AutomatonInfo {
            kind: self.kind(),
            alphabet_size: self.alphabet.len(),
            tape_alphabet_size: self.tape_alphabet.len(),
            state_count: self.states.len(),
            transition_count: self.delta.len(),
        }
    }
}

/// Size summary of an automaton.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutomatonInfo {
    pub kind: MachineKind,
    pub alphabet_size: usize,
    pub tape_alphabet_size: usize,
    pub state_count: usize,
    pub transition_count: usize,
}

impl fmt::Display for AutomatonInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "* * * {} * * *", self.kind)?;
        writeln!(f, "Sigma size: {}", self.alphabet_size)?;
        writeln!(f, "Gamma size: {}", self.tape_alphabet_size)?;
        writeln!(f, "Total states: {}", self.state_count)?;
        write!(f, "Total transitions: {}", self.transition_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Direction;

    fn set(symbols: &[&str]) -> BTreeSet<String> {
        symbols.iter().map(|s| s.to_string()).collect()
    }

    fn create_bounded() -> Automaton {
        let mut delta = BTreeMap::new();
        delta.insert(
            ("start".to_string(), "@".to_string()),
            Transition {
                next_state: "scan".to_string(),
                write: "@".to_string(),
                direction: Direction::Right,
            },
        );
        delta.insert(
            ("scan".to_string(), "1".to_string()),
            Transition {
                next_state: "done".to_string(),
                write: "x".to_string(),
                direction: Direction::Right,
            },
        );

        Automaton::new(
            set(&["@", "1", "$"]),
            set(&["@", "1", "x", "$"]),
            Tape::Bounded {
                left: "@".to_string(),
                right: "$".to_string(),
            },
            "start".to_string(),
            set(&["done"]),
            delta,
        )
    }

    #[test]
    fn test_states_are_collected_from_transitions() {
        let automaton = create_bounded();

        assert_eq!(automaton.states(), &set(&["done", "scan", "start"]));
        assert!(automaton.is_final("done"));
        assert!(!automaton.is_final("scan"));
    }

    #[test]
    fn test_marker_filtering() {
        let automaton = create_bounded();

        assert_eq!(automaton.kind(), MachineKind::Bounded);
        assert_eq!(automaton.markers(), Some(("@", "$")));
        assert_eq!(automaton.blank(), None);
        assert_eq!(automaton.input_symbols(), vec!["1"]);
        assert_eq!(automaton.cell_symbols(), vec!["1", "x"]);
    }

    #[test]
    fn test_transition_lookup() {
        let automaton = create_bounded();

        let transition = automaton.transition("scan", "1").unwrap();
        assert_eq!(transition.next_state, "done");
        assert_eq!(transition.write, "x");
        assert!(automaton.transition("scan", "x").is_none());
    }

    #[test]
    fn test_info() {
        let info = create_bounded().info();

        assert_eq!(info.state_count, 3);
        assert_eq!(info.transition_count, 2);
        assert!(info.to_string().contains("Linear bounded automaton"));
    }

    #[test]
    fn test_kind_extensions() {
        assert_eq!(
            MachineKind::from_extension(MachineKind::Bounded.extension()),
            Some(MachineKind::Bounded)
        );
        assert_eq!(MachineKind::from_extension("tur"), None);
    }
}
