//! Sample machines compiled into the crate, available without any descriptor on disk.

use crate::automaton::{Automaton, MachineKind};
use crate::parser::parse;
use crate::types::GrammarError;
use tracing::warn;

/// Name of the sample pair deciding whether a unary number is prime.
pub const PRIMALITY: &str = "primality";

// Embedded descriptors, one Turing machine and one bounded automaton per language
const MACHINE_TEXTS: [(&str, MachineKind, &str); 2] = [
    (
        PRIMALITY,
        MachineKind::Unbounded,
        include_str!("../machines/primality.tm"),
    ),
    (
        PRIMALITY,
        MachineKind::Bounded,
        include_str!("../machines/primality.lba"),
    ),
];

/// An embedded descriptor together with its parsed automaton.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub name: &'static str,
    pub text: &'static str,
    pub automaton: Automaton,
}

lazy_static::lazy_static! {
    pub static ref MACHINES: Vec<CatalogEntry> = MACHINE_TEXTS
        .iter()
        .filter_map(|&(name, kind, text)| match parse(text, kind) {
            Ok(automaton) => Some(CatalogEntry { name, text, automaton }),
            Err(e) => {
                warn!(machine = name, kind = %kind, error = %e, "Failed to parse embedded machine");
                None
            }
        })
        .collect();
}

pub struct MachineCatalog;

impl MachineCatalog {
    /// Looks up an embedded machine by name and kind.
    pub fn get(name: &str, kind: MachineKind) -> Result<Automaton, GrammarError> {
        Self::entry(name, kind).map(|entry| entry.automaton.clone())
    }

    /// The descriptor text an embedded machine was parsed from.
    pub fn text(name: &str, kind: MachineKind) -> Result<&'static str, GrammarError> {
        Self::entry(name, kind).map(|entry| entry.text)
    }

    /// Lists the names of the embedded machines, each once.
    pub fn names() -> Vec<&'static str> {
        let mut names: Vec<&'static str> = MACHINES.iter().map(|entry| entry.name).collect();
        names.dedup();
        names
    }

    fn entry(name: &str, kind: MachineKind) -> Result<&'static CatalogEntry, GrammarError> {
        MACHINES
            .iter()
            .find(|entry| entry.name == name && entry.automaton.kind() == kind)
            .ok_or_else(|| {
                GrammarError::ValidationError(format!(
                    "Machine '{}' ({}) not found",
                    name,
                    kind.extension()
                ))
            })
    }
}

/// The embedded primality machine of the given kind.
#[cfg(test)]
pub(crate) fn primality_automaton(kind: MachineKind) -> Automaton {
    MachineCatalog::get(PRIMALITY, kind).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_machines_parse() {
        assert_eq!(MACHINES.len(), MACHINE_TEXTS.len());
        assert_eq!(MachineCatalog::names(), vec![PRIMALITY]);
    }

    #[test]
    fn test_primality_pair() {
        let tm = primality_automaton(MachineKind::Unbounded);
        let lba = primality_automaton(MachineKind::Bounded);

        assert_eq!(tm.blank(), Some("B"));
        assert_eq!(lba.markers(), Some(("@", "$")));
        // The bounded automaton needs one extra transition to step off its left marker
        assert_eq!(tm.info().transition_count + 1, lba.info().transition_count);
        assert_eq!(tm.input_symbols(), lba.input_symbols());
    }

    #[test]
    fn test_descriptor_text() {
        let text = MachineCatalog::text(PRIMALITY, MachineKind::Bounded).unwrap();
        assert!(text.starts_with("@ 1 $"));
    }

    #[test]
    fn test_unknown_machine() {
        assert!(matches!(
            MachineCatalog::get("palindrome", MachineKind::Unbounded),
            Err(GrammarError::ValidationError(_))
        ));
    }
}
