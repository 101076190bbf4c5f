//! This module compiles an [`Automaton`] into a string-rewriting grammar whose derivations
//! mirror the automaton's runs. A Turing machine yields an unrestricted (type-0) grammar, a
//! linear bounded automaton yields a context-sensitive (type-1) grammar.
//!
//! Every grammar is split into three tables that are consulted in separate derivation
//! phases: *generation* builds the initial configuration for a word, *transition* mirrors
//! one machine step per production and *recovery* strips the bookkeeping once an accepting
//! configuration has been reached.

/// Builds a non-terminal from labels of any string-like type.
macro_rules! nt {
    ($($label:expr),+ $(,)?) => {
        $crate::types::Symbol::non_terminal([$($label.to_string()),+])
    };
}

mod context_sensitive;
mod unrestricted;

use crate::automaton::{Automaton, MachineKind, Tape};
use crate::types::{GrammarError, Production, Symbol};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::debug;

/// The two grammar constructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum GrammarKind {
    /// Type-0, built from a Turing machine.
    Unrestricted,
    /// Type-1, built from a linear bounded automaton.
    ContextSensitive,
}

impl GrammarKind {
    /// The grammar kind a machine of the given kind compiles to.
    pub fn for_machine(kind: MachineKind) -> Self {
        match kind {
            MachineKind::Unbounded => GrammarKind::Unrestricted,
            MachineKind::Bounded => GrammarKind::ContextSensitive,
        }
    }

    /// Index of the state token in the sentential form right after generation.
    ///
    /// The unrestricted token follows the blank cells generated left of the word.
    pub fn initial_cursor(&self, padding: Padding) -> usize {
        match self {
            GrammarKind::Unrestricted => padding.left,
            GrammarKind::ContextSensitive => 0,
        }
    }

    /// Width of the window a left move rewrites, starting one symbol before the cursor.
    ///
    /// An unrestricted left move rewrites `[b, C] q [a, X]`, a context-sensitive one only the
    /// two composites `[Z, b][q, X, a]`.
    pub fn backward_window(&self) -> usize {
        match self {
            GrammarKind::Unrestricted => 3,
            GrammarKind::ContextSensitive => 2,
        }
    }
}

impl fmt::Display for GrammarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrammarKind::Unrestricted => f.write_str("Zero-type grammar"),
            GrammarKind::ContextSensitive => f.write_str("One-type grammar"),
        }
    }
}

/// Productions grouped by left pattern.
///
/// Patterns are kept ordered so that iteration and dumps are deterministic. Alternatives of a
/// pattern keep the order in which they were inserted; inserting an existing production is a
/// no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductionTable {
    rules: BTreeMap<Vec<Symbol>, Vec<Vec<Symbol>>>,
}

impl ProductionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `left -> right`, returning `false` if the production was already present.
    pub fn insert(&mut self, left: Vec<Symbol>, right: Vec<Symbol>) -> bool {
        let alternatives = self.rules.entry(left).or_default();
        if alternatives.contains(&right) {
            return false;
        }

        alternatives.push(right);
        true
    }

    /// Returns the right-hand sides of `left`, in insertion order.
    pub fn get(&self, left: &[Symbol]) -> Option<&[Vec<Symbol>]> {
        self.rules.get(left).map(Vec::as_slice)
    }

    pub fn contains(&self, left: &[Symbol], right: &[Symbol]) -> bool {
        self.get(left)
            .is_some_and(|alternatives| alternatives.iter().any(|r| r == right))
    }

    /// The number of productions, counting every alternative.
    pub fn len(&self) -> usize {
        self.rules.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Iterates over every production, ordered by left pattern.
    pub fn productions(&self) -> impl Iterator<Item = Production> + '_ {
        self.rules.iter().flat_map(|(left, alternatives)| {
            alternatives
                .iter()
                .map(move |right| Production::new(left.clone(), right.clone()))
        })
    }

    /// Iterates over the left patterns that have more than one right-hand side.
    pub fn ambiguous_patterns(&self) -> impl Iterator<Item = &[Symbol]> {
        self.rules
            .iter()
            .filter(|(_, alternatives)| alternatives.len() > 1)
            .map(|(left, _)| left.as_slice())
    }
}

/// A side of the generated tape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Left,
    Right,
}

/// Blank cells generated around the word of an unrestricted configuration.
///
/// Bounded configurations are delimited by their markers and ignore the padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Padding {
    pub left: usize,
    pub right: usize,
}

impl Padding {
    /// One blank cell on the left, `len + 2` on the right.
    pub fn around(len: usize) -> Self {
        Self {
            left: 1,
            right: len + 2,
        }
    }

    /// Doubles the padding on the side the machine ran out of.
    pub fn widened(self, edge: Edge) -> Self {
        match edge {
            Edge::Left => Self {
                left: self.left.max(1) * 2,
                ..self
            },
            Edge::Right => Self {
                right: self.right.max(1) * 2,
                ..self
            },
        }
    }
}

/// One entry of a generation plan: apply `production` exactly `repeat` times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationStep {
    pub production: Production,
    pub repeat: usize,
}

impl GenerationStep {
    fn once(left: Symbol, right: Vec<Symbol>) -> Self {
        Self::times(left, right, 1)
    }

    fn times(left: Symbol, right: Vec<Symbol>, repeat: usize) -> Self {
        Self {
            production: Production::new(vec![left], right),
            repeat,
        }
    }
}

/// A grammar compiled from an automaton. Immutable once built.
#[derive(Debug, Clone)]
pub struct Grammar {
    kind: GrammarKind,
    alphabet: BTreeSet<String>,
    generation: ProductionTable,
    transition: ProductionTable,
    recovery: ProductionTable,
    automaton: Automaton,
}

impl Grammar {
    /// Compiles an automaton into the grammar matching its kind.
    pub fn from_automaton(automaton: &Automaton) -> Self {
        let (generation, transition, recovery) = match automaton.tape() {
            Tape::Unbounded { blank } => unrestricted::build(automaton, blank),
            Tape::Bounded { left, right } => context_sensitive::build(automaton, left, right),
        };

        let grammar = Self {
            kind: GrammarKind::for_machine(automaton.kind()),
            alphabet: automaton
                .input_symbols()
                .into_iter()
                .map(str::to_string)
                .collect(),
            generation,
            transition,
            recovery,
            automaton: automaton.clone(),
        };

        debug!(
            kind = %grammar.kind,
            generation = grammar.generation.len(),
            transition = grammar.transition.len(),
            recovery = grammar.recovery.len(),
            "Built grammar"
        );

        grammar
    }

    pub fn kind(&self) -> GrammarKind {
        self.kind
    }

    /// The terminal alphabet, i.e. the symbols a derivable word consists of.
    pub fn alphabet(&self) -> &BTreeSet<String> {
        &self.alphabet
    }

    pub fn generation(&self) -> &ProductionTable {
        &self.generation
    }

    pub fn transition(&self) -> &ProductionTable {
        &self.transition
    }

    pub fn recovery(&self) -> &ProductionTable {
        &self.recovery
    }

    pub fn automaton(&self) -> &Automaton {
        &self.automaton
    }

    pub fn start_symbol(&self) -> Symbol {
        match self.kind {
            GrammarKind::Unrestricted => unrestricted::start_symbol(),
            GrammarKind::ContextSensitive => context_sensitive::start_symbol(),
        }
    }

    /// The fixed sequence of generation productions that derives the initial configuration
    /// for `word`. The word must be non-empty.
    pub fn generation_plan(&self, word: &[String]) -> Vec<GenerationStep> {
        self.padded_generation_plan(word, Padding::around(word.len()))
    }

    /// Like [`Grammar::generation_plan`], with an explicit number of blank cells on each
    /// side of an unrestricted configuration.
    pub fn padded_generation_plan(
        &self,
        word: &[String],
        padding: Padding,
    ) -> Vec<GenerationStep> {
        match self.automaton.tape() {
            Tape::Unbounded { blank } => {
                unrestricted::generation_plan(self.automaton.start_state(), blank, word, padding)
            }
            Tape::Bounded { left, right } => context_sensitive::generation_plan(
                self.automaton.start_state(),
                left,
                right,
                word,
            ),
        }
    }

    /// Iterates over every production: generation, then transition, then recovery.
    pub fn productions(&self) -> impl Iterator<Item = Production> + '_ {
        self.generation
            .productions()
            .chain(self.transition.productions())
            .chain(self.recovery.productions())
    }

    pub fn summary(&self) -> GrammarSummary {
        GrammarSummary {
            kind: self.kind,
            alphabet_size: self.alphabet.len(),
            generation_count: self.generation.len(),
            transition_count: self.transition.len(),
            recovery_count: self.recovery.len(),
        }
    }

    /// Renders every production as a `left -> right` line.
    pub fn dump(&self) -> Vec<String> {
        self.productions().map(|p| p.to_string()).collect()
    }

    /// Writes [`Grammar::dump`] to a file, one production per line.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), GrammarError> {
        let path = path.as_ref();
        let mut content = self.dump().join("\n");
        content.push('\n');

        fs::write(path, content).map_err(|e| {
            GrammarError::FileError(format!("Failed to write {}: {}", path.display(), e))
        })?;

        debug!(path = %path.display(), "Dumped grammar");
        Ok(())
    }
}

/// Size summary of a grammar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GrammarSummary {
    pub kind: GrammarKind,
    pub alphabet_size: usize,
    pub generation_count: usize,
    pub transition_count: usize,
    pub recovery_count: usize,
}

impl GrammarSummary {
    pub fn total(&self) -> usize {
        self.generation_count + self.transition_count + self.recovery_count
    }
}

impl fmt::Display for GrammarSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "* * * {} * * *", self.kind)?;
        writeln!(f, "Sigma size: {}", self.alphabet_size)?;
        writeln!(f, "Generation productions: {}", self.generation_count)?;
        writeln!(f, "Transition productions: {}", self.transition_count)?;
        writeln!(f, "Recovery productions: {}", self.recovery_count)?;
        write!(f, "Total productions: {}", self.total())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::programs::primality_automaton;
    use tempfile::tempdir;

    #[test]
    fn test_table_ignores_duplicates() {
        let mut table = ProductionTable::new();

        assert!(table.insert(vec![nt!("A")], vec![nt!("b")]));
        assert!(!table.insert(vec![nt!("A")], vec![nt!("b")]));
        assert!(table.insert(vec![nt!("A")], vec![nt!("c")]));

        assert_eq!(table.len(), 2);
        assert_eq!(table.get(&[nt!("A")]).unwrap()[1], vec![nt!("c")]);
        assert!(table.contains(&[nt!("A")], &[nt!("b")]));
        assert!(!table.contains(&[nt!("B")], &[nt!("b")]));
        assert_eq!(table.ambiguous_patterns().count(), 1);
    }

    #[test]
    fn test_grammar_kind_follows_machine() {
        let unrestricted = Grammar::from_automaton(&primality_automaton(MachineKind::Unbounded));
        let bounded = Grammar::from_automaton(&primality_automaton(MachineKind::Bounded));

        assert_eq!(unrestricted.kind(), GrammarKind::Unrestricted);
        assert_eq!(bounded.kind(), GrammarKind::ContextSensitive);
        assert_eq!(unrestricted.start_symbol(), nt!("A0"));
        assert_eq!(bounded.start_symbol(), nt!("A1"));
        assert_eq!(bounded.alphabet().len(), 1);
    }

    #[test]
    fn test_padding_widens_one_side() {
        let padding = Padding::around(3);
        assert_eq!(padding, Padding { left: 1, right: 5 });

        assert_eq!(padding.widened(Edge::Left), Padding { left: 2, right: 5 });
        assert_eq!(padding.widened(Edge::Right), Padding { left: 1, right: 10 });
        assert_eq!(GrammarKind::Unrestricted.initial_cursor(padding), 1);
        assert_eq!(
            GrammarKind::Unrestricted.initial_cursor(padding.widened(Edge::Left)),
            2
        );
        assert_eq!(GrammarKind::ContextSensitive.initial_cursor(padding), 0);
    }

    #[test]
    fn test_summary() {
        let grammar = Grammar::from_automaton(&primality_automaton(MachineKind::Unbounded));
        let summary = grammar.summary();

        assert_eq!(summary.total(), grammar.productions().count());
        let text = summary.to_string();
        assert!(text.starts_with("* * * Zero-type grammar * * *"));
        assert!(text.contains("Sigma size: 1"));
    }

    #[test]
    fn test_dump_order() {
        let grammar = Grammar::from_automaton(&primality_automaton(MachineKind::Unbounded));
        let lines = grammar.dump();
        let generation = grammar.generation().len();

        assert_eq!(lines.len(), grammar.summary().total());
        assert!(lines[..generation].iter().all(|l| l.starts_with('A')));
        // Recovery comes last and ends with productions of the final state
        assert!(lines.last().unwrap().contains("accept"));
    }

    #[test]
    fn test_save_to_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("grammar.txt");
        let grammar = Grammar::from_automaton(&primality_automaton(MachineKind::Bounded));

        grammar.save_to_file(&path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), grammar.summary().total());
        assert!(content.contains("A1 -> [start, @, 1, 1, $]"));
    }

    #[test]
    fn test_save_to_missing_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("grammar.txt");
        let grammar = Grammar::from_automaton(&primality_automaton(MachineKind::Bounded));

        assert!(matches!(
            grammar.save_to_file(&path),
            Err(GrammarError::FileError(_))
        ));
    }
}
