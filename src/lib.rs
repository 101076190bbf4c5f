//! This crate compiles Turing machines into unrestricted grammars and linear bounded automata
//! into context-sensitive grammars, and decides whether a word is derivable by building its
//! derivation step by step. A direct tape simulator runs the same machines for comparison.

pub mod analyzer;
pub mod automaton;
pub mod derivation;
pub mod grammar;
pub mod interpreter;
pub mod loader;
pub mod parser;
pub mod programs;
pub mod rewrite;
pub mod types;

/// Re-exports the `Rule` enum from the parser module, used by the `pest` grammar.
pub use crate::parser::Rule;
/// Re-exports the `analyze` function and `AnalysisError` enum from the analyzer module.
pub use analyzer::{analyze, AnalysisError};
/// Re-exports the automaton model.
pub use automaton::{Automaton, AutomatonInfo, MachineKind, Tape};
/// Re-exports the derivation checker and its verdicts.
pub use derivation::{Acceptance, DerivationChecker, Phase, Rejection, Verdict, NOT_DERIVABLE};
/// Re-exports the grammar model.
pub use grammar::{Edge, Grammar, GrammarKind, GrammarSummary, Padding, ProductionTable};
/// Re-exports the tape simulator.
pub use interpreter::{RunOutcome, Step, TapeSimulator};
/// Re-exports the `AutomatonLoader` struct from the loader module.
pub use loader::AutomatonLoader;
/// Re-exports the `parse` function from the parser module.
pub use parser::parse;
/// Re-exports the embedded machine catalog.
pub use programs::{CatalogEntry, MachineCatalog, MACHINES, PRIMALITY};
/// Re-exports the rewrite primitive.
pub use rewrite::{SententialForm, Trace};
/// Re-exports the core types.
pub use types::{
    unary_word, Direction, GrammarError, Production, Symbol, Transition, EPSILON, UNARY_SYMBOL,
};
