//! This module defines the core data structures shared by the automaton model, the grammar
//! builders and the derivation engine: grammar symbols, productions, machine transitions and
//! the crate-wide error type.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::Rule;

/// Label used as the "no input symbol" component of padding cells, written `ε` in dumps.
pub const EPSILON: &str = "ε";
/// The unary digit used by [`unary_word`].
pub const UNARY_SYMBOL: &str = "1";
/// The maximum number of labels a composite non-terminal may carry.
pub const MAX_LABELS: usize = 5;
/// The maximum width of a production's left-hand side.
pub const MAX_PATTERN_WIDTH: usize = 3;
/// Names of the helper non-terminals threaded through the generation phase.
pub const HELPER_NAMES: [&str; 4] = ["A0", "A1", "A2", "A3"];

/// A grammar symbol.
///
/// Terminals carry exactly one label. Non-terminals carry between one and [`MAX_LABELS`]
/// labels and encode a fragment of a machine configuration, e.g. `[q, @, X, a]` for a state
/// `q` reading the left marker of a cell holding `X` that was generated from input `a`.
///
/// Equality and ordering are structural over the variant and the whole label sequence.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Symbol {
    Terminal(String),
    NonTerminal(Vec<String>),
}

impl Symbol {
    /// Creates a terminal symbol.
    pub fn terminal(label: impl Into<String>) -> Self {
        Symbol::Terminal(label.into())
    }

    /// Creates a (possibly composite) non-terminal symbol.
    pub fn non_terminal<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        debug_assert!(
            (1..=MAX_LABELS).contains(&labels.len()),
            "non-terminal with {} labels",
            labels.len()
        );
        Symbol::NonTerminal(labels)
    }

    /// Returns every label of the symbol in order.
    pub fn labels(&self) -> &[String] {
        match self {
            Symbol::Terminal(label) => std::slice::from_ref(label),
            Symbol::NonTerminal(labels) => labels,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Symbol::Terminal(_))
    }

    /// Returns the label of a terminal, `None` for non-terminals.
    pub fn as_terminal(&self) -> Option<&str> {
        match self {
            Symbol::Terminal(label) => Some(label),
            Symbol::NonTerminal(_) => None,
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.labels() {
            [single] => write!(f, "{single}"),
            labels => write!(f, "[{}]", labels.join(", ")),
        }
    }
}

/// Writes a symbol sequence without separators, `ε` for the empty sequence.
pub fn write_symbols(f: &mut fmt::Formatter<'_>, symbols: &[Symbol]) -> fmt::Result {
    if symbols.is_empty() {
        return write!(f, "{EPSILON}");
    }

    for symbol in symbols {
        write!(f, "{symbol}")?;
    }

    Ok(())
}

/// A rewrite rule `left -> right`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Production {
    pub left: Vec<Symbol>,
    pub right: Vec<Symbol>,
}

impl Production {
    pub fn new(left: Vec<Symbol>, right: Vec<Symbol>) -> Self {
        debug_assert!((1..=MAX_PATTERN_WIDTH).contains(&left.len()));
        Self { left, right }
    }
}

impl fmt::Display for Production {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_symbols(f, &self.left)?;
        write!(f, " -> ")?;
        write_symbols(f, &self.right)
    }
}

/// Represents the possible directions a head can move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Direction {
    Left,
    Right,
}

impl Direction {
    /// Returns the keyword used for this direction in descriptor files.
    pub fn keyword(&self) -> &'static str {
        match self {
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// The right-hand side of a single δ entry: `δ(state, read) = (next_state, write, direction)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    /// The state the machine moves to.
    pub next_state: String,
    /// The symbol written over the one that was read.
    pub write: String,
    /// The direction the head moves after writing.
    pub direction: Direction,
}

/// Builds the unary encoding `1^n` of a number.
pub fn unary_word(n: usize) -> Vec<String> {
    vec![UNARY_SYMBOL.to_string(); n]
}

/// Represents the errors that can occur while loading machines, building grammars or
/// checking derivations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GrammarError {
    /// Indicates a syntax error in a machine descriptor.
    #[error("Descriptor parsing error: {0}")]
    ParseError(#[from] Box<pest::error::Error<Rule>>),
    /// Indicates a descriptor that parsed but describes an inconsistent machine.
    #[error("Descriptor validation error: {0}")]
    ValidationError(String),
    /// Indicates an error related to reading descriptors or writing dumps.
    #[error("File error: {0}")]
    FileError(String),
    /// Indicates a word that cannot be derived by construction (empty, or foreign symbols).
    #[error("Invalid word: {0}")]
    InvalidWord(String),
    /// Indicates that a derivation or a simulation ran past its step budget.
    #[error("Step limit of {0} exceeded")]
    StepLimitExceeded(usize),
    /// Indicates that a grammar and its automaton disagree. This is a defect, not a rejection.
    #[error("Internal invariant violated: {0}")]
    InvariantViolation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_serialization() {
        let left_json = serde_json::to_string(&Direction::Left).unwrap();
        let right_json = serde_json::to_string(&Direction::Right).unwrap();

        assert_eq!(left_json, "\"Left\"");
        assert_eq!(right_json, "\"Right\"");

        let left: Direction = serde_json::from_str(&left_json).unwrap();
        assert_eq!(left, Direction::Left);
    }

    #[test]
    fn test_symbol_equality_is_structural() {
        let a = Symbol::non_terminal(["q0", "@", "1", "1"]);
        let b = Symbol::non_terminal(vec!["q0".to_string(), "@".into(), "1".into(), "1".into()]);
        let c = Symbol::non_terminal(["q0", "@", "1"]);

        assert_eq!(a, b);
        assert_ne!(a, c);
        // Same label, different variant
        assert_ne!(Symbol::terminal("q0"), Symbol::non_terminal(["q0"]));
    }

    #[test]
    fn test_symbol_display() {
        assert_eq!(Symbol::terminal("1").to_string(), "1");
        assert_eq!(Symbol::non_terminal(["A0"]).to_string(), "A0");
        assert_eq!(Symbol::non_terminal([EPSILON, "B"]).to_string(), "[ε, B]");
    }

    #[test]
    fn test_production_display() {
        let production = Production::new(
            vec![Symbol::non_terminal(["q"]), Symbol::non_terminal(["1", "1"])],
            vec![Symbol::non_terminal(["1", "x"]), Symbol::non_terminal(["p"])],
        );
        assert_eq!(production.to_string(), "q[1, 1] -> [1, x]p");

        let erase = Production::new(vec![Symbol::non_terminal(["A3"])], vec![]);
        assert_eq!(erase.to_string(), "A3 -> ε");
    }

    #[test]
    fn test_terminal_accessors() {
        let terminal = Symbol::terminal("1");
        assert!(terminal.is_terminal());
        assert_eq!(terminal.as_terminal(), Some("1"));
        assert_eq!(terminal.labels(), ["1".to_string()]);

        let composite = Symbol::non_terminal(["1", "d"]);
        assert!(!composite.is_terminal());
        assert_eq!(composite.as_terminal(), None);
    }

    #[test]
    fn test_unary_word() {
        assert_eq!(unary_word(3), vec!["1", "1", "1"]);
        assert!(unary_word(0).is_empty());
    }

    #[test]
    fn test_error_display() {
        let error = GrammarError::InvalidWord("empty".to_string());
        assert!(error.to_string().contains("Invalid word"));
        assert!(GrammarError::StepLimitExceeded(10).to_string().contains("10"));
    }
}
