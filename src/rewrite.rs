//! The rewrite primitive: every derivation step, in every phase, is a call to
//! [`SententialForm::apply_first_match`].

use crate::types::{write_symbols, Production, Symbol};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::trace;

/// The evolving symbol sequence of a single derivation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SententialForm {
    symbols: Vec<Symbol>,
}

impl SententialForm {
    /// Creates a form holding a single start symbol.
    pub fn new(start: Symbol) -> Self {
        Self {
            symbols: vec![start],
        }
    }

    pub fn from_symbols(symbols: Vec<Symbol>) -> Self {
        Self { symbols }
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Symbol> {
        self.symbols.get(index)
    }

    /// Returns the `width` symbols starting at `start`, or `None` if the window does not fit.
    pub fn window(&self, start: usize, width: usize) -> Option<&[Symbol]> {
        self.symbols.get(start..start.checked_add(width)?)
    }

    /// Replaces the `len` symbols starting at `start` with `with`.
    ///
    /// # Panics
    ///
    /// Panics if the range is out of bounds.
    pub fn replace_range(&mut self, start: usize, len: usize, with: &[Symbol]) {
        self.symbols.splice(start..start + len, with.iter().cloned());
    }

    /// Returns the lowest index at which `pattern` occurs.
    pub fn find(&self, pattern: &[Symbol]) -> Option<usize> {
        if pattern.is_empty() {
            return None;
        }

        self.symbols
            .windows(pattern.len())
            .position(|window| window == pattern)
    }

    /// Rewrites the leftmost occurrence of `left` into `right`.
    ///
    /// On success the applied production is appended to `trace` and `true` is returned. If
    /// `left` does not occur, nothing changes and `false` is returned.
    pub fn apply_first_match(
        &mut self,
        left: &[Symbol],
        right: &[Symbol],
        trace: &mut Trace,
    ) -> bool {
        let Some(start) = self.find(left) else {
            return false;
        };

        self.replace_range(start, left.len(), right);
        let step = Production::new(left.to_vec(), right.to_vec());
        trace!(at = start, "{step}");
        trace.push(step);

        true
    }

    /// Returns `true` if every symbol is a terminal.
    pub fn is_terminal(&self) -> bool {
        self.symbols.iter().all(Symbol::is_terminal)
    }

    /// Returns the terminal labels in order, skipping non-terminals.
    pub fn terminals(&self) -> Vec<String> {
        self.symbols
            .iter()
            .filter_map(Symbol::as_terminal)
            .map(str::to_string)
            .collect()
    }
}

impl fmt::Display for SententialForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_symbols(f, &self.symbols)
    }
}

/// The ordered list of productions applied during a derivation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trace {
    steps: Vec<Production>,
}

impl Trace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, step: Production) {
        self.steps.push(step);
    }

    pub fn steps(&self) -> &[Production] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn last(&self) -> Option<&Production> {
        self.steps.last()
    }

    /// Renders every step as a `left -> right` line.
    pub fn lines(&self) -> Vec<String> {
        self.steps.iter().map(ToString::to_string).collect()
    }
}
