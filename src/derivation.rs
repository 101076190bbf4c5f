//! This module drives a derivation of a word through a compiled [`Grammar`].
//!
//! A check runs three phases over one sentential form. `Generate` follows a fixed plan that
//! turns the start symbol into the initial configuration for the word. `Simulate` applies
//! transition productions around a cursor that tracks the state token, exactly one per
//! machine step, until none applies. If the state reached is final, `Cleanup` applies
//! recovery productions until only the word's terminals are left.
//!
//! An unrestricted run that halts against the edge of its generated tape while the machine
//! still has a move is not a verdict: the derivation is generated again with more blank
//! cells on that side and replayed.

use crate::grammar::{Edge, Grammar, GrammarKind, Padding, ProductionTable};
use crate::rewrite::{SententialForm, Trace};
use crate::types::{unary_word, GrammarError, Production, Symbol};
use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

/// Reason reported for words whose derivation halts in a non-final state.
pub const NOT_DERIVABLE: &str = "not derivable";

/// The phases of a single check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Generate,
    Simulate,
    Cleanup,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Generate => f.write_str("generate"),
            Phase::Simulate => f.write_str("simulate"),
            Phase::Cleanup => f.write_str("cleanup"),
        }
    }
}

/// A successful derivation of the word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Acceptance {
    /// The final state the simulation halted in.
    pub state: String,
    /// Number of transition productions applied, i.e. machine steps.
    pub steps: usize,
    /// The terminals left after cleanup, equal to the checked word.
    pub terminals: Vec<String>,
    pub trace: Trace,
}

/// A derivation that halted outside the final states.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejection {
    pub reason: String,
    pub state: String,
    pub steps: usize,
    pub trace: Trace,
}

/// The outcome of checking one word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    Accepted(Acceptance),
    Rejected(Rejection),
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted(_))
    }

    /// The state the simulation phase halted in.
    pub fn state(&self) -> &str {
        match self {
            Verdict::Accepted(acceptance) => &acceptance.state,
            Verdict::Rejected(rejection) => &rejection.state,
        }
    }

    pub fn steps(&self) -> usize {
        match self {
            Verdict::Accepted(acceptance) => acceptance.steps,
            Verdict::Rejected(rejection) => rejection.steps,
        }
    }

    pub fn trace(&self) -> &Trace {
        match self {
            Verdict::Accepted(acceptance) => &acceptance.trace,
            Verdict::Rejected(rejection) => &rejection.trace,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Accepted(acceptance) => write!(
                f,
                "Accepted: {} (halted in {} after {} steps)",
                acceptance.terminals.concat(),
                acceptance.state,
                acceptance.steps
            ),
            Verdict::Rejected(rejection) => write!(
                f,
                "Rejected: {} (halted in {} after {} steps)",
                rejection.reason, rejection.state, rejection.steps
            ),
        }
    }
}

/// Decides whether words are derivable in a grammar.
///
/// The checker borrows the grammar and keeps no state between checks, so one grammar can
/// back any number of checkers.
#[derive(Debug, Clone, Copy)]
pub struct DerivationChecker<'g> {
    grammar: &'g Grammar,
    max_steps: Option<usize>,
}

impl<'g> DerivationChecker<'g> {
    pub fn new(grammar: &'g Grammar) -> Self {
        Self {
            grammar,
            max_steps: None,
        }
    }

    /// Fails checks whose simulation phase needs more than `limit` transition steps.
    pub fn with_step_limit(mut self, limit: usize) -> Self {
        self.max_steps = Some(limit);
        self
    }

    /// Checks the unary encoding `1^n`.
    pub fn check_number(&self, n: usize) -> Result<Verdict, GrammarError> {
        self.check(&unary_word(n))
    }

    /// Derives `word` and reports whether the grammar generates it.
    ///
    /// A Turing machine that runs past its generated blank cells gets its derivation
    /// generated again with more padding on that side, so the verdict never depends on the
    /// initial padding.
    ///
    /// # Returns
    ///
    /// * `Ok(Verdict)` once the derivation either completed or halted in a non-final state.
    /// * `Err(GrammarError::InvalidWord)` if the word is empty or uses foreign symbols.
    /// * `Err(GrammarError::StepLimitExceeded)` if the step limit was hit.
    /// * `Err(GrammarError::InvariantViolation)` if grammar and automaton disagree.
    pub fn check(&self, word: &[String]) -> Result<Verdict, GrammarError> {
        self.validate(word)?;

        let mut padding = Padding::around(word.len());
        let mut derivation = loop {
            let mut derivation = Derivation::new(self.grammar, padding);
            derivation.generate(word, padding)?;
            derivation.simulate(self.max_steps)?;

            match derivation.exhausted_edge() {
                Some(edge) => {
                    padding = padding.widened(edge);
                    debug!(
                        edge = ?edge,
                        left = padding.left,
                        right = padding.right,
                        "Ran out of tape, generating again"
                    );
                }
                None => break derivation,
            }
        };

        let state = derivation.halting_state()?;
        if !self.grammar.automaton().is_final(&state) {
            debug!(state = %state, steps = derivation.steps, "Derivation halted");
            return Ok(Verdict::Rejected(Rejection {
                reason: NOT_DERIVABLE.to_string(),
                state,
                steps: derivation.steps,
                trace: derivation.trace,
            }));
        }

        derivation.cleanup(&state)?;
        if !derivation.form.is_terminal() {
            return Err(GrammarError::InvariantViolation(format!(
                "Cleanup left non-terminals in {}",
                derivation.form
            )));
        }

        let terminals = derivation.form.terminals();
        if terminals != word {
            return Err(GrammarError::InvariantViolation(format!(
                "Derived {} instead of {}",
                terminals.concat(),
                word.concat()
            )));
        }

        Ok(Verdict::Accepted(Acceptance {
            state,
            steps: derivation.steps,
            terminals,
            trace: derivation.trace,
        }))
    }

    fn validate(&self, word: &[String]) -> Result<(), GrammarError> {
        if word.is_empty() {
            return Err(GrammarError::InvalidWord("the word is empty".to_string()));
        }

        let foreign: Vec<&str> = word
            .iter()
            .map(String::as_str)
            .filter(|symbol| !self.grammar.alphabet().contains(*symbol))
            .collect();
        if !foreign.is_empty() {
            return Err(GrammarError::InvalidWord(format!(
                "symbols outside the alphabet: {:?}",
                foreign
            )));
        }

        Ok(())
    }
}

/// The in-flight state of one check.
struct Derivation<'g> {
    grammar: &'g Grammar,
    form: SententialForm,
    trace: Trace,
    cursor: usize,
    steps: usize,
}

impl<'g> Derivation<'g> {
    fn new(grammar: &'g Grammar, padding: Padding) -> Self {
        Self {
            grammar,
            form: SententialForm::new(grammar.start_symbol()),
            trace: Trace::new(),
            cursor: grammar.kind().initial_cursor(padding),
            steps: 0,
        }
    }

    fn generate(&mut self, word: &[String], padding: Padding) -> Result<(), GrammarError> {
        debug!(phase = %Phase::Generate, length = word.len());
        let grammar = self.grammar;

        for step in grammar.padded_generation_plan(word, padding) {
            let Production { left, right } = &step.production;
            if !grammar.generation().contains(left, right) {
                return Err(GrammarError::InvariantViolation(format!(
                    "Missing generation production {}",
                    step.production
                )));
            }

            for _ in 0..step.repeat {
                if !self.form.apply_first_match(left, right, &mut self.trace) {
                    return Err(GrammarError::InvariantViolation(format!(
                        "Generation production {} does not apply to {}",
                        step.production, self.form
                    )));
                }
            }
        }

        Ok(())
    }

    fn simulate(&mut self, max_steps: Option<usize>) -> Result<(), GrammarError> {
        debug!(phase = %Phase::Simulate, form = %self.form);

        while self.advance() {
            self.steps += 1;
            if let Some(limit) = max_steps.filter(|&limit| self.steps > limit) {
                return Err(GrammarError::StepLimitExceeded(limit));
            }
        }

        Ok(())
    }

    /// Applies one transition production around the cursor, returning `false` on halt.
    ///
    /// Windows are tried in order: the cursor symbol alone, the cursor and its right
    /// neighbour, then a window starting left of the cursor. The cursor follows the state
    /// token.
    fn advance(&mut self) -> bool {
        let grammar = self.grammar;
        let cursor = self.cursor;

        let mut windows = vec![(cursor, 1, cursor), (cursor, 2, cursor + 1)];
        if let Some(previous) = cursor.checked_sub(1) {
            windows.push((previous, grammar.kind().backward_window(), previous));
        }

        for (start, width, next) in windows {
            let Some(left) = self.form.window(start, width).map(<[Symbol]>::to_vec) else {
                continue;
            };
            let Some(right) = first_alternative(grammar.transition(), &left) else {
                continue;
            };

            if self.form.apply_first_match(&left, right, &mut self.trace) {
                self.cursor = next;
                return true;
            }
        }

        false
    }

    /// The edge an unrestricted run halted against, if δ still has a move there.
    ///
    /// Interior left and right moves always find a window, so a halt with a defined move can
    /// only mean the state token reached the end of the generated tape. Past the last cell
    /// the machine reads a blank.
    fn exhausted_edge(&self) -> Option<Edge> {
        let automaton = self.grammar.automaton();
        let blank = automaton.blank()?;
        let state = self.form.get(self.cursor)?.labels().first()?;
        let read = match self.form.get(self.cursor + 1) {
            Some(cell) => cell.labels().get(1)?.as_str(),
            None => blank,
        };
        automaton.transition(state, read)?;

        if self.cursor == 0 {
            Some(Edge::Left)
        } else if self.cursor + 1 == self.form.len() {
            Some(Edge::Right)
        } else {
            None
        }
    }

    /// The state carried by the symbol under the cursor.
    fn halting_state(&self) -> Result<String, GrammarError> {
        let automaton = self.grammar.automaton();

        self.form
            .get(self.cursor)
            .and_then(|symbol| {
                symbol
                    .labels()
                    .iter()
                    .find(|label| automaton.is_state(label))
            })
            .cloned()
            .ok_or_else(|| {
                GrammarError::InvariantViolation(format!(
                    "No state under the cursor at {} in {}",
                    self.cursor, self.form
                ))
            })
    }

    fn cleanup(&mut self, state: &str) -> Result<(), GrammarError> {
        debug!(phase = %Phase::Cleanup, state = %state, steps = self.steps);
        let grammar = self.grammar;
        let recovery = grammar.recovery();

        if grammar.kind() == GrammarKind::ContextSensitive {
            let anchor: Vec<Symbol> = self.form.get(self.cursor).cloned().into_iter().collect();
            let right = first_alternative(recovery, &anchor).ok_or_else(|| {
                GrammarError::InvariantViolation(format!(
                    "No recovery production for the accepting cell at {} in {}",
                    self.cursor, self.form
                ))
            })?;
            self.form.apply_first_match(&anchor, right, &mut self.trace);
        }

        let mut i = self.cursor;
        while i + 1 < self.form.len() {
            self.recover_pair(recovery, i);
            i += 1;
        }
        for i in (0..self.cursor).rev() {
            self.recover_pair(recovery, i);
        }

        let token = [Symbol::non_terminal([state])];
        let mut collapsed = 0;
        if let Some(right) = first_alternative(recovery, &token) {
            while self.form.apply_first_match(&token, right, &mut self.trace) {
                collapsed += 1;
            }
        }

        if grammar.kind() == GrammarKind::Unrestricted && collapsed == 0 {
            return Err(GrammarError::InvariantViolation(format!(
                "State {state} never collapsed in {}",
                self.form
            )));
        }

        Ok(())
    }

    fn recover_pair(&mut self, recovery: &ProductionTable, start: usize) {
        let Some(left) = self.form.window(start, 2).map(<[Symbol]>::to_vec) else {
            return;
        };
        if let Some(right) = first_alternative(recovery, &left) {
            self.form.apply_first_match(&left, right, &mut self.trace);
        }
    }
}

/// The first right-hand side of `left`, in construction order.
fn first_alternative<'t>(table: &'t ProductionTable, left: &[Symbol]) -> Option<&'t [Symbol]> {
    let alternatives = table.get(left)?;
    if alternatives.len() > 1 {
        warn!(
            pattern = ?left,
            alternatives = alternatives.len(),
            "Ambiguous left pattern, taking the first alternative"
        );
    }

    alternatives.first().map(Vec::as_slice)
}
