//! This module defines the `TapeSimulator`, which runs an [`Automaton`] directly on a tape,
//! independently of any grammar. Its verdicts and step counts are the reference the
//! derivation checker is compared against.

use crate::automaton::{Automaton, Tape};
use crate::types::{Direction, GrammarError};
use serde::Serialize;
use std::fmt;

/// The result of a single step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// A transition was applied.
    Continue,
    /// No transition is defined for the current state and symbol.
    Halt,
}

/// The outcome of a complete run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunOutcome {
    /// The state the machine halted in.
    pub state: String,
    pub steps: usize,
    /// Whether `state` is a final state.
    pub accepted: bool,
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verdict = if self.accepted { "Accepted" } else { "Rejected" };
        write!(
            f,
            "{verdict} (halted in {} after {} steps)",
            self.state, self.steps
        )
    }
}

/// Executes an automaton on a tape that grows in both directions.
///
/// Cells at positions `>= 0` live in one vector and cells at positions `< 0` in another, so
/// moving left of the input never shifts existing cells. Unwritten cells of an unbounded
/// machine read as the blank symbol. A bounded automaton has no blank: its tape is the word
/// between the two markers and the head starts on the left marker.
pub struct TapeSimulator<'a> {
    automaton: &'a Automaton,
    state: String,
    right: Vec<String>,
    left: Vec<String>,
    head: isize,
    step_count: usize,
    max_steps: Option<usize>,
}

impl<'a> TapeSimulator<'a> {
    /// Creates a simulator in the start state over an empty tape.
    pub fn new(automaton: &'a Automaton) -> Self {
        Self {
            automaton,
            state: automaton.start_state().to_string(),
            right: Vec::new(),
            left: Vec::new(),
            head: 0,
            step_count: 0,
            max_steps: None,
        }
    }

    /// Fails runs that need more than `limit` steps.
    pub fn with_step_limit(mut self, limit: usize) -> Self {
        self.max_steps = Some(limit);
        self
    }

    /// Resets the machine and writes `word` onto the tape.
    pub fn load(&mut self, word: &[String]) -> Result<(), GrammarError> {
        let inputs = self.automaton.input_symbols();
        if word.is_empty() {
            return Err(GrammarError::InvalidWord("the word is empty".to_string()));
        }
        if let Some(symbol) = word.iter().find(|s| !inputs.contains(&s.as_str())) {
            return Err(GrammarError::InvalidWord(format!(
                "'{symbol}' is not an input symbol"
            )));
        }

        self.state = self.automaton.start_state().to_string();
        self.left.clear();
        self.head = 0;
        self.step_count = 0;
        self.right = match self.automaton.tape() {
            Tape::Unbounded { .. } => word.to_vec(),
            Tape::Bounded { left, right } => std::iter::once(left.clone())
                .chain(word.iter().cloned())
                .chain(std::iter::once(right.clone()))
                .collect(),
        };

        Ok(())
    }

    /// Loads `word` and steps until the machine halts.
    pub fn run(&mut self, word: &[String]) -> Result<RunOutcome, GrammarError> {
        self.load(word)?;

        while self.step() == Step::Continue {
            if let Some(limit) = self.max_steps.filter(|&limit| self.step_count > limit) {
                return Err(GrammarError::StepLimitExceeded(limit));
            }
        }

        Ok(RunOutcome {
            state: self.state.clone(),
            steps: self.step_count,
            accepted: self.is_accepted(),
        })
    }

    /// Applies the transition for the current state and symbol, if there is one.
    pub fn step(&mut self) -> Step {
        let Some(symbol) = self.read() else {
            return Step::Halt;
        };
        let Some(transition) = self.automaton.transition(&self.state, symbol).cloned() else {
            return Step::Halt;
        };

        self.write(transition.write);
        self.head += match transition.direction {
            Direction::Left => -1,
            Direction::Right => 1,
        };
        self.state = transition.next_state;
        self.step_count += 1;

        Step::Continue
    }

    /// Returns the symbol under the head, `None` past the end of a bounded tape.
    pub fn read(&self) -> Option<&str> {
        self.cell(self.head)
    }

    pub fn state(&self) -> &str {
        &self.state
    }

    pub fn head(&self) -> isize {
        self.head
    }

    pub fn step_count(&self) -> usize {
        self.step_count
    }

    pub fn is_accepted(&self) -> bool {
        self.automaton.is_final(&self.state)
    }

    /// Renders the written part of the tape with the cell under the head in brackets.
    ///
    /// ```text
    /// @ d d [u] 1 $
    /// ```
    pub fn render_tape(&self) -> String {
        let first = -(self.left.len() as isize);
        let last = self.right.len() as isize - 1;

        (first.min(self.head)..=last.max(self.head))
            .map(|position| {
                let symbol = self.cell(position).unwrap_or(" ");
                if position == self.head {
                    format!("[{symbol}]")
                } else {
                    symbol.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn cell(&self, position: isize) -> Option<&str> {
        let cell = if position >= 0 {
            self.right.get(position as usize)
        } else {
            self.left.get((-position - 1) as usize)
        };

        cell.map(String::as_str).or_else(|| self.automaton.blank())
    }

    fn write(&mut self, symbol: String) {
        let blank = self.automaton.blank().unwrap_or_default().to_string();
        let (cells, index) = if self.head >= 0 {
            (&mut self.right, self.head as usize)
        } else {
            (&mut self.left, (-self.head - 1) as usize)
        };

        if index >= cells.len() {
            cells.resize(index + 1, blank);
        }
        cells[index] = symbol;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automaton::MachineKind;
    use crate::parser::parse;
    use crate::programs::primality_automaton;
    use crate::types::unary_word;

    #[test]
    fn test_primality_steps() {
        let automaton = primality_automaton(MachineKind::Unbounded);
        let mut simulator = TapeSimulator::new(&automaton);

        let outcome = simulator.run(&unary_word(2)).unwrap();
        assert!(outcome.accepted);
        assert_eq!(outcome.steps, 7);

        let outcome = simulator.run(&unary_word(7)).unwrap();
        assert_eq!(outcome.steps, 353);
        assert_eq!(outcome.state, "accept");
    }

    #[test]
    fn test_bounded_takes_one_more_step() {
        let tm = primality_automaton(MachineKind::Unbounded);
        let lba = primality_automaton(MachineKind::Bounded);

        for n in [3, 4, 9, 13] {
            let word = unary_word(n);
            let unbounded = TapeSimulator::new(&tm).run(&word).unwrap();
            let bounded = TapeSimulator::new(&lba).run(&word).unwrap();

            assert_eq!(unbounded.accepted, bounded.accepted);
            assert_eq!(unbounded.steps + 1, bounded.steps);
        }
    }

    #[test]
    fn test_single_steps_and_rendering() {
        let automaton = primality_automaton(MachineKind::Bounded);
        let mut simulator = TapeSimulator::new(&automaton);
        simulator.load(&unary_word(3)).unwrap();

        assert_eq!(simulator.render_tape(), "[@] 1 1 1 $");
        assert_eq!(simulator.step(), Step::Continue);
        assert_eq!(simulator.step(), Step::Continue);
        assert_eq!(simulator.state(), "q1");
        assert_eq!(simulator.head(), 2);
        assert_eq!(simulator.render_tape(), "@ d [1] 1 $");
    }

    #[test]
    fn test_unbounded_tape_grows_left() {
        let input = "1
1 B
B
q0
done
q0 1 q0 1 left
q0 B done 1 right
";
        let automaton = parse(input, MachineKind::Unbounded).unwrap();
        let mut simulator = TapeSimulator::new(&automaton);

        let outcome = simulator.run(&unary_word(1)).unwrap();
        assert!(outcome.accepted);
        assert_eq!(outcome.steps, 2);
        assert_eq!(simulator.render_tape(), "1 [1]");
    }

    #[test]
    fn test_step_limit() {
        let input = "1
1 B
B
q0
done
q0 1 q0 1 right
q0 B q0 B right
";
        let automaton = parse(input, MachineKind::Unbounded).unwrap();
        let mut simulator = TapeSimulator::new(&automaton).with_step_limit(50);

        assert_eq!(
            simulator.run(&unary_word(2)),
            Err(GrammarError::StepLimitExceeded(50))
        );
    }

    #[test]
    fn test_invalid_word() {
        let automaton = primality_automaton(MachineKind::Bounded);
        let mut simulator = TapeSimulator::new(&automaton);

        assert!(matches!(
            simulator.run(&[]),
            Err(GrammarError::InvalidWord(_))
        ));
        assert!(matches!(
            simulator.run(&["$".to_string()]),
            Err(GrammarError::InvalidWord(_))
        ));
    }
}
