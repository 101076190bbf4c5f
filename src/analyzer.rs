//! This module provides functions for analyzing machine descriptors to detect inconsistencies
//! before a grammar is built from them. The grammar constructions rely on every check here:
//! a machine that passes analysis always yields a grammar whose derivations mirror the
//! machine's own runs.

use crate::automaton::{Automaton, Tape};
use crate::types::{Direction, GrammarError, EPSILON, HELPER_NAMES};
use std::collections::BTreeSet;

/// Represents the problems that can be found during the analysis of an automaton.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum AnalysisError {
    /// Input symbols missing from the tape alphabet.
    AlphabetNotContained(Vec<String>),
    /// The blank symbol is missing from the tape alphabet or is also an input symbol.
    InvalidBlank(String),
    /// The boundary markers are equal or not part of the alphabets.
    InvalidMarkers(String),
    /// Transitions that read or write symbols outside the tape alphabet.
    UnknownSymbols(Vec<String>),
    /// Transitions that overwrite, cross or invent a boundary marker.
    MarkerViolation(Vec<String>),
    /// Names that clash with tape symbols or with names the grammar reserves.
    ReservedNames(Vec<String>),
}

impl From<AnalysisError> for GrammarError {
    /// Converts an `AnalysisError` into a `GrammarError::ValidationError`.
    fn from(error: AnalysisError) -> Self {
        match error {
            AnalysisError::AlphabetNotContained(symbols) => GrammarError::ValidationError(
                format!("Input symbols missing from the tape alphabet: {:?}", symbols),
            ),
            AnalysisError::InvalidBlank(msg) => {
                GrammarError::ValidationError(format!("Invalid blank symbol: {msg}"))
            }
            AnalysisError::InvalidMarkers(msg) => {
                GrammarError::ValidationError(format!("Invalid boundary markers: {msg}"))
            }
            AnalysisError::UnknownSymbols(transitions) => GrammarError::ValidationError(format!(
                "Transitions use symbols outside the tape alphabet: {:?}",
                transitions
            )),
            AnalysisError::MarkerViolation(transitions) => GrammarError::ValidationError(
                format!("Transitions violate the boundary markers: {:?}", transitions),
            ),
            AnalysisError::ReservedNames(names) => GrammarError::ValidationError(format!(
                "Names clash with tape symbols or reserved grammar names: {:?}",
                names
            )),
        }
    }
}

/// Analyzes a given `Automaton` for structural errors.
///
/// # Returns
///
/// * `Ok(())` if no errors are found.
/// * `Err(GrammarError::ValidationError)` describing the first problem found.
pub fn analyze(automaton: &Automaton) -> Result<(), GrammarError> {
    [
        check_alphabets,
        check_boundary,
        check_transition_symbols,
        check_markers,
        check_reserved_names,
    ]
    .iter()
    .find_map(|check| check(automaton).err())
    .map_or(Ok(()), |error| Err(error.into()))
}

/// Checks that every input symbol (markers aside) is also a tape symbol.
fn check_alphabets(automaton: &Automaton) -> Result<(), AnalysisError> {
    let missing: Vec<String> = automaton
        .input_symbols()
        .into_iter()
        .filter(|symbol| !automaton.tape_alphabet().contains(*symbol))
        .map(str::to_string)
        .collect();

    if !missing.is_empty() {
        return Err(AnalysisError::AlphabetNotContained(missing));
    }

    Ok(())
}

/// Checks the third descriptor line against the alphabets.
///
/// The unrestricted construction pairs padding cells with the blank, so the blank has to be
/// a tape symbol and must not be confused with an input symbol.
fn check_boundary(automaton: &Automaton) -> Result<(), AnalysisError> {
    match automaton.tape() {
        Tape::Unbounded { blank } => {
            if !automaton.tape_alphabet().contains(blank) {
                return Err(AnalysisError::InvalidBlank(format!(
                    "'{blank}' is not a tape symbol"
                )));
            }
            if automaton.alphabet().contains(blank) {
                return Err(AnalysisError::InvalidBlank(format!(
                    "'{blank}' is also an input symbol"
                )));
            }
        }
        Tape::Bounded { left, right } => {
            if left == right {
                return Err(AnalysisError::InvalidMarkers(format!(
                    "left and right marker are both '{left}'"
                )));
            }
            let missing: Vec<&str> = [left, right]
                .into_iter()
                .filter(|marker| {
                    !automaton.alphabet().contains(*marker)
                        || !automaton.tape_alphabet().contains(*marker)
                })
                .map(String::as_str)
                .collect();
            if !missing.is_empty() {
                return Err(AnalysisError::InvalidMarkers(format!(
                    "{:?} missing from the input or tape alphabet",
                    missing
                )));
            }
            if automaton.input_symbols().is_empty() {
                return Err(AnalysisError::InvalidMarkers(
                    "no input symbols besides the markers".to_string(),
                ));
            }
        }
    }

    Ok(())
}

/// Checks that every transition reads and writes known symbols.
fn check_transition_symbols(automaton: &Automaton) -> Result<(), AnalysisError> {
    let known = |symbol: &str| {
        automaton.tape_alphabet().contains(symbol) || automaton.is_marker(symbol)
    };

    let unknown: Vec<String> = automaton
        .transitions()
        .filter(|(_, read, t)| !known(*read) || !known(t.write.as_str()))
        .map(|(state, read, t)| format!("{state} {read} -> {} {}", t.next_state, t.write))
        .collect();

    if !unknown.is_empty() {
        return Err(AnalysisError::UnknownSymbols(unknown));
    }

    Ok(())
}

/// Checks that markers are only ever rewritten by themselves while stepping back inside.
///
/// The context-sensitive construction has dedicated marker-preserving productions for
/// `δ(q, left) = (p, left, right)` and `δ(q, right) = (p, right, left)` only.
fn check_markers(automaton: &Automaton) -> Result<(), AnalysisError> {
    let Some((left, right)) = automaton.markers() else {
        return Ok(());
    };

    let violations: Vec<String> = automaton
        .transitions()
        .filter(|(_, read, t)| {
            let preserves = match *read {
                r if r == left => t.write == left && t.direction == Direction::Right,
                r if r == right => t.write == right && t.direction == Direction::Left,
                _ => !automaton.is_marker(&t.write),
            };
            !preserves
        })
        .map(|(state, read, t)| {
            format!(
                "{state} {read} -> {} {} {}",
                t.next_state, t.write, t.direction
            )
        })
        .collect();

    if !violations.is_empty() {
        return Err(AnalysisError::MarkerViolation(violations));
    }

    Ok(())
}

/// Checks for names the grammar cannot tell apart.
///
/// Composite symbols mix state names with tape and input symbols, so a state must not share
/// a name with any of them, nor with the generation helpers `A0`..`A3`. No name may equal the
/// padding label `ε`.
fn check_reserved_names(automaton: &Automaton) -> Result<(), AnalysisError> {
    let symbols: BTreeSet<&str> = automaton
        .alphabet()
        .iter()
        .chain(automaton.tape_alphabet())
        .map(String::as_str)
        .collect();

    let mut clashes: Vec<String> = automaton
        .states()
        .iter()
        .filter(|state| {
            symbols.contains(state.as_str()) || HELPER_NAMES.contains(&state.as_str())
        })
        .cloned()
        .collect();

    if symbols.contains(EPSILON) || automaton.is_state(EPSILON) {
        clashes.push(EPSILON.to_string());
    }

    if !clashes.is_empty() {
        return Err(AnalysisError::ReservedNames(clashes));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automaton::MachineKind;
    use crate::parser::parse;

    fn analyze_text(input: &str, kind: MachineKind) -> Result<Automaton, GrammarError> {
        parse(input, kind)
    }

    fn assert_validation_error(result: Result<Automaton, GrammarError>, needle: &str) {
        match result {
            Err(GrammarError::ValidationError(msg)) => {
                assert!(msg.contains(needle), "'{msg}' does not mention '{needle}'")
            }
            other => panic!("Expected a validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_machine() {
        let input = "1\n1 B\nB\nq0\nq1\nq0 1 q1 1 right\n";
        assert!(analyze_text(input, MachineKind::Unbounded).is_ok());
    }

    #[test]
    fn test_alphabet_not_contained() {
        let input = "1 2\n1 B\nB\nq0\nq1\nq0 1 q1 1 right\n";
        assert_validation_error(analyze_text(input, MachineKind::Unbounded), "\"2\"");
    }

    #[test]
    fn test_blank_outside_tape_alphabet() {
        let input = "1\n1\nB\nq0\nq1\nq0 1 q1 1 right\n";
        assert_validation_error(
            analyze_text(input, MachineKind::Unbounded),
            "not a tape symbol",
        );
    }

    #[test]
    fn test_blank_is_input_symbol() {
        let input = "1 B\n1 B\nB\nq0\nq1\nq0 1 q1 1 right\n";
        assert_validation_error(
            analyze_text(input, MachineKind::Unbounded),
            "also an input symbol",
        );
    }

    #[test]
    fn test_equal_markers() {
        let input = "@ 1\n@ 1\n@ @\ns\nf\ns @ f @ right\n";
        assert_validation_error(analyze_text(input, MachineKind::Bounded), "both '@'");
    }

    #[test]
    fn test_markers_outside_alphabets() {
        let input = "@ 1\n@ 1 $\n@ $\ns\nf\ns @ f @ right\n";
        assert_validation_error(analyze_text(input, MachineKind::Bounded), "[\"$\"]");

        let input = "@ 1 $\n1 $\n@ $\ns\nf\ns 1 f 1 right\n";
        assert_validation_error(analyze_text(input, MachineKind::Bounded), "[\"@\"]");
    }

    #[test]
    fn test_unknown_transition_symbols() {
        let input = "1\n1 B\nB\nq0\nq1\nq0 1 q1 z right\n";
        assert_validation_error(analyze_text(input, MachineKind::Unbounded), "q0 1 -> q1 z");
    }

    #[test]
    fn test_marker_overwritten() {
        let input = "@ 1 $\n@ 1 $\n@ $\ns\nf\ns @ f 1 right\n";
        assert_validation_error(analyze_text(input, MachineKind::Bounded), "boundary markers");
    }

    #[test]
    fn test_marker_crossed() {
        let input = "@ 1 $\n@ 1 $\n@ $\ns\nf\ns $ f $ right\n";
        assert_validation_error(analyze_text(input, MachineKind::Bounded), "s $ -> f $ right");
    }

    #[test]
    fn test_marker_written_inside() {
        let input = "@ 1 $\n@ 1 $\n@ $\ns\nf\ns 1 f $ right\n";
        assert_validation_error(analyze_text(input, MachineKind::Bounded), "boundary markers");
    }

    #[test]
    fn test_state_named_like_symbol() {
        let input = "1\n1 x B\nB\nq0\nx\nq0 1 x 1 right\n";
        assert_validation_error(analyze_text(input, MachineKind::Unbounded), "\"x\"");
    }

    #[test]
    fn test_state_named_like_helper() {
        let input = "1\n1 B\nB\nA1\nq1\nA1 1 q1 1 right\n";
        assert_validation_error(analyze_text(input, MachineKind::Unbounded), "\"A1\"");
    }

    #[test]
    fn test_epsilon_label_is_reserved() {
        let input = "1 ε\n1 ε B\nB\nq0\nq1\nq0 1 q1 1 right\n";
        assert_validation_error(analyze_text(input, MachineKind::Unbounded), "ε");
    }

    #[test]
    fn test_analysis_error_conversion() {
        let error: GrammarError = AnalysisError::InvalidBlank("'_'".to_string()).into();
        assert!(matches!(error, GrammarError::ValidationError(_)));
    }
}
