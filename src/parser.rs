//! This module provides the parser for machine descriptors, utilizing the `pest` crate.
//! It defines the grammar for `.tm`/`.lba` files and functions to parse the input into an
//! [`Automaton`].

use crate::{
    analyzer::analyze,
    automaton::{Automaton, MachineKind, Tape},
    types::{Direction, GrammarError, Transition},
};
use pest::{
    error::{Error, ErrorVariant},
    iterators::{Pair, Pairs},
    Parser as PestParser, Span,
};
use pest_derive::Parser as PestParser;
use std::collections::{BTreeMap, BTreeSet};

/// Derives a `PestParser` for the descriptor grammar defined in `descriptor.pest`.
#[derive(PestParser)]
#[grammar = "descriptor.pest"]
pub struct DescriptorParser;

/// Parses a descriptor into an [`Automaton`] of the requested kind.
///
/// The third descriptor line decides how the tape is delimited, so the caller has to say
/// which kind it expects: a single blank symbol for [`MachineKind::Unbounded`], two boundary
/// markers for [`MachineKind::Bounded`]. The parsed automaton is validated before being
/// returned.
///
/// # Returns
///
/// * `Ok(Automaton)` if the input is successfully parsed and validated.
/// * `Err(GrammarError::ParseError)` if there are syntax errors or duplicate transitions.
/// * `Err(GrammarError::ValidationError)` if the machine is inconsistent.
pub fn parse(input: &str, kind: MachineKind) -> Result<Automaton, GrammarError> {
    let root = DescriptorParser::parse(Rule::descriptor, input.trim())
        .map_err(|e| GrammarError::ParseError(Box::new(e)))?
        .next()
        .ok_or_else(|| GrammarError::ValidationError("Empty descriptor".to_string()))?;

    let automaton = parse_descriptor(root, kind)?;

    analyze(&automaton)?;

    Ok(automaton)
}

/// Parses the top-level structure of a descriptor from a `Pair<Rule::descriptor>`.
fn parse_descriptor(pair: Pair<Rule>, kind: MachineKind) -> Result<Automaton, GrammarError> {
    let mut alphabet = BTreeSet::new();
    let mut tape_alphabet = BTreeSet::new();
    let mut tape: Option<Tape> = None;
    let mut start_state: Option<String> = None;
    let mut final_states = BTreeSet::new();
    let mut delta = BTreeMap::new();

    for p in pair.into_inner() {
        match p.as_rule() {
            Rule::alphabet => alphabet = parse_symbol_set(p),
            Rule::tape_alphabet => tape_alphabet = parse_symbol_set(p),
            Rule::boundary => tape = Some(parse_boundary(p, kind)?),
            Rule::start => start_state = Some(parse_inner_string(p)?),
            Rule::finals => final_states = parse_symbol_set(p),
            Rule::transition => {
                let span = p.as_span();
                let (key, transition) = parse_transition(p)?;
                if delta.contains_key(&key) {
                    return Err(parse_error(
                        &format!("Duplicate transition for state {} on {}", key.0, key.1),
                        span,
                    ));
                }
                delta.insert(key, transition);
            }
            _ => {} // EOI
        }
    }

    let tape = check_required(tape, "boundary")?;
    let start_state = check_required(start_state, "start state")?;

    Ok(Automaton::new(
        alphabet,
        tape_alphabet,
        tape,
        start_state,
        final_states,
        delta,
    ))
}

/// Parses the third descriptor line according to the expected machine kind.
fn parse_boundary(pair: Pair<Rule>, kind: MachineKind) -> Result<Tape, GrammarError> {
    let span = pair.as_span();
    let symbols = parse_symbol_list(pair);

    match (kind, symbols.as_slice()) {
        (MachineKind::Unbounded, [blank]) => Ok(Tape::Unbounded {
            blank: blank.clone(),
        }),
        (MachineKind::Bounded, [left, right]) => Ok(Tape::Bounded {
            left: left.clone(),
            right: right.clone(),
        }),
        (MachineKind::Unbounded, _) => Err(parse_error(
            &format!("Expected a single blank symbol, found {}", symbols.len()),
            span,
        )),
        (MachineKind::Bounded, _) => Err(parse_error(
            &format!(
                "Expected a left and a right boundary marker, found {} symbols",
                symbols.len()
            ),
            span,
        )),
    }
}

/// Parses a single transition line from a `Pair<Rule::transition>`.
fn parse_transition(
    pair: Pair<Rule>,
) -> Result<((String, String), Transition), GrammarError> {
    let span = pair.as_span();
    let mut pairs = pair.into_inner();

    let state = parse_string(&mut pairs, span)?;
    let read = parse_string(&mut pairs, span)?;
    let next_state = parse_string(&mut pairs, span)?;
    let write = parse_string(&mut pairs, span)?;
    let direction = match pairs.next() {
        Some(p) => parse_direction(p)?,
        None => return Err(parse_error("Missing direction", span)),
    };

    Ok((
        (state, read),
        Transition {
            next_state,
            write,
            direction,
        },
    ))
}

/// Parses a single direction from a `Pair<Rule::direction>`.
fn parse_direction(pair: Pair<Rule>) -> Result<Direction, GrammarError> {
    match pair.as_str() {
        "left" => Ok(Direction::Left),
        "right" => Ok(Direction::Right),
        other => Err(parse_error(
            &format!("Unsupported direction: {other}"),
            pair.as_span(),
        )),
    }
}

/// Collects the symbols of a `symbols` list in the order they were written.
fn parse_symbol_list(pair: Pair<Rule>) -> Vec<String> {
    // Rule: (alphabet | tape_alphabet | boundary | finals) > symbols > [symbol]
    pair.into_inner()
        .flat_map(|symbols| symbols.into_inner())
        .filter(|p| p.as_rule() == Rule::symbol)
        .map(|p| p.as_str().to_string())
        .collect()
}

fn parse_symbol_set(pair: Pair<Rule>) -> BTreeSet<String> {
    parse_symbol_list(pair).into_iter().collect()
}

/// Extracts the inner string content from a `Pair`.
fn parse_inner_string(pair: Pair<Rule>) -> Result<String, GrammarError> {
    let span = pair.as_span();
    parse_string(&mut pair.into_inner(), span)
}

/// Extracts the string content from the current `Pair` in a `Pairs` iterator.
fn parse_string(pairs: &mut Pairs<Rule>, span: Span) -> Result<String, GrammarError> {
    pairs
        .next()
        .map(|p| p.as_str().to_string())
        .ok_or_else(|| parse_error("Missing symbol", span))
}

/// Creates a `GrammarError::ParseError` from a message and a `Span`.
fn parse_error(msg: &str, span: Span) -> GrammarError {
    GrammarError::ParseError(Box::new(Error::new_from_span(
        ErrorVariant::CustomError {
            message: msg.to_string(),
        },
        span,
    )))
}

/// Checks if a required section is present, returning an `Err` if it's missing.
fn check_required<T>(value: Option<T>, name: &str) -> Result<T, GrammarError> {
    value.ok_or_else(|| GrammarError::ValidationError(format!("Missing {name} line")))
}
