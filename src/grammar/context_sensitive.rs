//! Context-sensitive grammar of a linear bounded automaton.
//!
//! Every cell is a single composite carrying the tape symbol `X` and the input symbol `a` it
//! was generated from. The first cell also carries the left marker, the last one the right
//! marker, and the cell under the head carries the state. Where the state sits inside the
//! composite tells which symbol the head reads:
//!
//! | layout            | head reads         |
//! |-------------------|--------------------|
//! | `[q, @, X, a]`    | the left marker    |
//! | `[@, q, X, a]`    | the first cell     |
//! | `[q, X, a]`       | an inner cell      |
//! | `[X, a, q, $]`    | the right marker   |
//!
//! plus the `$`-suffixed variants for the last cell and `[q, @, X, a, $]`, `[@, q, X, a, $]`,
//! `[@, X, a, q, $]` for single-cell words. No production ever shrinks the form except the
//! recovery ones, which only run after acceptance.

use super::{GenerationStep, ProductionTable};
use crate::automaton::Automaton;
use crate::types::{Direction, Symbol};

const ATTACH_START: &str = "A1";
const PAIR_INPUT: &str = "A2";

pub(super) fn start_symbol() -> Symbol {
    nt!(ATTACH_START)
}

/// The boundary markers and the marker-free alphabets every enumeration runs over.
struct Frame<'a> {
    left: &'a str,
    right: &'a str,
    inputs: Vec<&'a str>,
    cells: Vec<&'a str>,
}

/// Builds the generation, transition and recovery tables.
pub(super) fn build(
    automaton: &Automaton,
    left: &str,
    right: &str,
) -> (ProductionTable, ProductionTable, ProductionTable) {
    let frame = Frame {
        left,
        right,
        inputs: automaton.input_symbols(),
        cells: automaton.cell_symbols(),
    };

    (
        generation(automaton, &frame),
        transition(automaton, &frame),
        recovery(automaton, &frame),
    )
}

/// `A1 -> [q0, @, a, a, $]`, `A1 -> [q0, @, a, a]A2`, `A2 -> [a, a]A2`, `A2 -> [a, a, $]`
fn generation(automaton: &Automaton, frame: &Frame) -> ProductionTable {
    let mut table = ProductionTable::new();
    let (l, r) = (frame.left, frame.right);
    let q0 = automaton.start_state();

    for &a in &frame.inputs {
        table.insert(vec![nt!(ATTACH_START)], vec![nt!(q0, l, a, a, r)]);
        table.insert(
            vec![nt!(ATTACH_START)],
            vec![nt!(q0, l, a, a), nt!(PAIR_INPUT)],
        );
        table.insert(vec![nt!(PAIR_INPUT)], vec![nt!(a, a), nt!(PAIR_INPUT)]);
        table.insert(vec![nt!(PAIR_INPUT)], vec![nt!(a, a, r)]);
    }

    table
}

fn transition(automaton: &Automaton, frame: &Frame) -> ProductionTable {
    let mut table = ProductionTable::new();

    for (q, x, t) in automaton.transitions() {
        let p = t.next_state.as_str();
        let y = t.write.as_str();

        for &a in &frame.inputs {
            match t.direction {
                Direction::Right if x == frame.left && y == frame.left => {
                    step_off_left_marker(&mut table, frame, q, p, a)
                }
                Direction::Right => move_right(&mut table, frame, (q, x), (p, y), a),
                Direction::Left if x == frame.right && y == frame.right => {
                    step_off_right_marker(&mut table, frame, q, p, a)
                }
                Direction::Left => move_left(&mut table, frame, (q, x), (p, y), a),
            }
        }
    }

    table
}

/// `δ(q, @) = (p, @, right)`: the head leaves the left marker for the first cell.
fn step_off_left_marker(table: &mut ProductionTable, frame: &Frame, q: &str, p: &str, a: &str) {
    let (l, r) = (frame.left, frame.right);

    for &z in &frame.cells {
        table.insert(vec![nt!(q, l, z, a, r)], vec![nt!(l, p, z, a, r)]);
        table.insert(vec![nt!(q, l, z, a)], vec![nt!(l, p, z, a)]);
    }
}

/// `δ(q, $) = (p, $, left)`: the head leaves the right marker for the last cell.
fn step_off_right_marker(table: &mut ProductionTable, frame: &Frame, q: &str, p: &str, a: &str) {
    let (l, r) = (frame.left, frame.right);

    for &z in &frame.cells {
        table.insert(vec![nt!(l, z, a, q, r)], vec![nt!(l, p, z, a, r)]);
        table.insert(vec![nt!(z, a, q, r)], vec![nt!(p, z, a, r)]);
    }
}

/// `δ(q, X) = (p, Y, right)` on a cell. Moving off the last cell puts the head on the right
/// marker, any other move hands the state to the next composite.
fn move_right(
    table: &mut ProductionTable,
    frame: &Frame,
    (q, x): (&str, &str),
    (p, y): (&str, &str),
    a: &str,
) {
    let (l, r) = (frame.left, frame.right);

    table.insert(vec![nt!(l, q, x, a, r)], vec![nt!(l, y, a, p, r)]);
    table.insert(vec![nt!(q, x, a, r)], vec![nt!(y, a, p, r)]);

    for &z in &frame.cells {
        for &b in &frame.inputs {
            table.insert(
                vec![nt!(l, q, x, a), nt!(z, b)],
                vec![nt!(l, y, a), nt!(p, z, b)],
            );
            table.insert(
                vec![nt!(l, q, x, a), nt!(z, b, r)],
                vec![nt!(l, y, a), nt!(p, z, b, r)],
            );
            table.insert(
                vec![nt!(q, x, a), nt!(z, b)],
                vec![nt!(y, a), nt!(p, z, b)],
            );
            table.insert(
                vec![nt!(q, x, a), nt!(z, b, r)],
                vec![nt!(y, a), nt!(p, z, b, r)],
            );
        }
    }
}

/// `δ(q, X) = (p, Y, left)` on a cell. Moving off the first cell puts the head on the left
/// marker, any other move hands the state to the previous composite.
fn move_left(
    table: &mut ProductionTable,
    frame: &Frame,
    (q, x): (&str, &str),
    (p, y): (&str, &str),
    a: &str,
) {
    let (l, r) = (frame.left, frame.right);

    table.insert(vec![nt!(l, q, x, a, r)], vec![nt!(p, l, y, a, r)]);
    table.insert(vec![nt!(l, q, x, a)], vec![nt!(p, l, y, a)]);

    for &z in &frame.cells {
        for &b in &frame.inputs {
            table.insert(
                vec![nt!(l, z, b), nt!(q, x, a)],
                vec![nt!(l, p, z, b), nt!(y, a)],
            );
            table.insert(
                vec![nt!(z, b), nt!(q, x, a)],
                vec![nt!(p, z, b), nt!(y, a)],
            );
            table.insert(
                vec![nt!(z, b), nt!(q, x, a, r)],
                vec![nt!(p, z, b), nt!(y, a, r)],
            );
            table.insert(
                vec![nt!(l, z, b), nt!(q, x, a, r)],
                vec![nt!(l, p, z, b), nt!(y, a, r)],
            );
        }
    }
}

/// Collapses the state-carrying composite to its input symbol, then turns every neighbour of
/// an already recovered terminal into its own input symbol.
fn recovery(automaton: &Automaton, frame: &Frame) -> ProductionTable {
    let mut table = ProductionTable::new();
    let (l, r) = (frame.left, frame.right);

    for &a in &frame.inputs {
        for &x in &frame.cells {
            for q in automaton.final_states() {
                let anchors = [
                    nt!(q, l, x, a, r),
                    nt!(l, q, x, a, r),
                    nt!(l, x, a, q, r),
                    nt!(q, l, x, a),
                    nt!(l, q, x, a),
                    nt!(q, x, a),
                    nt!(q, x, a, r),
                    nt!(x, a, q, r),
                ];
                for anchor in anchors {
                    table.insert(vec![anchor], vec![Symbol::terminal(a)]);
                }
            }

            for &b in &frame.inputs {
                let (ta, tb) = (Symbol::terminal(a), Symbol::terminal(b));
                let both = vec![ta.clone(), tb.clone()];

                table.insert(vec![ta.clone(), nt!(x, b)], both.clone());
                table.insert(vec![ta.clone(), nt!(x, b, r)], both.clone());
                table.insert(vec![nt!(x, a), tb.clone()], both.clone());
                table.insert(vec![nt!(l, x, a), tb], both);
            }
        }
    }

    table
}

/// A single-symbol word is generated as one composite carrying both markers, longer words as
/// a first cell, the inner cells and a last cell.
pub(super) fn generation_plan(
    start: &str,
    left: &str,
    right: &str,
    word: &[String],
) -> Vec<GenerationStep> {
    match word {
        [] => Vec::new(),
        [a] => vec![GenerationStep::once(
            nt!(ATTACH_START),
            vec![nt!(start, left, a, a, right)],
        )],
        [first, inner @ .., last] => {
            let mut plan = vec![GenerationStep::once(
                nt!(ATTACH_START),
                vec![nt!(start, left, first, first), nt!(PAIR_INPUT)],
            )];
            plan.extend(inner.iter().map(|a| {
                GenerationStep::once(nt!(PAIR_INPUT), vec![nt!(a, a), nt!(PAIR_INPUT)])
            }));
            plan.push(GenerationStep::once(
                nt!(PAIR_INPUT),
                vec![nt!(last, last, right)],
            ));
            plan
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automaton::MachineKind;
    use crate::grammar::Grammar;
    use crate::programs::primality_automaton;

    fn primality_grammar() -> Grammar {
        Grammar::from_automaton(&primality_automaton(MachineKind::Bounded))
    }

    fn is_length_preserving(grammar: &Grammar) -> bool {
        grammar
            .transition()
            .productions()
            .all(|p| p.left.len() == p.right.len())
    }

    #[test]
    fn test_table_sizes() {
        let grammar = primality_grammar();

        assert_eq!(grammar.generation().len(), 4);
        assert_eq!(grammar.transition().len(), 560);
        assert_eq!(grammar.recovery().len(), 48);
    }

    #[test]
    fn test_transitions_never_shrink() {
        assert!(is_length_preserving(&primality_grammar()));
    }

    #[test]
    fn test_marker_preserving_rules() {
        let grammar = primality_grammar();

        // start @ q0 @ right
        assert!(grammar.transition().contains(
            &[nt!("start", "@", "1", "1", "$")],
            &[nt!("@", "q0", "1", "1", "$")]
        ));
        assert!(grammar.transition().contains(
            &[nt!("start", "@", "d", "1")],
            &[nt!("@", "q0", "d", "1")]
        ));
        // spread $ settle $ left
        assert!(grammar.transition().contains(
            &[nt!("x", "1", "spread", "$")],
            &[nt!("settle", "x", "1", "$")]
        ));
    }

    #[test]
    fn test_interior_moves() {
        let grammar = primality_grammar();

        // q0 1 q1 d right, from the first cell
        assert!(grammar.transition().contains(
            &[nt!("@", "q0", "1", "1"), nt!("1", "1")],
            &[nt!("@", "d", "1"), nt!("q1", "1", "1")]
        ));
        // seek 1 back x left, onto the last cell
        assert!(grammar.transition().contains(
            &[nt!("u", "1"), nt!("seek", "1", "1", "$")],
            &[nt!("back", "u", "1"), nt!("x", "1", "$")]
        ));
        // seek $ is handled by its own marker rule only
        assert!(grammar
            .transition()
            .get(&[nt!("seek", "$", "1")])
            .is_none());
    }

    #[test]
    fn test_recovery() {
        let grammar = primality_grammar();
        let one = Symbol::terminal("1");

        assert!(grammar
            .recovery()
            .contains(&[nt!("accept", "d", "1")], &[one.clone()]));
        assert!(grammar.recovery().contains(
            &[nt!("@", "u", "1"), one.clone()],
            &[one.clone(), one.clone()]
        ));
        assert!(grammar.recovery().contains(
            &[one.clone(), nt!("x", "1", "$")],
            &[one.clone(), one.clone()]
        ));
        assert!(grammar.recovery().get(&[nt!("reject", "d", "1")]).is_none());
    }

    #[test]
    fn test_transition_and_recovery_are_unambiguous() {
        let grammar = primality_grammar();

        assert_eq!(grammar.transition().ambiguous_patterns().count(), 0);
        assert_eq!(grammar.recovery().ambiguous_patterns().count(), 0);
    }

    #[test]
    fn test_generation_is_ambiguous_by_construction() {
        let grammar = primality_grammar();

        // A1 and A2 both choose between continuing and closing the word
        assert_eq!(grammar.generation().ambiguous_patterns().count(), 2);
    }

    #[test]
    fn test_single_symbol_plan() {
        let grammar = primality_grammar();
        let plan = grammar.generation_plan(&["1".to_string()]);

        assert_eq!(plan.len(), 1);
        assert_eq!(
            plan[0].production.to_string(),
            "A1 -> [start, @, 1, 1, $]"
        );
    }

    #[test]
    fn test_multi_symbol_plan() {
        let grammar = primality_grammar();
        let plan = grammar.generation_plan(&vec!["1".to_string(); 4]);

        let lines: Vec<String> = plan.iter().map(|s| s.production.to_string()).collect();
        assert_eq!(
            lines,
            vec![
                "A1 -> [start, @, 1, 1]A2",
                "A2 -> [1, 1]A2",
                "A2 -> [1, 1]A2",
                "A2 -> [1, 1, $]",
            ]
        );
        for step in &plan {
            let production = &step.production;
            assert!(grammar
                .generation()
                .contains(&production.left, &production.right));
        }
    }
}
