//! Unrestricted grammar of a Turing machine.
//!
//! A configuration is encoded as a row of pairs `[a, X]`: `a` is the input symbol the cell
//! was generated from (`ε` for padding) and `X` the symbol the machine currently sees there.
//! The state is a separate single-label token placed right before the cell under the head.

use super::{GenerationStep, Padding, ProductionTable};
use crate::automaton::Automaton;
use crate::types::{Direction, Symbol, EPSILON};

const PAD_LEFT: &str = "A0";
const ATTACH_START: &str = "A1";
const PAIR_INPUT: &str = "A2";
const PAD_RIGHT: &str = "A3";

pub(super) fn start_symbol() -> Symbol {
    nt!(PAD_LEFT)
}

/// Builds the generation, transition and recovery tables.
pub(super) fn build(
    automaton: &Automaton,
    blank: &str,
) -> (ProductionTable, ProductionTable, ProductionTable) {
    let inputs = inputs_with_epsilon(automaton);

    (
        generation(automaton, blank),
        transition(automaton, &inputs),
        recovery(automaton, &inputs),
    )
}

/// Σ followed by the padding label.
fn inputs_with_epsilon(automaton: &Automaton) -> Vec<&str> {
    let mut inputs = automaton.input_symbols();
    inputs.push(EPSILON);
    inputs
}

/// `A0 -> [ε, B]A0 | A1`, `A1 -> q0 A2`, `A2 -> [a, a]A2 | A3`, `A3 -> [ε, B]A3 | ε`
fn generation(automaton: &Automaton, blank: &str) -> ProductionTable {
    let mut table = ProductionTable::new();

    table.insert(vec![nt!(PAD_LEFT)], vec![nt!(EPSILON, blank), nt!(PAD_LEFT)]);
    table.insert(vec![nt!(PAD_LEFT)], vec![nt!(ATTACH_START)]);
    table.insert(
        vec![nt!(ATTACH_START)],
        vec![nt!(automaton.start_state()), nt!(PAIR_INPUT)],
    );
    for a in automaton.input_symbols() {
        table.insert(vec![nt!(PAIR_INPUT)], vec![nt!(a, a), nt!(PAIR_INPUT)]);
    }
    table.insert(vec![nt!(PAIR_INPUT)], vec![nt!(PAD_RIGHT)]);
    table.insert(vec![nt!(PAD_RIGHT)], vec![nt!(EPSILON, blank), nt!(PAD_RIGHT)]);
    table.insert(vec![nt!(PAD_RIGHT)], vec![]);

    table
}

/// One production per δ entry and input label `a`, plus the left context for left moves.
///
/// * right: `q[a, X] -> [a, Y]p`
/// * left: `[b, C]q[a, X] -> p[b, C][a, Y]` for every `b` in Σ ∪ {ε} and `C` in Γ
fn transition(automaton: &Automaton, inputs: &[&str]) -> ProductionTable {
    let mut table = ProductionTable::new();

    for (q, x, t) in automaton.transitions() {
        let p = t.next_state.as_str();
        let y = t.write.as_str();

        for &a in inputs {
            match t.direction {
                Direction::Right => {
                    table.insert(vec![nt!(q), nt!(a, x)], vec![nt!(a, y), nt!(p)]);
                }
                Direction::Left => {
                    for &b in inputs {
                        for c in automaton.tape_alphabet() {
                            table.insert(
                                vec![nt!(b, c), nt!(q), nt!(a, x)],
                                vec![nt!(p), nt!(b, c), nt!(a, y)],
                            );
                        }
                    }
                }
            }
        }
    }

    table
}

/// For every final `q`: `q -> ε`, `[a, C]q -> q a q` and `q[a, C] -> q a q`.
///
/// The terminal in the middle is left out for padding cells, so only the generated word
/// survives the cleanup.
fn recovery(automaton: &Automaton, inputs: &[&str]) -> ProductionTable {
    let mut table = ProductionTable::new();

    for q in automaton.final_states() {
        table.insert(vec![nt!(q)], vec![]);

        for &a in inputs {
            let mut right = vec![nt!(q)];
            if a != EPSILON {
                right.push(Symbol::terminal(a));
            }
            right.push(nt!(q));

            for c in automaton.tape_alphabet() {
                table.insert(vec![nt!(a, c), nt!(q)], right.clone());
                table.insert(vec![nt!(q), nt!(a, c)], right.clone());
            }
        }
    }

    table
}

/// `padding.left` blank cells, the word paired with itself, `padding.right` blank cells.
pub(super) fn generation_plan(
    start: &str,
    blank: &str,
    word: &[String],
    padding: Padding,
) -> Vec<GenerationStep> {
    let mut plan = vec![
        GenerationStep::times(
            nt!(PAD_LEFT),
            vec![nt!(EPSILON, blank), nt!(PAD_LEFT)],
            padding.left,
        ),
        GenerationStep::once(nt!(PAD_LEFT), vec![nt!(ATTACH_START)]),
        GenerationStep::once(nt!(ATTACH_START), vec![nt!(start), nt!(PAIR_INPUT)]),
    ];

    plan.extend(word.iter().map(|a| {
        GenerationStep::once(nt!(PAIR_INPUT), vec![nt!(a, a), nt!(PAIR_INPUT)])
    }));

    plan.push(GenerationStep::once(nt!(PAIR_INPUT), vec![nt!(PAD_RIGHT)]));
    plan.push(GenerationStep::times(
        nt!(PAD_RIGHT),
        vec![nt!(EPSILON, blank), nt!(PAD_RIGHT)],
        padding.right,
    ));
    plan.push(GenerationStep::once(nt!(PAD_RIGHT), vec![]));

    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automaton::MachineKind;
    use crate::grammar::Grammar;
    use crate::parser::parse;
    use crate::programs::primality_automaton;

    fn primality_grammar() -> Grammar {
        Grammar::from_automaton(&primality_automaton(MachineKind::Unbounded))
    }

    #[test]
    fn test_table_sizes() {
        let grammar = primality_grammar();

        assert_eq!(grammar.generation().len(), 7);
        assert_eq!(grammar.transition().len(), 320);
        assert_eq!(grammar.recovery().len(), 21);
    }

    #[test]
    fn test_right_move() {
        // q0 1 q1 d right
        let grammar = primality_grammar();

        assert!(grammar.transition().contains(
            &[nt!("q0"), nt!("1", "1")],
            &[nt!("1", "d"), nt!("q1")]
        ));
        assert!(grammar.transition().contains(
            &[nt!("q0"), nt!(EPSILON, "1")],
            &[nt!(EPSILON, "d"), nt!("q1")]
        ));
    }

    #[test]
    fn test_left_move() {
        // seek 1 back x left
        let grammar = primality_grammar();

        assert!(grammar.transition().contains(
            &[nt!(EPSILON, "B"), nt!("seek"), nt!("1", "1")],
            &[nt!("back"), nt!(EPSILON, "B"), nt!("1", "x")]
        ));
    }

    #[test]
    fn test_recovery_skips_padding() {
        let grammar = primality_grammar();

        assert!(grammar.recovery().contains(&[nt!("accept")], &[]));
        assert!(grammar.recovery().contains(
            &[nt!("1", "u"), nt!("accept")],
            &[nt!("accept"), Symbol::terminal("1"), nt!("accept")]
        ));
        assert!(grammar.recovery().contains(
            &[nt!("accept"), nt!(EPSILON, "B")],
            &[nt!("accept"), nt!("accept")]
        ));
        // Only final states are recovered
        assert!(grammar.recovery().get(&[nt!("reject")]).is_none());
    }

    #[test]
    fn test_transition_and_recovery_are_unambiguous() {
        let grammar = primality_grammar();

        assert_eq!(grammar.transition().ambiguous_patterns().count(), 0);
        assert_eq!(grammar.recovery().ambiguous_patterns().count(), 0);
    }

    #[test]
    fn test_generation_plan() {
        let grammar = primality_grammar();
        let word = vec!["1".to_string(); 3];
        let plan = grammar.generation_plan(&word);

        assert_eq!(plan.len(), 3 + 3 + 3);
        assert_eq!(plan[2].production.to_string(), "A1 -> q0A2");
        assert_eq!(plan[7].repeat, 5);
        for step in &plan {
            let production = &step.production;
            assert!(grammar
                .generation()
                .contains(&production.left, &production.right));
        }
    }

    #[test]
    fn test_padded_generation_plan() {
        let grammar = primality_grammar();
        let word = vec!["1".to_string(); 2];
        let plan = grammar.padded_generation_plan(&word, Padding { left: 3, right: 8 });

        assert_eq!(plan[0].production.to_string(), "A0 -> [ε, B]A0");
        assert_eq!(plan[0].repeat, 3);
        assert_eq!(plan[plan.len() - 2].repeat, 8);
        assert_eq!(plan.last().unwrap().production.to_string(), "A3 -> ε");
    }

    #[test]
    fn test_generation_per_input_symbol() {
        let input = "a b
a b B
B
q0
q0
";
        let automaton = parse(input, MachineKind::Unbounded).unwrap();
        let grammar = Grammar::from_automaton(&automaton);

        let pairings = grammar.generation().get(&[nt!(PAIR_INPUT)]).unwrap();
        // [a, a]A2, [b, b]A2 and A3
        assert_eq!(pairings.len(), 3);
        assert!(grammar.transition().is_empty());
    }
}
