// Automaton reversal.

use crate::automaton::{Automaton, AutomatonBuilder};
use crate::symbols::Symbol;

/// Reverse the direction of every path.
///
/// The result has a fresh start state (index 0) with an all-epsilon arc to
/// each former final state. Every arc is flipped, and the former start
/// state is the only final state. Old state `i` becomes `i + 1`. Tapes,
/// aliases and symbol tables are kept as they are.
pub fn reverse(automaton: &Automaton) -> Automaton {
    let mut builder = AutomatonBuilder::like(automaton);
    builder.ensure_states(automaton.num_states() + 1);

    let silent: Box<[Symbol]> = vec![Symbol::Epsilon; automaton.tape_count()].into();
    for state in automaton.final_states() {
        builder.push_arc(0, state + 1, silent.clone());
    }
    for arc in automaton.all_arcs() {
        builder.push_arc(arc.target + 1, arc.source + 1, arc.symbols.clone());
    }
    builder.mark_final(automaton.start() + 1);
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExpandConfig;
    use crate::expand::expand;

    fn lines(a: &Automaton) -> Vec<String> {
        expand(a, &ExpandConfig::default())
            .unwrap()
            .iter()
            .map(|p| p.join(":"))
            .collect()
    }

    #[test]
    fn reverses_accepted_strings() {
        let mut b = AutomatonBuilder::new(["in", "out"]).unwrap();
        b.ensure_states(4);
        b.add_arc_text(0, 1, &["a", "x"]).unwrap();
        b.add_arc_text(1, 2, &["b", ""]).unwrap();
        b.add_arc_text(1, 3, &["c", "y"]).unwrap();
        b.set_final(2, true).unwrap();
        b.set_final(3, true).unwrap();
        let a = b.build();

        let r = reverse(&a);
        assert_eq!(r.num_states(), 5);
        assert_eq!(r.arc_count(), 5);
        assert_eq!(r.final_states().collect::<Vec<_>>(), [1]);
        assert_eq!(lines(&r), ["ba:x", "ca:yx"]);
    }

    #[test]
    fn double_reverse_accepts_the_same_language() {
        let mut b = AutomatonBuilder::new(["t"]).unwrap();
        b.ensure_states(3);
        b.add_arc_text(0, 1, &["p"]).unwrap();
        b.add_arc_text(1, 2, &["q"]).unwrap();
        b.add_arc_text(0, 2, &["r"]).unwrap();
        b.set_final(2, true).unwrap();
        let a = b.build();
        assert_eq!(lines(&reverse(&reverse(&a))), lines(&a));
    }

    #[test]
    fn keeps_tapes_and_aliases() {
        let mut b = AutomatonBuilder::new(["in", "out"]).unwrap();
        b.add_alias("surface", 1).unwrap();
        let a = b.build();
        let r = reverse(&a);
        assert_eq!(r.tape_names().collect::<Vec<_>>(), ["in", "out"]);
        assert_eq!(r.tape_index("surface"), Some(1));
    }
}
