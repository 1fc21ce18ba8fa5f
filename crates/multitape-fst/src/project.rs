// Projection: keep a subset of tapes, in a chosen order.

use hashbrown::HashSet;

use crate::automaton::{Automaton, AutomatonBuilder, Tape};
use crate::symbols::Symbol;
use crate::{FstError, Operand};

/// Keep the tapes named in `keep` (canonical names or aliases), in that
/// order, and drop the others.
///
/// Arcs keep their endpoints; arcs that become identical after the drop
/// are emitted once. Aliases of kept tapes survive. States are not
/// renumbered.
pub fn project<S: AsRef<str>>(automaton: &Automaton, keep: &[S]) -> Result<Automaton, FstError> {
    let mut indices: Vec<usize> = Vec::with_capacity(keep.len());
    for name in keep {
        let name = name.as_ref();
        let index = automaton.tape_index(name).ok_or_else(|| FstError::UnknownTape {
            name: name.to_string(),
            operand: Operand::Input,
        })?;
        if indices.contains(&index) {
            return Err(FstError::DuplicateTape(name.to_string()));
        }
        indices.push(index);
    }

    let tapes: Vec<Tape> = indices.iter().map(|&i| automaton.tapes()[i].clone()).collect();
    let mut builder = AutomatonBuilder::from_tapes(tapes)?;
    for (alias, tape) in automaton.aliases() {
        if let Some(new_tape) = indices.iter().position(|i| i == tape) {
            builder.add_alias(alias.clone(), new_tape)?;
        }
    }

    builder.ensure_states(automaton.num_states());
    builder.set_start(automaton.start())?;
    for (id, state) in automaton.states().iter().enumerate() {
        if state.is_final {
            builder.mark_final(id);
        }
        let mut emitted: HashSet<(usize, Box<[Symbol]>)> = HashSet::new();
        for arc in &state.arcs {
            let symbols: Box<[Symbol]> = indices.iter().map(|&i| arc.symbols[i]).collect();
            if emitted.insert((arc.target, symbols.clone())) {
                builder.push_arc(id, arc.target, symbols);
            }
        }
    }
    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_tape() -> Automaton {
        let mut b = AutomatonBuilder::new(["lex", "mid", "surf"]).unwrap();
        b.add_alias("rule_in", 1).unwrap();
        b.add_alias("rule_out", 2).unwrap();
        b.ensure_states(2);
        b.add_arc_text(0, 1, &["a", "b", "c"]).unwrap();
        b.add_arc_text(0, 1, &["a", "x", "c"]).unwrap();
        b.set_final(1, true).unwrap();
        b.build()
    }

    #[test]
    fn keeps_named_tapes_in_order() {
        let p = project(&three_tape(), &["surf", "lex"]).unwrap();
        assert_eq!(p.tape_names().collect::<Vec<_>>(), ["surf", "lex"]);
        assert_eq!(p.tape_index("rule_out"), Some(0));
        assert_eq!(p.tape_index("rule_in"), None);

        // the two arcs only differed on the dropped tape
        assert_eq!(p.arc_count(), 1);
        let arc = &p.arcs(0)[0];
        assert_eq!(p.lookup(0, arc.symbols[0]).unwrap(), "c");
        assert_eq!(p.lookup(1, arc.symbols[1]).unwrap(), "a");
        assert!(p.is_final(1));
    }

    #[test]
    fn resolves_aliases() {
        let p = project(&three_tape(), &["rule_in"]).unwrap();
        assert_eq!(p.tape_names().collect::<Vec<_>>(), ["mid"]);
        assert_eq!(p.arc_count(), 2);
    }

    #[test]
    fn rejects_bad_names() {
        let a = three_tape();
        assert!(matches!(
            project(&a, &["nope"]),
            Err(FstError::UnknownTape {
                operand: Operand::Input,
                ..
            })
        ));
        assert!(matches!(
            project(&a, &["mid", "rule_in"]),
            Err(FstError::DuplicateTape(_))
        ));
        let none: &[&str] = &[];
        assert!(matches!(project(&a, none), Err(FstError::NoTapes)));
    }
}
