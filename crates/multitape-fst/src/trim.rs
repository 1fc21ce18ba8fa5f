// Reachability-based state removal: dead-end pruning and trimming.

use std::collections::VecDeque;

use crate::automaton::{Automaton, AutomatonBuilder, StateId};

/// Mark every state reachable from `seeds` along `links`.
fn follow_links(links: &[Vec<StateId>], seeds: impl IntoIterator<Item = StateId>) -> Vec<bool> {
    let mut reached = vec![false; links.len()];
    let mut todo: VecDeque<StateId> = seeds.into_iter().collect();
    while let Some(cur) = todo.pop_front() {
        if reached[cur] {
            continue;
        }
        reached[cur] = true;
        todo.extend(links[cur].iter().copied().filter(|&next| !reached[next]));
    }
    reached
}

/// States reachable from the start state.
pub fn accessible(automaton: &Automaton) -> Vec<bool> {
    let forward: Vec<Vec<StateId>> = automaton
        .states()
        .iter()
        .map(|s| s.arcs.iter().map(|a| a.target).collect())
        .collect();
    follow_links(&forward, [automaton.start()])
}

/// States from which some final state is reachable.
pub fn coaccessible(automaton: &Automaton) -> Vec<bool> {
    let mut backward = vec![Vec::new(); automaton.num_states()];
    for arc in automaton.all_arcs() {
        backward[arc.target].push(arc.source);
    }
    follow_links(&backward, automaton.final_states())
}

/// Remove every state that cannot reach a final state.
///
/// The start state always survives, so an automaton accepting nothing
/// becomes a single non-final state without arcs.
pub fn prune_dead_ends(automaton: &Automaton) -> Automaton {
    let keep = coaccessible(automaton);
    retain_states(automaton, &keep)
}

/// Keep only states that are both reachable from the start and able to
/// reach a final state.
pub fn trim(automaton: &Automaton) -> Automaton {
    let forward = accessible(automaton);
    let backward = coaccessible(automaton);
    let keep: Vec<bool> = forward.iter().zip(&backward).map(|(&f, &b)| f && b).collect();
    retain_states(automaton, &keep)
}

/// Rebuild `automaton` with only the states flagged in `keep` (plus the
/// start state). Survivors are renumbered densely, start first, the rest in
/// ascending original order. Arcs touching a removed state are dropped.
pub fn retain_states(automaton: &Automaton, keep: &[bool]) -> Automaton {
    let start = automaton.start();
    let mut new_index: Vec<Option<StateId>> = vec![None; automaton.num_states()];
    new_index[start] = Some(0);
    let mut next = 1;
    for (id, &kept) in keep.iter().enumerate() {
        if kept && id != start {
            new_index[id] = Some(next);
            next += 1;
        }
    }

    let mut builder = AutomatonBuilder::like(automaton);
    builder.ensure_states(next);

    for (old, state) in automaton.states().iter().enumerate() {
        let Some(src) = new_index[old] else { continue };
        if !keep[old] {
            continue;
        }
        if state.is_final {
            builder.mark_final(src);
        }
        for arc in &state.arcs {
            if !keep[arc.target] {
                continue;
            }
            if let Some(trg) = new_index[arc.target] {
                builder.push_arc(src, trg, arc.symbols.clone());
            }
        }
    }
    builder.build()
}
