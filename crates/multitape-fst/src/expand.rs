// Path expansion: enumerate the per-tape strings of every accepting path.

use std::collections::BTreeSet;

use crate::FstError;
use crate::automaton::Automaton;
use crate::config::{ExpandConfig, PathStack};
use crate::flags::FlagTable;
use crate::trim;

/// One accepting path: the concatenated symbol text of each tape.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExpandedPath {
    pub tapes: Vec<String>,
}

impl ExpandedPath {
    /// Render as one line with `separator` between tapes.
    pub fn join(&self, separator: &str) -> String {
        self.tapes.join(separator)
    }
}

/// States that lie on some accepting path.
fn useful_states(automaton: &Automaton) -> Vec<bool> {
    let forward = trim::accessible(automaton);
    let backward = trim::coaccessible(automaton);
    forward.iter().zip(&backward).map(|(&f, &b)| f && b).collect()
}

/// Find a cycle among `useful` states, returning a state on it.
fn find_cycle(automaton: &Automaton, useful: &[bool]) -> Option<usize> {
    const WHITE: u8 = 0;
    const GREY: u8 = 1;
    const BLACK: u8 = 2;

    let start = automaton.start();
    if !useful[start] {
        return None;
    }
    let mut color = vec![WHITE; automaton.num_states()];
    let mut stack: Vec<(usize, usize)> = vec![(start, 0)];
    color[start] = GREY;
    while let Some(top) = stack.last_mut() {
        let (state, index) = *top;
        let arcs = automaton.arcs(state);
        if index == arcs.len() {
            color[state] = BLACK;
            stack.pop();
            continue;
        }
        top.1 += 1;
        let target = arcs[index].target;
        if !useful[target] {
            continue;
        }
        match color[target] {
            GREY => return Some(target),
            WHITE => {
                color[target] = GREY;
                stack.push((target, 0));
            }
            _ => {}
        }
    }
    None
}

/// Enumerate every accepting path of `automaton` as per-tape strings.
///
/// Only states that are both reachable and able to reach a final state are
/// walked. Epsilon contributes nothing; identity is written as its marker
/// text. The result is sorted and free of duplicates.
///
/// With `check_flags`, flag diacritics on any tape are evaluated along the
/// path. A path that breaks one is not accepted, and flags write no text.
///
/// With `max_cycles: None`, an automaton with a cycle among those states has
/// infinitely many paths and fails with [`FstError::AcceptingCycle`].
pub fn expand(automaton: &Automaton, config: &ExpandConfig) -> Result<Vec<ExpandedPath>, FstError> {
    let useful = useful_states(automaton);
    if config.max_cycles.is_none() {
        if let Some(state) = find_cycle(automaton, &useful) {
            return Err(FstError::AcceptingCycle { state });
        }
    }

    let mut found: BTreeSet<Vec<String>> = BTreeSet::new();
    let start = automaton.start();
    if !useful[start] {
        return Ok(Vec::new());
    }

    let flags = config.check_flags.then(|| FlagTable::new(automaton));
    let feature_count = flags.as_ref().map_or(0, FlagTable::feature_count);

    let limit = config.visit_limit();
    let mut stack = PathStack::new(automaton.tape_count(), automaton.num_states(), feature_count);
    stack.push(start);
    if automaton.is_final(start) {
        found.insert(stack.outputs.clone());
    }

    while let Some((state, index)) = stack.advance() {
        let Some(arc) = automaton.arcs(state).get(index) else {
            stack.pop();
            continue;
        };
        if !useful[arc.target] || stack.visits[arc.target] >= limit {
            continue;
        }
        stack.push(arc.target);
        let mut allowed = true;
        for (tape, &symbol) in arc.symbols.iter().enumerate() {
            if let Some(ofv) = flags.as_ref().and_then(|table| table.get(tape, symbol)) {
                allowed &= stack.apply_flag(&ofv);
                continue;
            }
            let text = automaton.lookup(tape, symbol)?;
            stack.outputs[tape].push_str(text);
        }
        if !allowed {
            stack.pop();
            continue;
        }
        if automaton.is_final(arc.target) {
            found.insert(stack.outputs.clone());
        }
    }

    Ok(found.into_iter().map(|tapes| ExpandedPath { tapes }).collect())
}
