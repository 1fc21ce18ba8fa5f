// Path expansion configuration and its explicit DFS stack.

use crate::automaton::StateId;
use crate::flags::{self, FlagCheckResult, OpFeatureValue};

/// How [`expand`](crate::expand::expand) treats cycles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpandConfig {
    /// `None` rejects automata whose useful part has a cycle. `Some(n)` lets
    /// each state be entered at most `n + 1` times on one path, unrolling
    /// every cycle up to `n` times.
    pub max_cycles: Option<usize>,
    /// Enforce flag diacritics: paths whose flags conflict are dropped and
    /// flag text is left out of the output. Off, flags are plain symbols.
    pub check_flags: bool,
}

impl ExpandConfig {
    pub fn with_max_cycles(max_cycles: usize) -> Self {
        Self {
            max_cycles: Some(max_cycles),
            ..Self::default()
        }
    }

    pub fn with_flag_checks(self) -> Self {
        Self {
            check_flags: true,
            ..self
        }
    }

    /// Number of times a state may appear on one path.
    #[inline]
    pub(crate) fn visit_limit(&self) -> usize {
        self.max_cycles.map_or(1, |n| n.saturating_add(1))
    }
}

/// Explicit DFS stack for path enumeration.
///
/// Frame `d` holds the state reached at depth `d` and the index of the next
/// arc to try from it. `marks` is a flattened `[depth * tape_count + tape]`
/// table of output lengths before the arc into that frame was taken, so a
/// pop restores every tape in one step.
///
/// Flag values are changed in place. Every change is logged as
/// `(feature, previous value)` and `flag_marks` holds the log length at each
/// push, so a pop rolls back the flags set by the arc into that frame.
pub(crate) struct PathStack {
    pub tape_count: usize,
    pub states: Vec<StateId>,
    pub next_arc: Vec<usize>,
    pub marks: Vec<usize>,
    /// Text accumulated on each tape along the current path.
    pub outputs: Vec<String>,
    /// Occurrences of each state on the current path.
    pub visits: Vec<usize>,
    flag_values: Vec<u16>,
    flag_undo: Vec<(u16, u16)>,
    flag_marks: Vec<usize>,
}

impl PathStack {
    pub fn new(tape_count: usize, state_count: usize, feature_count: usize) -> Self {
        Self {
            tape_count,
            states: Vec::new(),
            next_arc: Vec::new(),
            marks: Vec::new(),
            outputs: vec![String::new(); tape_count],
            visits: vec![0; state_count],
            flag_values: vec![flags::FLAG_VALUE_NEUTRAL; feature_count],
            flag_undo: Vec::new(),
            flag_marks: Vec::new(),
        }
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.states.len()
    }

    /// Enter `state`, remembering the current output lengths.
    pub fn push(&mut self, state: StateId) {
        self.marks.extend(self.outputs.iter().map(String::len));
        self.states.push(state);
        self.next_arc.push(0);
        self.flag_marks.push(self.flag_undo.len());
        self.visits[state] += 1;
    }

    /// Leave the top frame and undo what was appended since its push.
    pub fn pop(&mut self) {
        let Some(state) = self.states.pop() else {
            return;
        };
        self.next_arc.pop();
        self.visits[state] -= 1;
        let base = self.marks.len() - self.tape_count;
        for (output, &len) in self.outputs.iter_mut().zip(&self.marks[base..]) {
            output.truncate(len);
        }
        self.marks.truncate(base);
        let mark = self.flag_marks.pop().unwrap_or(0);
        while self.flag_undo.len() > mark {
            if let Some((feature, value)) = self.flag_undo.pop() {
                self.flag_values[feature as usize] = value;
            }
        }
    }

    /// Apply a flag on the current path. Returns false if it conflicts; the
    /// updates already made for the top frame are undone by its pop.
    pub fn apply_flag(&mut self, ofv: &OpFeatureValue) -> bool {
        let feature = ofv.feature as usize;
        match flags::check_flag(ofv, self.flag_values[feature]) {
            FlagCheckResult::Reject => false,
            FlagCheckResult::AcceptNoUpdate { .. } => true,
            FlagCheckResult::AcceptAndUpdate { feature, value } => {
                let slot = &mut self.flag_values[feature as usize];
                self.flag_undo.push((feature, *slot));
                *slot = value;
                true
            }
        }
    }

    /// Top state and the index of its next untried arc, advancing the index.
    pub fn advance(&mut self) -> Option<(StateId, usize)> {
        let state = *self.states.last()?;
        let next = self.next_arc.last_mut()?;
        let index = *next;
        *next += 1;
        Some((state, index))
    }
}
