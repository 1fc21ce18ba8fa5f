// Multi-tape automaton: arena of states with per-tape symbol tables.

use crate::FstError;
use crate::symbols::{Symbol, SymbolTable};

/// Dense index of a state inside its automaton.
pub type StateId = usize;

/// A named tape and the symbols that may appear on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tape {
    pub name: String,
    pub symbols: SymbolTable,
}

impl Tape {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            symbols: SymbolTable::new(),
        }
    }
}

/// A transition consuming one symbol per tape.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Arc {
    pub source: StateId,
    pub target: StateId,
    /// One entry per tape, in tape declaration order.
    pub symbols: Box<[Symbol]>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct State {
    pub is_final: bool,
    pub arcs: Vec<Arc>,
}

/// An immutable multi-tape automaton.
///
/// States live in a flat arena and refer to each other by index, so cyclic
/// graphs need no shared ownership. Every arc tuple has exactly
/// [`tape_count`](Self::tape_count) entries and every index is in range;
/// [`AutomatonBuilder`] enforces both.
#[derive(Clone, PartialEq, Eq)]
pub struct Automaton {
    tapes: Vec<Tape>,
    aliases: Vec<(String, usize)>,
    states: Vec<State>,
    start: StateId,
}

impl std::fmt::Debug for Automaton {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Automaton")
            .field("tapes", &self.tape_names().collect::<Vec<_>>())
            .field("aliases", &self.aliases)
            .field("state_count", &self.states.len())
            .field("arc_count", &self.arc_count())
            .field("start", &self.start)
            .finish()
    }
}

impl Automaton {
    pub fn tape_count(&self) -> usize {
        self.tapes.len()
    }

    pub fn tapes(&self) -> &[Tape] {
        &self.tapes
    }

    pub fn tape_names(&self) -> impl Iterator<Item = &str> {
        self.tapes.iter().map(|t| t.name.as_str())
    }

    /// Resolve a tape name, trying canonical names before aliases.
    pub fn tape_index(&self, name: &str) -> Option<usize> {
        self.tapes
            .iter()
            .position(|t| t.name == name)
            .or_else(|| {
                self.aliases
                    .iter()
                    .find(|(alias, _)| alias == name)
                    .map(|&(_, index)| index)
            })
    }

    /// Alternative tape names as `(alias, tape index)`.
    pub fn aliases(&self) -> &[(String, usize)] {
        &self.aliases
    }

    pub fn symbols(&self, tape: usize) -> Option<&SymbolTable> {
        self.tapes.get(tape).map(|t| &t.symbols)
    }

    /// Text of `symbol` on `tape`.
    pub fn lookup(&self, tape: usize, symbol: Symbol) -> Result<&str, FstError> {
        let table = self.symbols(tape).ok_or(FstError::UnknownTapeIndex {
            index: tape,
            count: self.tapes.len(),
        })?;
        table.get(symbol).ok_or(FstError::UnknownSymbolId {
            tape,
            id: symbol.raw(),
        })
    }

    pub fn start(&self) -> StateId {
        self.start
    }

    pub fn num_states(&self) -> usize {
        self.states.len()
    }

    pub fn states(&self) -> &[State] {
        &self.states
    }

    pub fn state(&self, id: StateId) -> Option<&State> {
        self.states.get(id)
    }

    /// Whether `id` is final. Out-of-range ids are never final.
    pub fn is_final(&self, id: StateId) -> bool {
        self.states.get(id).is_some_and(|s| s.is_final)
    }

    /// Outgoing arcs of `id`. Panics if `id` is out of range.
    pub fn arcs(&self, id: StateId) -> &[Arc] {
        &self.states[id].arcs
    }

    pub fn arc_count(&self) -> usize {
        self.states.iter().map(|s| s.arcs.len()).sum()
    }

    pub fn all_arcs(&self) -> impl Iterator<Item = &Arc> {
        self.states.iter().flat_map(|s| s.arcs.iter())
    }

    pub fn final_states(&self) -> impl Iterator<Item = StateId> + '_ {
        self.states
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_final)
            .map(|(id, _)| id)
    }
}

/// Incremental construction of an [`Automaton`].
///
/// State indices and symbol ids are allocated by the builder itself, so
/// independent builders never interfere. A new builder holds a single
/// state, index 0, which is the start state.
#[derive(Debug, Clone)]
pub struct AutomatonBuilder {
    tapes: Vec<Tape>,
    aliases: Vec<(String, usize)>,
    states: Vec<State>,
    start: StateId,
}

impl AutomatonBuilder {
    /// Start an automaton with the given tape names, each with an empty table.
    pub fn new<I, S>(tape_names: I) -> Result<Self, FstError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_tapes(tape_names.into_iter().map(Tape::new).collect())
    }

    /// Start an automaton from prepared tapes (names plus symbol tables).
    pub fn from_tapes(tapes: Vec<Tape>) -> Result<Self, FstError> {
        if tapes.is_empty() {
            return Err(FstError::NoTapes);
        }
        for (i, tape) in tapes.iter().enumerate() {
            validate_name(&tape.name)?;
            if tapes[..i].iter().any(|t| t.name == tape.name) {
                return Err(FstError::DuplicateTape(tape.name.clone()));
            }
        }
        Ok(Self {
            tapes,
            aliases: Vec::new(),
            states: vec![State::default()],
            start: 0,
        })
    }

    /// Start a builder with the tapes, symbol tables and aliases of
    /// `automaton` and a single start state.
    pub fn like(automaton: &Automaton) -> Self {
        Self {
            tapes: automaton.tapes.clone(),
            aliases: automaton.aliases.clone(),
            states: vec![State::default()],
            start: 0,
        }
    }

    pub fn tape_count(&self) -> usize {
        self.tapes.len()
    }

    pub fn num_states(&self) -> usize {
        self.states.len()
    }

    pub fn tapes(&self) -> &[Tape] {
        &self.tapes
    }

    /// Push an arc whose endpoints and symbols are known to be valid for
    /// this builder (copied from an automaton with the same tables).
    pub(crate) fn push_arc(&mut self, source: StateId, target: StateId, symbols: Box<[Symbol]>) {
        debug_assert!(source < self.states.len() && target < self.states.len());
        debug_assert_eq!(symbols.len(), self.tapes.len());
        self.states[source].arcs.push(Arc {
            source,
            target,
            symbols,
        });
    }

    pub(crate) fn tape_mut(&mut self, tape: usize) -> &mut Tape {
        &mut self.tapes[tape]
    }

    /// Mark a state known to exist as final.
    pub(crate) fn mark_final(&mut self, state: StateId) {
        self.states[state].is_final = true;
    }

    /// Register `alias` as another name for tape `tape`.
    pub fn add_alias(&mut self, alias: impl Into<String>, tape: usize) -> Result<(), FstError> {
        let alias = alias.into();
        validate_name(&alias)?;
        self.check_tape(tape)?;
        if self.name_taken(&alias) {
            return Err(FstError::DuplicateTape(alias));
        }
        self.aliases.push((alias, tape));
        Ok(())
    }

    /// Whether `name` is already used as a tape name or alias.
    pub fn name_taken(&self, name: &str) -> bool {
        self.tapes.iter().any(|t| t.name == name) || self.aliases.iter().any(|(a, _)| a == name)
    }

    /// Intern `text` on tape `tape`.
    pub fn intern(&mut self, tape: usize, text: &str) -> Result<Symbol, FstError> {
        self.check_tape(tape)?;
        Ok(self.tapes[tape].symbols.intern(text))
    }

    pub fn add_state(&mut self) -> StateId {
        self.states.push(State::default());
        self.states.len() - 1
    }

    /// Grow the arena so that at least `count` states exist.
    pub fn ensure_states(&mut self, count: usize) {
        if self.states.len() < count {
            self.states.resize_with(count, State::default);
        }
    }

    pub fn set_start(&mut self, state: StateId) -> Result<(), FstError> {
        self.check_state(state)?;
        self.start = state;
        Ok(())
    }

    pub fn set_final(&mut self, state: StateId, is_final: bool) -> Result<(), FstError> {
        self.check_state(state)?;
        self.states[state].is_final = is_final;
        Ok(())
    }

    /// Add an arc from `source` to `target`.
    ///
    /// `symbols` must hold one symbol per tape, each defined in its tape's
    /// table.
    pub fn add_arc(
        &mut self,
        source: StateId,
        target: StateId,
        symbols: impl Into<Box<[Symbol]>>,
    ) -> Result<(), FstError> {
        let symbols = symbols.into();
        if symbols.len() != self.tapes.len() {
            return Err(FstError::ArityMismatch {
                expected: self.tapes.len(),
                actual: symbols.len(),
            });
        }
        self.check_state(source)?;
        self.check_state(target)?;
        for (tape, (&sym, t)) in symbols.iter().zip(&self.tapes).enumerate() {
            if !t.symbols.contains(sym) {
                return Err(FstError::UnknownSymbolId { tape, id: sym.raw() });
            }
        }
        self.states[source].arcs.push(Arc {
            source,
            target,
            symbols,
        });
        Ok(())
    }

    /// Intern `texts` (one per tape) and add the resulting arc.
    pub fn add_arc_text(
        &mut self,
        source: StateId,
        target: StateId,
        texts: &[&str],
    ) -> Result<(), FstError> {
        if texts.len() != self.tapes.len() {
            return Err(FstError::ArityMismatch {
                expected: self.tapes.len(),
                actual: texts.len(),
            });
        }
        let symbols: Vec<Symbol> = texts
            .iter()
            .zip(self.tapes.iter_mut())
            .map(|(text, tape)| tape.symbols.intern(text))
            .collect();
        self.add_arc(source, target, symbols)
    }

    pub fn build(self) -> Automaton {
        Automaton {
            tapes: self.tapes,
            aliases: self.aliases,
            states: self.states,
            start: self.start,
        }
    }

    fn check_state(&self, state: StateId) -> Result<(), FstError> {
        if state < self.states.len() {
            Ok(())
        } else {
            Err(FstError::InvalidState {
                state,
                count: self.states.len(),
            })
        }
    }

    fn check_tape(&self, tape: usize) -> Result<(), FstError> {
        if tape < self.tapes.len() {
            Ok(())
        } else {
            Err(FstError::UnknownTapeIndex {
                index: tape,
                count: self.tapes.len(),
            })
        }
    }
}

/// Tape names end up in tab-separated text, so they must be non-empty and
/// free of tabs and line breaks.
fn validate_name(name: &str) -> Result<(), FstError> {
    if name.is_empty() || name.contains(['\t', '\n', '\r']) {
        return Err(FstError::InvalidTapeName(name.to_string()));
    }
    Ok(())
}
