// Multi-tape composition: lazy product construction joined on tape pairs.
//
// Each pairing (tape of the left automaton, tape of the right automaton)
// must read the same symbol stream. All pairings are checked together, so
// the result is a relational join across tapes rather than a chain of
// single-tape compositions.

use std::collections::VecDeque;

use hashbrown::{HashMap, HashSet};

use crate::automaton::{Arc, Automaton, AutomatonBuilder, StateId, Tape};
use crate::flags;
use crate::symbols::Symbol;
use crate::trim;
use crate::{FstError, Operand};

/// Default for [`ComposeOptions::max_pending`].
pub const DEFAULT_MAX_PENDING: usize = 8;

/// Knobs for [`compose_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComposeOptions {
    /// Remove states that cannot reach a final state once the product has
    /// been built.
    pub prune_dead_ends: bool,
    /// Treat flag diacritics on paired tapes like epsilon: they match
    /// nothing and are copied to the output.
    pub flags_as_epsilon: bool,
    /// How many symbols one side may read on a pairing ahead of the other.
    /// Paths that need a longer delay are not explored.
    pub max_pending: usize,
}

impl Default for ComposeOptions {
    fn default() -> Self {
        Self {
            prune_dead_ends: true,
            flags_as_epsilon: true,
            max_pending: DEFAULT_MAX_PENDING,
        }
    }
}

/// Compose `left` and `right`, reading every `(left tape, right tape)` pair
/// in `pairings` in lock-step.
///
/// The result has all tapes of `left` followed by the tapes of `right` that
/// are not the right-hand side of a pairing. A paired right tape is merged
/// into its left tape and its name becomes an alias of that tape. A
/// surviving right tape whose name is already in use is renamed
/// `<name>_<k>` with the smallest free `k >= 2`.
///
/// Symbols on a pairing join when they are equal, when one is identity and
/// the other concrete (the concrete one is kept), or when both are identity.
/// Identity never joins with epsilon. All identities on one arc stand for
/// the same symbol, so an arc whose identities would resolve to different
/// symbols joins with nothing.
///
/// Each pairing compares the symbol *strings* of the two sides, not their
/// arcs: one side may read a symbol on a pairing before the other side gets
/// to it, and the product state remembers what is still unmatched. An arc
/// that reads nothing on some paired tape (epsilon, or a flag diacritic
/// when [`ComposeOptions::flags_as_epsilon`] is set) may advance its side
/// alone. A state is final only when both sides are final and nothing is
/// pending.
///
/// If both operands are deterministic and epsilon-free on their paired
/// tapes, the result is deterministic on the surviving tapes. Nothing
/// enforces this; other inputs give a correct but non-deterministic result.
///
/// Fails with [`FstError::EmptyPairing`], [`FstError::UnknownTape`] or
/// [`FstError::DuplicatePairing`] before any traversal.
pub fn compose<L, R>(
    left: &Automaton,
    right: &Automaton,
    pairings: &[(L, R)],
) -> Result<Automaton, FstError>
where
    L: AsRef<str>,
    R: AsRef<str>,
{
    compose_with(left, right, pairings, &ComposeOptions::default())
}

/// [`compose`] with explicit options.
pub fn compose_with<L, R>(
    left: &Automaton,
    right: &Automaton,
    pairings: &[(L, R)],
    options: &ComposeOptions,
) -> Result<Automaton, FstError>
where
    L: AsRef<str>,
    R: AsRef<str>,
{
    let pairings = resolve_pairings(left, right, pairings)?;
    let (plan, builder) = Plan::new(left, right, pairings, options)?;

    let mut product = Product::new(left, right, &plan, builder);
    while let Some(key) = product.queue.pop_front() {
        product.expand(key);
    }

    let composed = product.builder.build();
    if options.prune_dead_ends {
        Ok(trim::prune_dead_ends(&composed))
    } else {
        Ok(composed)
    }
}

/// Join two symbols read on a pair of tapes (both in output-id space).
///
/// Identity never matches epsilon: it stands for exactly one symbol.
fn join_symbols(left: Symbol, right: Symbol) -> Option<Symbol> {
    match (left, right) {
        (Symbol::Epsilon, Symbol::Epsilon) => Some(Symbol::Epsilon),
        (Symbol::Epsilon, _) | (_, Symbol::Epsilon) => None,
        (Symbol::Identity, other) | (other, Symbol::Identity) => Some(other),
        (l, r) if l == r => Some(l),
        _ => None,
    }
}

/// A pairing resolved to tape indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Pairing {
    left: usize,
    right: usize,
}

fn resolve_pairings<L, R>(
    left: &Automaton,
    right: &Automaton,
    pairings: &[(L, R)],
) -> Result<Vec<Pairing>, FstError>
where
    L: AsRef<str>,
    R: AsRef<str>,
{
    if pairings.is_empty() {
        return Err(FstError::EmptyPairing);
    }
    let mut resolved: Vec<Pairing> = Vec::with_capacity(pairings.len());
    for (l, r) in pairings {
        let (l, r) = (l.as_ref(), r.as_ref());
        let li = left.tape_index(l).ok_or_else(|| FstError::UnknownTape {
            name: l.to_string(),
            operand: Operand::Left,
        })?;
        let ri = right.tape_index(r).ok_or_else(|| FstError::UnknownTape {
            name: r.to_string(),
            operand: Operand::Right,
        })?;
        if resolved.iter().any(|p| p.left == li) {
            return Err(FstError::DuplicatePairing {
                name: l.to_string(),
                operand: Operand::Left,
            });
        }
        if resolved.iter().any(|p| p.right == ri) {
            return Err(FstError::DuplicatePairing {
                name: r.to_string(),
                operand: Operand::Right,
            });
        }
        resolved.push(Pairing {
            left: li,
            right: ri,
        });
    }
    Ok(resolved)
}

/// Smallest `base`, `base_2`, `base_3`, ... not rejected by `taken`.
fn unique_name(base: &str, taken: impl Fn(&str) -> bool) -> String {
    if !taken(base) {
        return base.to_string();
    }
    let mut k = 2;
    loop {
        let candidate = format!("{base}_{k}");
        if !taken(&candidate) {
            return candidate;
        }
        k += 1;
    }
}

/// Output tape layout, computed once before traversal.
struct Plan {
    pairings: Vec<Pairing>,
    left_tapes: usize,
    tape_count: usize,
    left_paired: Vec<bool>,
    right_paired: Vec<bool>,
    /// Output tape each right tape lands on.
    right_placement: Vec<usize>,
    /// Raw right id -> output symbol, per right tape.
    right_update: Vec<Vec<Symbol>>,
    /// Raw output ids that pairings read as epsilon, per output tape.
    transparent: Vec<Vec<bool>>,
    max_pending: usize,
}

impl Plan {
    fn new(
        left: &Automaton,
        right: &Automaton,
        pairings: Vec<Pairing>,
        options: &ComposeOptions,
    ) -> Result<(Self, AutomatonBuilder), FstError> {
        let mut tapes: Vec<Tape> = left.tapes().to_vec();
        let mut left_paired = vec![false; left.tape_count()];
        let mut right_paired = vec![false; right.tape_count()];
        let mut right_placement = vec![0; right.tape_count()];
        let mut right_update = vec![Vec::new(); right.tape_count()];

        for p in &pairings {
            left_paired[p.left] = true;
            right_paired[p.right] = true;
            right_placement[p.right] = p.left;
            right_update[p.right] = tapes[p.left].symbols.merge(&right.tapes()[p.right].symbols);
        }

        let mut taken: Vec<String> = left
            .tape_names()
            .map(str::to_string)
            .chain(left.aliases().iter().map(|(a, _)| a.clone()))
            .collect();

        for (ri, tape) in right.tapes().iter().enumerate() {
            if right_paired[ri] {
                continue;
            }
            let name = unique_name(&tape.name, |n| taken.iter().any(|t| t == n));
            taken.push(name.clone());
            right_placement[ri] = tapes.len();
            right_update[ri] = (0..tape.symbols.len() as u32).map(Symbol::from_raw).collect();
            tapes.push(Tape {
                name,
                symbols: tape.symbols.clone(),
            });
        }

        let transparent = tapes
            .iter()
            .map(|tape| {
                let mut column = vec![false; tape.symbols.len()];
                if options.flags_as_epsilon {
                    for (symbol, text) in tape.symbols.concrete() {
                        column[symbol.raw() as usize] = flags::is_flag(text);
                    }
                }
                column
            })
            .collect();

        let mut builder = AutomatonBuilder::from_tapes(tapes)?;
        for (alias, index) in left.aliases() {
            builder.add_alias(alias.clone(), *index)?;
        }
        let right_names = right
            .tapes()
            .iter()
            .enumerate()
            .map(|(ri, t)| (t.name.as_str(), ri))
            .filter(|&(_, ri)| right_paired[ri])
            .chain(right.aliases().iter().map(|(a, ri)| (a.as_str(), *ri)));
        for (name, ri) in right_names {
            if !builder.name_taken(name) {
                builder.add_alias(name, right_placement[ri])?;
            }
        }

        let tape_count = builder.tape_count();
        Ok((
            Self {
                pairings,
                left_tapes: left.tape_count(),
                tape_count,
                left_paired,
                right_paired,
                right_placement,
                right_update,
                transparent,
                max_pending: options.max_pending,
            },
            builder,
        ))
    }

    /// Right arc symbols translated to the ids of their output tapes.
    fn right_row(&self, b: &Arc) -> Vec<Symbol> {
        b.symbols
            .iter()
            .enumerate()
            .map(|(ri, &s)| self.right_update[ri][s.raw() as usize])
            .collect()
    }

    /// Nothing to match: epsilon, or a flag read as epsilon.
    #[inline]
    fn is_gap(&self, tape: usize, symbol: Symbol) -> bool {
        match symbol {
            Symbol::Epsilon => true,
            Symbol::Identity => false,
            Symbol::Concrete(id) => self.transparent[tape].get(id as usize).copied().unwrap_or(false),
        }
    }

    /// Number of pairings on which a left row reads a symbol.
    fn left_reads(&self, row: &[Symbol]) -> usize {
        self.pairings
            .iter()
            .filter(|p| !self.is_gap(p.left, row[p.left]))
            .count()
    }

    fn right_reads(&self, row: &[Symbol]) -> usize {
        self.pairings
            .iter()
            .filter(|p| !self.is_gap(p.left, row[p.right]))
            .count()
    }
}

// ---------------------------------------------------------------------------
// Pending symbols
// ---------------------------------------------------------------------------

/// Symbols one side has read on a pairing that the other side has not
/// matched yet. Only one side can be ahead at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
struct Lag {
    left_ahead: bool,
    pending: Vec<Symbol>,
}

/// What one move does on one pairing.
struct Advance {
    /// Symbol written on the pairing's output tape.
    output: Symbol,
    lag: Lag,
    /// Concrete symbol that an identity read by the left (right) arc of
    /// this move was matched against.
    left_binding: Option<Symbol>,
    right_binding: Option<Symbol>,
}

/// Feed the symbols a move reads on one pairing into its lag. `None` means
/// that side reads nothing. A move matches at most one pair per pairing,
/// since each side reads at most one symbol and only one side is ahead.
fn advance(lag: &Lag, left: Option<Symbol>, right: Option<Symbol>, max_pending: usize) -> Option<Advance> {
    // (symbol, read by this move)
    let mut lefts: Vec<(Symbol, bool)> = Vec::new();
    let mut rights: Vec<(Symbol, bool)> = Vec::new();
    let ahead = if lag.left_ahead { &mut lefts } else { &mut rights };
    ahead.extend(lag.pending.iter().map(|&s| (s, false)));
    lefts.extend(left.map(|s| (s, true)));
    rights.extend(right.map(|s| (s, true)));

    let mut step = Advance {
        output: Symbol::Epsilon,
        lag: Lag::default(),
        left_binding: None,
        right_binding: None,
    };
    if !lefts.is_empty() && !rights.is_empty() {
        let (l, l_new) = lefts.remove(0);
        let (r, r_new) = rights.remove(0);
        let joined = join_symbols(l, r)?;
        if let Symbol::Concrete(_) = joined {
            if l_new && l.is_identity() {
                step.left_binding = Some(joined);
            }
            if r_new && r.is_identity() {
                step.right_binding = Some(joined);
            }
        }
        step.output = joined;
    }

    let (left_ahead, rest) = if lefts.is_empty() {
        (false, rights)
    } else {
        (true, lefts)
    };
    if rest.len() > max_pending {
        return None;
    }
    step.lag = Lag {
        left_ahead: left_ahead && !rest.is_empty(),
        pending: rest.into_iter().map(|(s, _)| s).collect(),
    };
    Some(step)
}

// ---------------------------------------------------------------------------
// Product construction
// ---------------------------------------------------------------------------

/// A product state: a state of each operand plus one lag per pairing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Key {
    left: StateId,
    right: StateId,
    backlog: Box<[Lag]>,
}

impl Key {
    fn settled(&self) -> bool {
        self.backlog.iter().all(|lag| lag.pending.is_empty())
    }
}

/// Traversal state of one composition run.
struct Product<'a> {
    left: &'a Automaton,
    right: &'a Automaton,
    plan: &'a Plan,
    builder: AutomatonBuilder,
    seen: HashMap<Key, StateId>,
    queue: VecDeque<Key>,
}

impl<'a> Product<'a> {
    fn new(
        left: &'a Automaton,
        right: &'a Automaton,
        plan: &'a Plan,
        mut builder: AutomatonBuilder,
    ) -> Self {
        let start = Key {
            left: left.start(),
            right: right.start(),
            backlog: vec![Lag::default(); plan.pairings.len()].into_boxed_slice(),
        };
        if left.is_final(start.left) && right.is_final(start.right) {
            builder.mark_final(0);
        }
        let mut seen = HashMap::new();
        seen.insert(start.clone(), 0);
        Self {
            left,
            right,
            plan,
            builder,
            seen,
            queue: VecDeque::from([start]),
        }
    }

    /// Output state for a product state, allocating and enqueueing it on
    /// first sight.
    fn state_for(&mut self, key: Key) -> StateId {
        if let Some(&id) = self.seen.get(&key) {
            return id;
        }
        let id = self.builder.add_state();
        if self.left.is_final(key.left) && self.right.is_final(key.right) && key.settled() {
            self.builder.mark_final(id);
        }
        self.seen.insert(key.clone(), id);
        self.queue.push_back(key);
        id
    }

    fn expand(&mut self, key: Key) {
        let (left, right, plan) = (self.left, self.right, self.plan);
        let source = self.seen[&key];
        let every = plan.pairings.len();
        let mut emitted: HashSet<(StateId, Box<[Symbol]>)> = HashSet::new();

        let right_arcs = right.arcs(key.right);
        let right_rows: Vec<Vec<Symbol>> = right_arcs.iter().map(|b| plan.right_row(b)).collect();

        // Joint moves: both arcs read on at least one pairing. Arcs that read
        // nothing at all only move alone, so epsilon loops on both sides do
        // not pair up with each other.
        for a in left.arcs(key.left) {
            if plan.left_reads(&a.symbols) == 0 {
                continue;
            }
            for (b, row) in right_arcs.iter().zip(&right_rows) {
                if plan.right_reads(row) == 0 {
                    continue;
                }
                let moved = self.combine(&key.backlog, Some(a.symbols.to_vec()), Some(row.clone()));
                if let Some((symbols, backlog)) = moved {
                    let target = Key {
                        left: a.target,
                        right: b.target,
                        backlog,
                    };
                    self.emit(&mut emitted, source, target, symbols);
                }
            }
        }

        // One-sided moves: an arc with a gap on some pairing.
        for a in left.arcs(key.left) {
            if plan.left_reads(&a.symbols) == every {
                continue;
            }
            if let Some((symbols, backlog)) = self.combine(&key.backlog, Some(a.symbols.to_vec()), None) {
                let target = Key {
                    left: a.target,
                    right: key.right,
                    backlog,
                };
                self.emit(&mut emitted, source, target, symbols);
            }
        }
        for (b, row) in right_arcs.iter().zip(&right_rows) {
            if plan.right_reads(row) == every {
                continue;
            }
            if let Some((symbols, backlog)) = self.combine(&key.backlog, None, Some(row.clone())) {
                let target = Key {
                    left: key.left,
                    right: b.target,
                    backlog,
                };
                self.emit(&mut emitted, source, target, symbols);
            }
        }
    }

    /// Apply a move to `backlog`. `left` is a left arc's symbols, `right` a
    /// right arc's symbols in output ids; `None` for the side that stays.
    /// Returns the output tuple and the backlog after the move.
    fn combine(
        &mut self,
        backlog: &[Lag],
        mut left: Option<Vec<Symbol>>,
        mut right: Option<Vec<Symbol>>,
    ) -> Option<(Vec<Symbol>, Box<[Lag]>)> {
        let plan = self.plan;
        let mut left_text: Option<String> = None;
        let mut right_text: Option<String> = None;

        // Resolving an identity binds every identity of its arc, which can
        // resolve identities of the other arc in turn; each side binds once.
        let steps = loop {
            let mut steps = Vec::with_capacity(plan.pairings.len());
            let mut rebound = false;
            for (p, lag) in plan.pairings.iter().zip(backlog) {
                let read = |row: &Option<Vec<Symbol>>, index: usize| {
                    row.as_ref()
                        .map(|r| r[index])
                        .filter(|&s| !plan.is_gap(p.left, s))
                };
                let step = advance(lag, read(&left, p.left), read(&right, p.right), plan.max_pending)?;
                if let Some(symbol) = step.left_binding {
                    rebound |= self.bind(&mut left_text, p.left, symbol)?;
                }
                if let Some(symbol) = step.right_binding {
                    rebound |= self.bind(&mut right_text, p.left, symbol)?;
                }
                steps.push(step);
            }
            if !rebound {
                break steps;
            }
            if let (Some(row), Some(text)) = (left.as_mut(), &left_text) {
                for (tape, s) in row.iter_mut().enumerate() {
                    if s.is_identity() {
                        *s = self.builder.tape_mut(tape).symbols.intern(text);
                    }
                }
            }
            if let (Some(row), Some(text)) = (right.as_mut(), &right_text) {
                for (ri, s) in row.iter_mut().enumerate() {
                    if s.is_identity() {
                        let tape = plan.right_placement[ri];
                        *s = self.builder.tape_mut(tape).symbols.intern(text);
                    }
                }
            }
        };

        let mut symbols = vec![Symbol::Epsilon; plan.tape_count];
        if let Some(row) = &left {
            for tape in 0..plan.left_tapes {
                if !plan.left_paired[tape] {
                    symbols[tape] = row[tape];
                }
            }
        }
        if let Some(row) = &right {
            for (ri, &s) in row.iter().enumerate() {
                if !plan.right_paired[ri] {
                    symbols[plan.right_placement[ri]] = s;
                }
            }
        }
        // A paired output tape holds one symbol per arc: the matched symbol
        // or a flag read as epsilon, never both.
        for (p, step) in plan.pairings.iter().zip(&steps) {
            let flag = |row: &Option<Vec<Symbol>>, index: usize| {
                row.as_ref()
                    .map(|r| r[index])
                    .filter(|&s| !s.is_epsilon() && plan.is_gap(p.left, s))
            };
            symbols[p.left] = match (step.output, flag(&left, p.left), flag(&right, p.right)) {
                (output, None, None) => output,
                (Symbol::Epsilon, Some(f), None) | (Symbol::Epsilon, None, Some(f)) => f,
                _ => return None,
            };
        }

        let backlog = steps.into_iter().map(|step| step.lag).collect();
        Some((symbols, backlog))
    }

    /// Record the text an arc's identity was resolved to, on output tape
    /// `tape`. Fails when the same arc already resolved to other text;
    /// otherwise tells whether the binding is new.
    fn bind(&self, slot: &mut Option<String>, tape: usize, symbol: Symbol) -> Option<bool> {
        let text = self.builder.tapes()[tape].symbols.get(symbol)?;
        match slot {
            Some(bound) if bound == text => Some(false),
            Some(_) => None,
            None => {
                *slot = Some(text.to_string());
                Some(true)
            }
        }
    }

    fn emit(
        &mut self,
        emitted: &mut HashSet<(StateId, Box<[Symbol]>)>,
        source: StateId,
        target: Key,
        symbols: Vec<Symbol>,
    ) {
        let target = self.state_for(target);
        let symbols = symbols.into_boxed_slice();
        if emitted.insert((target, symbols.clone())) {
            self.builder.push_arc(source, target, symbols);
        }
    }
}
