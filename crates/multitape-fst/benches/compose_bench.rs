// Criterion benchmarks for multitape-fst.
//
// The automata are generated: a two-tape lexicon of synthetic words, an
// identity transducer and a one-symbol rewrite rule. No input files needed.
//
// Run:
//   cargo bench -p multitape-fst

use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use multitape_fst::symbols::IDENTITY_TEXT;
use multitape_fst::{Automaton, AutomatonBuilder, binary, compose};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

const ALPHABET: &[&str] = &["a", "e", "i", "k", "l", "n", "o", "s", "t", "u"];

/// Deterministic word list: `count` words of 3..=8 letters.
fn words(count: usize) -> Vec<Vec<&'static str>> {
    let mut seed: u64 = 0x2545_F491_4F6C_DD1D;
    (0..count)
        .map(|_| {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            let len = 3 + (seed % 6) as usize;
            (0..len)
                .map(|i| ALPHABET[((seed >> (i * 4)) % ALPHABET.len() as u64) as usize])
                .collect()
        })
        .collect()
}

/// Tapes `lex`, `surf`: each word as its own path, `a` surfacing as `ä`.
fn lexicon(count: usize) -> Automaton {
    let mut b = AutomatonBuilder::new(["lex", "surf"]).unwrap();
    let accept = b.add_state();
    b.set_final(accept, true).unwrap();
    for word in words(count) {
        let mut state = 0;
        for (i, &letter) in word.iter().enumerate() {
            let next = if i + 1 == word.len() { accept } else { b.add_state() };
            let surface = if letter == "a" { "\u{00e4}" } else { letter };
            b.add_arc_text(state, next, &[letter, surface]).unwrap();
            state = next;
        }
    }
    b.build()
}

/// Tapes `in`, `out`: copies any symbol.
fn identity() -> Automaton {
    let mut b = AutomatonBuilder::new(["in", "out"]).unwrap();
    b.add_arc_text(0, 0, &[IDENTITY_TEXT, IDENTITY_TEXT]).unwrap();
    b.set_final(0, true).unwrap();
    b.build()
}

/// Tapes `in`, `out`: rewrites `k` to `g`, copies everything else.
fn rewrite_rule() -> Automaton {
    let mut b = AutomatonBuilder::new(["in", "out"]).unwrap();
    for letter in ALPHABET.iter().copied().chain(["\u{00e4}"]) {
        let out = if letter == "k" { "g" } else { letter };
        b.add_arc_text(0, 0, &[letter, out]).unwrap();
    }
    b.set_final(0, true).unwrap();
    b.build()
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_compose_identity(c: &mut Criterion) {
    let lex = lexicon(2000);
    let id = identity();
    c.bench_function("compose_identity_2000", |b| {
        b.iter(|| compose(black_box(&lex), black_box(&id), &[("surf", "in")]).unwrap())
    });
}

fn bench_compose_rule(c: &mut Criterion) {
    let lex = lexicon(2000);
    let rule = rewrite_rule();
    c.bench_function("compose_rule_2000", |b| {
        b.iter(|| compose(black_box(&lex), black_box(&rule), &[("surf", "in")]).unwrap())
    });
}

fn bench_compose_two_pairings(c: &mut Criterion) {
    let lex = lexicon(2000);
    let other = lexicon(1000);
    c.bench_function("compose_self_join_2000x1000", |b| {
        b.iter(|| {
            compose(
                black_box(&lex),
                black_box(&other),
                &[("lex", "lex"), ("surf", "surf")],
            )
            .unwrap()
        })
    });
}

fn bench_binary_round_trip(c: &mut Criterion) {
    let lex = lexicon(2000);
    c.bench_function("binary_round_trip_2000", |b| {
        b.iter(|| {
            let bytes = binary::to_bytes(black_box(&lex)).unwrap();
            binary::from_bytes(&bytes).unwrap()
        })
    });
}

criterion_group!(
    benches,
    bench_compose_identity,
    bench_compose_rule,
    bench_compose_two_pairings,
    bench_binary_round_trip
);
criterion_main!(benches);
