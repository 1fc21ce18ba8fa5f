// mt-compose: Compose two binary automata on one or more tape pairs.
//
// Every `-g LEFT RIGHT` pairs a tape of the first automaton with a tape of
// the second; all pairs must match at once. The result keeps all tapes of
// the first automaton followed by the unpaired tapes of the second.
//
// Usage:
//   mt-compose -g LEFT RIGHT [-g LEFT RIGHT ...] [--keep-dead-ends]
//              [--flags-as-symbols] [--max-pending N]
//              [--project TAPE,...] [-v] BINARY-A BINARY-B [BINARY-OUT]
//
// Options:
//   -g, --pair LEFT RIGHT   Tape of A read in lock-step with a tape of B
//   --keep-dead-ends        Keep states that cannot reach a final state
//   --flags-as-symbols      Match flag diacritics like ordinary symbols
//   --max-pending N         Symbols one side may run ahead on a pair
//   --project TAPE,...      Keep only these tapes of the result, in order
//   -v, --verbose           Print state and arc counts to stderr

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use multitape_fst::project::project;
use multitape_fst::compose::DEFAULT_MAX_PENDING;
use multitape_fst::{Automaton, ComposeOptions, compose_with};

#[derive(Parser)]
#[command(name = "mt-compose", version, about = "Compose two multi-tape automata")]
struct Cli {
    /// Tape pairing: a tape of A and a tape of B
    #[arg(
        short = 'g',
        long = "pair",
        num_args = 2,
        value_names = ["LEFT", "RIGHT"],
        action = ArgAction::Append,
        required = true
    )]
    pairs: Vec<String>,

    /// Keep states that cannot reach a final state
    #[arg(long)]
    keep_dead_ends: bool,

    /// Match flag diacritics on paired tapes instead of skipping them
    #[arg(long)]
    flags_as_symbols: bool,

    /// How many symbols one side may read ahead of the other on a pair
    #[arg(long, value_name = "N", default_value_t = DEFAULT_MAX_PENDING)]
    max_pending: usize,

    /// Restrict the result to these tapes
    #[arg(long, value_name = "TAPE", value_delimiter = ',')]
    project: Vec<String>,

    /// Print state and arc counts to stderr
    #[arg(short, long)]
    verbose: bool,

    /// First (left) automaton
    left: PathBuf,

    /// Second (right) automaton
    right: PathBuf,

    /// Binary output (default: stdout)
    output: Option<PathBuf>,
}

fn describe(label: &str, automaton: &Automaton) {
    eprintln!(
        "{label}: {} tapes [{}], {} states, {} arcs",
        automaton.tape_count(),
        automaton.tape_names().collect::<Vec<_>>().join(", "),
        automaton.num_states(),
        automaton.arc_count()
    );
}

fn run(cli: &Cli) -> Result<()> {
    let left = multitape_cli::read_automaton(Some(cli.left.as_path()))?;
    let right = multitape_cli::read_automaton(Some(cli.right.as_path()))?;
    let pairings: Vec<(&str, &str)> = cli
        .pairs
        .chunks_exact(2)
        .map(|pair| (pair[0].as_str(), pair[1].as_str()))
        .collect();

    if cli.verbose {
        describe("left", &left);
        describe("right", &right);
    }

    let options = ComposeOptions {
        prune_dead_ends: !cli.keep_dead_ends,
        flags_as_epsilon: !cli.flags_as_symbols,
        max_pending: cli.max_pending,
    };
    let mut result = compose_with(&left, &right, &pairings, &options).with_context(|| {
        format!(
            "cannot compose {} with {}",
            cli.left.display(),
            cli.right.display()
        )
    })?;
    if !cli.project.is_empty() {
        result = project(&result, &cli.project).context("cannot project result")?;
    }

    if cli.verbose {
        describe("result", &result);
    }
    multitape_cli::write_automaton(cli.output.as_deref(), &result)
}

fn main() {
    let cli = Cli::parse();
    multitape_cli::exit_on_error(run(&cli));
}
