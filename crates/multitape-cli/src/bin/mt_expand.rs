// mt-expand: List the accepted strings of a binary automaton.
//
// Prints one line per accepting path: the text of each tape, joined by the
// separator. Fails with status 1 if the automaton accepts infinitely many
// paths and no cycle bound is given.
//
// Usage:
//   mt-expand [-c N] [-f] [-s SEP] [BINARY] [OUTPUT]
//
// Options:
//   -c, --cycles N        Unroll each cycle at most N times
//   -f, --flags           Enforce flag diacritics and hide them
//   -s, --separator SEP   Text between tapes (default ":")

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use multitape_fst::config::ExpandConfig;
use multitape_fst::expand::expand;

#[derive(Parser)]
#[command(name = "mt-expand", version, about = "List accepted strings of an automaton")]
struct Cli {
    /// Unroll each cycle at most N times instead of rejecting cyclic input
    #[arg(short = 'c', long = "cycles", value_name = "N")]
    cycles: Option<usize>,

    /// Enforce flag diacritics and leave them out of the output
    #[arg(short = 'f', long = "flags")]
    check_flags: bool,

    /// Separator between tapes
    #[arg(short = 's', long, default_value = ":")]
    separator: String,

    /// Binary input (default: stdin)
    input: Option<PathBuf>,

    /// Text output (default: stdout)
    output: Option<PathBuf>,
}

fn run(cli: &Cli) -> Result<()> {
    let automaton = multitape_cli::read_automaton(cli.input.as_deref())?;
    let config = ExpandConfig {
        max_cycles: cli.cycles,
        check_flags: cli.check_flags,
    };
    let paths = expand(&automaton, &config).with_context(|| {
        format!(
            "cannot expand {}",
            multitape_cli::display_name(cli.input.as_deref())
        )
    })?;

    let mut text = String::new();
    for path in &paths {
        text.push_str(&path.join(&cli.separator));
        text.push('\n');
    }
    multitape_cli::write_output(cli.output.as_deref(), text.as_bytes())
}

fn main() {
    let cli = Cli::parse();
    multitape_cli::exit_on_error(run(&cli));
}
