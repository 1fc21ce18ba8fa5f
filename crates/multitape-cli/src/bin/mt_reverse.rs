// mt-reverse: Reverse every path of a binary automaton.
//
// Usage:
//   mt-reverse [BINARY] [BINARY-OUT]

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use multitape_fst::reverse::reverse;

#[derive(Parser)]
#[command(name = "mt-reverse", version, about = "Reverse a binary automaton")]
struct Cli {
    /// Binary input (default: stdin)
    input: Option<PathBuf>,

    /// Binary output (default: stdout)
    output: Option<PathBuf>,
}

fn run(cli: &Cli) -> Result<()> {
    let automaton = multitape_cli::read_automaton(cli.input.as_deref())?;
    multitape_cli::write_automaton(cli.output.as_deref(), &reverse(&automaton))
}

fn main() {
    let cli = Cli::parse();
    multitape_cli::exit_on_error(run(&cli));
}
