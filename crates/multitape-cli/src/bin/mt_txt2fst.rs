// mt-txt2fst: Compile a text automaton into the binary format.
//
// Reads tab-separated rows (see `multitape_fst::att`) and writes the binary
// encoding. Fails with status 1 on malformed text.
//
// Usage:
//   mt-txt2fst [TEXT] [BINARY]
//
// `-` or a missing path means stdin/stdout.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

#[derive(Parser)]
#[command(name = "mt-txt2fst", version, about = "Compile a text automaton into binary form")]
struct Cli {
    /// Text input (default: stdin)
    input: Option<PathBuf>,

    /// Binary output (default: stdout)
    output: Option<PathBuf>,
}

fn run(cli: &Cli) -> Result<()> {
    let automaton = multitape_cli::read_text_automaton(cli.input.as_deref())?;
    multitape_cli::write_automaton(cli.output.as_deref(), &automaton)
}

fn main() {
    let cli = Cli::parse();
    multitape_cli::exit_on_error(run(&cli));
}
