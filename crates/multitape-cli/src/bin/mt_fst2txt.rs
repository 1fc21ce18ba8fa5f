// mt-fst2txt: Print a binary automaton as tab-separated text.
//
// Usage:
//   mt-fst2txt [--no-header] [BINARY] [TEXT]
//
// Options:
//   --no-header   Omit the `# tapes:` and `# alt:` lines

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use multitape_fst::att::{self, AttOptions};

#[derive(Parser)]
#[command(name = "mt-fst2txt", version, about = "Print a binary automaton as text")]
struct Cli {
    /// Do not print tape names and aliases
    #[arg(long)]
    no_header: bool,

    /// Binary input (default: stdin)
    input: Option<PathBuf>,

    /// Text output (default: stdout)
    output: Option<PathBuf>,
}

fn run(cli: &Cli) -> Result<()> {
    let automaton = multitape_cli::read_automaton(cli.input.as_deref())?;
    let options = AttOptions {
        header: !cli.no_header,
    };
    let text = att::write(&automaton, &options).context("cannot render automaton")?;
    multitape_cli::write_output(cli.output.as_deref(), text.as_bytes())
}

fn main() {
    let cli = Cli::parse();
    multitape_cli::exit_on_error(run(&cli));
}
