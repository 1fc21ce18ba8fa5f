// multitape-cli: shared utilities for CLI tools.

use std::io::{self, Read, Write};
use std::path::Path;
use std::process;

use anyhow::{Context, Result};
use multitape_fst::{Automaton, att, binary};

/// The file named by a path argument. `None` and `-` both mean the
/// standard stream.
fn file_path(path: Option<&Path>) -> Option<&Path> {
    path.filter(|p| *p != Path::new("-"))
}

/// Human-readable name of an input or output, for error messages.
pub fn display_name(path: Option<&Path>) -> String {
    match file_path(path) {
        Some(p) => p.display().to_string(),
        None => "<stdio>".to_string(),
    }
}

/// Read all bytes from a file, or from stdin.
pub fn read_input(path: Option<&Path>) -> Result<Vec<u8>> {
    match file_path(path) {
        Some(p) => std::fs::read(p).with_context(|| format!("failed to read {}", p.display())),
        None => {
            let mut data = Vec::new();
            io::stdin()
                .lock()
                .read_to_end(&mut data)
                .context("failed to read standard input")?;
            Ok(data)
        }
    }
}

/// Write `data` to a file, or to stdout. The caller renders the whole
/// output first, so a failed command never leaves a partial file behind.
pub fn write_output(path: Option<&Path>, data: &[u8]) -> Result<()> {
    match file_path(path) {
        Some(p) => std::fs::write(p, data).with_context(|| format!("failed to write {}", p.display())),
        None => {
            let mut out = io::stdout().lock();
            out.write_all(data).context("failed to write standard output")?;
            out.flush().context("failed to write standard output")
        }
    }
}

/// Load a binary automaton.
pub fn read_automaton(path: Option<&Path>) -> Result<Automaton> {
    let data = read_input(path)?;
    binary::from_bytes(&data)
        .with_context(|| format!("malformed automaton in {}", display_name(path)))
}

/// Load an automaton in text form.
pub fn read_text_automaton(path: Option<&Path>) -> Result<Automaton> {
    let data = read_input(path)?;
    let text = String::from_utf8(data)
        .with_context(|| format!("{} is not valid UTF-8", display_name(path)))?;
    att::parse(&text).with_context(|| format!("malformed text in {}", display_name(path)))
}

/// Encode and store a binary automaton.
pub fn write_automaton(path: Option<&Path>, automaton: &Automaton) -> Result<()> {
    let bytes = binary::to_bytes(automaton).context("cannot encode automaton")?;
    write_output(path, &bytes)
}

/// Print an error message and exit with code 1.
pub fn fatal(msg: &str) -> ! {
    eprintln!("error: {msg}");
    process::exit(1);
}

/// Finish `main`: report an error chain through [`fatal`].
pub fn exit_on_error(result: Result<()>) {
    if let Err(e) = result {
        fatal(&format!("{e:#}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dash_means_stdio() {
        assert_eq!(file_path(None), None);
        assert_eq!(file_path(Some(Path::new("-"))), None);
        assert_eq!(
            file_path(Some(Path::new("lexicon.fst"))),
            Some(Path::new("lexicon.fst"))
        );
        assert_eq!(display_name(Some(Path::new("-"))), "<stdio>");
        assert_eq!(display_name(Some(Path::new("a.fst"))), "a.fst");
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.fst");
        let a = att::parse("# tapes:\tin\tout\n0\t1\ta\tb\n1\n").unwrap();
        write_automaton(Some(&path), &a).unwrap();
        assert_eq!(read_automaton(Some(&path)).unwrap(), a);
    }

    #[test]
    fn errors_name_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.txt");
        std::fs::write(&path, "0\t1\ta\n0\tx\tb\n").unwrap();
        let err = read_text_automaton(Some(&path)).unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("bad.txt"), "{msg}");
        assert!(msg.contains("line 2"), "{msg}");
    }
}
