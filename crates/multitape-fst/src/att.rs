// Tab-separated text format (AT&T-style rows with one column per tape).
//
//   # tapes:<TAB>in<TAB>out        tape names (optional)
//   # alt:<TAB>out<TAB>surface     alias for a tape
//   0<TAB>1<TAB>a<TAB>@0@          transition: source, target, one symbol per tape
//   1                              final state
//   ---                            end of automaton

use crate::FstError;
use crate::automaton::{Automaton, AutomatonBuilder, StateId};
use crate::symbols::{IDENTITY_TEXT, Symbol};

const TAPES_HEADER: &str = "# tapes:";
const ALIAS_HEADER: &str = "# alt:";

const EPSILON_MARK: &str = "@0@";
const EPSILON_LONG: &str = "@_EPSILON_SYMBOL_@";
const UNKNOWN_MARK: &str = "@_UNKNOWN_SYMBOL_@";
const SPACE_MARK: &str = "@_SPACE_@";
const TAB_MARK: &str = "@_TAB_@";

/// Options for [`write`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttOptions {
    /// Emit the `# tapes:` and `# alt:` lines.
    pub header: bool,
}

impl Default for AttOptions {
    fn default() -> Self {
        Self { header: true }
    }
}

// ----------------------------------------------------------------------------
// Reading
// ----------------------------------------------------------------------------

/// One non-comment line: its 1-based number and its fields.
struct Row<'a> {
    line: usize,
    fields: Vec<&'a str>,
}

fn parse_error(line: usize, message: impl Into<String>) -> FstError {
    FstError::Parse {
        line,
        message: message.into(),
    }
}

/// Parse a state number. States are allocated up to the highest number
/// seen, so numbers beyond the length of the input are refused.
fn parse_state(line: usize, field: &str, limit: usize) -> Result<StateId, FstError> {
    let state: StateId = field
        .trim()
        .parse()
        .map_err(|_| parse_error(line, format!("invalid state number '{field}'")))?;
    if state >= limit {
        return Err(parse_error(line, format!("state number {state} out of range")));
    }
    Ok(state)
}

/// Translate a written field into symbol text for [`SymbolTable::intern`].
///
/// [`SymbolTable::intern`]: crate::symbols::SymbolTable::intern
fn decode_symbol(field: &str) -> String {
    match field {
        "" | EPSILON_MARK | EPSILON_LONG => String::new(),
        IDENTITY_TEXT | UNKNOWN_MARK => IDENTITY_TEXT.to_string(),
        _ => field.replace(SPACE_MARK, " ").replace(TAB_MARK, "\t"),
    }
}

fn encode_symbol(symbol: Symbol, text: &str) -> String {
    match symbol {
        Symbol::Epsilon => EPSILON_MARK.to_string(),
        Symbol::Identity => IDENTITY_TEXT.to_string(),
        Symbol::Concrete(_) => text.replace(' ', SPACE_MARK).replace('\t', TAB_MARK),
    }
}

/// Parse one automaton from text.
///
/// Without a `# tapes:` line the tapes are named `Tape_1`, `Tape_2`, ...
/// and their number is taken from the first transition row. Reading stops
/// at the end of input or at a line made only of `-`.
pub fn parse(text: &str) -> Result<Automaton, FstError> {
    let mut tape_header: Option<(usize, Vec<&str>)> = None;
    let mut alias_lines: Vec<(usize, Vec<&str>)> = Vec::new();
    let mut rows: Vec<Row<'_>> = Vec::new();

    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let raw = raw.strip_suffix('\r').unwrap_or(raw);
        if raw.is_empty() {
            continue;
        }
        if raw.starts_with('#') {
            let mut fields: Vec<&str> = raw.split('\t').collect();
            if fields.last().is_some_and(|f| f.is_empty()) {
                fields.pop();
            }
            match fields[0] {
                TAPES_HEADER => {
                    if tape_header.is_some() {
                        return Err(parse_error(line, "repeated tape header"));
                    }
                    if !rows.is_empty() {
                        return Err(parse_error(line, "tape header after transitions"));
                    }
                    tape_header = Some((line, fields.split_off(1)));
                }
                ALIAS_HEADER => alias_lines.push((line, fields.split_off(1))),
                _ => {}
            }
            continue;
        }
        if raw.chars().all(|c| c == '-') {
            break;
        }
        rows.push(Row {
            line,
            fields: raw.split('\t').collect(),
        });
    }

    let names: Vec<String> = match tape_header {
        Some((line, names)) => {
            if names.is_empty() {
                return Err(parse_error(line, "tape header names no tapes"));
            }
            names.into_iter().map(str::to_string).collect()
        }
        None => {
            let first = rows
                .iter()
                .find(|r| r.fields.len() > 1)
                .ok_or_else(|| parse_error(1, "cannot infer tape count without a transition row"))?;
            if first.fields.len() < 3 {
                return Err(parse_error(first.line, "transition row needs at least one tape"));
            }
            (1..=first.fields.len() - 2).map(|i| format!("Tape_{i}")).collect()
        }
    };

    let mut builder = AutomatonBuilder::new(names).map_err(|e| parse_error(1, e.to_string()))?;
    let tape_count = builder.tape_count();
    let limit = text.len();

    for (line, fields) in alias_lines {
        let &[canonical, alias] = &fields[..] else {
            return Err(parse_error(line, "alias line needs a tape name and an alias"));
        };
        let tape = builder
            .tapes()
            .iter()
            .position(|t| t.name == canonical)
            .ok_or_else(|| parse_error(line, format!("alias for unknown tape '{canonical}'")))?;
        builder
            .add_alias(alias, tape)
            .map_err(|e| parse_error(line, e.to_string()))?;
    }

    for row in &rows {
        let line = row.line;
        match row.fields.len() {
            1 => {
                let state = parse_state(line, row.fields[0], limit)?;
                builder.ensure_states(state + 1);
                builder.mark_final(state);
            }
            n if n == tape_count + 2 => {
                let source = parse_state(line, row.fields[0], limit)?;
                let target = parse_state(line, row.fields[1], limit)?;
                builder.ensure_states(source.max(target) + 1);
                let texts: Vec<String> = row.fields[2..].iter().map(|f| decode_symbol(f)).collect();
                let texts: Vec<&str> = texts.iter().map(String::as_str).collect();
                builder
                    .add_arc_text(source, target, &texts)
                    .map_err(|e| parse_error(line, e.to_string()))?;
            }
            n => {
                return Err(parse_error(
                    line,
                    format!("expected 1 or {} fields, found {n}", tape_count + 2),
                ));
            }
        }
    }

    Ok(builder.build())
}

// ----------------------------------------------------------------------------
// Writing
// ----------------------------------------------------------------------------

/// Render `automaton` as text: header lines, one row per arc in state
/// order, then one row per final state.
pub fn write(automaton: &Automaton, options: &AttOptions) -> Result<String, FstError> {
    let mut out = String::new();

    if options.header {
        out.push_str(TAPES_HEADER);
        for name in automaton.tape_names() {
            out.push('\t');
            out.push_str(name);
        }
        out.push('\n');
        for (alias, tape) in automaton.aliases() {
            let canonical = &automaton.tapes()[*tape].name;
            out.push_str(&format!("{ALIAS_HEADER}\t{canonical}\t{alias}\n"));
        }
    }

    for arc in automaton.all_arcs() {
        out.push_str(&format!("{}\t{}", arc.source, arc.target));
        for (tape, &symbol) in arc.symbols.iter().enumerate() {
            let text = automaton.lookup(tape, symbol)?;
            out.push('\t');
            out.push_str(&encode_symbol(symbol, text));
        }
        out.push('\n');
    }
    for state in automaton.final_states() {
        out.push_str(&format!("{state}\n"));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(text: &str) -> Vec<&str> {
        let mut rows: Vec<&str> = text.lines().filter(|l| !l.starts_with('#')).collect();
        rows.sort();
        rows
    }

    #[test]
    fn parses_header_rows_and_finals() {
        let a = parse("# tapes:\tin\tout\n0\t1\ta\tx\n1\t2\tb\t@0@\n2\n").unwrap();
        assert_eq!(a.tape_names().collect::<Vec<_>>(), ["in", "out"]);
        assert_eq!(a.num_states(), 3);
        assert_eq!(a.arc_count(), 2);
        assert_eq!(a.final_states().collect::<Vec<_>>(), [2]);
        let arc = &a.arcs(1)[0];
        assert_eq!(a.lookup(0, arc.symbols[0]).unwrap(), "b");
        assert_eq!(arc.symbols[1], Symbol::Epsilon);
    }

    #[test]
    fn infers_tape_names() {
        let a = parse("0\t1\ta\tb\tc\n1\n").unwrap();
        assert_eq!(
            a.tape_names().collect::<Vec<_>>(),
            ["Tape_1", "Tape_2", "Tape_3"]
        );
    }

    #[test]
    fn final_row_before_transitions() {
        let a = parse("3\n0\t3\ta\n").unwrap();
        assert_eq!(a.num_states(), 4);
        assert!(a.is_final(3));
    }

    #[test]
    fn decodes_escapes() {
        let a = parse(
            "# tapes:\tt\n0\t1\t@_EPSILON_SYMBOL_@\n0\t1\t\n0\t1\t@_UNKNOWN_SYMBOL_@\n\
             0\t1\t@_IDENTITY_SYMBOL_@\n0\t1\ta@_SPACE_@b\n0\t1\t@_TAB_@\n1\n",
        )
        .unwrap();
        let symbols: Vec<Symbol> = a.arcs(0).iter().map(|arc| arc.symbols[0]).collect();
        assert_eq!(symbols[0], Symbol::Epsilon);
        assert_eq!(symbols[1], Symbol::Epsilon);
        assert_eq!(symbols[2], Symbol::Identity);
        assert_eq!(symbols[3], Symbol::Identity);
        assert_eq!(a.lookup(0, symbols[4]).unwrap(), "a b");
        assert_eq!(a.lookup(0, symbols[5]).unwrap(), "\t");
    }

    #[test]
    fn separator_ends_input() {
        let a = parse("0\t1\ta\n1\n---\n0\t1\tb\tc\n").unwrap();
        assert_eq!(a.arc_count(), 1);
        assert_eq!(a.tape_count(), 1);
    }

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        let a = parse("# a comment\n\n0\t1\ta\r\n\n1\n").unwrap();
        assert_eq!(a.arc_count(), 1);
        assert!(a.is_final(1));
    }

    #[test]
    fn aliases() {
        let a = parse("# tapes:\tin\tout\n# alt:\tout\tsurface\n0\t0\ta\tb\n0\n").unwrap();
        assert_eq!(a.tape_index("surface"), Some(1));
        assert!(matches!(
            parse("# tapes:\tin\n# alt:\tnope\tx\n0\n"),
            Err(FstError::Parse { line: 2, .. })
        ));
    }

    #[test]
    fn malformed_input() {
        // wrong field count
        assert!(matches!(
            parse("0\t1\ta\n0\t1\n"),
            Err(FstError::Parse { line: 2, .. })
        ));
        // bad state number
        assert!(matches!(
            parse("0\tq\ta\n"),
            Err(FstError::Parse { line: 1, .. })
        ));
        // header disagrees with rows
        assert!(matches!(
            parse("# tapes:\tin\tout\n0\t1\ta\n"),
            Err(FstError::Parse { line: 2, .. })
        ));
        // nothing to infer from
        assert!(matches!(parse("1\n"), Err(FstError::Parse { .. })));
        assert!(parse("").unwrap_err().is_parse());
        // duplicate tape names
        assert!(matches!(
            parse("# tapes:\tx\tx\n"),
            Err(FstError::Parse { .. })
        ));
    }

    #[test]
    fn out_of_range_state_numbers() {
        assert!(matches!(
            parse("# tapes:\tt\n18446744073709551615\n"),
            Err(FstError::Parse { line: 2, .. })
        ));
        assert!(matches!(
            parse("0\t4000000000\ta\n"),
            Err(FstError::Parse { line: 1, .. })
        ));
        assert!(matches!(
            parse("0\t1\ta\n99999\n"),
            Err(FstError::Parse { line: 2, .. })
        ));
        // gaps in the numbering are still fine
        let a = parse("0\t5\ta\n5\n").unwrap();
        assert_eq!(a.num_states(), 6);
    }

    #[test]
    fn header_only_gives_single_state() {
        let a = parse("# tapes:\tin\tout\n").unwrap();
        assert_eq!(a.num_states(), 1);
        assert_eq!(a.arc_count(), 0);
    }

    #[test]
    fn writes_rows() {
        let mut b = AutomatonBuilder::new(["in", "out"]).unwrap();
        b.add_alias("surface", 1).unwrap();
        b.ensure_states(2);
        b.add_arc_text(0, 1, &["a b", ""]).unwrap();
        b.add_arc_text(1, 1, &[IDENTITY_TEXT, "x"]).unwrap();
        b.set_final(1, true).unwrap();
        let a = b.build();

        let text = write(&a, &AttOptions::default()).unwrap();
        assert_eq!(
            text,
            "# tapes:\tin\tout\n# alt:\tout\tsurface\n\
             0\t1\ta@_SPACE_@b\t@0@\n1\t1\t@_IDENTITY_SYMBOL_@\tx\n1\n"
        );
        let bare = write(&a, &AttOptions { header: false }).unwrap();
        assert!(!bare.contains('#'));
    }

    #[test]
    fn text_round_trip() {
        let text = "# tapes:\tlex\tsurf\n# alt:\tsurf\tout\n\
                    0\t1\tk\tk\n1\t2\ta\t\u{00e4}\n2\t2\t@_IDENTITY_SYMBOL_@\t@_IDENTITY_SYMBOL_@\n\
                    0\t3\t<n>\t@0@\n2\n3\n";
        let a = parse(text).unwrap();
        let written = write(&a, &AttOptions::default()).unwrap();
        assert_eq!(rows(&written), rows(text));
        let again = parse(&written).unwrap();
        assert_eq!(write(&again, &AttOptions::default()).unwrap(), written);
    }
}
