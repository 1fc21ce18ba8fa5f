// Binary serialization of whole automata.
//
// Layout after the 16-byte header (all integers u32 little-endian, strings
// UTF-8 and null-terminated):
//
//   tape count, tape names
//   alias count, (alias, tape index)*
//   per tape: concrete symbol count, symbol strings in id order
//   state count, start state, final count, final states
//   arc count
//   padding to an 8-byte boundary
//   arc table: (source, target, sym_1 .. sym_N)* as raw symbol ids

use crate::FstError;
use crate::automaton::{Automaton, AutomatonBuilder, Tape};
use crate::format::{self, HEADER_SIZE};
use crate::symbols::Symbol;

const WORD: usize = size_of::<u32>();
const ARC_ALIGN: usize = 8;

// ----------------------------------------------------------------------------
// Reading
// ----------------------------------------------------------------------------

/// Bounds-checked cursor over the input bytes.
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8], pos: usize) -> Self {
        Self { data, pos }
    }

    fn too_short(&self, wanted: usize) -> FstError {
        FstError::TooShort {
            expected: self.pos.saturating_add(wanted),
            actual: self.data.len(),
        }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], FstError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or_else(|| self.too_short(len))?;
        let data = self.data;
        let bytes = &data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    fn u32(&mut self) -> Result<u32, FstError> {
        let b = self.take(WORD)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn count(&mut self) -> Result<usize, FstError> {
        Ok(self.u32()? as usize)
    }

    /// A null-terminated UTF-8 string.
    fn string(&mut self) -> Result<&'a str, FstError> {
        let data = self.data;
        let rest = &data[self.pos..];
        let len = rest.iter().position(|&b| b == 0).ok_or_else(|| {
            FstError::InvalidSymbolTable("unterminated string".to_string())
        })?;
        let text = std::str::from_utf8(&rest[..len])
            .map_err(|_| FstError::InvalidSymbolTable(format!("invalid UTF-8 at byte {}", self.pos)))?;
        self.pos += len + 1;
        Ok(text)
    }

    fn align(&mut self, to: usize) -> Result<(), FstError> {
        let partial = self.pos % to;
        if partial > 0 {
            self.take(to - partial)?;
        }
        Ok(())
    }
}

/// Decode an automaton from its binary form.
pub fn from_bytes(data: &[u8]) -> Result<Automaton, FstError> {
    format::parse_header(data)?;
    let mut r = Reader::new(data, HEADER_SIZE);

    let tape_count = r.count()?;
    let mut tapes = Vec::new();
    for _ in 0..tape_count {
        tapes.push(Tape::new(r.string()?));
    }

    let alias_count = r.count()?;
    let mut aliases = Vec::new();
    for _ in 0..alias_count {
        let alias = r.string()?;
        aliases.push((alias, r.count()?));
    }

    for tape in &mut tapes {
        let symbol_count = r.count()?;
        for _ in 0..symbol_count {
            let text = r.string()?;
            if tape.symbols.find(text).is_some() {
                return Err(FstError::InvalidSymbolTable(format!(
                    "reserved or repeated symbol {text:?} on tape '{}'",
                    tape.name
                )));
            }
            tape.symbols.intern(text);
        }
    }

    let mut builder = AutomatonBuilder::from_tapes(tapes)?;
    for (alias, tape) in aliases {
        builder.add_alias(alias, tape)?;
    }

    let state_count = r.count()?;
    if state_count == 0 {
        return Err(FstError::InvalidState { state: 0, count: 0 });
    }
    // States are allocated up front; a count the input cannot back up is
    // refused before anything is reserved.
    if state_count > data.len() {
        return Err(FstError::TooShort {
            expected: state_count,
            actual: data.len(),
        });
    }
    let start = r.count()?;
    let final_count = r.count()?;
    let mut finals = Vec::new();
    for _ in 0..final_count {
        finals.push(r.count()?);
    }
    let arc_count = r.count()?;
    r.align(ARC_ALIGN)?;

    let width = 2 + builder.tape_count();
    let words = arc_count
        .checked_mul(width)
        .ok_or_else(|| r.too_short(usize::MAX))?;
    let bytes = r.take(words.checked_mul(WORD).ok_or_else(|| r.too_short(usize::MAX))?)?;

    // Copy into an aligned buffer; the input slice may sit at any address.
    let mut table = vec![0u32; words];
    bytemuck::cast_slice_mut::<u32, u8>(&mut table).copy_from_slice(bytes);

    builder.ensure_states(state_count);
    builder.set_start(start)?;
    for state in finals {
        builder.set_final(state, true)?;
    }
    for row in table.chunks_exact(width) {
        let source = u32::from_le(row[0]) as usize;
        let target = u32::from_le(row[1]) as usize;
        let symbols: Vec<Symbol> = row[2..]
            .iter()
            .map(|&raw| Symbol::from_raw(u32::from_le(raw)))
            .collect();
        builder.add_arc(source, target, symbols)?;
    }

    Ok(builder.build())
}

// ----------------------------------------------------------------------------
// Writing
// ----------------------------------------------------------------------------

fn put_u32(out: &mut Vec<u8>, value: usize) -> Result<(), FstError> {
    let value = u32::try_from(value)
        .map_err(|_| FstError::InvalidSymbolTable(format!("count {value} does not fit in 32 bits")))?;
    out.extend_from_slice(&value.to_le_bytes());
    Ok(())
}

fn put_string(out: &mut Vec<u8>, text: &str) -> Result<(), FstError> {
    if text.contains('\0') {
        return Err(FstError::InvalidSymbolTable(format!(
            "string {text:?} contains a NUL byte"
        )));
    }
    out.extend_from_slice(text.as_bytes());
    out.push(0);
    Ok(())
}

/// Encode an automaton. Fails with [`FstError::InvalidSymbolTable`] if a
/// tape name, alias or symbol contains a NUL byte.
pub fn to_bytes(automaton: &Automaton) -> Result<Vec<u8>, FstError> {
    let mut out = Vec::new();
    format::write_header(&mut out);

    put_u32(&mut out, automaton.tape_count())?;
    for name in automaton.tape_names() {
        put_string(&mut out, name)?;
    }

    put_u32(&mut out, automaton.aliases().len())?;
    for (alias, tape) in automaton.aliases() {
        put_string(&mut out, alias)?;
        put_u32(&mut out, *tape)?;
    }

    for tape in automaton.tapes() {
        let concrete: Vec<&str> = tape.symbols.concrete().map(|(_, text)| text).collect();
        put_u32(&mut out, concrete.len())?;
        for text in concrete {
            put_string(&mut out, text)?;
        }
    }

    put_u32(&mut out, automaton.num_states())?;
    put_u32(&mut out, automaton.start())?;
    let finals: Vec<usize> = automaton.final_states().collect();
    put_u32(&mut out, finals.len())?;
    for state in finals {
        put_u32(&mut out, state)?;
    }
    put_u32(&mut out, automaton.arc_count())?;
    while out.len() % ARC_ALIGN != 0 {
        out.push(0);
    }

    let mut table: Vec<u32> = Vec::with_capacity(automaton.arc_count() * (2 + automaton.tape_count()));
    for arc in automaton.all_arcs() {
        table.push((arc.source as u32).to_le());
        table.push((arc.target as u32).to_le());
        table.extend(arc.symbols.iter().map(|s| s.raw().to_le()));
    }
    out.extend_from_slice(bytemuck::cast_slice::<u32, u8>(&table));
    Ok(out)
}
