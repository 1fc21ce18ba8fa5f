// Symbol table: per-tape string interning with reserved epsilon and identity ids.

use hashbrown::HashMap;

/// Raw id of the epsilon symbol.
pub const EPSILON_ID: u32 = 0;

/// Raw id of the identity (unknown) symbol.
pub const IDENTITY_ID: u32 = 1;

/// First raw id handed out to user symbols.
pub const FIRST_CONCRETE_ID: u32 = 2;

/// Textual form of the identity symbol, as stored in a table.
pub const IDENTITY_TEXT: &str = "@_IDENTITY_SYMBOL_@";

/// A symbol on one tape of an arc.
///
/// Epsilon consumes nothing on its tape. Identity matches any concrete
/// symbol on a paired tape and reproduces it. Concrete ids are always
/// `>= FIRST_CONCRETE_ID` and only meaningful relative to the table of the
/// tape they appear on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Symbol {
    Epsilon,
    Identity,
    Concrete(u32),
}

impl Symbol {
    /// Decode a raw id.
    #[inline]
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            EPSILON_ID => Symbol::Epsilon,
            IDENTITY_ID => Symbol::Identity,
            id => Symbol::Concrete(id),
        }
    }

    /// Encode as a raw id (the index into the owning table).
    #[inline]
    pub fn raw(self) -> u32 {
        match self {
            Symbol::Epsilon => EPSILON_ID,
            Symbol::Identity => IDENTITY_ID,
            Symbol::Concrete(id) => id,
        }
    }

    #[inline]
    pub fn is_epsilon(self) -> bool {
        self == Symbol::Epsilon
    }

    #[inline]
    pub fn is_identity(self) -> bool {
        self == Symbol::Identity
    }
}

/// Bidirectional string/id mapping for one tape.
///
/// Ids are dense. Index 0 is epsilon (empty string) and index 1 is identity;
/// both exist before any user symbol is interned and can never be handed
/// out for other text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolTable {
    strings: Vec<String>,
    ids: HashMap<String, u32>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            strings: vec![String::new(), IDENTITY_TEXT.to_string()],
            ids: HashMap::new(),
        }
    }

    /// Intern `text`, returning its symbol. Idempotent.
    ///
    /// The empty string is epsilon and [`IDENTITY_TEXT`] is identity.
    pub fn intern(&mut self, text: &str) -> Symbol {
        if text.is_empty() {
            return Symbol::Epsilon;
        }
        if text == IDENTITY_TEXT {
            return Symbol::Identity;
        }
        if let Some(&id) = self.ids.get(text) {
            return Symbol::Concrete(id);
        }
        let id = self.strings.len() as u32;
        self.strings.push(text.to_string());
        self.ids.insert(text.to_string(), id);
        Symbol::Concrete(id)
    }

    /// Look up an already interned text without adding it.
    pub fn find(&self, text: &str) -> Option<Symbol> {
        if text.is_empty() {
            Some(Symbol::Epsilon)
        } else if text == IDENTITY_TEXT {
            Some(Symbol::Identity)
        } else {
            self.ids.get(text).map(|&id| Symbol::Concrete(id))
        }
    }

    /// Text of a symbol, or `None` if the id was never assigned here.
    pub fn get(&self, symbol: Symbol) -> Option<&str> {
        self.strings.get(symbol.raw() as usize).map(String::as_str)
    }

    /// Validate a raw id against this table.
    pub fn symbol(&self, raw: u32) -> Option<Symbol> {
        ((raw as usize) < self.strings.len()).then(|| Symbol::from_raw(raw))
    }

    #[inline]
    pub fn contains(&self, symbol: Symbol) -> bool {
        (symbol.raw() as usize) < self.strings.len()
    }

    /// Number of ids in use, reserved ones included.
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// True when no user symbol has been interned.
    pub fn is_empty(&self) -> bool {
        self.strings.len() == FIRST_CONCRETE_ID as usize
    }

    /// User symbols in id order.
    pub fn concrete(&self) -> impl Iterator<Item = (Symbol, &str)> {
        self.strings
            .iter()
            .enumerate()
            .skip(FIRST_CONCRETE_ID as usize)
            .map(|(id, s)| (Symbol::Concrete(id as u32), s.as_str()))
    }

    /// Intern every user symbol of `other` and return a raw-id remapping
    /// from `other`'s ids to ids in `self`. Reserved ids map to themselves.
    pub fn merge(&mut self, other: &SymbolTable) -> Vec<Symbol> {
        let mut update = vec![Symbol::Epsilon, Symbol::Identity];
        for (_, text) in other.concrete() {
            update.push(self.intern(text));
        }
        update
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_ids_exist_before_interning() {
        let table = SymbolTable::new();
        assert_eq!(table.len(), 2);
        assert!(table.is_empty());
        assert_eq!(table.get(Symbol::Epsilon), Some(""));
        assert_eq!(table.get(Symbol::Identity), Some(IDENTITY_TEXT));
    }

    #[test]
    fn intern_is_idempotent() {
        let mut table = SymbolTable::new();
        let a = table.intern("a");
        let b = table.intern("b");
        assert_eq!(a, Symbol::Concrete(2));
        assert_eq!(b, Symbol::Concrete(3));
        assert_eq!(table.intern("a"), a);
        assert_eq!(table.len(), 4);
    }

    #[test]
    fn reserved_texts_never_become_concrete() {
        let mut table = SymbolTable::new();
        assert_eq!(table.intern(""), Symbol::Epsilon);
        assert_eq!(table.intern(IDENTITY_TEXT), Symbol::Identity);
        assert!(table.is_empty());
    }

    #[test]
    fn multi_character_symbols() {
        let mut table = SymbolTable::new();
        let tag = table.intern("<n>");
        let umlaut = table.intern("\u{00e4}");
        assert_eq!(table.get(tag), Some("<n>"));
        assert_eq!(table.get(umlaut), Some("\u{00e4}"));
        assert_eq!(table.find("<n>"), Some(tag));
        assert_eq!(table.find("<v>"), None);
    }

    #[test]
    fn unknown_ids_are_rejected() {
        let mut table = SymbolTable::new();
        table.intern("x");
        assert_eq!(table.symbol(2), Some(Symbol::Concrete(2)));
        assert_eq!(table.symbol(3), None);
        assert_eq!(table.get(Symbol::Concrete(7)), None);
        assert!(!table.contains(Symbol::Concrete(7)));
    }

    #[test]
    fn raw_round_trip() {
        for raw in [0, 1, 2, 40] {
            assert_eq!(Symbol::from_raw(raw).raw(), raw);
        }
        assert!(Symbol::from_raw(0).is_epsilon());
        assert!(Symbol::from_raw(1).is_identity());
    }

    #[test]
    fn merge_builds_remapping() {
        let mut left = SymbolTable::new();
        left.intern("a");
        left.intern("b");
        let mut right = SymbolTable::new();
        right.intern("b");
        right.intern("c");

        let update = left.merge(&right);
        assert_eq!(update.len(), right.len());
        assert_eq!(update[0], Symbol::Epsilon);
        assert_eq!(update[1], Symbol::Identity);
        assert_eq!(left.get(update[2]), Some("b"));
        assert_eq!(update[2], Symbol::Concrete(3));
        assert_eq!(left.get(update[3]), Some("c"));
        assert_eq!(left.len(), 5);
    }
}
