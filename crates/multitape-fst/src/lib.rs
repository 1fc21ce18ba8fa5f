//! Multi-tape finite state transducer engine.
//!
//! An automaton in this crate carries one symbol per named *tape* on every
//! arc, instead of a single input/output pair. The centrepiece is
//! [`compose::compose`], a generalized composition that joins two automata
//! on any number of tape pairs at once.
//!
//! # Architecture
//!
//! - [`symbols`] -- Per-tape symbol tables and the [`Symbol`] variant
//! - [`automaton`] -- Arena-based automaton and its builder
//! - [`compose`] -- Multi-tape composition (lazy product construction)
//! - [`trim`] -- Dead-end pruning and accessible/co-accessible trimming
//! - [`reverse`] -- Automaton reversal
//! - [`project`] -- Dropping tapes
//! - [`att`] -- Tab-separated text format
//! - [`format`] -- Binary header parsing and validation
//! - [`binary`] -- Binary serialization of whole automata
//! - [`config`] -- Path expansion configuration (explicit DFS stack)
//! - [`expand`] -- Enumeration of accepted per-tape strings
//! - [`flags`] -- Flag diacritics

pub mod att;
pub mod automaton;
pub mod binary;
pub mod compose;
pub mod config;
pub mod expand;
pub mod flags;
pub mod format;
pub mod project;
pub mod reverse;
pub mod symbols;
pub mod trim;

pub use automaton::{Arc, Automaton, AutomatonBuilder, State, StateId, Tape};
pub use compose::{ComposeOptions, compose, compose_with};
pub use symbols::{Symbol, SymbolTable};

/// Which operand of an operation a tape name was looked up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    Left,
    Right,
    /// The single operand of a unary operation.
    Input,
}

impl std::fmt::Display for Operand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operand::Left => f.write_str("left"),
            Operand::Right => f.write_str("right"),
            Operand::Input => f.write_str("input"),
        }
    }
}

/// Error type for automaton construction, composition and (de)serialization.
#[derive(Debug, thiserror::Error)]
pub enum FstError {
    // -- validation ---------------------------------------------------------
    #[error("unknown tape '{name}' in {operand} automaton")]
    UnknownTape { name: String, operand: Operand },
    #[error("composition needs at least one tape pairing")]
    EmptyPairing,
    #[error("tape '{name}' of the {operand} automaton appears in more than one pairing")]
    DuplicatePairing { name: String, operand: Operand },
    #[error("duplicate tape name '{0}'")]
    DuplicateTape(String),
    #[error("an automaton needs at least one tape")]
    NoTapes,
    #[error("invalid tape name {0:?}")]
    InvalidTapeName(String),
    #[error("arc has {actual} symbols but the automaton has {expected} tapes")]
    ArityMismatch { expected: usize, actual: usize },
    #[error("state {state} does not exist (automaton has {count} states)")]
    InvalidState { state: usize, count: usize },
    #[error("tape index {index} out of range (automaton has {count} tapes)")]
    UnknownTapeIndex { index: usize, count: usize },
    #[error("automaton has an accepting cycle through state {state}")]
    AcceptingCycle { state: usize },

    // -- parse --------------------------------------------------------------
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("invalid magic number in binary header")]
    InvalidMagic,
    #[error("unsupported binary format version {0}")]
    UnsupportedVersion(u8),
    #[error("data too short: expected at least {expected} bytes, got {actual}")]
    TooShort { expected: usize, actual: usize },
    #[error("invalid symbol table: {0}")]
    InvalidSymbolTable(String),

    // -- internal consistency -----------------------------------------------
    #[error("symbol id {id} is not defined on tape {tape}")]
    UnknownSymbolId { tape: usize, id: u32 },
}

impl FstError {
    /// Errors caused by bad arguments or inconsistent requests.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            FstError::UnknownTape { .. }
                | FstError::EmptyPairing
                | FstError::DuplicatePairing { .. }
                | FstError::DuplicateTape(_)
                | FstError::NoTapes
                | FstError::InvalidTapeName(_)
                | FstError::ArityMismatch { .. }
                | FstError::InvalidState { .. }
                | FstError::UnknownTapeIndex { .. }
                | FstError::AcceptingCycle { .. }
        )
    }

    /// Errors caused by malformed text or binary input.
    pub fn is_parse(&self) -> bool {
        matches!(
            self,
            FstError::Parse { .. }
                | FstError::InvalidMagic
                | FstError::UnsupportedVersion(_)
                | FstError::TooShort { .. }
                | FstError::InvalidSymbolTable(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_classification() {
        assert!(FstError::EmptyPairing.is_validation());
        assert!(!FstError::EmptyPairing.is_parse());
        assert!(FstError::InvalidMagic.is_parse());
        let fault = FstError::UnknownSymbolId { tape: 0, id: 9 };
        assert!(!fault.is_parse() && !fault.is_validation());
    }

    #[test]
    fn unknown_tape_message_names_operand() {
        let err = FstError::UnknownTape {
            name: "surface".to_string(),
            operand: Operand::Right,
        };
        assert_eq!(err.to_string(), "unknown tape 'surface' in right automaton");
    }
}
