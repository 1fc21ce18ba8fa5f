// Flag diacritics: `@OP.FEATURE.VALUE@` symbols that constrain which paths
// are valid without standing for any text.

use hashbrown::HashMap;

use crate::automaton::Automaton;
use crate::symbols::Symbol;

/// The flag diacritic operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlagOp {
    /// Positive set: unconditionally set the feature.
    P,
    /// Clear: reset the feature to neutral.
    C,
    /// Unification: set if neutral, pass if equal, fail otherwise.
    U,
    /// Require: fail unless the feature has the value (or any value).
    R,
    /// Disallow: fail if the feature has the value (or any value).
    D,
}

/// A flag diacritic as written in a symbol.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FlagDiacritic {
    pub op: FlagOp,
    pub feature: String,
    /// `None` for the two-part form `@R.FEATURE@`, meaning "any value".
    pub value: Option<String>,
}

impl FlagDiacritic {
    /// Parse `@OP.FEATURE@` or `@OP.FEATURE.VALUE@`. Anything else is an
    /// ordinary symbol and gives `None`.
    pub fn parse(text: &str) -> Option<Self> {
        let inner = text.strip_prefix('@')?.strip_suffix('@')?;
        let (op, rest) = inner.split_once('.')?;
        let op = match op {
            "P" => FlagOp::P,
            "C" => FlagOp::C,
            "U" => FlagOp::U,
            "R" => FlagOp::R,
            "D" => FlagOp::D,
            _ => return None,
        };
        let (feature, value) = match rest.split_once('.') {
            Some((feature, value)) => (feature, Some(value)),
            None => (rest, None),
        };
        if feature.is_empty() || value.is_some_and(str::is_empty) {
            return None;
        }
        Some(Self {
            op,
            feature: feature.to_string(),
            value: value.map(str::to_string),
        })
    }
}

/// True if `text` is a flag diacritic.
pub fn is_flag(text: &str) -> bool {
    FlagDiacritic::parse(text).is_some()
}

/// Neutral value: the feature has not been set.
pub const FLAG_VALUE_NEUTRAL: u16 = 0;

/// Wildcard value of the two-part form.
pub const FLAG_VALUE_ANY: u16 = 1;

/// A flag with its feature and value interned to dense indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpFeatureValue {
    pub op: FlagOp,
    pub feature: u16,
    pub value: u16,
}

/// Outcome of checking a flag against the current value of its feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagCheckResult {
    Reject,
    AcceptAndUpdate { feature: u16, value: u16 },
    AcceptNoUpdate { feature: u16 },
}

/// Check a flag against the current value of its feature.
pub fn check_flag(ofv: &OpFeatureValue, current_value: u16) -> FlagCheckResult {
    match ofv.op {
        FlagOp::P => FlagCheckResult::AcceptAndUpdate {
            feature: ofv.feature,
            value: ofv.value,
        },
        FlagOp::C => FlagCheckResult::AcceptAndUpdate {
            feature: ofv.feature,
            value: FLAG_VALUE_NEUTRAL,
        },
        FlagOp::U => {
            if current_value == FLAG_VALUE_NEUTRAL {
                FlagCheckResult::AcceptAndUpdate {
                    feature: ofv.feature,
                    value: ofv.value,
                }
            } else if current_value == ofv.value {
                FlagCheckResult::AcceptNoUpdate {
                    feature: ofv.feature,
                }
            } else {
                FlagCheckResult::Reject
            }
        }
        FlagOp::R => {
            let ok = if ofv.value == FLAG_VALUE_ANY {
                current_value != FLAG_VALUE_NEUTRAL
            } else {
                current_value == ofv.value
            };
            if ok {
                FlagCheckResult::AcceptNoUpdate {
                    feature: ofv.feature,
                }
            } else {
                FlagCheckResult::Reject
            }
        }
        FlagOp::D => {
            let hit = if ofv.value == FLAG_VALUE_ANY {
                current_value != FLAG_VALUE_NEUTRAL
            } else {
                current_value == ofv.value
            };
            if hit {
                FlagCheckResult::Reject
            } else {
                FlagCheckResult::AcceptNoUpdate {
                    feature: ofv.feature,
                }
            }
        }
    }
}

/// The flag diacritics of one automaton, indexed by tape and raw symbol id.
///
/// Features and values are shared by all tapes: `@P.CASE.NOM@` on one tape
/// and `@R.CASE.NOM@` on another talk about the same feature.
pub struct FlagTable {
    ops: Vec<Vec<Option<OpFeatureValue>>>,
    feature_count: usize,
}

impl FlagTable {
    pub fn new(automaton: &Automaton) -> Self {
        let mut features: HashMap<String, u16> = HashMap::new();
        let mut values: HashMap<String, u16> = HashMap::new();
        let mut ops = Vec::with_capacity(automaton.tape_count());
        for tape in automaton.tapes() {
            let mut column = vec![None; tape.symbols.len()];
            for (symbol, text) in tape.symbols.concrete() {
                let Some(flag) = FlagDiacritic::parse(text) else {
                    continue;
                };
                let next = features.len() as u16;
                let feature = *features.entry(flag.feature).or_insert(next);
                let value = match flag.value {
                    None => FLAG_VALUE_ANY,
                    Some(v) => {
                        let next = values.len() as u16 + 2;
                        *values.entry(v).or_insert(next)
                    }
                };
                column[symbol.raw() as usize] = Some(OpFeatureValue {
                    op: flag.op,
                    feature,
                    value,
                });
            }
            ops.push(column);
        }
        Self {
            ops,
            feature_count: features.len(),
        }
    }

    /// Flag carried by `symbol` on `tape`, if it is one.
    #[inline]
    pub fn get(&self, tape: usize, symbol: Symbol) -> Option<OpFeatureValue> {
        self.ops.get(tape)?.get(symbol.raw() as usize).copied().flatten()
    }

    pub fn feature_count(&self) -> usize {
        self.feature_count
    }

    pub fn is_empty(&self) -> bool {
        self.feature_count == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automaton::AutomatonBuilder;

    #[test]
    fn parses_both_forms() {
        let f = FlagDiacritic::parse("@P.CASE.NOM@").unwrap();
        assert_eq!(f.op, FlagOp::P);
        assert_eq!(f.feature, "CASE");
        assert_eq!(f.value.as_deref(), Some("NOM"));

        let f = FlagDiacritic::parse("@R.CASE@").unwrap();
        assert_eq!(f.op, FlagOp::R);
        assert_eq!(f.value, None);
    }

    #[test]
    fn ordinary_symbols_are_not_flags() {
        for text in ["a", "@", "@@", "@P@", "@X.F.V@", "@P.F.V", "@P..V@", "@P.F.@", "@_SPACE_@"] {
            assert!(!is_flag(text), "{text}");
        }
        assert!(is_flag("@U.F.V@"));
        assert!(is_flag("@D.F@"));
    }

    #[test]
    fn unification() {
        let u = OpFeatureValue {
            op: FlagOp::U,
            feature: 0,
            value: 3,
        };
        assert_eq!(
            check_flag(&u, FLAG_VALUE_NEUTRAL),
            FlagCheckResult::AcceptAndUpdate { feature: 0, value: 3 }
        );
        assert_eq!(check_flag(&u, 3), FlagCheckResult::AcceptNoUpdate { feature: 0 });
        assert_eq!(check_flag(&u, 4), FlagCheckResult::Reject);
    }

    #[test]
    fn require_and_disallow() {
        let r_any = OpFeatureValue {
            op: FlagOp::R,
            feature: 1,
            value: FLAG_VALUE_ANY,
        };
        assert_eq!(check_flag(&r_any, FLAG_VALUE_NEUTRAL), FlagCheckResult::Reject);
        assert_eq!(check_flag(&r_any, 5), FlagCheckResult::AcceptNoUpdate { feature: 1 });

        let d = OpFeatureValue {
            op: FlagOp::D,
            feature: 1,
            value: 5,
        };
        assert_eq!(check_flag(&d, 5), FlagCheckResult::Reject);
        assert_eq!(check_flag(&d, 6), FlagCheckResult::AcceptNoUpdate { feature: 1 });
    }

    #[test]
    fn clear_and_set() {
        let c = OpFeatureValue {
            op: FlagOp::C,
            feature: 2,
            value: 9,
        };
        assert_eq!(
            check_flag(&c, 5),
            FlagCheckResult::AcceptAndUpdate {
                feature: 2,
                value: FLAG_VALUE_NEUTRAL
            }
        );
    }

    #[test]
    fn table_shares_features_across_tapes() {
        let mut b = AutomatonBuilder::new(["t", "u"]).unwrap();
        b.add_arc_text(0, 0, &["@P.CASE.NOM@", "x"]).unwrap();
        b.add_arc_text(0, 0, &["a", "@R.CASE.NOM@"]).unwrap();
        b.add_arc_text(0, 0, &["@D.NUM@", ""]).unwrap();
        let a = b.build();
        let table = FlagTable::new(&a);
        assert_eq!(table.feature_count(), 2);

        let set = a.arcs(0)[0].symbols[0];
        let require = a.arcs(0)[1].symbols[1];
        let (p, r) = (table.get(0, set).unwrap(), table.get(1, require).unwrap());
        assert_eq!(p.feature, r.feature);
        assert_eq!(p.value, r.value);
        assert_eq!(table.get(1, a.arcs(0)[0].symbols[1]), None);
        assert_eq!(table.get(0, a.arcs(0)[2].symbols[0]).unwrap().value, FLAG_VALUE_ANY);
    }
}
