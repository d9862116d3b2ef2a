//! The closed, tagged data-type variants that flow through the iterator
//! pipeline (spec §3 "Data-type variants").

use std::collections::BTreeMap;

/// Discriminant used by the iterator factory registry (spec C6, §9 design
/// notes: "replace virtual dispatch on data-type hierarchies with a closed
/// tagged variant").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DataType {
    Numeric,
    NumericArray,
    NumericSummary,
}

/// A single numeric value: an integer or a double, mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Numeric {
    Long(i64),
    Double(f64),
}

impl Numeric {
    pub fn is_float(&self) -> bool {
        matches!(self, Numeric::Double(_))
    }

    pub fn to_f64(&self) -> f64 {
        match self {
            Numeric::Long(v) => *v as f64,
            Numeric::Double(v) => *v,
        }
    }

    pub fn is_nan(&self) -> bool {
        matches!(self, Numeric::Double(v) if v.is_nan())
    }

    pub const NAN: Numeric = Numeric::Double(f64::NAN);

    pub fn checked_add(&self, other: &Numeric) -> Numeric {
        match (self, other) {
            (Numeric::Long(a), Numeric::Long(b)) => Numeric::Long(a.wrapping_add(*b)),
            _ => Numeric::Double(self.to_f64() + other.to_f64()),
        }
    }

    pub fn checked_sub(&self, other: &Numeric) -> Numeric {
        match (self, other) {
            (Numeric::Long(a), Numeric::Long(b)) => Numeric::Long(a.wrapping_sub(*b)),
            _ => Numeric::Double(self.to_f64() - other.to_f64()),
        }
    }
}

/// An offset/end window over either an `i64` or `f64` backing array — the
/// integer/double discriminator is per-array, not per-point (spec §3).
#[derive(Debug, Clone, PartialEq)]
pub enum NumericArray {
    Long { values: Vec<i64>, offset: usize, end: usize },
    Double { values: Vec<f64>, offset: usize, end: usize },
}

impl NumericArray {
    pub fn len(&self) -> usize {
        match self {
            NumericArray::Long { offset, end, .. } | NumericArray::Double { offset, end, .. } => {
                end.saturating_sub(*offset)
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_float(&self) -> bool {
        matches!(self, NumericArray::Double { .. })
    }

    /// Read element `i` (relative to `offset`) as an `f64`, widening longs.
    pub fn get_f64(&self, i: usize) -> f64 {
        match self {
            NumericArray::Long { values, offset, .. } => values[*offset + i] as f64,
            NumericArray::Double { values, offset, .. } => values[*offset + i],
        }
    }

    pub fn get_numeric(&self, i: usize) -> Numeric {
        match self {
            NumericArray::Long { values, offset, .. } => Numeric::Long(values[*offset + i]),
            NumericArray::Double { values, offset, .. } => Numeric::Double(values[*offset + i]),
        }
    }
}

/// Small-int identifiers for pre-aggregated components inside a
/// [`NumericSummary`] (spec §3, GLOSSARY "Summary id").
pub mod summary_id {
    pub const SUM: i32 = 0;
    pub const COUNT: i32 = 1;
    pub const MIN: i32 = 2;
    pub const MAX: i32 = 3;
    pub const AVG: i32 = 5;
}

/// A map from summary id to `Numeric` (spec §3).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NumericSummary {
    values: BTreeMap<i32, Numeric>,
}

impl NumericSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, id: i32, value: Numeric) -> Self {
        self.values.insert(id, value);
        self
    }

    pub fn set(&mut self, id: i32, value: Numeric) {
        self.values.insert(id, value);
    }

    pub fn get(&self, id: i32) -> Option<Numeric> {
        self.values.get(&id).copied()
    }

    /// The set of summary ids present with a non-null, non-NaN value —
    /// `summariesAvailable` in spec §4.6.
    pub fn summaries_available(&self) -> Vec<i32> {
        self.values
            .iter()
            .filter(|(_, v)| !v.is_nan())
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn ids(&self) -> impl Iterator<Item = i32> + '_ {
        self.values.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Tag map shared by the filter tree and the hash/cache-key machinery
/// (spec §3 "Tag map representation" expansion).
pub type TagMap = BTreeMap<String, String>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_available_excludes_nan() {
        let s = NumericSummary::new()
            .with(summary_id::SUM, Numeric::Long(10))
            .with(summary_id::COUNT, Numeric::NAN);
        assert_eq!(s.summaries_available(), vec![summary_id::SUM]);
    }
}
