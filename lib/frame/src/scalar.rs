use std::cmp::Ordering;

/// A single cell value. `Null` stands in for a SPARQL unbound / missing
/// binding (an `OPTIONAL` that did not match, a time-series row with no
/// matching signal), the same role pandas' `NaN` plays in
/// `examples/original_source/quarry/integrated_result.py`.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Int(i64),
    Real(f64),
    Str(String),
    Bool(bool),
}

impl Scalar {
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    /// Three-valued comparison: `None` whenever either side is `Null`,
    /// matching pandas' behavior of a relational comparison against `NaN`
    /// always being `False` (so the row is dropped by a `FILTER`/join, never
    /// kept by default).
    #[must_use]
    pub fn partial_cmp_for_filter(&self, other: &Scalar) -> Option<Ordering> {
        match (self, other) {
            (Scalar::Int(a), Scalar::Int(b)) => a.partial_cmp(b),
            (Scalar::Real(a), Scalar::Real(b)) => a.partial_cmp(b),
            (Scalar::Int(a), Scalar::Real(b)) => (*a as f64).partial_cmp(b),
            (Scalar::Real(a), Scalar::Int(b)) => a.partial_cmp(&(*b as f64)),
            (Scalar::Str(a), Scalar::Str(b)) => a.partial_cmp(b),
            (Scalar::Bool(a), Scalar::Bool(b)) => a.partial_cmp(b),
            _ => None,
        }
    }

    /// Equality as used by join keys: unlike `==`, `Null` never equals
    /// anything, including another `Null` (so two unmatched rows never join).
    #[must_use]
    pub fn join_eq(&self, other: &Scalar) -> bool {
        match (self, other) {
            (Scalar::Null, _) | (_, Scalar::Null) => false,
            _ => self == other,
        }
    }
}
