use hybridquery_model::{Expression, TermId};

/// The payload datatype an external variable's value is read back as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Datatype {
    Str,
    Real,
    Int,
    Bool,
}

/// One planned time-series fetch, keyed by the external subject term it
/// belongs to (spec §3 "TimeSeriesRequest").
#[derive(Debug, Clone)]
pub struct TimeSeriesRequest {
    pub variable_term: TermId,
    /// Signal ids pulled from the static frame's `<subject>_signal_id`
    /// column, in static-frame row order (duplicates are the store's
    /// concern, not the planner's).
    pub signal_ids: Vec<i64>,
    pub datatype: Option<Datatype>,
    pub timestamp_var: Option<TermId>,
    pub data_var: Option<TermId>,
    /// Literal comparisons against this request's timestamp/data variable,
    /// attached as pushdown hints (spec §4.5); a store MAY apply them, the
    /// integrated result builder re-applies them locally regardless.
    pub literal_filters: Vec<Expression>,
}

impl TimeSeriesRequest {
    #[must_use]
    pub fn new(variable_term: TermId, signal_ids: Vec<i64>) -> Self {
        Self {
            variable_term,
            signal_ids,
            datatype: None,
            timestamp_var: None,
            data_var: None,
            literal_filters: Vec::new(),
        }
    }
}
