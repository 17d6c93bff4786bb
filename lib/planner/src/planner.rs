//! Time-series request planner (spec §4.5): walks the back-propagated
//! original tree and groups triples by external subject term into one
//! [`TimeSeriesRequest`] each.

use crate::error::{PlanError, PlanResult};
use crate::request::{Datatype, TimeSeriesRequest};
use hybridquery_frame::{Frame, Scalar};
use hybridquery_inference::{
    BOOL_VALUE_VERB, INT_VALUE_VERB, REAL_VALUE_VERB, STRING_VALUE_VERB, TIMESTAMP_VERB,
};
use hybridquery_model::{Constraint, Expression, Operator, TermArena, TermId, TermValue, Triple};
use rustc_hash::FxHashMap;

/// Plans one [`TimeSeriesRequest`] per external subject term found anywhere
/// in `op`, pulling each request's signal ids from `static_frame`.
pub fn plan(
    op: &Operator,
    arena: &TermArena,
    static_frame: &Frame,
) -> PlanResult<Vec<TimeSeriesRequest>> {
    let mut order: Vec<TermId> = Vec::new();
    let mut requests: FxHashMap<TermId, TimeSeriesRequest> = FxHashMap::default();

    let mut first_error: Option<PlanError> = None;
    op.walk(&mut |node: &Operator| {
        if first_error.is_some() {
            return;
        }
        for triple in &node.triples {
            if let Err(err) = process_triple(triple, arena, static_frame, &mut requests, &mut order)
            {
                first_error = Some(err);
                return;
            }
        }
    });
    if let Some(err) = first_error {
        return Err(err);
    }

    op.walk(&mut |node: &Operator| {
        for expr in &node.expressions {
            attach_pushdown_hint(expr, arena, &mut requests);
        }
    });

    Ok(order
        .into_iter()
        .map(|id| {
            requests
                .remove(&id)
                .expect("every id in `order` was inserted into `requests`")
        })
        .collect())
}

fn process_triple(
    triple: &Triple,
    arena: &TermArena,
    static_frame: &Frame,
    requests: &mut FxHashMap<TermId, TimeSeriesRequest>,
    order: &mut Vec<TermId>,
) -> PlanResult<()> {
    if !arena.has_constraint(triple.subject, Constraint::ExternalUaVariableValue) {
        return Ok(());
    }

    if !requests.contains_key(&triple.subject) {
        let var_name = arena
            .variable_name(triple.subject)
            .expect("EXTERNAL_UA_VARIABLE_VALUE is only ever set on a Variable term");
        let column = format!("{var_name}_signal_id");
        let signal_ids = signal_id_column(static_frame, &column)?;
        requests.insert(
            triple.subject,
            TimeSeriesRequest::new(triple.subject, signal_ids),
        );
        order.push(triple.subject);
    }

    let verb_iri = match arena.value(triple.verb) {
        TermValue::Iri(iri) => iri.clone(),
        _ => return Ok(()),
    };
    let request = requests
        .get_mut(&triple.subject)
        .expect("just inserted or already present above");

    if verb_iri == TIMESTAMP_VERB {
        if !matches!(arena.value(triple.object), TermValue::Variable(_)) {
            return Err(PlanError::UnsupportedTimestampBinding(format!(
                "{:?}",
                arena.value(triple.object)
            )));
        }
        request.timestamp_var = Some(triple.object);
    } else if let Some(datatype) = datatype_for_verb(&verb_iri) {
        request.datatype = Some(datatype);
        if matches!(arena.value(triple.object), TermValue::Variable(_)) {
            request.data_var = Some(triple.object);
        }
    }

    Ok(())
}

fn datatype_for_verb(uri: &str) -> Option<Datatype> {
    match uri {
        STRING_VALUE_VERB => Some(Datatype::Str),
        REAL_VALUE_VERB => Some(Datatype::Real),
        INT_VALUE_VERB => Some(Datatype::Int),
        BOOL_VALUE_VERB => Some(Datatype::Bool),
        _ => None,
    }
}

/// Reads the `<subject>_signal_id` column out of the static frame. A `Null`
/// cell means the row's `OPTIONAL` binding never matched in the static
/// store; such rows carry no signal id to request and are skipped rather
/// than coerced to a sentinel (the Python keeps these as a nullable
/// `Int32`, never substituting `0`).
fn signal_id_column(frame: &Frame, name: &str) -> PlanResult<Vec<i64>> {
    let idx = frame
        .column_index(name)
        .ok_or_else(|| PlanError::MissingSignalIdColumn(name.to_owned()))?;
    Ok(frame
        .rows()
        .iter()
        .filter_map(|row| match row[idx] {
            Scalar::Int(value) => Some(value),
            _ => None,
        })
        .collect())
}

/// Attaches `expr` as a pushdown hint to every request whose timestamp/data
/// variable it compares against a literal; variable-vs-variable expressions
/// are left untouched, staying a post-join filter only (spec §4.5).
fn attach_pushdown_hint(
    expr: &Expression,
    arena: &TermArena,
    requests: &mut FxHashMap<TermId, TimeSeriesRequest>,
) {
    let lhs_is_var = matches!(arena.value(expr.lhs), TermValue::Variable(_));
    let rhs_is_var = matches!(arena.value(expr.rhs), TermValue::Variable(_));
    let var_term = match (lhs_is_var, rhs_is_var) {
        (true, false) => expr.lhs,
        (false, true) => expr.rhs,
        _ => return,
    };
    for request in requests.values_mut() {
        if request.timestamp_var == Some(var_term) || request.data_var == Some(var_term) {
            request.literal_filters.push(*expr);
        }
    }
}
