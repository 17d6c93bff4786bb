//! Integrated result builder (spec §4.7): folds the static frame, the
//! time-series frames, and the original (back-propagated) algebra tree into
//! the final result.
//!
//! Grounded in `examples/original_source/quarry/integrated_result.py`'s
//! `generate_select_result`/`generate_result_delegate`/`generate_left_join`/
//! `process_triples`/`filter_df`.

use crate::error::{QueryError, QueryResult};
use hybridquery_frame::{Frame, Scalar};
use hybridquery_model::{Constraint, Expression, Operator, OperatorKind, RelationalOp, TermArena, TermId, TermValue};
use hybridquery_planner::TimeSeriesRequest;
use std::cmp::Ordering;

/// A dispatched time-series request still waiting to be joined into a BGP
/// or Filter node whose triple it belongs to.
pub struct PendingTs {
    pub request: TimeSeriesRequest,
    pub frame: Frame,
}

/// Generates the `__row_id` column names `LeftJoin` nodes use to stay
/// unique across nesting (spec §4.7, §9's "global monotone counter"
/// re-architected as an owned counter rather than a module-level global).
#[derive(Default)]
pub struct JoinCounter {
    next: u64,
}

impl JoinCounter {
    fn allocate(&mut self) -> String {
        let name = format!("__row_id_{}", self.next);
        self.next += 1;
        name
    }
}

/// Builds the final result frame for a `SelectQuery` root.
pub fn build_select_result(
    op: &Operator,
    arena: &TermArena,
    static_frame: Frame,
    pending: Vec<PendingTs>,
) -> QueryResult<Frame> {
    assert_eq!(op.kind, OperatorKind::SelectQuery, "expects the SelectQuery root");
    let mut counter = JoinCounter::default();
    let (frame, remaining) = build(&op.children[0], arena, static_frame, pending, &mut counter)?;
    if !remaining.is_empty() {
        return Err(QueryError::UnconsumedTsRequest(remaining.len()));
    }
    let column_names: Vec<&str> = op
        .project_vars
        .iter()
        .map(|var| {
            arena
                .variable_name(*var)
                .expect("project_vars are always Variable terms")
        })
        .collect();
    Ok(frame.select(&column_names)?)
}

fn build(
    op: &Operator,
    arena: &TermArena,
    frame: Frame,
    pending: Vec<PendingTs>,
    counter: &mut JoinCounter,
) -> QueryResult<(Frame, Vec<PendingTs>)> {
    match op.kind {
        OperatorKind::SelectQuery => {
            unreachable!("SelectQuery only ever appears at the root, handled by build_select_result")
        }
        OperatorKind::Project => build(&op.children[0], arena, frame, pending, counter),
        OperatorKind::LeftJoin => build_left_join(op, arena, frame, pending, counter),
        OperatorKind::Bgp | OperatorKind::Filter => {
            build_bgp_or_filter(op, arena, frame, pending, counter)
        }
    }
}

fn build_left_join(
    op: &Operator,
    arena: &TermArena,
    frame: Frame,
    pending: Vec<PendingTs>,
    counter: &mut JoinCounter,
) -> QueryResult<(Frame, Vec<PendingTs>)> {
    let row_id = counter.allocate();
    let augmented = frame.with_row_id(&row_id);

    let p1 = op.child_named("p1");
    let p2 = op.child_named("p2");
    let (frame_l, pending1) = build(p1, arena, augmented.clone(), pending, counter)?;
    let (frame_r, pending2) = build(p2, arena, augmented, pending1, counter)?;

    let new_right_cols: Vec<&str> = frame_r
        .columns()
        .iter()
        .map(String::as_str)
        .filter(|c| !frame_l.columns().iter().any(|l| l == c))
        .collect();
    let mut select_cols = vec![row_id.as_str()];
    select_cols.extend(new_right_cols);
    let frame_r_narrow = frame_r.select(&select_cols)?;

    let joined = frame_l.left_join(&frame_r_narrow, &row_id, &row_id)?;
    let joined = joined.drop_columns(&[row_id.as_str()]);
    Ok((joined, pending2))
}

fn build_bgp_or_filter(
    op: &Operator,
    arena: &TermArena,
    frame: Frame,
    pending: Vec<PendingTs>,
    counter: &mut JoinCounter,
) -> QueryResult<(Frame, Vec<PendingTs>)> {
    let mut current_frame = frame;
    let mut current_pending = pending;

    for triple in &op.triples {
        if !arena.has_constraint(triple.subject, Constraint::ExternalUaVariableValue) {
            continue;
        }
        let Some(position) = current_pending
            .iter()
            .position(|pts| pts.request.variable_term == triple.subject)
        else {
            continue;
        };
        let pts = current_pending.remove(position);

        let subject_name = arena
            .variable_name(triple.subject)
            .expect("EXTERNAL_UA_VARIABLE_VALUE is only ever set on a Variable term");
        let signal_id_col = format!("{subject_name}_signal_id");
        let mut keys = vec![(signal_id_col.clone(), signal_id_col.clone())];
        if let Some(ts_var) = pts.request.timestamp_var {
            let ts_name = arena
                .variable_name(ts_var)
                .expect("timestamp_var is always a Variable")
                .to_owned();
            if current_frame.has_column(&ts_name) {
                keys.push((ts_name.clone(), ts_name));
            }
        }
        let key_refs: Vec<(&str, &str)> = keys.iter().map(|(l, r)| (l.as_str(), r.as_str())).collect();
        current_frame = current_frame.inner_join(&pts.frame, &key_refs)?;
    }

    for child in &op.children {
        let (child_frame, next_pending) = build(child, arena, current_frame, current_pending, counter)?;
        current_frame = child_frame;
        current_pending = next_pending;
    }

    for expr in &op.expressions {
        current_frame = apply_filter(&current_frame, expr, arena)?;
    }

    Ok((current_frame, current_pending))
}

/// Applies one relational `FILTER` expression, dropping rows that do not
/// satisfy it. Grounds `filter_df`.
fn apply_filter(frame: &Frame, expr: &Expression, arena: &TermArena) -> QueryResult<Frame> {
    let lhs_name = variable_name_of(expr.lhs, arena)?;
    let lhs_idx = frame
        .column_index(lhs_name)
        .ok_or_else(|| QueryError::ColumnNotFound(lhs_name.to_owned()))?;

    let rhs_col_idx = match arena.value(expr.rhs) {
        TermValue::Variable(name) => Some(
            frame
                .column_index(name)
                .ok_or_else(|| QueryError::ColumnNotFound(name.clone()))?,
        ),
        _ => None,
    };
    let rhs_literal = if rhs_col_idx.is_none() {
        Some(term_to_scalar(expr.rhs, arena))
    } else {
        None
    };

    let mask: Vec<bool> = frame
        .rows()
        .iter()
        .map(|row| {
            let rhs_value = match rhs_col_idx {
                Some(idx) => &row[idx],
                None => rhs_literal.as_ref().expect("set whenever rhs_col_idx is None"),
            };
            satisfies(&row[lhs_idx], expr.op, rhs_value)
        })
        .collect();
    Ok(frame.filter_mask(&mask))
}

fn variable_name_of<'a>(term: TermId, arena: &'a TermArena) -> QueryResult<&'a str> {
    match arena.value(term) {
        TermValue::Variable(name) => Ok(name),
        other => Err(QueryError::UnsupportedFilterOp(format!(
            "FILTER left-hand side must be a variable, found {other:?}"
        ))),
    }
}

fn term_to_scalar(term: TermId, arena: &TermArena) -> Scalar {
    match arena.value(term) {
        TermValue::Literal { lexical, .. } => {
            if let Ok(i) = lexical.parse::<i64>() {
                Scalar::Int(i)
            } else if let Ok(f) = lexical.parse::<f64>() {
                Scalar::Real(f)
            } else if let Ok(b) = lexical.parse::<bool>() {
                Scalar::Bool(b)
            } else {
                Scalar::Str(lexical.clone())
            }
        }
        TermValue::Iri(iri) => Scalar::Str(iri.clone()),
        TermValue::Variable(_) | TermValue::Path { .. } => {
            unreachable!("FILTER right-hand constants are never Variable/Path terms")
        }
    }
}

fn satisfies(lhs: &Scalar, op: RelationalOp, rhs: &Scalar) -> bool {
    match lhs.partial_cmp_for_filter(rhs) {
        None => false,
        Some(ordering) => match op {
            RelationalOp::Equal => ordering == Ordering::Equal,
            RelationalOp::Less => ordering == Ordering::Less,
            RelationalOp::LessOrEqual => ordering != Ordering::Greater,
            RelationalOp::Greater => ordering == Ordering::Greater,
            RelationalOp::GreaterOrEqual => ordering != Ordering::Less,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hybridquery_model::{Operator, OperatorKind, Triple};

    fn scalar_frame(columns: &[&str], rows: Vec<Vec<Scalar>>) -> Frame {
        Frame::from_rows(columns.iter().map(|c| (*c).to_owned()).collect(), rows)
    }

    #[test]
    fn left_join_keeps_all_left_rows_with_nulls_for_unmatched() {
        let mut arena = TermArena::new();
        let n = arena.intern(hybridquery_model::TermValue::Variable("n".to_owned()));
        let v = arena.intern(hybridquery_model::TermValue::Variable("v".to_owned()));
        let verb = arena.intern(hybridquery_model::TermValue::Iri("urn:ex:p".to_owned()));

        let p1 = Operator::new(OperatorKind::Bgp, "p1");
        let p2 = Operator::new(OperatorKind::Bgp, "p2").with_triples(vec![Triple::new(n, verb, v)]);
        let left_join = Operator::new(OperatorKind::LeftJoin, "p").with_children(vec![p1, p2]);
        let select = Operator::new(OperatorKind::SelectQuery, "algebra")
            .with_children(vec![Operator::new(OperatorKind::Project, "p").with_children(vec![left_join])])
            .with_project_vars(vec![n]);

        let frame = scalar_frame(&["n"], vec![vec![Scalar::Str("a".into())]]);
        let result = build_select_result(&select, &arena, frame, Vec::new()).unwrap();
        assert_eq!(result.nrows(), 1);
        assert_eq!(result.columns(), ["n"]);
    }

    #[test]
    fn filter_drops_rows_failing_the_comparison() {
        let mut arena = TermArena::new();
        let v = arena.intern(hybridquery_model::TermValue::Variable("v".to_owned()));
        let lit = arena.intern(hybridquery_model::TermValue::Literal {
            lexical: "0.07".to_owned(),
            datatype: None,
        });
        let filter = Operator::new(OperatorKind::Filter, "p")
            .with_children(vec![Operator::new(OperatorKind::Bgp, "p")])
            .with_expressions(vec![Expression::new(v, RelationalOp::GreaterOrEqual, lit)]);
        let select = Operator::new(OperatorKind::SelectQuery, "algebra")
            .with_children(vec![Operator::new(OperatorKind::Project, "p").with_children(vec![filter])])
            .with_project_vars(vec![v]);

        let frame = scalar_frame(
            "v".split(' ').collect::<Vec<_>>().as_slice(),
            vec![vec![Scalar::Real(0.1)], vec![Scalar::Real(0.01)]],
        );
        let result = build_select_result(&select, &arena, frame, Vec::new()).unwrap();
        assert_eq!(result.nrows(), 1);
        assert_eq!(result.rows()[0][0], Scalar::Real(0.1));
    }

    #[test]
    fn unconsumed_ts_request_is_an_error() {
        let mut arena = TermArena::new();
        let n = arena.intern(hybridquery_model::TermValue::Variable("n".to_owned()));
        let select = Operator::new(OperatorKind::SelectQuery, "algebra")
            .with_children(vec![Operator::new(OperatorKind::Project, "p")
                .with_children(vec![Operator::new(OperatorKind::Bgp, "p")])])
            .with_project_vars(vec![n]);

        let frame = scalar_frame(&["n"], vec![vec![Scalar::Str("a".into())]]);
        let leftover = PendingTs {
            request: TimeSeriesRequest::new(n, vec![1]),
            frame: scalar_frame(&["n_signal_id"], vec![vec![Scalar::Int(1)]]),
        };
        let err = build_select_result(&select, &arena, frame, vec![leftover]).unwrap_err();
        assert!(matches!(err, QueryError::UnconsumedTsRequest(1)));
    }
}
