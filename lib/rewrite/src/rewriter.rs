//! The static rewriter (spec §4.2): turns the inferred algebra tree into the
//! query that is actually sent to the RDF endpoint, replacing external
//! datatype-value triples with surrogate `signalId`/`isExternalValue` triples
//! and promoting surviving external datatype-value triples into `OPTIONAL`.
//!
//! Grounded in `examples/original_source/quarry/rewrite.py`'s
//! `rewrite_deepcopy_for_sparql_engine` and `generate_optional_expression`.

use hybridquery_model::{Constraint, Operator, OperatorKind, TermArena, TermId, Triple};
use rustc_hash::FxHashSet;

/// `http://prediktor.com/UA-helpers/#isExternalValue` (spec §6 reserved vocabulary).
pub const IS_EXTERNAL_VALUE_URI: &str = "http://prediktor.com/UA-helpers/#isExternalValue";
/// `http://prediktor.com/UA-helpers/#signalId` (spec §6 reserved vocabulary).
pub const SIGNAL_ID_URI: &str = "http://prediktor.com/UA-helpers/#signalId";

/// Rewrites `op` into the tree whose emitted text is sent to the static
/// store. `arena` is mutated with the surrogate IRIs/variables the rewrite
/// introduces; `op` itself is left untouched (the caller keeps the original
/// tree around for back-propagation, spec §4.4).
#[must_use]
pub fn rewrite(op: &Operator, arena: &mut TermArena) -> Operator {
    let mut surrogate_project_vars = Vec::new();
    rewrite_rec(op, arena, &mut surrogate_project_vars)
}

fn rewrite_rec(op: &Operator, arena: &mut TermArena, surrogate_vars: &mut Vec<TermId>) -> Operator {
    let children: Vec<Operator> = op
        .children
        .iter()
        .map(|child| rewrite_rec(child, arena, surrogate_vars))
        .collect();

    let mut mandatory = Vec::new();
    let mut optional = Vec::new();
    let mut signal_id_emitted: FxHashSet<TermId> = FxHashSet::default();
    let mut is_external_emitted: FxHashSet<TermId> = FxHashSet::default();

    for triple in &op.triples {
        let subject_external =
            arena.has_constraint(triple.subject, Constraint::ExternalUaVariableValue);
        let object_external_value = arena.has_constraint(triple.object, Constraint::ExternalDataValue)
            || arena.has_constraint(triple.object, Constraint::Timestamp);
        let subject_ua_value = arena.has_constraint(triple.subject, Constraint::UaVariableValue);
        let object_data_value = arena.has_constraint(triple.object, Constraint::DataValue);

        if subject_external && object_external_value {
            // R1: the triple's value lives in the time-series store. Drop it
            // in favor of a single signalId surrogate per subject.
            if signal_id_emitted.insert(triple.subject) {
                push_signal_id_surrogate(triple.subject, &mut mandatory, arena, surrogate_vars);
            }
        } else if subject_ua_value && object_data_value {
            // R2: the triple *might* be external (we can't tell statically),
            // so keep it but make it OPTIONAL, alongside helper triples that
            // let the result builder tell which rows actually were external.
            optional.push(*triple);
            if is_external_emitted.insert(triple.subject) {
                push_is_external_surrogate(triple.subject, &mut mandatory, arena, surrogate_vars);
            }
            if signal_id_emitted.insert(triple.subject) {
                push_signal_id_surrogate(triple.subject, &mut optional, arena, surrogate_vars);
            }
        } else {
            // R3: an ordinary structural triple, kept as-is.
            mandatory.push(*triple);
        }
    }

    let mut new_op = Operator::new(op.kind, op.name.clone())
        .with_triples(mandatory)
        .with_children(children)
        .with_expressions(op.expressions.clone());

    if op.kind == OperatorKind::SelectQuery {
        let mut project_vars: Vec<TermId> = op
            .project_vars
            .iter()
            .copied()
            .filter(|var| {
                !(arena.has_constraint(*var, Constraint::Timestamp)
                    || arena.has_constraint(*var, Constraint::ExternalDataValue))
            })
            .collect();
        project_vars.extend(surrogate_vars.iter().copied());
        new_op.project_vars = project_vars;
    }

    if optional.is_empty() {
        new_op
    } else {
        let root_name = new_op.name.clone();
        new_op.name = "p1".to_owned();
        build_optional_chain(new_op, root_name, optional)
    }
}

fn push_signal_id_surrogate(
    subject: TermId,
    triples: &mut Vec<Triple>,
    arena: &mut TermArena,
    surrogate_vars: &mut Vec<TermId>,
) {
    let verb = arena.intern(hybridquery_model::TermValue::Iri(SIGNAL_ID_URI.to_owned()));
    let var = arena.intern_derived_variable(subject, "_signal_id");
    triples.push(Triple::new(subject, verb, var));
    surrogate_vars.push(var);
}

fn push_is_external_surrogate(
    subject: TermId,
    triples: &mut Vec<Triple>,
    arena: &mut TermArena,
    surrogate_vars: &mut Vec<TermId>,
) {
    let verb = arena.intern(hybridquery_model::TermValue::Iri(
        IS_EXTERNAL_VALUE_URI.to_owned(),
    ));
    let var = arena.intern_derived_variable(subject, "_is_ext_var");
    triples.push(Triple::new(subject, verb, var));
    surrogate_vars.push(var);
}

/// Builds the `N`-deep `LeftJoin` chain for the optional triples belonging to
/// one BGP: each optional triple becomes its own single-triple `Bgp` (`p2`),
/// joined onto an accumulating left-hand side (`p1`) that bottoms out at
/// `base`. The outermost `LeftJoin` takes on `base`'s original name so its
/// own parent still finds it where it expects to.
fn build_optional_chain(base: Operator, root_name: String, optional: Vec<Triple>) -> Operator {
    let count = optional.len();
    let mut acc = base;
    for (index, triple) in optional.into_iter().enumerate() {
        let rhs = Operator::new(OperatorKind::Bgp, "p2").with_triples(vec![triple]);
        let name = if index + 1 == count {
            root_name.clone()
        } else {
            "p1".to_owned()
        };
        acc = Operator::new(OperatorKind::LeftJoin, name).with_children(vec![acc, rhs]);
    }
    acc
}
