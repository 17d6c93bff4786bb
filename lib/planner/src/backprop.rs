//! External-bit back-propagator (spec §4.4): after the static query runs,
//! walks the *original* (un-rewritten) tree and marks every term whose
//! variable turned out to be external.

use hybridquery_frame::{Frame, Scalar};
use hybridquery_model::{Constraint, Operator, TermArena, TermValue};
use rustc_hash::FxHashSet;

/// Computes `EXT = {var | any(frame[var_is_ext_var]) == true}` from the
/// static result frame's `*_is_ext_var` columns.
fn external_variable_names(frame: &Frame) -> FxHashSet<String> {
    let mut ext = FxHashSet::default();
    for column in frame.columns() {
        let Some(var_name) = column.strip_suffix("_is_ext_var") else {
            continue;
        };
        let idx = frame.column_index(column).expect("column came from frame.columns()");
        let any_true = frame
            .rows()
            .iter()
            .any(|row| matches!(row[idx], Scalar::Bool(true)));
        if any_true {
            ext.insert(var_name.to_owned());
        }
    }
    ext
}

/// Mutates `arena` in place, adding `EXTERNAL_UA_VARIABLE_VALUE` to every
/// term in `op` (subject or object of any triple) whose variable name is in
/// the external set derived from `static_frame`.
pub fn back_propagate(op: &Operator, arena: &mut TermArena, static_frame: &Frame) {
    let ext = external_variable_names(static_frame);
    if ext.is_empty() {
        return;
    }
    op.walk(&mut |node: &Operator| {
        for triple in &node.triples {
            for term in [triple.subject, triple.object] {
                let is_external = matches!(
                    arena.value(term),
                    TermValue::Variable(name) if ext.contains(name)
                );
                if is_external {
                    arena.add_constraint(term, Constraint::ExternalUaVariableValue);
                }
            }
        }
    });
}
