//! Deterministic SPARQL text emitter for a rewritten algebra tree (spec
//! §4.3), grounded in `examples/original_source/quarry/query_generator.py`'s
//! `op_to_query`/`term_string`.

use crate::error::{EmitError, EmitResult};
use hybridquery_model::{Operator, OperatorKind, TermArena, TermId, TermValue};
use std::fmt::Write as _;

/// Serializes `op` (expected to be the `SelectQuery` root of a rewritten
/// tree) into the `SELECT ... WHERE { ... }` text sent to the static store.
pub fn emit_query(op: &Operator, arena: &TermArena) -> EmitResult<String> {
    assert_eq!(
        op.kind,
        OperatorKind::SelectQuery,
        "emit_query expects the SelectQuery root"
    );
    let mut vars = String::new();
    for var in &op.project_vars {
        write!(vars, "{} ", term_to_sparql(*var, arena)?).expect("String writes never fail");
    }
    let body = emit_operator(&op.children[0], arena)?;
    Ok(format!("SELECT {}WHERE {{ {} }}", vars, body.trim_end()))
}

fn emit_operator(op: &Operator, arena: &TermArena) -> EmitResult<String> {
    match op.kind {
        OperatorKind::Project => emit_operator(&op.children[0], arena),
        // FILTER expressions are not pushed into the static query text (spec
        // §4.3): they are re-applied locally after TS materialisation
        // (§4.7), since their variables may reference surrogate-only columns
        // the rewrite dropped from the BGP entirely.
        OperatorKind::Filter => emit_operator(&op.children[0], arena),
        OperatorKind::LeftJoin => {
            let p1 = emit_operator(op.child_named("p1"), arena)?;
            let p2 = emit_operator(op.child_named("p2"), arena)?;
            Ok(format!("{}OPTIONAL {{ {} }} . ", p1, p2.trim_end()))
        }
        OperatorKind::Bgp => {
            let mut body = String::new();
            for triple in &op.triples {
                write!(
                    body,
                    "{} {} {} . ",
                    term_to_sparql(triple.subject, arena)?,
                    term_to_sparql(triple.verb, arena)?,
                    term_to_sparql(triple.object, arena)?
                )
                .expect("String writes never fail");
            }
            Ok(body)
        }
        OperatorKind::SelectQuery => unreachable!("SelectQuery only ever appears at the root"),
    }
}

fn term_to_sparql(id: TermId, arena: &TermArena) -> EmitResult<String> {
    match arena.value(id) {
        TermValue::Variable(name) => Ok(format!("?{name}")),
        TermValue::Iri(iri) => Ok(format!("<{iri}>")),
        TermValue::Path { iri, modifier } => {
            Ok(format!("<{iri}>{}", modifier.as_sparql_suffix()))
        }
        TermValue::Literal {
            lexical,
            datatype: None,
        } => Ok(format!("\"{}\"", escape_lexical(lexical))),
        TermValue::Literal {
            lexical,
            datatype: Some(datatype),
        } => Err(EmitError::UnsupportedLiteral {
            lexical: lexical.clone(),
            datatype: datatype.clone(),
        }),
    }
}

fn escape_lexical(lexical: &str) -> String {
    lexical.replace('\\', "\\\\").replace('"', "\\\"")
}
