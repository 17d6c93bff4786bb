//! Translates a parsed SPARQL query into our own [`Operator`]/[`Triple`]/[`Term`]
//! model.
//!
//! `spec.md` declares the parser that yields the initial algebra tree "assumed
//! available" and out of scope, but the original Python source
//! (`examples/original_source/quarry/algebra_utils.py`) still performs exactly
//! this translation step from the parser's own algebra (there, `rdflib`'s) into
//! the splitter's `Operator`/`Term`/`Triple` types — that translation is part of
//! the splitter, not the parser. Here the "parser... assumed available" is the
//! real `spargebra` crate (the same crate the teacher workspace depends on),
//! and this module is the `algebra_utils.py` equivalent.

use crate::error::{BuildError, BuildResult};
use crate::operator::{Operator, OperatorKind};
use crate::term::{PathModifier, TermArena, TermId, TermValue};
use crate::triple::{Expression, RelationalOp, Triple};
use oxrdf::vocab::xsd;
use oxrdf::Literal as OxLiteral;
use spargebra::algebra::{Expression as SparqlExpr, GraphPattern, PropertyPathExpression};
use spargebra::term::{NamedNodePattern, TermPattern, TriplePattern};
use spargebra::Query;

/// Parses `sparql_text` and builds the original (un-rewritten) algebra tree,
/// together with the [`TermArena`] every subsequent pass threads through.
pub fn build_from_sparql(sparql_text: &str) -> BuildResult<(Operator, TermArena)> {
    let query = Query::parse(sparql_text, None)?;
    let mut arena = TermArena::new();
    let root = match query {
        Query::Select { pattern, .. } => build_select_query(&pattern, &mut arena)?,
        Query::Construct { .. } => return Err(BuildError::UnsupportedOperator("CONSTRUCT")),
        Query::Describe { .. } => return Err(BuildError::UnsupportedOperator("DESCRIBE")),
        Query::Ask { .. } => return Err(BuildError::UnsupportedOperator("ASK")),
    };
    Ok((root, arena))
}

fn build_select_query(pattern: &GraphPattern, arena: &mut TermArena) -> BuildResult<Operator> {
    let GraphPattern::Project { inner, variables } = pattern else {
        return Err(BuildError::UnsupportedPattern(
            "expected a top-level projection (SELECT list)",
        ));
    };

    let project_vars = variables
        .iter()
        .map(|v| arena.intern(TermValue::Variable(v.as_str().to_owned())))
        .collect();
    let inner_op = build_pattern(inner, arena)?;
    let project = Operator::new(OperatorKind::Project, "p").with_children(vec![inner_op]);
    Ok(Operator::new(OperatorKind::SelectQuery, "algebra")
        .with_children(vec![project])
        .with_project_vars(project_vars))
}

fn build_pattern(pattern: &GraphPattern, arena: &mut TermArena) -> BuildResult<Operator> {
    match pattern {
        GraphPattern::Bgp { .. } | GraphPattern::Path { .. } | GraphPattern::Join { .. } => {
            let triples = flatten_to_triples(pattern, arena)?;
            Ok(Operator::new(OperatorKind::Bgp, "p").with_triples(triples))
        }
        GraphPattern::Filter { expr, inner } => {
            let expressions = flatten_expression(expr, arena)?;
            let inner_op = build_pattern(inner, arena)?;
            Ok(Operator::new(OperatorKind::Filter, "p")
                .with_children(vec![inner_op])
                .with_expressions(expressions))
        }
        GraphPattern::LeftJoin {
            left,
            right,
            expression,
        } => {
            let mut p1 = build_pattern(left, arena)?;
            p1.name = "p1".to_owned();
            let mut p2 = build_pattern(right, arena)?;
            p2.name = "p2".to_owned();
            // SPARQL allows `OPTIONAL { ... FILTER(...) }` to attach the filter
            // directly as the LeftJoin's join expression. Normalize that into a
            // nested Filter operator inside p2 so the Operator model matches
            // spec §3 exactly (expressions only non-empty on Filter/SelectQuery).
            if let Some(expr) = expression {
                let expressions = flatten_expression(expr, arena)?;
                p2.name = "p".to_owned();
                p2 = Operator::new(OperatorKind::Filter, "p2")
                    .with_children(vec![p2])
                    .with_expressions(expressions);
            }
            Ok(Operator::new(OperatorKind::LeftJoin, "p").with_children(vec![p1, p2]))
        }
        other => Err(BuildError::UnsupportedPattern(pattern_name(other))),
    }
}

fn flatten_to_triples(pattern: &GraphPattern, arena: &mut TermArena) -> BuildResult<Vec<Triple>> {
    match pattern {
        GraphPattern::Bgp { patterns } => patterns
            .iter()
            .map(|p| triple_from_pattern(p, arena))
            .collect(),
        GraphPattern::Path {
            subject,
            path,
            object,
        } => Ok(vec![triple_from_path(subject, path, object, arena)?]),
        GraphPattern::Join { left, right } => {
            let mut triples = flatten_to_triples(left, arena)?;
            triples.extend(flatten_to_triples(right, arena)?);
            Ok(triples)
        }
        other => Err(BuildError::UnsupportedPattern(pattern_name(other))),
    }
}

fn triple_from_pattern(pattern: &TriplePattern, arena: &mut TermArena) -> BuildResult<Triple> {
    let subject = term_pattern_to_term(&pattern.subject, arena)?;
    let verb = named_node_pattern_to_term(&pattern.predicate, arena)?;
    let object = term_pattern_to_term(&pattern.object, arena)?;
    Ok(Triple::new(subject, verb, object))
}

fn triple_from_path(
    subject: &TermPattern,
    path: &PropertyPathExpression,
    object: &TermPattern,
    arena: &mut TermArena,
) -> BuildResult<Triple> {
    let (iri, modifier) = match path {
        PropertyPathExpression::OneOrMore(inner) => {
            (single_hop_iri(inner)?, PathModifier::OneOrMore)
        }
        PropertyPathExpression::ZeroOrMore(inner) => {
            (single_hop_iri(inner)?, PathModifier::ZeroOrMore)
        }
        _ => return Err(BuildError::UnsupportedPath),
    };
    let subject = term_pattern_to_term(subject, arena)?;
    let object = term_pattern_to_term(object, arena)?;
    let verb = arena.intern(TermValue::Path { iri, modifier });
    Ok(Triple::new(subject, verb, object))
}

fn single_hop_iri(path: &PropertyPathExpression) -> BuildResult<String> {
    match path {
        PropertyPathExpression::NamedNode(iri) => validate_iri(iri.as_str()),
        _ => Err(BuildError::UnsupportedPath),
    }
}

/// Re-validates an IRI against RFC 3987 with `oxiri`, mirroring the
/// teacher's `lib/model` (`oxiri::Iri::parse` behind a `BuildError` variant).
/// `spargebra` already rejects unparseable IRI syntax during `Query::parse`,
/// so in practice this never fails; it exists for the same reason the
/// teacher keeps it in `lib/model` rather than trusting the parser alone —
/// a defensive boundary check independent of which parser produced the term.
fn validate_iri(iri: &str) -> BuildResult<String> {
    Ok(oxiri::Iri::parse(iri.to_owned())?.into_inner())
}

fn term_pattern_to_term(pattern: &TermPattern, arena: &mut TermArena) -> BuildResult<TermId> {
    match pattern {
        TermPattern::NamedNode(iri) => Ok(arena.intern(TermValue::Iri(validate_iri(iri.as_str())?))),
        TermPattern::Variable(var) => {
            Ok(arena.intern(TermValue::Variable(var.as_str().to_owned())))
        }
        TermPattern::Literal(literal) => Ok(arena.intern(literal_term_value(literal))),
        TermPattern::BlankNode(bnode) => Err(BuildError::UnsupportedTerm(format!(
            "blank node _:{}",
            bnode.as_str()
        ))),
        other => Err(BuildError::UnsupportedTerm(format!("{other:?}"))),
    }
}

fn named_node_pattern_to_term(
    pattern: &NamedNodePattern,
    arena: &mut TermArena,
) -> BuildResult<TermId> {
    match pattern {
        NamedNodePattern::NamedNode(iri) => {
            Ok(arena.intern(TermValue::Iri(validate_iri(iri.as_str())?)))
        }
        NamedNodePattern::Variable(var) => {
            Ok(arena.intern(TermValue::Variable(var.as_str().to_owned())))
        }
    }
}

fn literal_term_value(literal: &OxLiteral) -> TermValue {
    let datatype = if literal.datatype() == xsd::STRING && literal.language().is_none() {
        None
    } else {
        Some(literal.datatype().as_str().to_owned())
    };
    TermValue::Literal {
        lexical: literal.value().to_owned(),
        datatype,
    }
}

fn flatten_expression(expr: &SparqlExpr, arena: &mut TermArena) -> BuildResult<Vec<Expression>> {
    match expr {
        SparqlExpr::And(left, right) => {
            let mut expressions = flatten_expression(left, arena)?;
            expressions.extend(flatten_expression(right, arena)?);
            Ok(expressions)
        }
        SparqlExpr::Equal(left, right) => {
            Ok(vec![relational(left, right, RelationalOp::Equal, arena)?])
        }
        SparqlExpr::Greater(left, right) => Ok(vec![relational(
            left,
            right,
            RelationalOp::Greater,
            arena,
        )?]),
        SparqlExpr::GreaterOrEqual(left, right) => Ok(vec![relational(
            left,
            right,
            RelationalOp::GreaterOrEqual,
            arena,
        )?]),
        SparqlExpr::Less(left, right) => {
            Ok(vec![relational(left, right, RelationalOp::Less, arena)?])
        }
        SparqlExpr::LessOrEqual(left, right) => Ok(vec![relational(
            left,
            right,
            RelationalOp::LessOrEqual,
            arena,
        )?]),
        other => Err(BuildError::UnsupportedExpression(format!("{other:?}"))),
    }
}

fn relational(
    lhs: &SparqlExpr,
    rhs: &SparqlExpr,
    op: RelationalOp,
    arena: &mut TermArena,
) -> BuildResult<Expression> {
    Ok(Expression::new(
        term_from_scalar_expr(lhs, arena)?,
        op,
        term_from_scalar_expr(rhs, arena)?,
    ))
}

fn term_from_scalar_expr(expr: &SparqlExpr, arena: &mut TermArena) -> BuildResult<TermId> {
    match expr {
        SparqlExpr::Variable(var) => {
            Ok(arena.intern(TermValue::Variable(var.as_str().to_owned())))
        }
        SparqlExpr::Literal(literal) => Ok(arena.intern(literal_term_value(literal))),
        SparqlExpr::NamedNode(iri) => Ok(arena.intern(TermValue::Iri(validate_iri(iri.as_str())?))),
        other => Err(BuildError::UnsupportedExpression(format!("{other:?}"))),
    }
}

fn pattern_name(pattern: &GraphPattern) -> &'static str {
    match pattern {
        GraphPattern::Bgp { .. } => "BGP",
        GraphPattern::Path { .. } => "Path",
        GraphPattern::Join { .. } => "Join",
        GraphPattern::LeftJoin { .. } => "LeftJoin",
        GraphPattern::Filter { .. } => "Filter",
        GraphPattern::Union { .. } => "Union",
        GraphPattern::Graph { .. } => "Graph",
        GraphPattern::Extend { .. } => "Extend/BIND",
        GraphPattern::Minus { .. } => "MINUS",
        GraphPattern::Values { .. } => "VALUES",
        GraphPattern::OrderBy { .. } => "ORDER BY",
        GraphPattern::Project { .. } => "nested Project (subquery)",
        GraphPattern::Distinct { .. } => "DISTINCT",
        GraphPattern::Reduced { .. } => "REDUCED",
        GraphPattern::Slice { .. } => "LIMIT/OFFSET",
        GraphPattern::Group { .. } => "GROUP BY / aggregation",
        GraphPattern::Service { .. } => "SERVICE",
        _ => "unsupported graph pattern",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_bgp_select() {
        let (op, arena) = build_from_sparql(
            "SELECT ?n ?name WHERE { ?n <urn:ex:hasLogicalNode> ?x . ?x a <urn:ex:SVBR> . ?n <urn:ex:displayName> ?name . }",
        )
        .unwrap();
        assert_eq!(op.kind, OperatorKind::SelectQuery);
        assert_eq!(op.project_vars.len(), 2);
        assert_eq!(arena.variable_name(op.project_vars[0]), Some("n"));
        let project = &op.children[0];
        assert_eq!(project.kind, OperatorKind::Project);
        let bgp = &project.children[0];
        assert_eq!(bgp.kind, OperatorKind::Bgp);
        assert_eq!(bgp.triples.len(), 3);
    }

    #[test]
    fn unsupported_expression_is_rejected() {
        let err = build_from_sparql(
            "SELECT ?x WHERE { ?x <urn:ex:p> ?y . FILTER(regex(?x, \"a\")) }",
        )
        .unwrap_err();
        assert!(matches!(err, BuildError::UnsupportedExpression(_)));
    }

    #[test]
    fn optional_promotes_to_left_join() {
        let (op, _arena) = build_from_sparql(
            "SELECT ?n ?v WHERE { ?n <urn:ex:p> ?x . OPTIONAL { ?x <urn:ex:v> ?v . } }",
        )
        .unwrap();
        let bgp_or_lj = &op.children[0].children[0];
        assert_eq!(bgp_or_lj.kind, OperatorKind::LeftJoin);
        assert_eq!(bgp_or_lj.children.len(), 2);
        assert!(bgp_or_lj.children.iter().any(|c| c.name == "p1"));
        assert!(bgp_or_lj.children.iter().any(|c| c.name == "p2"));
    }
}
