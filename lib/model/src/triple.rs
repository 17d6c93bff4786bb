use crate::term::TermId;

/// `(subject, verb, object)`, identity by value of its three terms (spec §3).
///
/// Since [`TermId`] is already canonical per distinct value (terms are
/// interned), deriving `PartialEq`/`Eq`/`Hash` directly on the three ids gives
/// exactly the value-identity the spec asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Triple {
    pub subject: TermId,
    pub verb: TermId,
    pub object: TermId,
}

impl Triple {
    #[must_use]
    pub fn new(subject: TermId, verb: TermId, object: TermId) -> Self {
        Self {
            subject,
            verb,
            object,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationalOp {
    Equal,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
}

impl RelationalOp {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RelationalOp::Equal => "=",
            RelationalOp::Less => "<",
            RelationalOp::LessOrEqual => "<=",
            RelationalOp::Greater => ">",
            RelationalOp::GreaterOrEqual => ">=",
        }
    }
}

/// A relational expression `(lhs_term, op, rhs_term)` (spec §3 "Expression").
///
/// The source's conjunctive expression shape is not modeled as a distinct
/// type: a `ConditionalAndExpression` is flattened into a `Vec<Expression>`
/// at build time (see `hybridquery-model::builder`), since every consumer of
/// expressions in this crate family (Filter, SelectQuery) only ever wants the
/// flat collection of relational leaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expression {
    pub lhs: TermId,
    pub op: RelationalOp,
    pub rhs: TermId,
}

impl Expression {
    #[must_use]
    pub fn new(lhs: TermId, op: RelationalOp, rhs: TermId) -> Self {
        Self { lhs, op, rhs }
    }
}
