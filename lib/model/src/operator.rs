use crate::term::TermId;
use crate::triple::{Expression, Triple};

/// The tagged operator kinds of the supported algebra fragment (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorKind {
    SelectQuery,
    Project,
    LeftJoin,
    Filter,
    Bgp,
}

/// A node of the algebra tree.
///
/// Operators are stored as an owned `Vec` of children tagged by `name`
/// (`p`, `p1`, `p2`, `algebra`) rather than a GUID-keyed set: spec §9 notes
/// this is "simpler and equally correct" for a systems language, since we
/// never need two value-equal operators to coexist as distinct set members.
#[derive(Debug, Clone)]
pub struct Operator {
    pub kind: OperatorKind,
    pub name: String,
    pub children: Vec<Operator>,
    /// Non-empty only for `Bgp`, and for rewritten `LeftJoin` right-hand
    /// sides that the rewriter builds directly with `Bgp` children.
    pub triples: Vec<Triple>,
    /// Non-empty only for `Filter` and `SelectQuery`.
    pub expressions: Vec<Expression>,
    /// Ordered; non-empty only for `SelectQuery`.
    pub project_vars: Vec<TermId>,
}

impl Operator {
    #[must_use]
    pub fn new(kind: OperatorKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            children: Vec::new(),
            triples: Vec::new(),
            expressions: Vec::new(),
            project_vars: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_children(mut self, children: Vec<Operator>) -> Self {
        self.children = children;
        self
    }

    #[must_use]
    pub fn with_triples(mut self, triples: Vec<Triple>) -> Self {
        self.triples = triples;
        self
    }

    #[must_use]
    pub fn with_expressions(mut self, expressions: Vec<Expression>) -> Self {
        self.expressions = expressions;
        self
    }

    #[must_use]
    pub fn with_project_vars(mut self, project_vars: Vec<TermId>) -> Self {
        self.project_vars = project_vars;
        self
    }

    /// Finds the single child tagged `name`, e.g. `p1`/`p2` of a `LeftJoin`.
    ///
    /// # Panics
    ///
    /// Panics if no child (or more than one) carries `name`: this is an
    /// internal shape invariant (spec §3: "Every `LeftJoin` has exactly two
    /// children, one named `p1`... and one named `p2`"), not a user-facing
    /// error condition, so a broken invariant here indicates a bug in the
    /// builder/rewriter rather than a malformed query.
    #[must_use]
    pub fn child_named(&self, name: &str) -> &Operator {
        let mut matches = self.children.iter().filter(|c| c.name == name);
        let found = matches
            .next()
            .unwrap_or_else(|| panic!("operator has no child named `{name}`"));
        assert!(
            matches.next().is_none(),
            "operator has more than one child named `{name}`"
        );
        found
    }

    /// Walks `self` and every descendant, innermost-first is not guaranteed;
    /// only pre-order is.
    pub fn walk_mut(&mut self, f: &mut impl FnMut(&mut Operator)) {
        f(self);
        for child in &mut self.children {
            child.walk_mut(f);
        }
    }

    pub fn walk(&self, f: &mut impl FnMut(&Operator)) {
        f(self);
        for child in &self.children {
            child.walk(f);
        }
    }
}
