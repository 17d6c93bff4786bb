use rustc_hash::FxHashMap;
use std::fmt;

/// A role constraint inferred for a [`Term`] from the verbs it participates in.
///
/// See `spec.md` §3 "Term". Constraints are accumulated, never removed: once a
/// pass adds one, later passes may add more but nothing ever clears it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Constraint {
    UaVariableValue,
    ExternalUaVariableValue,
    Timestamp,
    DataValue,
    ExternalDataValue,
}

/// The underlying value of an interned [`Term`].
///
/// Two terms are the same term iff their `TermValue` is equal; this is what
/// [`TermArena::intern`] interns on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TermValue {
    Variable(String),
    Iri(String),
    /// Lexical form plus an optional datatype IRI. The baseline emitter only
    /// supports literals with no datatype (spec §4.3); literals with a
    /// datatype are still modeled so that `UNSUPPORTED_LITERAL` can be raised
    /// with a precise message instead of being rejected earlier than the spec
    /// asks for.
    Literal {
        lexical: String,
        datatype: Option<String>,
    },
    /// An IRI used as a triple's verb together with a `+`/`*` multiplicity
    /// modifier, e.g. `<...functionalAspect>+` (spec §4.3).
    Path { iri: String, modifier: PathModifier },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathModifier {
    /// `+` - one or more.
    OneOrMore,
    /// `*` - zero or more.
    ZeroOrMore,
}

impl PathModifier {
    pub fn as_sparql_suffix(self) -> &'static str {
        match self {
            PathModifier::OneOrMore => "+",
            PathModifier::ZeroOrMore => "*",
        }
    }
}

/// A stable index into a [`TermArena`], standing in for object-identity in the
/// source's Python term model (spec §9: "model this as an arena...with terms
/// addressed by stable indices").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TermId(u32);

impl TermId {
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TermId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// Interning arena for [`TermValue`]s plus their mutable [`Constraint`] sets.
///
/// A single arena is threaded through the whole pipeline: the original
/// algebra tree, the rewritten (disposable) tree used only for SPARQL
/// emission, and the back-propagation / planning passes all address terms by
/// [`TermId`] into this same arena. Because term identity here is by-value
/// (interning), sharing one arena across the original and rewritten trees is
/// safe: the rewritten tree never has constraints mutated on it again after
/// it is emitted to text, so there is nothing for the two trees to clobber
/// in each other (see DESIGN.md).
#[derive(Debug, Default)]
pub struct TermArena {
    values: Vec<TermValue>,
    constraints: Vec<Vec<Constraint>>,
    by_value: FxHashMap<TermValue, TermId>,
}

impl TermArena {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the existing id for `value` if already interned, otherwise
    /// allocates a fresh one with an empty constraint set.
    pub fn intern(&mut self, value: TermValue) -> TermId {
        if let Some(id) = self.by_value.get(&value) {
            return *id;
        }
        let id = TermId(self.values.len() as u32);
        self.by_value.insert(value.clone(), id);
        self.values.push(value);
        self.constraints.push(Vec::new());
        id
    }

    /// Interns a fresh variable derived deterministically from `base`'s
    /// lexical name, e.g. `?val` + `_signal_id` -> `?val_signal_id`.
    ///
    /// Per spec §5's ordering guarantee, surrogate names must be derived from
    /// the underlying variable name alone, never from visit order, so that
    /// re-running the splitter on the same query is reproducible.
    pub fn intern_derived_variable(&mut self, base: TermId, suffix: &str) -> TermId {
        let name = match self.value(base) {
            TermValue::Variable(name) => format!("{name}{suffix}"),
            other => panic!("derived variable requested from non-variable term {other:?}"),
        };
        self.intern(TermValue::Variable(name))
    }

    #[must_use]
    pub fn value(&self, id: TermId) -> &TermValue {
        &self.values[id.index()]
    }

    #[must_use]
    pub fn constraints(&self, id: TermId) -> &[Constraint] {
        &self.constraints[id.index()]
    }

    #[must_use]
    pub fn has_constraint(&self, id: TermId, constraint: Constraint) -> bool {
        self.constraints[id.index()].contains(&constraint)
    }

    /// Unions `constraint` into `id`'s constraint set. Monotonic: a no-op if
    /// already present (spec §3 invariant: "passes only add constraints").
    ///
    /// Returns `true` if the constraint was newly added, which the
    /// fixpoint-driving inferencer uses to detect convergence.
    pub fn add_constraint(&mut self, id: TermId, constraint: Constraint) -> bool {
        let set = &mut self.constraints[id.index()];
        if set.contains(&constraint) {
            false
        } else {
            set.push(constraint);
            true
        }
    }

    #[must_use]
    pub fn variable_name(&self, id: TermId) -> Option<&str> {
        match self.value(id) {
            TermValue::Variable(name) => Some(name),
            _ => None,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
