mod fluent;

pub use fluent::{all, field, FluentConstraint};

use crate::common::Value;
use crate::connection::Document;
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};

/// Comparison operator applied by a single query constraint.
///
/// Defaults to [Operator::Eq], the operator the fluent builder produces for
/// plain field/value matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Operator {
    /// Field equals the value.
    #[default]
    Eq,
    /// Field differs from the value (also matches records lacking the field).
    Ne,
    /// Field is greater than the value.
    Gt,
    /// Field is greater than or equal to the value.
    Gte,
    /// Field is less than the value.
    Lt,
    /// Field is less than or equal to the value.
    Lte,
}

impl Display for Operator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Operator::Eq => write!(f, "=="),
            Operator::Ne => write!(f, "!="),
            Operator::Gt => write!(f, ">"),
            Operator::Gte => write!(f, ">="),
            Operator::Lt => write!(f, "<"),
            Operator::Lte => write!(f, "<="),
        }
    }
}

/// A single `(field, operator, value)` constraint.
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    field: String,
    op: Operator,
    value: Value,
}

impl Constraint {
    pub fn new(field: &str, op: Operator, value: Value) -> Self {
        Constraint {
            field: field.to_string(),
            op,
            value,
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn op(&self) -> Operator {
        self.op
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Combines this constraint with another into a conjunction.
    pub fn and(self, other: impl Into<Query>) -> Query {
        Query::from(self).and(other)
    }

    fn apply(&self, document: &Document) -> bool {
        let field_value = document.get(&self.field);
        match self.op {
            Operator::Eq => field_value == Some(&self.value),
            // absent fields count as "not equal", the way document stores do
            Operator::Ne => field_value != Some(&self.value),
            Operator::Gt => Self::ordered(field_value, &self.value, &[Ordering::Greater]),
            Operator::Gte => {
                Self::ordered(field_value, &self.value, &[Ordering::Greater, Ordering::Equal])
            }
            Operator::Lt => Self::ordered(field_value, &self.value, &[Ordering::Less]),
            Operator::Lte => {
                Self::ordered(field_value, &self.value, &[Ordering::Less, Ordering::Equal])
            }
        }
    }

    fn ordered(field_value: Option<&Value>, target: &Value, accept: &[Ordering]) -> bool {
        match field_value {
            Some(value) => match value.compare(target) {
                Some(ordering) => accept.contains(&ordering),
                // incomparable families never satisfy an ordering constraint
                None => false,
            },
            None => false,
        }
    }
}

impl Display for Constraint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.field, self.op, self.value)
    }
}

/// A predicate over stored records, built as a conjunction of field
/// constraints.
///
/// # Purpose
/// A `Query` selects records by their metadata and generated system fields.
/// It is built with the fluent API ([field], [all]) and evaluated by the
/// driver against each candidate document.
///
/// # Composition rules
/// Composition is associative and order-independent for distinct fields.
/// Adding a constraint with the same `(field, operator)` pair as an existing
/// one replaces it (last-write-wins).
///
/// # Examples
///
/// ```rust,ignore
/// use warehouse::query::{all, field};
///
/// let everything = all();
/// let scans = field("type").eq("scan");
/// let recent_scans = field("type").eq("scan").and(field("creation_time").gt(1_700_000_000_000i64));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    constraints: Vec<Constraint>,
}

impl Query {
    /// Creates an empty query, matching every record.
    pub fn new() -> Self {
        Query {
            constraints: Vec::new(),
        }
    }

    /// Adds a constraint to the conjunction.
    ///
    /// Constraints sharing the `(field, operator)` pair of an existing one
    /// replace it; constraints on distinct fields accumulate.
    pub fn and(mut self, other: impl Into<Query>) -> Self {
        for constraint in other.into().constraints {
            self.constraints
                .retain(|c| !(c.field == constraint.field && c.op == constraint.op));
            self.constraints.push(constraint);
        }
        self
    }

    /// Returns true when the query has no constraints.
    pub fn matches_everything(&self) -> bool {
        self.constraints.is_empty()
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Evaluates the conjunction against a document.
    pub fn matches(&self, document: &Document) -> bool {
        self.constraints.iter().all(|c| c.apply(document))
    }
}

impl From<Constraint> for Query {
    fn from(constraint: Constraint) -> Self {
        Query {
            constraints: vec![constraint],
        }
    }
}

impl Display for Query {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.constraints.is_empty() {
            return write!(f, "(all)");
        }
        let parts: Vec<String> = self.constraints.iter().map(|c| c.to_string()).collect();
        write!(f, "({})", parts.join(" && "))
    }
}
