use crate::common::Value;
use crate::query::{Constraint, Operator, Query};

/// Creates a fluent constraint builder for the specified field name.
///
/// The returned builder provides methods for equality and relational
/// comparison; each produces a [Constraint] that composes into a [Query]
/// via `and` or `Into<Query>`.
///
/// # Examples
///
/// ```rust,ignore
/// use warehouse::query::field;
///
/// let scans = field("type").eq("scan");
/// let large = field("width").gte(1024);
/// ```
pub fn field(field_name: &str) -> FluentConstraint {
    FluentConstraint {
        field_name: field_name.to_string(),
    }
}

/// Creates a query matching every record.
pub fn all() -> Query {
    Query::new()
}

/// A fluent builder for constructing constraints on a specific field.
pub struct FluentConstraint {
    field_name: String,
}

impl FluentConstraint {
    /// Matches records where the field equals the value.
    #[inline]
    pub fn eq<T: Into<Value>>(self, value: T) -> Constraint {
        Constraint::new(&self.field_name, Operator::Eq, value.into())
    }

    /// Matches records where the field differs from the value.
    #[inline]
    pub fn ne<T: Into<Value>>(self, value: T) -> Constraint {
        Constraint::new(&self.field_name, Operator::Ne, value.into())
    }

    /// Matches records where the field is greater than the value.
    #[inline]
    pub fn gt<T: Into<Value>>(self, value: T) -> Constraint {
        Constraint::new(&self.field_name, Operator::Gt, value.into())
    }

    /// Matches records where the field is greater than or equal to the value.
    #[inline]
    pub fn gte<T: Into<Value>>(self, value: T) -> Constraint {
        Constraint::new(&self.field_name, Operator::Gte, value.into())
    }

    /// Matches records where the field is less than the value.
    #[inline]
    pub fn lt<T: Into<Value>>(self, value: T) -> Constraint {
        Constraint::new(&self.field_name, Operator::Lt, value.into())
    }

    /// Matches records where the field is less than or equal to the value.
    #[inline]
    pub fn lte<T: Into<Value>>(self, value: T) -> Constraint {
        Constraint::new(&self.field_name, Operator::Lte, value.into())
    }
}
