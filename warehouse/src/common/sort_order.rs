/// Specifies the direction for sorting query results.
///
/// # Purpose
/// Defines whether matching records should be returned in ascending (low to
/// high) or descending (high to low) order of the sort field. Used in find
/// options to control result ordering; without a sort specification the
/// relative order of results is store-defined.
///
/// # Characteristics
/// - **Copy**: Can be copied instead of cloned
/// - **Comparable**: Can be compared for equality
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Sort in ascending order (smallest to largest, A-Z, oldest to newest)
    Ascending,
    /// Sort in descending order (largest to smallest, Z-A, newest to oldest)
    Descending,
}

/// A sort specification: the field to order by and the direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    field: String,
    order: SortOrder,
}

impl SortSpec {
    pub fn new(field: &str, order: SortOrder) -> Self {
        SortSpec {
            field: field.to_string(),
            order,
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn order(&self) -> SortOrder {
        self.order
    }

    pub fn ascending(&self) -> bool {
        self.order == SortOrder::Ascending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_spec_accessors() {
        let spec = SortSpec::new("creation_time", SortOrder::Descending);
        assert_eq!(spec.field(), "creation_time");
        assert_eq!(spec.order(), SortOrder::Descending);
        assert!(!spec.ascending());
    }
}
