use crate::common::sort_order::{SortOrder, SortSpec};

/// Options controlling how a query's results are fetched.
///
/// `metadata_only` skips payload decoding entirely; results carry no
/// message. `sort` orders results by a metadata field or a system field
/// such as `creation_time`.
#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    metadata_only: bool,
    sort: Option<SortSpec>,
    limit: Option<usize>,
}

impl FindOptions {
    pub fn new() -> Self {
        FindOptions::default()
    }

    /// Requests metadata-only results; payloads are neither fetched into
    /// memory nor decoded.
    pub fn metadata_only(mut self) -> Self {
        self.metadata_only = true;
        self
    }

    /// Sorts results by `field` in the given order.
    pub fn order_by(mut self, field: &str, order: SortOrder) -> Self {
        self.sort = Some(SortSpec::new(field, order));
        self
    }

    /// Caps the number of results returned.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn is_metadata_only(&self) -> bool {
        self.metadata_only
    }

    pub fn sort_spec(&self) -> Option<&SortSpec> {
        self.sort.as_ref()
    }

    pub fn limit_value(&self) -> Option<usize> {
        self.limit
    }
}
