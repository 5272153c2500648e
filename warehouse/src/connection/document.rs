use crate::common::Value;
use crate::errors::{ErrorKind, WarehouseError, WarehouseResult};
use indexmap::IndexMap;
use std::fmt::{Debug, Formatter};

/// A flat field/value mapping, the unit of storage exchanged with the driver.
///
/// # Purpose
/// A `Document` is the store-agnostic persisted shape of a record: generated
/// system fields, user metadata fields, and the binary payload, all as named
/// [Value]s. Field insertion order is preserved.
///
/// Documents are deliberately flat; the warehouse does not nest documents.
#[derive(Clone, Default, PartialEq)]
pub struct Document {
    fields: IndexMap<String, Value>,
}

impl Document {
    pub fn new() -> Self {
        Document {
            fields: IndexMap::new(),
        }
    }

    /// Sets a field, replacing any previous value for the key.
    ///
    /// # Errors
    ///
    /// Returns [ErrorKind::StorageError] when the key is empty.
    pub fn put<T: Into<Value>>(&mut self, key: &str, value: T) -> WarehouseResult<()> {
        if key.is_empty() {
            log::error!("Document does not support empty keys");
            return Err(WarehouseError::new(
                "Document does not support empty keys",
                ErrorKind::StorageError,
            ));
        }
        self.fields.insert(key.to_string(), value.into());
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.shift_remove(key)
    }

    pub fn contains_field(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates over `(key, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Merges `patch` into this document by key: keys in the patch overwrite,
    /// keys absent from the patch are preserved.
    pub fn merge(&mut self, patch: &Document) {
        for (key, value) in patch.iter() {
            self.fields.insert(key.to_string(), value.clone());
        }
    }
}

impl Debug for Document {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.fields.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_get_remove() {
        let mut doc = Document::new();
        doc.put("name", "scan").unwrap();
        doc.put("count", 3).unwrap();

        assert_eq!(doc.get("name"), Some(&Value::from("scan")));
        assert_eq!(doc.len(), 2);
        assert_eq!(doc.remove("name"), Some(Value::from("scan")));
        assert!(!doc.contains_field("name"));
    }

    #[test]
    fn test_empty_key_rejected() {
        let mut doc = Document::new();
        let result = doc.put("", 1);
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().kind(), &ErrorKind::StorageError);
    }

    #[test]
    fn test_merge_semantics() {
        let mut doc = Document::new();
        doc.put("a", 1).unwrap();
        doc.put("b", 2).unwrap();

        let mut patch = Document::new();
        patch.put("b", 20).unwrap();
        patch.put("c", 30).unwrap();

        doc.merge(&patch);

        assert_eq!(doc.get("a"), Some(&Value::I64(1)));
        assert_eq!(doc.get("b"), Some(&Value::I64(20)));
        assert_eq!(doc.get("c"), Some(&Value::I64(30)));
    }

    #[test]
    fn test_field_order_preserved() {
        let mut doc = Document::new();
        doc.put("z", 1).unwrap();
        doc.put("a", 2).unwrap();
        let keys: Vec<&str> = doc.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["z", "a"]);
    }
}
