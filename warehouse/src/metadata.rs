use crate::common::{Value, RESERVED_FIELDS, SYSTEM_PREFIX};
use crate::errors::{ErrorKind, WarehouseError, WarehouseResult};
use indexmap::IndexMap;
use std::fmt::{Debug, Formatter};

/// User-supplied key/value tags attached to a stored message.
///
/// # Purpose
/// Metadata tags stored messages so they can be queried without touching the
/// message payload. It is an ordered mapping from field name to scalar
/// [Value]; keys are unique and insertion order is preserved.
///
/// # Reserved keys
/// Keys that name a persisted system field (`_id`, `creation_time`,
/// `payload`, `payload_type_fingerprint`) or start with the system prefix
/// `_` are generated by the warehouse and are never user-settable; `put`
/// rejects them with [ErrorKind::InvalidMetadata].
///
/// # Examples
///
/// ```rust,ignore
/// use warehouse::metadata::Metadata;
///
/// let mut meta = Metadata::new();
/// meta.put("type", "scan")?;
/// meta.put("width", 640)?;
///
/// // or with the macro
/// let meta = warehouse::metadata! { "type": "scan", "width": 640 };
/// ```
#[derive(Clone, Default, PartialEq)]
pub struct Metadata {
    fields: IndexMap<String, Value>,
}

impl Metadata {
    /// Creates an empty metadata mapping.
    pub fn new() -> Self {
        Metadata {
            fields: IndexMap::new(),
        }
    }

    /// Sets a metadata field, replacing any previous value for the key.
    ///
    /// # Errors
    ///
    /// Returns [ErrorKind::InvalidMetadata] when the key is empty, names a
    /// system field, or starts with the reserved system prefix.
    pub fn put<T: Into<Value>>(&mut self, key: &str, value: T) -> WarehouseResult<()> {
        Self::validate_key(key)?;
        self.fields.insert(key.to_string(), value.into());
        Ok(())
    }

    /// Gets the value for a key, if present.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
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

    /// Merges `patch` into this metadata: keys present in the patch
    /// overwrite, keys absent from the patch are preserved.
    pub fn merge(&mut self, patch: &Metadata) {
        for (key, value) in patch.iter() {
            self.fields.insert(key.to_string(), value.clone());
        }
    }

    /// Builds metadata from stored document fields, skipping every system
    /// field. Used when re-hydrating a stored record.
    pub(crate) fn from_stored_fields<'a>(
        fields: impl Iterator<Item = (&'a str, &'a Value)>,
    ) -> Metadata {
        let mut metadata = Metadata::new();
        for (key, value) in fields {
            if Self::is_reserved_key(key) {
                continue;
            }
            metadata.fields.insert(key.to_string(), value.clone());
        }
        metadata
    }

    pub(crate) fn is_reserved_key(key: &str) -> bool {
        key.starts_with(SYSTEM_PREFIX) || RESERVED_FIELDS.contains(&key)
    }

    fn validate_key(key: &str) -> WarehouseResult<()> {
        if key.is_empty() {
            log::error!("Metadata does not support empty keys");
            return Err(WarehouseError::new(
                "Metadata does not support empty keys",
                ErrorKind::InvalidMetadata,
            ));
        }
        if Self::is_reserved_key(key) {
            log::error!("Metadata key '{}' is reserved for system fields", key);
            return Err(WarehouseError::new(
                &format!("Metadata key '{}' is reserved for system fields", key),
                ErrorKind::InvalidMetadata,
            ));
        }
        Ok(())
    }
}

impl Debug for Metadata {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.fields.iter()).finish()
    }
}

/// Creates a [Metadata] value from `key: value` pairs.
///
/// Panics when a key is reserved; intended for literal metadata where keys
/// are known at the call site.
///
/// ```rust,ignore
/// let meta = metadata! { "type": "scan", "priority": 3 };
/// ```
#[macro_export]
macro_rules! metadata {
    () => {
        $crate::metadata::Metadata::new()
    };

    ($($key:tt : $value:expr),* $(,)?) => {
        {
            let mut metadata = $crate::metadata::Metadata::new();
            $(
                metadata.put($key, $value)
                    .expect(&format!("Failed to put metadata key {}", stringify!($key)));
            )*
            metadata
        }
    };
}
