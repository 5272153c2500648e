use std::fmt::{Display, Formatter};

use uuid::Uuid;

use crate::common::constants::{CREATION_TIME, DOC_ID, PAYLOAD};
use crate::common::value::Value;
use crate::connection::Document;
use crate::errors::{ErrorKind, WarehouseError, WarehouseResult};
use crate::message::Message;
use crate::metadata::Metadata;

/// Unique identifier of a stored record, assigned at insert time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordId {
    id: String,
}

impl RecordId {
    /// Generates a fresh random identifier.
    pub(crate) fn generate() -> RecordId {
        RecordId {
            id: Uuid::new_v4().to_string(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.id
    }
}

impl Display for RecordId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id)
    }
}

/// A message retrieved from a collection, paired with its metadata.
///
/// The payload is decoded eagerly unless the query that produced this
/// record asked for metadata only, in which case [StoredRecord::message]
/// is `None`.
#[derive(Debug)]
pub struct StoredRecord<M> {
    id: RecordId,
    creation_time: i64,
    metadata: Metadata,
    message: Option<M>,
}

impl<M: Message> StoredRecord<M> {
    /// The record's unique identifier.
    pub fn id(&self) -> &RecordId {
        &self.id
    }

    /// Insertion timestamp in milliseconds since the Unix epoch.
    pub fn creation_time(&self) -> i64 {
        self.creation_time
    }

    /// The user-supplied metadata stored alongside the payload.
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// The decoded message, or `None` for a metadata-only result.
    pub fn message(&self) -> Option<&M> {
        self.message.as_ref()
    }

    /// Consumes the record, returning the decoded message.
    pub fn into_message(self) -> WarehouseResult<M> {
        self.message.ok_or_else(|| {
            WarehouseError::new(
                "Record was fetched metadata-only and carries no payload",
                ErrorKind::NoMatch,
            )
        })
    }

    /// Reconstructs a record from its persisted document, decoding the
    /// payload unless `metadata_only` is set.
    pub(crate) fn from_document(
        document: Document,
        metadata_only: bool,
    ) -> WarehouseResult<StoredRecord<M>> {
        let id = match document.get(DOC_ID).and_then(Value::as_str) {
            Some(id) => RecordId { id: id.to_string() },
            None => {
                return Err(WarehouseError::new(
                    "Stored document has no record id",
                    ErrorKind::StorageError,
                ))
            }
        };

        let creation_time = document
            .get(CREATION_TIME)
            .and_then(Value::as_i64)
            .unwrap_or(0);

        let message = if metadata_only {
            None
        } else {
            let payload = document.get(PAYLOAD).and_then(Value::as_bytes).ok_or_else(|| {
                WarehouseError::new(
                    &format!("Stored document {} has no payload", id),
                    ErrorKind::StorageError,
                )
            })?;
            Some(M::decode(payload)?)
        };

        let metadata = Metadata::from_stored_fields(document.iter());

        Ok(StoredRecord {
            id,
            creation_time,
            metadata,
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata;

    #[derive(Debug, PartialEq, serde::Serialize, serde::Deserialize)]
    struct Reading {
        value: f64,
    }

    crate::warehouse_message!(Reading);

    fn stored_document() -> Document {
        let mut document = Document::new();
        document.put(DOC_ID, "rec-1").unwrap();
        document.put(CREATION_TIME, 1700000000000_i64).unwrap();
        document.put("station", "alpha").unwrap();
        document
            .put(PAYLOAD, Reading { value: 4.2 }.encode().unwrap())
            .unwrap();
        document
    }

    #[test]
    fn test_from_document_decodes_payload() {
        let record = StoredRecord::<Reading>::from_document(stored_document(), false).unwrap();
        assert_eq!(record.id().as_str(), "rec-1");
        assert_eq!(record.creation_time(), 1700000000000);
        assert_eq!(
            record.metadata().get("station"),
            Some(&Value::from("alpha"))
        );
        assert_eq!(record.message(), Some(&Reading { value: 4.2 }));
    }

    #[test]
    fn test_metadata_only_skips_payload() {
        let mut document = stored_document();
        // A corrupt payload must not matter when only metadata is requested.
        document.put(PAYLOAD, vec![0xff, 0xff]).unwrap();
        let record = StoredRecord::<Reading>::from_document(document, true).unwrap();
        assert!(record.message().is_none());
        assert_eq!(
            record.metadata().get("station"),
            Some(&Value::from("alpha"))
        );
    }

    #[test]
    fn test_metadata_excludes_reserved_fields() {
        let record = StoredRecord::<Reading>::from_document(stored_document(), false).unwrap();
        assert!(record.metadata().get(DOC_ID).is_none());
        assert!(record.metadata().get(CREATION_TIME).is_none());
        assert!(record.metadata().get(PAYLOAD).is_none());
        let expected = metadata! { "station": "alpha" };
        assert_eq!(record.metadata(), &expected);
    }

    #[test]
    fn test_missing_payload_is_storage_error() {
        let mut document = Document::new();
        document.put(DOC_ID, "rec-2").unwrap();
        let result = StoredRecord::<Reading>::from_document(document, false);
        assert_eq!(result.unwrap_err().kind(), &ErrorKind::StorageError);
    }

    #[test]
    fn test_into_message_on_metadata_only_fails() {
        let record = StoredRecord::<Reading>::from_document(stored_document(), true).unwrap();
        assert!(record.into_message().is_err());
    }
}
