use std::marker::PhantomData;

use crate::collection::record::StoredRecord;
use crate::connection::DocumentIter;
use crate::errors::WarehouseResult;
use crate::message::Message;

/// A lazy stream of query results.
///
/// Documents are pulled from the underlying connection one at a time as
/// the cursor is advanced; payload decoding happens per element, so a
/// record whose payload fails to decode yields an `Err` for that element
/// without poisoning the rest of the stream.
///
/// # Example
///
/// ```ignore
/// for record in collection.query(field("level").gt(3).into())? {
///     let record = record?;
///     println!("{}: {:?}", record.id(), record.metadata());
/// }
/// ```
pub struct QueryResults<M> {
    documents: DocumentIter,
    metadata_only: bool,
    phantom_data: PhantomData<M>,
}

impl<M: Message> QueryResults<M> {
    pub(crate) fn new(documents: DocumentIter, metadata_only: bool) -> QueryResults<M> {
        QueryResults {
            documents,
            metadata_only,
            phantom_data: PhantomData,
        }
    }

    /// Drains the cursor into a vector, failing on the first bad record.
    pub fn collect_all(self) -> WarehouseResult<Vec<StoredRecord<M>>> {
        self.collect()
    }
}

impl<M: Message> Iterator for QueryResults<M> {
    type Item = WarehouseResult<StoredRecord<M>>;

    fn next(&mut self) -> Option<Self::Item> {
        let document = match self.documents.next()? {
            Ok(document) => document,
            Err(e) => return Some(Err(e)),
        };
        Some(StoredRecord::from_document(document, self.metadata_only))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::constants::{CREATION_TIME, DOC_ID, PAYLOAD};
    use crate::connection::Document;
    use crate::errors::ErrorKind;

    #[derive(Debug, PartialEq, serde::Serialize, serde::Deserialize)]
    struct Sample {
        n: i64,
    }

    crate::warehouse_message!(Sample);

    fn stored(id: &str, n: i64) -> Document {
        let mut document = Document::new();
        document.put(DOC_ID, id).unwrap();
        document.put(CREATION_TIME, 1_i64).unwrap();
        document.put(PAYLOAD, Sample { n }.encode().unwrap()).unwrap();
        document
    }

    fn corrupt(id: &str) -> Document {
        let mut document = Document::new();
        document.put(DOC_ID, id).unwrap();
        document.put(PAYLOAD, vec![0xc1]).unwrap();
        document
    }

    #[test]
    fn test_lazy_decode_per_element() {
        let documents: DocumentIter =
            Box::new(vec![stored("a", 1), corrupt("b"), stored("c", 3)].into_iter().map(Ok));
        let mut results = QueryResults::<Sample>::new(documents, false);

        assert_eq!(
            results.next().unwrap().unwrap().message(),
            Some(&Sample { n: 1 })
        );
        // The bad record fails alone; the cursor keeps going.
        let bad = results.next().unwrap();
        assert_eq!(bad.unwrap_err().kind(), &ErrorKind::DecodeError);
        assert_eq!(
            results.next().unwrap().unwrap().message(),
            Some(&Sample { n: 3 })
        );
        assert!(results.next().is_none());
    }

    #[test]
    fn test_metadata_only_never_decodes() {
        let documents: DocumentIter = Box::new(vec![corrupt("a")].into_iter().map(Ok));
        let mut results = QueryResults::<Sample>::new(documents, true);
        let record = results.next().unwrap().unwrap();
        assert!(record.message().is_none());
    }

    #[test]
    fn test_collect_all_fails_on_first_bad_record() {
        let documents: DocumentIter =
            Box::new(vec![stored("a", 1), corrupt("b")].into_iter().map(Ok));
        let results = QueryResults::<Sample>::new(documents, false);
        assert!(results.collect_all().is_err());
    }
}
