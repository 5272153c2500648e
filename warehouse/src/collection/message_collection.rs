use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, warn};
use uuid::Uuid;

use crate::collection::cursor::QueryResults;
use crate::collection::event::{InsertEventInfo, InsertEventListener};
use crate::collection::find_options::FindOptions;
use crate::collection::record::{RecordId, StoredRecord};
use crate::common::constants::{
    CREATION_TIME, DOC_ID, META_COLLECTION, PAYLOAD, PAYLOAD_TYPE_FINGERPRINT,
};
use crate::common::event_bus::{SubscriberRef, WarehouseEventBus};
use crate::common::util::current_time_millis;
use crate::connection::{Connection, ConnectionConfig, Document, Namespace};
use crate::errors::{ErrorKind, WarehouseError, WarehouseResult};
use crate::memory::MemoryConnection;
use crate::message::Message;
use crate::metadata::Metadata;
use crate::query::{all, Query};

/// A typed collection of messages with queryable metadata.
///
/// Each inserted message is encoded to a binary payload and stored in a
/// document together with its metadata fields, a generated id and an
/// insertion timestamp. Queries match against metadata; payloads are
/// decoded lazily as results are iterated.
///
/// The handle is cheap to clone and shares its connection and event bus
/// across clones.
///
/// # Example
///
/// ```ignore
/// let scans: MessageCollection<LaserScan> =
///     MessageCollection::open("robot_db", "scans", &ConnectionConfig::new())?;
///
/// scans.insert(&scan, metadata! { "station": "dock", "sweep": 42 })?;
///
/// for record in scans.query(field("sweep").gte(40))? {
///     let record = record?;
///     process(record.message());
/// }
/// ```
pub struct MessageCollection<M> {
    inner: Arc<MessageCollectionInner<M>>,
}

impl<M> std::fmt::Debug for MessageCollection<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageCollection")
            .field("namespace", &self.inner.namespace)
            .finish_non_exhaustive()
    }
}

impl<M> Clone for MessageCollection<M> {
    fn clone(&self) -> Self {
        MessageCollection {
            inner: self.inner.clone(),
        }
    }
}

struct MessageCollectionInner<M> {
    connection: Connection,
    namespace: Namespace,
    meta_namespace: Namespace,
    event_bus: WarehouseEventBus<InsertEventInfo, InsertEventListener>,
    fingerprint_matches: bool,
    meta_written: AtomicBool,
    phantom_data: PhantomData<M>,
}

impl<M: Message> MessageCollection<M> {
    /// Connects to the configured endpoint and opens the collection.
    ///
    /// Blocks until the endpoint is reachable or the configured timeout
    /// elapses, in which case a `ConnectionFailed` error is returned.
    pub fn open(
        database: &str,
        collection: &str,
        config: &ConnectionConfig,
    ) -> WarehouseResult<MessageCollection<M>> {
        let connection = MemoryConnection::connect(config)?;
        Self::open_with_connection(connection, database, collection)
    }

    /// Opens the collection over an existing connection.
    pub fn open_with_connection(
        connection: Connection,
        database: &str,
        collection: &str,
    ) -> WarehouseResult<MessageCollection<M>> {
        let namespace = Namespace::new(database, collection);
        let meta_namespace = namespace.meta();

        // The identifier and creation-time indexes always exist.
        Self::ensure_index_on(&connection, &namespace, DOC_ID)?;
        Self::ensure_index_on(&connection, &namespace, CREATION_TIME)?;

        let stored_fingerprint = Self::read_stored_fingerprint(&connection, &meta_namespace)?;
        let fingerprint_matches = match &stored_fingerprint {
            Some(stored) => {
                let current = M::type_fingerprint();
                if stored != &current {
                    warn!(
                        "collection {} was created with payload fingerprint {} but the \
                         current type has {}",
                        namespace, stored, current
                    );
                }
                stored == &current
            }
            None => true,
        };

        debug!("opened collection {}", namespace);
        Ok(MessageCollection {
            inner: Arc::new(MessageCollectionInner {
                connection,
                namespace,
                meta_namespace,
                event_bus: WarehouseEventBus::new(),
                fingerprint_matches,
                meta_written: AtomicBool::new(stored_fingerprint.is_some()),
                phantom_data: PhantomData,
            }),
        })
    }

    fn read_stored_fingerprint(
        connection: &Connection,
        meta_namespace: &Namespace,
    ) -> WarehouseResult<Option<String>> {
        let mut results = connection.find(meta_namespace, &all(), None, Some(1))?;
        match results.next() {
            Some(document) => Ok(document?
                .get(PAYLOAD_TYPE_FINGERPRINT)
                .and_then(|value| value.as_str())
                .map(|s| s.to_string())),
            None => Ok(None),
        }
    }

    /// Name of the collection within its database.
    pub fn name(&self) -> &str {
        self.inner.namespace.collection()
    }

    /// Name of the database holding the collection.
    pub fn database(&self) -> &str {
        self.inner.namespace.database()
    }

    /// Inserts a message with the given metadata, returning the generated
    /// record id.
    ///
    /// Metadata keys must not collide with system fields; [Metadata::put]
    /// enforces this at construction time. Registered insert listeners are
    /// notified best-effort after the write: a failing listener is logged
    /// and does not fail the insert.
    pub fn insert(&self, message: &M, metadata: Metadata) -> WarehouseResult<RecordId> {
        let payload = message.encode()?;
        let record_id = RecordId::generate();

        let mut document = Document::new();
        document.put(DOC_ID, record_id.as_str())?;
        document.put(CREATION_TIME, current_time_millis())?;
        for (key, value) in metadata.iter() {
            document.put(key, value.clone())?;
        }
        document.put(PAYLOAD, payload)?;

        self.inner
            .connection
            .insert_document(&self.inner.namespace, document)?;
        self.write_meta_once()?;

        self.notify_insert(&record_id, metadata);
        Ok(record_id)
    }

    // The fingerprint of the first inserted message's type is recorded in
    // the collection's meta namespace so later opens can detect a type
    // change. The flag is latched only once the meta document is known to
    // exist, so a failed write is retried on the next insert.
    fn write_meta_once(&self) -> WarehouseResult<()> {
        if self.inner.meta_written.load(Ordering::SeqCst) {
            return Ok(());
        }
        // Another handle on the same collection may have recorded the
        // fingerprint in the meantime.
        if Self::read_stored_fingerprint(&self.inner.connection, &self.inner.meta_namespace)?
            .is_some()
        {
            self.inner.meta_written.store(true, Ordering::SeqCst);
            return Ok(());
        }
        let mut meta = Document::new();
        meta.put(DOC_ID, Self::meta_document_id(&self.inner.namespace))?;
        meta.put(META_COLLECTION, self.inner.namespace.collection())?;
        meta.put(PAYLOAD_TYPE_FINGERPRINT, M::type_fingerprint())?;
        self.inner
            .connection
            .insert_document(&self.inner.meta_namespace, meta)?;
        self.inner.meta_written.store(true, Ordering::SeqCst);
        Ok(())
    }

    // The meta document id is derived from the namespace, so handles racing
    // on the first insert write the same document instead of duplicates.
    fn meta_document_id(namespace: &Namespace) -> String {
        Uuid::new_v5(&Uuid::NAMESPACE_OID, namespace.to_string().as_bytes()).to_string()
    }

    fn notify_insert(&self, record_id: &RecordId, metadata: Metadata) {
        if !self.inner.event_bus.has_listeners() {
            return;
        }
        let info = InsertEventInfo::new(record_id.clone(), &self.inner.namespace, metadata);
        if let Err(e) = self.inner.event_bus.publish(info) {
            warn!(
                "insert listener failed for record {} in {}: {}",
                record_id, self.inner.namespace, e
            );
        }
    }

    /// Runs a query, returning a lazy cursor over matching records.
    pub fn query(&self, query: impl Into<Query>) -> WarehouseResult<QueryResults<M>> {
        self.query_with_options(query, FindOptions::new())
    }

    /// Runs a query with explicit fetch options.
    pub fn query_with_options(
        &self,
        query: impl Into<Query>,
        options: FindOptions,
    ) -> WarehouseResult<QueryResults<M>> {
        let query = query.into();
        let documents = self.inner.connection.find(
            &self.inner.namespace,
            &query,
            options.sort_spec(),
            options.limit_value(),
        )?;
        Ok(QueryResults::new(documents, options.is_metadata_only()))
    }

    /// Runs a query and collects every matching record eagerly.
    pub fn pull_all(&self, query: impl Into<Query>) -> WarehouseResult<Vec<StoredRecord<M>>> {
        self.query(query)?.collect_all()
    }

    /// Returns the single record matching `query`, or a `NoMatch` error if
    /// nothing matches. When several records match, which one is returned
    /// is unspecified unless `options` carries a sort.
    pub fn find_one(
        &self,
        query: impl Into<Query>,
        options: FindOptions,
    ) -> WarehouseResult<StoredRecord<M>> {
        let query = query.into();
        let mut results = self.query_with_options(query.clone(), options.limit(1))?;
        match results.next() {
            Some(record) => record,
            None => Err(WarehouseError::new(
                &format!("No record matches {}", query),
                ErrorKind::NoMatch,
            )),
        }
    }

    /// Removes every record matching `query`, returning how many were
    /// removed. Matching nothing is not an error.
    pub fn remove_messages(&self, query: impl Into<Query>) -> WarehouseResult<u64> {
        let query = query.into();
        let removed = self.inner.connection.remove(&self.inner.namespace, &query)?;
        debug!(
            "removed {} records from {} matching {}",
            removed, self.inner.namespace, query
        );
        Ok(removed)
    }

    /// Ensures an index exists on a metadata field. Idempotent; returns
    /// `&Self` so calls can be chained.
    pub fn ensure_index(&self, field: &str) -> WarehouseResult<&Self> {
        Self::ensure_index_on(&self.inner.connection, &self.inner.namespace, field)?;
        Ok(self)
    }

    fn ensure_index_on(
        connection: &Connection,
        namespace: &Namespace,
        field: &str,
    ) -> WarehouseResult<()> {
        connection.ensure_index(namespace, field).map_err(|e| {
            WarehouseError::new_with_cause(
                &format!("Failed to index {} on {}", field, namespace),
                ErrorKind::IndexingError,
                e,
            )
        })
    }

    /// Merges `patch` into the metadata of the first record matching
    /// `query`. Fields in the patch overwrite existing values; fields not
    /// named are preserved. Fails with `NoMatch` if nothing matches.
    ///
    /// The find and the update are not atomic with respect to concurrent
    /// writers.
    pub fn modify_metadata(
        &self,
        query: impl Into<Query>,
        patch: &Metadata,
    ) -> WarehouseResult<()> {
        let query = query.into();
        let mut update = Document::new();
        for (key, value) in patch.iter() {
            update.put(key, value.clone())?;
        }
        let updated =
            self.inner
                .connection
                .update_first(&self.inner.namespace, &query, &update)?;
        if updated == 0 {
            return Err(WarehouseError::new(
                &format!("No record matches {}", query),
                ErrorKind::NoMatch,
            ));
        }
        Ok(())
    }

    /// Number of records currently stored in the collection.
    pub fn count(&self) -> WarehouseResult<u64> {
        self.inner.connection.count(&self.inner.namespace)
    }

    /// Whether the payload fingerprint recorded at the collection's first
    /// insert matches the current message type. A mismatch is a warning
    /// sign, not an error; operations remain available.
    pub fn type_signature_matches(&self) -> bool {
        self.inner.fingerprint_matches
    }

    /// Registers a listener notified after every successful insert through
    /// this handle or any clone of it.
    pub fn subscribe(&self, listener: InsertEventListener) -> WarehouseResult<Option<SubscriberRef>> {
        self.inner.event_bus.register(listener)
    }

    /// Removes a previously registered insert listener.
    pub fn unsubscribe(&self, subscriber: SubscriberRef) -> WarehouseResult<()> {
        self.inner.event_bus.deregister(subscriber)
    }

    /// Drops the collection's records and its recorded type fingerprint.
    pub fn drop_collection(&self) -> WarehouseResult<()> {
        self.inner.connection.drop_namespace(&self.inner.namespace)?;
        self.inner
            .connection
            .drop_namespace(&self.inner.meta_namespace)?;
        self.inner.meta_written.store(false, Ordering::SeqCst);
        debug!("dropped collection {}", self.inner.namespace);
        Ok(())
    }
}
