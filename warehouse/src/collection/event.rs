use std::fmt::Debug;
use std::sync::Arc;

use anyhow::Error;
use basu::error::BasuError;
use basu::event::Event;
use basu::Handle;

use crate::collection::record::RecordId;
use crate::common::util::current_time_millis;
use crate::connection::Namespace;
use crate::errors::WarehouseResult;
use crate::metadata::Metadata;

/// Notification payload describing a completed insert.
///
/// Listeners receive the record's identifier and metadata but not the
/// message payload; a listener that needs the payload can fetch the
/// record by id.
///
/// # Usage
///
/// ```ignore
/// collection.subscribe(InsertEventListener::new(|event| {
///     println!("inserted {} into {}", event.record_id(), event.collection());
///     Ok(())
/// }))?;
/// ```
#[derive(Clone)]
pub struct InsertEventInfo {
    inner: Arc<InsertEventInner>,
}

struct InsertEventInner {
    record_id: RecordId,
    database: String,
    collection: String,
    topic: String,
    metadata: Metadata,
    timestamp: i64,
}

impl InsertEventInfo {
    pub(crate) fn new(record_id: RecordId, namespace: &Namespace, metadata: Metadata) -> Self {
        InsertEventInfo {
            inner: Arc::new(InsertEventInner {
                record_id,
                database: namespace.database().to_string(),
                collection: namespace.collection().to_string(),
                topic: format!("{}/{}/inserts", namespace.database(), namespace.collection()),
                metadata,
                timestamp: current_time_millis(),
            }),
        }
    }

    /// Identifier of the inserted record.
    pub fn record_id(&self) -> &RecordId {
        &self.inner.record_id
    }

    /// Name of the database holding the collection.
    pub fn database(&self) -> &str {
        &self.inner.database
    }

    /// Name of the collection the record was inserted into.
    pub fn collection(&self) -> &str {
        &self.inner.collection
    }

    /// Notification topic in `<database>/<collection>/inserts` form,
    /// distinguishing equally named collections in different databases.
    pub fn topic(&self) -> &str {
        &self.inner.topic
    }

    /// Metadata stored with the record.
    pub fn metadata(&self) -> &Metadata {
        &self.inner.metadata
    }

    /// Event creation time in milliseconds since the Unix epoch.
    pub fn timestamp(&self) -> i64 {
        self.inner.timestamp
    }
}

impl Debug for InsertEventInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InsertEventInfo")
            .field("record_id", &self.record_id())
            .field("topic", &self.topic())
            .field("metadata", &self.metadata())
            .field("timestamp", &self.timestamp())
            .finish()
    }
}

/// Trait for closure-based insert event handlers.
///
/// Any closure with the signature
/// `Fn(InsertEventInfo) -> WarehouseResult<()>` implements this trait.
pub trait InsertEventCallback: Send + Sync + Fn(InsertEventInfo) -> WarehouseResult<()> {}

impl<F> InsertEventCallback for F where F: Send + Sync + Fn(InsertEventInfo) -> WarehouseResult<()> {}

/// Listener for insert notifications.
///
/// Wraps an event handler callback for registration with
/// [MessageCollection::subscribe].
///
/// [MessageCollection::subscribe]: crate::collection::MessageCollection::subscribe
#[derive(Clone)]
pub struct InsertEventListener {
    on_event: Arc<dyn InsertEventCallback>,
}

impl InsertEventListener {
    pub fn new(on_event: impl InsertEventCallback + 'static) -> Self {
        InsertEventListener {
            on_event: Arc::new(on_event),
        }
    }
}

impl Handle<InsertEventInfo> for InsertEventListener {
    fn handle(&self, event: &Event<InsertEventInfo>) -> Result<(), BasuError> {
        match (self.on_event)(event.data.clone()) {
            Ok(_) => Ok(()),
            Err(e) => Err(BasuError::HandlerError(Error::from(e))),
        }
    }
}

impl Debug for InsertEventListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InsertEventListener").finish()
    }
}
