mod config;
mod document;

pub use config::ConnectionConfig;
pub use document::Document;

use crate::common::SortSpec;
use crate::common::META_SUFFIX;
use crate::errors::WarehouseResult;
use crate::query::Query;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::sync::Arc;

/// Identifies a collection inside a database on the underlying store.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Namespace {
    database: String,
    collection: String,
}

impl Namespace {
    pub fn new(database: &str, collection: &str) -> Self {
        Namespace {
            database: database.to_string(),
            collection: collection.to_string(),
        }
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// The companion namespace holding this collection's meta document
    /// (the recorded payload type fingerprint).
    pub fn meta(&self) -> Namespace {
        Namespace {
            database: self.database.clone(),
            collection: format!("{}{}", self.collection, META_SUFFIX),
        }
    }
}

impl Display for Namespace {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.database, self.collection)
    }
}

/// A boxed lazy iterator over matching documents produced by the driver.
pub type DocumentIter = Box<dyn Iterator<Item = WarehouseResult<Document>> + Send>;

/// The minimal operations the warehouse requires from any underlying
/// document store.
///
/// # Purpose
/// `ConnectionProvider` is the seam for re-hosting the warehouse against any
/// document store: every storage action of [MessageCollection] goes through
/// this trait. The in-tree [MemoryConnection] is the reference
/// implementation.
///
/// # Characteristics
/// - **Object-safe**: used as `Arc<dyn ConnectionProvider>` behind the
///   [Connection] facade
/// - **Thread-safe**: `Send + Sync` so a connection can be shared between
///   collections and threads
/// - **Namespace-scoped**: every operation names its target collection
///   explicitly; implementations create namespaces on demand
///
/// [MessageCollection]: crate::collection::MessageCollection
/// [MemoryConnection]: crate::memory::MemoryConnection
pub trait ConnectionProvider: Send + Sync {
    /// Stores one document in the namespace.
    fn insert_document(&self, ns: &Namespace, document: Document) -> WarehouseResult<()>;

    /// Returns a lazy iterator over documents matching the query, optionally
    /// sorted and limited. Without a sort specification, order is
    /// store-defined.
    fn find(
        &self,
        ns: &Namespace,
        query: &Query,
        sort: Option<&SortSpec>,
        limit: Option<usize>,
    ) -> WarehouseResult<DocumentIter>;

    /// Deletes all matching documents, returning the number actually removed.
    fn remove(&self, ns: &Namespace, query: &Query) -> WarehouseResult<u64>;

    /// Merges `patch` into the first matching document, returning the number
    /// of documents affected (0 or 1).
    fn update_first(
        &self,
        ns: &Namespace,
        query: &Query,
        patch: &Document,
    ) -> WarehouseResult<u64>;

    /// Ensures an index exists on the field. Idempotent.
    fn ensure_index(&self, ns: &Namespace, field: &str) -> WarehouseResult<()>;

    /// Counts all documents in the namespace.
    fn count(&self, ns: &Namespace) -> WarehouseResult<u64>;

    /// Removes the namespace and everything in it.
    fn drop_namespace(&self, ns: &Namespace) -> WarehouseResult<()>;
}

/// A shared handle to an established store connection.
///
/// Wraps an implementation of [ConnectionProvider] behind an `Arc` so the
/// same connection can be reused by several collections; cloning only bumps
/// the reference count, and the underlying driver resources are released
/// when the last clone is dropped.
#[derive(Clone)]
pub struct Connection {
    inner: Arc<dyn ConnectionProvider>,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection").finish_non_exhaustive()
    }
}

impl Connection {
    pub fn new(provider: impl ConnectionProvider + 'static) -> Self {
        Connection {
            inner: Arc::new(provider),
        }
    }
}

impl Deref for Connection {
    type Target = Arc<dyn ConnectionProvider>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
