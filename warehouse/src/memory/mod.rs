//! In-process storage endpoint and connection driver.
//!
//! A [MemoryEndpoint] plays the role of a running database server: it is
//! bound to a host/port pair in a process-wide registry, and
//! [MemoryConnection::connect] repeatedly looks that pair up until the
//! endpoint appears or the configured timeout elapses. This mirrors how a
//! networked driver behaves against a server that is still starting, and
//! makes connection-timeout behavior testable without sockets.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use indexmap::IndexMap;
use log::debug;
use once_cell::sync::Lazy;

use crate::common::constants::DOC_ID;
use crate::common::sort_order::{SortOrder, SortSpec};
use crate::common::util::{atomic, Atomic, ReadExecutor, WriteExecutor};
use crate::connection::{
    Connection, ConnectionConfig, ConnectionProvider, Document, DocumentIter, Namespace,
};
use crate::errors::{ErrorKind, WarehouseError, WarehouseResult};
use crate::query::Query;

static ENDPOINTS: Lazy<DashMap<(String, u16), MemoryEndpoint>> = Lazy::new(DashMap::new);

const CONNECT_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Documents and index registrations for one namespace.
#[derive(Default)]
struct NamespaceStore {
    documents: Atomic<IndexMap<String, Document>>,
    indexed_fields: Atomic<HashSet<String>>,
}

impl NamespaceStore {
    fn new() -> Self {
        NamespaceStore {
            documents: atomic(IndexMap::new()),
            indexed_fields: atomic(HashSet::new()),
        }
    }
}

/// An in-process database server addressable by host and port.
///
/// Binding an endpoint makes it visible to [MemoryConnection::connect];
/// dropping the handle does not unbind it, so tests control server
/// lifetime explicitly via [MemoryEndpoint::unbind].
#[derive(Clone)]
pub struct MemoryEndpoint {
    inner: Arc<MemoryEndpointInner>,
}

struct MemoryEndpointInner {
    host: String,
    port: u16,
    namespaces: DashMap<String, NamespaceStore>,
}

impl MemoryEndpoint {
    /// Binds a fresh endpoint at `host:port`, replacing any previous
    /// binding at that address.
    pub fn bind(host: &str, port: u16) -> MemoryEndpoint {
        let endpoint = MemoryEndpoint {
            inner: Arc::new(MemoryEndpointInner {
                host: host.to_string(),
                port,
                namespaces: DashMap::new(),
            }),
        };
        ENDPOINTS.insert((host.to_string(), port), endpoint.clone());
        debug!("memory endpoint bound at {}:{}", host, port);
        endpoint
    }

    /// Removes the binding at `host:port`; subsequent connection attempts
    /// to that address will time out.
    pub fn unbind(host: &str, port: u16) {
        ENDPOINTS.remove(&(host.to_string(), port));
        debug!("memory endpoint unbound at {}:{}", host, port);
    }

    fn lookup(host: &str, port: u16) -> Option<MemoryEndpoint> {
        ENDPOINTS
            .get(&(host.to_string(), port))
            .map(|entry| entry.value().clone())
    }

    /// The fields registered for indexing in a namespace, for inspection
    /// in tests.
    pub fn indexed_fields(&self, namespace: &Namespace) -> Vec<String> {
        match self.inner.namespaces.get(&namespace.to_string()) {
            Some(store) => store.indexed_fields.read_with(|fields| {
                let mut names: Vec<String> = fields.iter().cloned().collect();
                names.sort();
                names
            }),
            None => Vec::new(),
        }
    }

    fn with_store<T>(&self, namespace: &Namespace, f: impl FnOnce(&NamespaceStore) -> T) -> T {
        let store = self
            .inner
            .namespaces
            .entry(namespace.to_string())
            .or_insert_with(NamespaceStore::new);
        f(store.value())
    }
}

/// A connection to a [MemoryEndpoint].
pub struct MemoryConnection {
    endpoint: MemoryEndpoint,
}

impl MemoryConnection {
    /// Resolves the target address from `config` and connects, polling the
    /// endpoint registry until the endpoint is bound or the configured
    /// timeout elapses.
    pub fn connect(config: &ConnectionConfig) -> WarehouseResult<Connection> {
        let host = config.resolve_host();
        let port = config.resolve_port();
        let deadline = Instant::now() + config.timeout();

        loop {
            if let Some(endpoint) = MemoryEndpoint::lookup(&host, port) {
                debug!("connected to memory endpoint at {}:{}", host, port);
                return Ok(Connection::new(MemoryConnection { endpoint }));
            }
            if Instant::now() >= deadline {
                return Err(WarehouseError::new(
                    &format!(
                        "Failed to connect to {}:{} within {:?}",
                        host,
                        port,
                        config.timeout()
                    ),
                    ErrorKind::ConnectionFailed,
                ));
            }
            std::thread::sleep(CONNECT_POLL_INTERVAL);
        }
    }
}

fn document_id(document: &Document) -> WarehouseResult<String> {
    match document.get(DOC_ID).and_then(|value| value.as_str()) {
        Some(id) => Ok(id.to_string()),
        None => Err(WarehouseError::new(
            "Document has no string _id field",
            ErrorKind::StorageError,
        )),
    }
}

fn compare_by(a: &Document, b: &Document, sort: &SortSpec) -> Ordering {
    let ordering = match (a.get(sort.field()), b.get(sort.field())) {
        (Some(left), Some(right)) => left.compare(right).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    };
    match sort.order() {
        SortOrder::Ascending => ordering,
        SortOrder::Descending => ordering.reverse(),
    }
}

impl ConnectionProvider for MemoryConnection {
    fn insert_document(&self, namespace: &Namespace, document: Document) -> WarehouseResult<()> {
        let id = document_id(&document)?;
        self.endpoint.with_store(namespace, |store| {
            store.documents.write_with(|documents| {
                documents.insert(id, document);
            });
            Ok(())
        })
    }

    fn find(
        &self,
        namespace: &Namespace,
        query: &Query,
        sort: Option<&SortSpec>,
        limit: Option<usize>,
    ) -> WarehouseResult<DocumentIter> {
        let mut matched: Vec<Document> = self.endpoint.with_store(namespace, |store| {
            store.documents.read_with(|documents| {
                documents
                    .values()
                    .filter(|document| query.matches(document))
                    .cloned()
                    .collect()
            })
        });

        if let Some(sort) = sort {
            let spec = sort.clone();
            matched.sort_by(|a, b| compare_by(a, b, &spec));
        }
        if let Some(limit) = limit {
            matched.truncate(limit);
        }

        Ok(Box::new(matched.into_iter().map(Ok)))
    }

    fn remove(&self, namespace: &Namespace, query: &Query) -> WarehouseResult<u64> {
        self.endpoint.with_store(namespace, |store| {
            store.documents.write_with(|documents| {
                let before = documents.len();
                documents.retain(|_, document| !query.matches(document));
                Ok((before - documents.len()) as u64)
            })
        })
    }

    fn update_first(
        &self,
        namespace: &Namespace,
        query: &Query,
        update: &Document,
    ) -> WarehouseResult<u64> {
        self.endpoint.with_store(namespace, |store| {
            store.documents.write_with(|documents| {
                for document in documents.values_mut() {
                    if query.matches(document) {
                        document.merge(update);
                        return Ok(1);
                    }
                }
                Ok(0)
            })
        })
    }

    fn ensure_index(&self, namespace: &Namespace, field: &str) -> WarehouseResult<()> {
        self.endpoint.with_store(namespace, |store| {
            store.indexed_fields.write_with(|fields| {
                if fields.insert(field.to_string()) {
                    debug!("index created on {}.{}", namespace, field);
                }
            });
            Ok(())
        })
    }

    fn count(&self, namespace: &Namespace) -> WarehouseResult<u64> {
        self.endpoint.with_store(namespace, |store| {
            store
                .documents
                .read_with(|documents| Ok(documents.len() as u64))
        })
    }

    fn drop_namespace(&self, namespace: &Namespace) -> WarehouseResult<()> {
        self.endpoint.inner.namespaces.remove(&namespace.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::value::Value;
    use crate::query::{all, field};
    use uuid::Uuid;

    fn unique_address() -> (String, u16) {
        (format!("host-{}", Uuid::new_v4()), 27017)
    }

    fn doc(id: &str, level: i64) -> Document {
        let mut document = Document::new();
        document.put(DOC_ID, Value::from(id)).unwrap();
        document.put("level", Value::from(level)).unwrap();
        document
    }

    #[test]
    fn test_connect_to_bound_endpoint() {
        let (host, port) = unique_address();
        let _endpoint = MemoryEndpoint::bind(&host, port);
        let config = ConnectionConfig::new().with_host(&host).with_port(port);
        assert!(MemoryConnection::connect(&config).is_ok());
        MemoryEndpoint::unbind(&host, port);
    }

    #[test]
    fn test_connect_times_out_when_unbound() {
        let (host, port) = unique_address();
        let config = ConnectionConfig::new()
            .with_host(&host)
            .with_port(port)
            .with_timeout(Duration::from_millis(50));
        let result = MemoryConnection::connect(&config);
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().kind(), &ErrorKind::ConnectionFailed);
    }

    #[test]
    fn test_insert_find_remove() {
        let (host, port) = unique_address();
        let _endpoint = MemoryEndpoint::bind(&host, port);
        let config = ConnectionConfig::new().with_host(&host).with_port(port);
        let connection = MemoryConnection::connect(&config).unwrap();
        let namespace = Namespace::new("test_db", "readings");

        connection
            .insert_document(&namespace, doc("a", 1))
            .unwrap();
        connection
            .insert_document(&namespace, doc("b", 2))
            .unwrap();
        connection
            .insert_document(&namespace, doc("c", 3))
            .unwrap();

        let query = field("level").gt(1).into();
        let found: Vec<Document> = connection
            .find(&namespace, &query, None, None)
            .unwrap()
            .map(|result| result.unwrap())
            .collect();
        assert_eq!(found.len(), 2);

        let removed = connection.remove(&namespace, &query).unwrap();
        assert_eq!(removed, 2);
        assert_eq!(connection.count(&namespace).unwrap(), 1);

        MemoryEndpoint::unbind(&host, port);
    }

    #[test]
    fn test_find_sorted_descending_with_limit() {
        let (host, port) = unique_address();
        let _endpoint = MemoryEndpoint::bind(&host, port);
        let config = ConnectionConfig::new().with_host(&host).with_port(port);
        let connection = MemoryConnection::connect(&config).unwrap();
        let namespace = Namespace::new("test_db", "readings");

        for (id, level) in [("a", 1), ("b", 3), ("c", 2)] {
            connection.insert_document(&namespace, doc(id, level)).unwrap();
        }

        let sort = SortSpec::new("level", SortOrder::Descending);
        let levels: Vec<i64> = connection
            .find(&namespace, &all(), Some(&sort), Some(2))
            .unwrap()
            .map(|result| result.unwrap().get("level").unwrap().as_i64().unwrap())
            .collect();
        assert_eq!(levels, vec![3, 2]);

        MemoryEndpoint::unbind(&host, port);
    }

    #[test]
    fn test_update_first_merges_fields() {
        let (host, port) = unique_address();
        let _endpoint = MemoryEndpoint::bind(&host, port);
        let config = ConnectionConfig::new().with_host(&host).with_port(port);
        let connection = MemoryConnection::connect(&config).unwrap();
        let namespace = Namespace::new("test_db", "readings");

        connection.insert_document(&namespace, doc("a", 1)).unwrap();

        let mut update = Document::new();
        update.put("level", Value::from(9_i64)).unwrap();
        let updated = connection
            .update_first(&namespace, &field("_id").eq("a").into(), &update)
            .unwrap();
        assert_eq!(updated, 1);

        let found: Vec<Document> = connection
            .find(&namespace, &field("level").eq(9).into(), None, None)
            .unwrap()
            .map(|result| result.unwrap())
            .collect();
        assert_eq!(found.len(), 1);
        assert_eq!(
            found[0].get(DOC_ID).unwrap().as_str().unwrap(),
            "a"
        );

        MemoryEndpoint::unbind(&host, port);
    }

    #[test]
    fn test_ensure_index_is_idempotent() {
        let (host, port) = unique_address();
        let endpoint = MemoryEndpoint::bind(&host, port);
        let config = ConnectionConfig::new().with_host(&host).with_port(port);
        let connection = MemoryConnection::connect(&config).unwrap();
        let namespace = Namespace::new("test_db", "readings");

        connection.ensure_index(&namespace, "level").unwrap();
        connection.ensure_index(&namespace, "level").unwrap();
        connection.ensure_index(&namespace, "station").unwrap();

        assert_eq!(
            endpoint.indexed_fields(&namespace),
            vec!["level".to_string(), "station".to_string()]
        );

        MemoryEndpoint::unbind(&host, port);
    }

    #[test]
    fn test_drop_namespace_clears_documents() {
        let (host, port) = unique_address();
        let _endpoint = MemoryEndpoint::bind(&host, port);
        let config = ConnectionConfig::new().with_host(&host).with_port(port);
        let connection = MemoryConnection::connect(&config).unwrap();
        let namespace = Namespace::new("test_db", "readings");

        connection.insert_document(&namespace, doc("a", 1)).unwrap();
        connection.drop_namespace(&namespace).unwrap();
        assert_eq!(connection.count(&namespace).unwrap(), 0);

        MemoryEndpoint::unbind(&host, port);
    }
}
