use warehouse::collection::MessageCollection;
use warehouse::connection::ConnectionConfig;
use warehouse::errors::WarehouseResult;
use warehouse::memory::MemoryEndpoint;
use warehouse::message::Message;

/// A bound endpoint plus a fresh database name for one test.
///
/// Every context gets its own host name and database, so tests can run in
/// parallel against the process-wide endpoint registry without seeing each
/// other's data.
#[derive(Clone)]
pub struct TestContext {
    host: String,
    port: u16,
    database: String,
    endpoint: MemoryEndpoint,
}

impl TestContext {
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn endpoint(&self) -> &MemoryEndpoint {
        &self.endpoint
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn config(&self) -> ConnectionConfig {
        ConnectionConfig::new()
            .with_host(&self.host)
            .with_port(self.port)
    }

    pub fn open<M: Message>(&self, collection: &str) -> WarehouseResult<MessageCollection<M>> {
        MessageCollection::open(&self.database, collection, &self.config())
    }
}

pub fn create_test_context() -> WarehouseResult<TestContext> {
    let id = uuid::Uuid::new_v4();
    let host = format!("test-host-{}", id);
    let port = 27017;
    let endpoint = MemoryEndpoint::bind(&host, port);
    Ok(TestContext {
        host,
        port,
        database: format!("test_db_{}", id.simple()),
        endpoint,
    })
}

pub fn cleanup(ctx: TestContext) -> WarehouseResult<()> {
    MemoryEndpoint::unbind(&ctx.host, ctx.port);
    Ok(())
}
