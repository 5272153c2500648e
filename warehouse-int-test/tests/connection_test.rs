use std::time::{Duration, Instant};

use warehouse::collection::MessageCollection;
use warehouse::connection::ConnectionConfig;
use warehouse::errors::ErrorKind;
use warehouse::memory::{MemoryConnection, MemoryEndpoint};
use warehouse::metadata::Metadata;
use warehouse::warehouse_message;
use warehouse_int_test::test_util::{cleanup, create_test_context};

#[ctor::ctor]
fn init() {
    colog::init();
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
struct Heartbeat {
    sequence: u64,
}

warehouse_message!(Heartbeat);

#[test]
fn test_open_against_bound_endpoint() {
    let ctx = create_test_context().unwrap();
    let beats: MessageCollection<Heartbeat> = ctx.open("beats").unwrap();
    beats
        .insert(&Heartbeat { sequence: 1 }, Metadata::new())
        .unwrap();
    assert_eq!(beats.count().unwrap(), 1);
    cleanup(ctx).unwrap();
}

#[test]
fn test_open_times_out_without_endpoint() {
    let host = format!("absent-{}", uuid::Uuid::new_v4());
    let config = ConnectionConfig::new()
        .with_host(&host)
        .with_port(27017)
        .with_timeout(Duration::from_millis(100));

    let started = Instant::now();
    let result: Result<MessageCollection<Heartbeat>, _> =
        MessageCollection::open("test_db", "beats", &config);

    assert_eq!(result.unwrap_err().kind(), &ErrorKind::ConnectionFailed);
    assert!(started.elapsed() >= Duration::from_millis(100));

    cleanup_host(&host);
}

fn cleanup_host(host: &str) {
    MemoryEndpoint::unbind(host, 27017);
}

#[test]
fn test_connect_succeeds_once_endpoint_appears() {
    let host = format!("late-{}", uuid::Uuid::new_v4());
    let config = ConnectionConfig::new()
        .with_host(&host)
        .with_port(27017)
        .with_timeout(Duration::from_secs(5));

    let binder_host = host.clone();
    let binder = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(100));
        MemoryEndpoint::bind(&binder_host, 27017);
    });

    let connection = MemoryConnection::connect(&config);
    binder.join().unwrap();
    assert!(connection.is_ok());

    cleanup_host(&host);
}

#[test]
fn test_shared_connection_across_collections() {
    let ctx = create_test_context().unwrap();
    let connection = MemoryConnection::connect(&ctx.config()).unwrap();

    let beats: MessageCollection<Heartbeat> =
        MessageCollection::open_with_connection(connection.clone(), ctx.database(), "beats")
            .unwrap();
    let spare: MessageCollection<Heartbeat> =
        MessageCollection::open_with_connection(connection, ctx.database(), "spare").unwrap();

    beats
        .insert(&Heartbeat { sequence: 1 }, Metadata::new())
        .unwrap();
    assert_eq!(beats.count().unwrap(), 1);
    assert_eq!(spare.count().unwrap(), 0);

    cleanup(ctx).unwrap();
}
