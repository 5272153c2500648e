#![allow(dead_code, unused_imports)]
//! # Warehouse - Typed Message Persistence
//!
//! Warehouse stores strongly typed messages in named collections, each
//! record carrying user-defined metadata that can be queried without
//! touching the message payload. It is aimed at logging and replaying
//! streams of sensor or telemetry messages: write every message with a
//! few descriptive fields, then pull back exactly the slice you need.
//!
//! ## Key Features
//!
//! - **Typed collections**: A [`MessageCollection<M>`] only stores and
//!   yields messages of type `M`
//! - **Queryable metadata**: Attach arbitrary fields at insert time and
//!   filter on them with a fluent query builder
//! - **Lazy cursors**: Results stream one record at a time; payloads are
//!   decoded per element, and metadata-only queries skip decoding entirely
//! - **Fingerprint checks**: Each collection remembers the payload type it
//!   was created with and flags a mismatch on reopen
//! - **Insert notifications**: Register listeners that fire after every
//!   successful insert, best-effort
//! - **Indexes**: Declare metadata fields worth indexing; declarations are
//!   idempotent
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use warehouse::collection::MessageCollection;
//! use warehouse::connection::ConnectionConfig;
//! use warehouse::query::field;
//! use warehouse::{metadata, warehouse_message};
//!
//! #[derive(serde::Serialize, serde::Deserialize)]
//! struct LaserScan {
//!     ranges: Vec<f32>,
//! }
//!
//! warehouse_message!(LaserScan);
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let scans: MessageCollection<LaserScan> =
//!     MessageCollection::open("robot_db", "scans", &ConnectionConfig::new())?;
//!
//! scans.insert(&scan, metadata! { "station": "dock", "sweep": 42 })?;
//!
//! for record in scans.query(field("sweep").gte(40))? {
//!     let record = record?;
//!     println!("{}: {:?}", record.id(), record.metadata());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Design Pattern
//!
//! Warehouse uses the **PIMPL (Pointer To IMPLementation)** design
//! pattern: public handles like [`MessageCollection`] and
//! [`Connection`] are thin clonable wrappers around `Arc`-shared inner
//! state, so clones share one connection and one listener registry while
//! the public surface stays stable.
//!
//! ## Module Organization
//!
//! - [`collection`] - Typed message collections, cursors, and insert events
//! - [`common`] - Shared values, sort specs, constants, and the event bus
//! - [`connection`] - Connection handles, configuration, and the driver trait
//! - [`errors`] - Error types and result definitions
//! - [`memory`] - In-process storage endpoint and driver
//! - [`message`] - The [`Message`] capability trait
//! - [`metadata`] - User-defined record metadata
//! - [`query`] - Metadata queries and the fluent constraint builder
//!
//! [`MessageCollection<M>`]: collection::MessageCollection
//! [`MessageCollection`]: collection::MessageCollection
//! [`Connection`]: connection::Connection
//! [`Message`]: message::Message

use crate::common::*;

pub mod collection;
pub mod common;
pub mod connection;
pub mod errors;
pub mod memory;
pub mod message;
pub mod metadata;
pub mod query;

pub use crate::collection::MessageCollection;
pub use crate::common::event_bus::SubscriberRef;
pub use crate::errors::{ErrorKind, WarehouseError, WarehouseResult};
pub use crate::message::Message;
