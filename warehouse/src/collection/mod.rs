//! Typed message collections.
//!
//! [MessageCollection] is the main entry point of the crate: a typed
//! façade over a document namespace that stores encoded messages with
//! queryable metadata. Supporting types here cover query results
//! ([QueryResults]), fetched records ([StoredRecord]), fetch options
//! ([FindOptions]) and insert notifications ([InsertEventListener]).

mod cursor;
mod event;
mod find_options;
mod message_collection;
mod record;

pub use cursor::QueryResults;
pub use event::{InsertEventCallback, InsertEventInfo, InsertEventListener};
pub use find_options::FindOptions;
pub use message_collection::MessageCollection;
pub use record::{RecordId, StoredRecord};
