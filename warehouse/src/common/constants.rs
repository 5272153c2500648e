// persisted record fields
pub const DOC_ID: &str = "_id";
pub const CREATION_TIME: &str = "creation_time";
pub const PAYLOAD: &str = "payload";
pub const PAYLOAD_TYPE_FINGERPRINT: &str = "payload_type_fingerprint";
pub const SYSTEM_PREFIX: &str = "_";
pub const RESERVED_FIELDS: [&str; 4] = [DOC_ID, CREATION_TIME, PAYLOAD, PAYLOAD_TYPE_FINGERPRINT];

// Compile-time assertion for reserved fields count
const _: () = {
    const RESERVED_FIELDS_COUNT: usize = 4;
    const ACTUAL_COUNT: usize = RESERVED_FIELDS.len();
    const _: [(); 1] = [(); (ACTUAL_COUNT == RESERVED_FIELDS_COUNT) as usize];
};

// meta namespace
pub const META_SUFFIX: &str = ".meta";
pub const META_COLLECTION: &str = "collection";

// connection constants
pub const HOST_ENV_VAR: &str = "WAREHOUSE_HOST";
pub const PORT_ENV_VAR: &str = "WAREHOUSE_PORT";
pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 27017;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 300;

// event constants
pub const WAREHOUSE_EVENT: &str = "warehouse_event";

pub const WAREHOUSE_VERSION: &str = env!("CARGO_PKG_VERSION");
