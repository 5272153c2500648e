use backtrace::Backtrace;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::result::Result;

use crate::{atomic, Atomic};

/// Error kinds for warehouse operations.
///
/// Each kind describes a specific category of failure, enabling precise error
/// handling. The taxonomy distinguishes errors fatal to opening a collection
/// (`ConnectionFailed`) from per-call errors surfaced to the caller.
///
/// # Examples
///
/// ```rust,ignore
/// use warehouse::errors::{WarehouseError, ErrorKind, WarehouseResult};
///
/// fn example() -> WarehouseResult<()> {
///     Err(WarehouseError::new("no matching message", ErrorKind::NoMatch))
/// }
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrorKind {
    /// No connection to the store could be established before the timeout.
    /// Fatal to collection construction.
    ConnectionFailed,
    /// A write, delete, or index operation was rejected by the store.
    StorageError,
    /// A query expecting at least one result found none.
    NoMatch,
    /// A stored payload could not be deserialized as the expected message type.
    /// Surfaced per record; does not abort a cursor.
    DecodeError,
    /// A message could not be serialized for storage.
    EncodeError,
    /// A metadata key collides with a system field or the reserved prefix.
    InvalidMetadata,
    /// Error while creating or maintaining an index.
    IndexingError,
    /// Error in the notification event bus.
    EventError,
    /// Generic IO error.
    IOError,
    /// Internal error (usually indicates a bug).
    InternalError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::ConnectionFailed => write!(f, "Connection failed"),
            ErrorKind::StorageError => write!(f, "Storage error"),
            ErrorKind::NoMatch => write!(f, "No matching message"),
            ErrorKind::DecodeError => write!(f, "Decode error"),
            ErrorKind::EncodeError => write!(f, "Encode error"),
            ErrorKind::InvalidMetadata => write!(f, "Invalid metadata"),
            ErrorKind::IndexingError => write!(f, "Indexing error"),
            ErrorKind::EventError => write!(f, "Event error"),
            ErrorKind::IOError => write!(f, "IO error"),
            ErrorKind::InternalError => write!(f, "Internal error"),
        }
    }
}

/// Custom warehouse error type.
///
/// `WarehouseError` encapsulates the error message, kind, and optional cause.
/// It supports error chaining and backtraces for debugging.
///
/// # Examples
///
/// ```rust,ignore
/// use warehouse::errors::{WarehouseError, ErrorKind};
///
/// let err = WarehouseError::new("write rejected", ErrorKind::StorageError);
///
/// let cause = WarehouseError::new("IO failed", ErrorKind::IOError);
/// let err = WarehouseError::new_with_cause("write rejected", ErrorKind::StorageError, cause);
/// ```
#[derive(Clone)]
pub struct WarehouseError {
    message: String,
    error_kind: ErrorKind,
    cause: Option<Box<WarehouseError>>,
    backtrace: Atomic<Backtrace>,
}

impl WarehouseError {
    /// Creates a new `WarehouseError` with the specified message and error kind.
    pub fn new(message: &str, error_kind: ErrorKind) -> Self {
        WarehouseError {
            message: message.to_string(),
            error_kind,
            cause: None,
            backtrace: atomic(Backtrace::new()),
        }
    }

    /// Creates a new `WarehouseError` with a cause error.
    ///
    /// This creates an error chain where the cause error is preserved for
    /// debugging.
    pub fn new_with_cause(message: &str, error_kind: ErrorKind, cause: WarehouseError) -> Self {
        WarehouseError {
            message: message.to_string(),
            error_kind,
            cause: Some(Box::new(cause)),
            backtrace: atomic(Backtrace::new()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.error_kind
    }

    pub fn cause(&self) -> Option<&WarehouseError> {
        self.cause.as_deref()
    }
}

impl Display for WarehouseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Debug for WarehouseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // print error message with stack trace followed by cause
        match &self.cause {
            Some(cause) => write!(f, "{}\nCaused by: {:?}", self.message, cause),
            None => write!(f, "{}\n{:?}", self.message, self.backtrace.read()),
        }
    }
}

impl Error for WarehouseError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref()),
            None => None,
        }
    }
}

/// A result type alias for warehouse operations.
///
/// `WarehouseResult<T>` is shorthand for `Result<T, WarehouseError>`.
/// All fallible warehouse operations return this type.
pub type WarehouseResult<T> = Result<T, WarehouseError>;

// From trait implementations for automatic error conversion
impl From<std::io::Error> for WarehouseError {
    fn from(err: std::io::Error) -> Self {
        WarehouseError::new(&format!("IO error: {}", err), ErrorKind::IOError)
    }
}

impl From<std::string::FromUtf8Error> for WarehouseError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        WarehouseError::new(
            &format!("UTF-8 encoding error: {}", err),
            ErrorKind::DecodeError,
        )
    }
}

impl From<String> for WarehouseError {
    fn from(msg: String) -> Self {
        WarehouseError::new(&msg, ErrorKind::InternalError)
    }
}

impl From<&str> for WarehouseError {
    fn from(msg: &str) -> Self {
        WarehouseError::new(msg, ErrorKind::InternalError)
    }
}
