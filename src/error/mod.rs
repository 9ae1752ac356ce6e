//! Error types for the reconciliation core.
//!
//! The crate uses one error type, [`Error`], carrying a stable
//! [`ErrorKind`] plus the underlying message. Remote-service messages are
//! preserved verbatim; only the
//! [`FailureClassifier`](crate::classify::FailureClassifier) ever inspects
//! them.
//!
//! ## Key Invariant
//!
//! Absence is not an error. `read()` returns `Ok(None)` for a vanished
//! resource and `delete()` returns `Outcome::Absent`; `ErrorKind::NotFound`
//! only escapes on operations where absence really is a failure, such as
//! an update of something that no longer exists.

mod error;
mod kind;

pub use error::Error;
pub use kind::ErrorKind;

/// A specialized `Result` type for reconciliation operations.
pub type Result<T> = std::result::Result<T, Error>;
