//! Main error type for the reconciliation core.

use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt;

use super::ErrorKind;

/// The primary error type for reconciliation operations.
///
/// `Error` pairs a stable [`ErrorKind`] with the underlying message, which
/// for remote failures is preserved verbatim: the classifier matches on it,
/// and diagnosability depends on it surviving every layer untouched.
///
/// ## Example
///
/// ```rust
/// use thinplane::{Error, ErrorKind};
///
/// fn handle_error(err: Error) {
///     match err.kind() {
///         ErrorKind::NotFound => {
///             println!("already gone");
///         }
///         kind if kind.is_transient() => {
///             println!("transient fault: {}", err);
///         }
///         _ => {
///             println!("permanent error: {}", err);
///         }
///     }
/// }
/// ```
#[derive(Debug)]
pub struct Error {
    /// The error category.
    kind: ErrorKind,

    /// Human-readable error message, preserved verbatim for remote errors.
    message: Cow<'static, str>,

    /// The underlying error, if any.
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
}

impl Error {
    /// Creates a new error with the given kind and message.
    ///
    /// # Example
    ///
    /// ```rust
    /// use thinplane::{Error, ErrorKind};
    ///
    /// let err = Error::new(ErrorKind::InvalidArgument, "level cannot be empty");
    /// assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    /// ```
    pub fn new(kind: ErrorKind, message: impl Into<Cow<'static, str>>) -> Self {
        Self { kind, message: message.into(), source: None }
    }

    /// Creates an error from a kind with a default message.
    pub fn from_kind(kind: ErrorKind) -> Self {
        let message = match kind {
            ErrorKind::MalformedIdentifier => "identifier does not decode",
            ErrorKind::InvalidKey => "key segment is not parseable",
            ErrorKind::NotFound => "resource not found",
            ErrorKind::Conflict => "resource already exists",
            ErrorKind::InvalidArgument => "invalid argument",
            ErrorKind::Unauthorized => "authentication failed",
            ErrorKind::Forbidden => "permission denied",
            ErrorKind::RateLimited => "rate limit exceeded",
            ErrorKind::Unavailable => "service unavailable",
            ErrorKind::Timeout => "request timed out",
            ErrorKind::Internal => "internal server error",
            ErrorKind::Cancelled => "operation cancelled",
            ErrorKind::Unsupported => "operation not supported",
            ErrorKind::Inconsistent => "remote state is inconsistent",
            ErrorKind::Unknown => "unknown error",
        };
        Self::new(kind, message)
    }

    /// Returns the error kind for categorization.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the error message.
    ///
    /// For errors originating at the remote service this is the service's
    /// text unchanged. The [`FailureClassifier`](crate::classify::FailureClassifier)
    /// is the only component that inspects it.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns `true` if this error describes a transient server fault.
    ///
    /// Equivalent to `self.kind().is_transient()`.
    #[inline]
    pub fn is_transient(&self) -> bool {
        self.kind.is_transient()
    }

    /// Sets the source error for this error.
    #[must_use]
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    // Convenience constructors for common error types

    /// Creates a malformed-identifier error.
    pub fn malformed_identifier(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::MalformedIdentifier, message)
    }

    /// Creates an invalid-key error.
    pub fn invalid_key(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::InvalidKey, message)
    }

    /// Creates a not-found error.
    pub fn not_found(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Creates a conflict error.
    pub fn conflict(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    /// Creates an invalid-argument error.
    pub fn invalid_argument(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::InvalidArgument, message)
    }

    /// Creates an unavailable error.
    pub fn unavailable(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Unavailable, message)
    }

    /// Creates a timeout error.
    pub fn timeout(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Creates a cancelled error.
    pub fn cancelled() -> Self {
        Self::from_kind(ErrorKind::Cancelled)
    }

    /// Creates an unsupported-operation error.
    pub fn unsupported(operation: &'static str) -> Self {
        Self::new(
            ErrorKind::Unsupported,
            format!("relationship type does not support {operation}"),
        )
    }

    /// Creates an inconsistent-remote-state error.
    pub fn inconsistent(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Inconsistent, message)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self::from_kind(kind)
    }
}

impl From<std::num::ParseIntError> for Error {
    fn from(err: std::num::ParseIntError) -> Self {
        Error::invalid_key(err.to_string()).with_source(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_new() {
        let err = Error::new(ErrorKind::InvalidArgument, "test message");
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(err.message(), "test message");
        assert!(err.to_string().contains("test message"));
    }

    #[test]
    fn test_error_from_kind() {
        let err = Error::from_kind(ErrorKind::NotFound);
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.to_string().contains("resource not found"));
    }

    #[test]
    fn test_error_is_transient() {
        assert!(Error::from_kind(ErrorKind::Timeout).is_transient());
        assert!(Error::from_kind(ErrorKind::Internal).is_transient());
        assert!(!Error::from_kind(ErrorKind::NotFound).is_transient());
        assert!(!Error::from_kind(ErrorKind::MalformedIdentifier).is_transient());
    }

    #[test]
    fn test_error_with_source() {
        let io_err = std::io::Error::other("underlying error");
        let err = Error::new(ErrorKind::Internal, "call failed").with_source(io_err);
        assert!(err.source().is_some());
    }

    #[test]
    fn test_message_preserved_verbatim() {
        let err = Error::conflict("Group 7 already has access on content 42");
        assert_eq!(err.message(), "Group 7 already has access on content 42");
    }

    #[test]
    fn test_convenience_constructors() {
        assert_eq!(
            Error::malformed_identifier("x").kind(),
            ErrorKind::MalformedIdentifier
        );
        assert_eq!(Error::invalid_key("x").kind(), ErrorKind::InvalidKey);
        assert_eq!(Error::not_found("x").kind(), ErrorKind::NotFound);
        assert_eq!(Error::conflict("x").kind(), ErrorKind::Conflict);
        assert_eq!(Error::invalid_argument("x").kind(), ErrorKind::InvalidArgument);
        assert_eq!(Error::unavailable("x").kind(), ErrorKind::Unavailable);
        assert_eq!(Error::timeout("x").kind(), ErrorKind::Timeout);
        assert_eq!(Error::internal("x").kind(), ErrorKind::Internal);
        assert_eq!(Error::cancelled().kind(), ErrorKind::Cancelled);
        assert_eq!(Error::unsupported("fetch").kind(), ErrorKind::Unsupported);
        assert_eq!(Error::inconsistent("x").kind(), ErrorKind::Inconsistent);
    }

    #[test]
    fn test_unsupported_names_operation() {
        let err = Error::unsupported("direct fetch");
        assert!(err.message().contains("direct fetch"));
    }

    #[test]
    fn test_from_parse_int_error() {
        let parse_err = "abc".parse::<i64>().unwrap_err();
        let err: Error = parse_err.into();
        assert_eq!(err.kind(), ErrorKind::InvalidKey);
        assert!(err.source().is_some());
    }

    #[test]
    fn test_display_format() {
        let err = Error::new(ErrorKind::NotFound, "grant not found");
        let display = err.to_string();
        assert!(display.contains("not found"));
        assert!(display.contains("grant not found"));
    }
}
