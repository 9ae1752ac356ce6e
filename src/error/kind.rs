//! Error kind enumeration for categorizing reconciliation errors.

/// Categorization of reconciliation errors.
///
/// This enum provides a stable interface for matching on error types. The
/// first two variants are local failures produced by the identity codec and
/// are never retried; the rest describe remote-service failures as reported
/// by a [`Relation`](crate::relation::Relation) implementation.
///
/// ## Transient vs Permanent
///
/// | ErrorKind             | Transient | Typical origin                    |
/// |-----------------------|-----------|-----------------------------------|
/// | `Unavailable`         | Yes       | HTTP 503                          |
/// | `Timeout`             | Yes       | HTTP 504 or client-side timeout   |
/// | `RateLimited`         | Yes       | HTTP 429                          |
/// | `Internal`            | Yes*      | HTTP 500                          |
/// | `NotFound`            | No        | HTTP 404 / "not found" text       |
/// | `Conflict`            | No        | HTTP 409 / duplicate-create text  |
/// | `MalformedIdentifier` | No        | local identifier decode           |
/// | `InvalidKey`          | No        | local key segment parse           |
///
/// *`Internal` counts as transient only where the state machine permits
/// retries at all — creation of a brand-new resource. Everywhere else it
/// surfaces immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
#[non_exhaustive]
pub enum ErrorKind {
    /// A persisted local identifier does not decode to the expected number
    /// of key segments.
    ///
    /// Always surfaced, never retried, and never triggers a remote call.
    #[error("malformed identifier")]
    MalformedIdentifier,

    /// A key segment is not parseable as its expected type, is empty, or
    /// embeds the identifier delimiter.
    ///
    /// Always surfaced, never retried.
    #[error("invalid key")]
    InvalidKey,

    /// The remote instance does not exist.
    ///
    /// HTTP: 404 Not Found
    ///
    /// On read and delete this is normalized away by the state machine
    /// (absent is an outcome, not a fault).
    #[error("not found")]
    NotFound,

    /// The remote service rejected a create because the target state
    /// already exists.
    ///
    /// HTTP: 409 Conflict, or duplicate phrasing in the error text
    ///
    /// Absorbed into a successful outcome during create reconciliation.
    #[error("conflict")]
    Conflict,

    /// Invalid request argument or payload.
    ///
    /// HTTP: 400 Bad Request
    #[error("invalid argument")]
    InvalidArgument,

    /// Authentication failed.
    ///
    /// HTTP: 401 Unauthorized
    #[error("unauthorized")]
    Unauthorized,

    /// Valid credentials but insufficient permissions.
    ///
    /// HTTP: 403 Forbidden
    #[error("forbidden")]
    Forbidden,

    /// Rate limit exceeded.
    ///
    /// HTTP: 429 Too Many Requests
    #[error("rate limited")]
    RateLimited,

    /// Service temporarily unavailable.
    ///
    /// HTTP: 503 Service Unavailable
    #[error("service unavailable")]
    Unavailable,

    /// Request timed out, including an existence lookup exceeding its
    /// wall-clock bound.
    ///
    /// HTTP: 504 Gateway Timeout or client-side timeout
    #[error("timeout")]
    Timeout,

    /// Internal server error.
    ///
    /// HTTP: 500 Internal Server Error
    #[error("internal error")]
    Internal,

    /// The operation was cancelled through the caller-supplied
    /// cancellation token.
    #[error("cancelled")]
    Cancelled,

    /// The relationship type does not offer this capability (e.g. a
    /// scan-only type asked for a direct fetch).
    #[error("unsupported operation")]
    Unsupported,

    /// The remote service contradicted itself: a create reported the
    /// instance as already existing, but resolving by the same natural
    /// keys found nothing.
    #[error("inconsistent remote state")]
    Inconsistent,

    /// Unknown or unexpected error.
    #[error("unknown error")]
    Unknown,
}

impl ErrorKind {
    /// Returns `true` if this kind describes a transient server fault.
    ///
    /// Transient faults are eligible for retry, but only where the state
    /// machine allows retries at all (create of a brand-new resource).
    ///
    /// # Example
    ///
    /// ```rust
    /// use thinplane::ErrorKind;
    ///
    /// assert!(ErrorKind::Unavailable.is_transient());
    /// assert!(ErrorKind::Internal.is_transient());
    /// assert!(!ErrorKind::NotFound.is_transient());
    /// ```
    #[inline]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ErrorKind::Unavailable
                | ErrorKind::Timeout
                | ErrorKind::RateLimited
                | ErrorKind::Internal
        )
    }

    /// Returns `true` if this kind is produced locally by the identity
    /// codec, before any remote call.
    #[inline]
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            ErrorKind::MalformedIdentifier | ErrorKind::InvalidKey
        )
    }

    /// Creates an `ErrorKind` from an HTTP status code.
    ///
    /// Useful for `Relation` implementations translating a raw client
    /// response into the crate taxonomy.
    pub fn from_http_status(status: u16) -> Self {
        match status {
            400 => ErrorKind::InvalidArgument,
            401 => ErrorKind::Unauthorized,
            403 => ErrorKind::Forbidden,
            404 => ErrorKind::NotFound,
            409 => ErrorKind::Conflict,
            429 => ErrorKind::RateLimited,
            500 => ErrorKind::Internal,
            503 => ErrorKind::Unavailable,
            504 => ErrorKind::Timeout,
            _ if (400..500).contains(&status) => ErrorKind::InvalidArgument,
            _ if status >= 500 => ErrorKind::Internal,
            _ => ErrorKind::Unknown,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_is_transient() {
        assert!(ErrorKind::Unavailable.is_transient());
        assert!(ErrorKind::Timeout.is_transient());
        assert!(ErrorKind::RateLimited.is_transient());
        assert!(ErrorKind::Internal.is_transient());

        assert!(!ErrorKind::MalformedIdentifier.is_transient());
        assert!(!ErrorKind::InvalidKey.is_transient());
        assert!(!ErrorKind::NotFound.is_transient());
        assert!(!ErrorKind::Conflict.is_transient());
        assert!(!ErrorKind::InvalidArgument.is_transient());
        assert!(!ErrorKind::Unauthorized.is_transient());
        assert!(!ErrorKind::Forbidden.is_transient());
        assert!(!ErrorKind::Cancelled.is_transient());
        assert!(!ErrorKind::Unsupported.is_transient());
        assert!(!ErrorKind::Inconsistent.is_transient());
        assert!(!ErrorKind::Unknown.is_transient());
    }

    #[test]
    fn test_is_local() {
        assert!(ErrorKind::MalformedIdentifier.is_local());
        assert!(ErrorKind::InvalidKey.is_local());
        assert!(!ErrorKind::NotFound.is_local());
        assert!(!ErrorKind::Internal.is_local());
    }

    #[test]
    fn test_from_http_status() {
        assert_eq!(ErrorKind::from_http_status(400), ErrorKind::InvalidArgument);
        assert_eq!(ErrorKind::from_http_status(401), ErrorKind::Unauthorized);
        assert_eq!(ErrorKind::from_http_status(403), ErrorKind::Forbidden);
        assert_eq!(ErrorKind::from_http_status(404), ErrorKind::NotFound);
        assert_eq!(ErrorKind::from_http_status(409), ErrorKind::Conflict);
        assert_eq!(ErrorKind::from_http_status(429), ErrorKind::RateLimited);
        assert_eq!(ErrorKind::from_http_status(500), ErrorKind::Internal);
        assert_eq!(ErrorKind::from_http_status(503), ErrorKind::Unavailable);
        assert_eq!(ErrorKind::from_http_status(504), ErrorKind::Timeout);

        // 4xx range falls back to InvalidArgument
        assert_eq!(ErrorKind::from_http_status(422), ErrorKind::InvalidArgument);
        // 5xx range falls back to Internal
        assert_eq!(ErrorKind::from_http_status(502), ErrorKind::Internal);
        // Anything else is Unknown
        assert_eq!(ErrorKind::from_http_status(302), ErrorKind::Unknown);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            format!("{}", ErrorKind::MalformedIdentifier),
            "malformed identifier"
        );
        assert_eq!(format!("{}", ErrorKind::InvalidKey), "invalid key");
        assert_eq!(format!("{}", ErrorKind::NotFound), "not found");
        assert_eq!(format!("{}", ErrorKind::Conflict), "conflict");
        assert_eq!(
            format!("{}", ErrorKind::Inconsistent),
            "inconsistent remote state"
        );
        assert_eq!(format!("{}", ErrorKind::Cancelled), "cancelled");
    }

    #[test]
    fn test_error_kind_hash() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(ErrorKind::Timeout);
        set.insert(ErrorKind::Unavailable);
        set.insert(ErrorKind::Timeout); // duplicate
        assert_eq!(set.len(), 2);
    }
}
