//! Local identifier type persisted by callers between operations.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Delimiter joining key segments inside a [`LocalId`].
///
/// Chosen because it is not expected to appear in any key value; the codec
/// refuses to encode a segment that would embed it.
pub const KEY_DELIMITER: char = ':';

/// A stable local identifier derived from a relationship's natural keys.
///
/// The identifier is the caller-facing primary key: an encoding of the
/// natural-key tuple joined with `:`, independent of any server-assigned
/// ID. Identity therefore survives the remote instance being destroyed and
/// recreated with the same keys.
///
/// ## Format
///
/// `key1:key2[:key3...]`
///
/// ```rust
/// use thinplane::identity::LocalId;
///
/// let id = LocalId::from_segments(["42", "7"]).unwrap();
/// assert_eq!(id.as_str(), "42:7");
/// assert_eq!(id.segments(2).unwrap(), vec!["42", "7"]);
/// ```
///
/// Construction from a raw string is deliberately unchecked — the caller
/// hands back whatever it persisted, and validation happens at decode time
/// against the expected arity of the relationship type:
///
/// ```rust
/// use thinplane::{ErrorKind, identity::LocalId};
///
/// let id = LocalId::new("only-one-part");
/// let err = id.segments(2).unwrap_err();
/// assert_eq!(err.kind(), ErrorKind::MalformedIdentifier);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalId(String);

impl LocalId {
    /// Wraps a persisted identifier string without validation.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Builds an identifier by joining key segments with the delimiter.
    ///
    /// Fails with [`ErrorKind::InvalidKey`](crate::ErrorKind::InvalidKey)
    /// if any segment is empty or contains the delimiter — an identifier
    /// must never embed a value that would corrupt its own framing.
    pub fn from_segments<I>(segments: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut out = String::new();
        let mut count = 0usize;
        for segment in segments {
            let segment = segment.as_ref();
            if segment.is_empty() {
                return Err(Error::invalid_key("key segment cannot be empty"));
            }
            if segment.contains(KEY_DELIMITER) {
                return Err(Error::invalid_key(format!(
                    "key segment {segment:?} contains the delimiter {KEY_DELIMITER:?}"
                )));
            }
            if count > 0 {
                out.push(KEY_DELIMITER);
            }
            out.push_str(segment);
            count += 1;
        }
        if count == 0 {
            return Err(Error::invalid_key("identifier needs at least one segment"));
        }
        Ok(Self(out))
    }

    /// Returns the identifier as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Splits the identifier into its key segments, checking arity.
    ///
    /// Fails with
    /// [`ErrorKind::MalformedIdentifier`](crate::ErrorKind::MalformedIdentifier)
    /// when the segment count does not match `expect`. No remote call is
    /// ever made on a malformed identifier.
    pub fn segments(&self, expect: usize) -> Result<Vec<&str>> {
        let parts: Vec<&str> = self.0.split(KEY_DELIMITER).collect();
        if parts.len() != expect {
            return Err(Error::malformed_identifier(format!(
                "identifier {:?} has {} segment(s), expected {expect}",
                self.0,
                parts.len()
            )));
        }
        Ok(parts)
    }
}

impl fmt::Display for LocalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for LocalId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for LocalId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl From<&str> for LocalId {
    fn from(raw: &str) -> Self {
        Self(raw.to_owned())
    }
}
