//! Scalar and tuple codecs for natural keys.

use super::LocalId;
use crate::{Error, Result};

/// A scalar value usable as one segment of a natural-key tuple.
///
/// The round trip `Key::from_segment(&key.to_segment())` is exact for every
/// valid key value; for `i64` that covers the full range including
/// `i64::MIN` and `i64::MAX`.
pub trait Key: Clone + PartialEq + Send + Sync + Sized {
    /// Renders the key as an identifier segment.
    fn to_segment(&self) -> String;

    /// Parses the key from an identifier segment.
    ///
    /// Fails with [`ErrorKind::InvalidKey`](crate::ErrorKind::InvalidKey)
    /// on input that does not denote a value of this type. Whitespace is
    /// never trimmed — `" 42"` is not a numeric key.
    fn from_segment(segment: &str) -> Result<Self>;
}

impl Key for i64 {
    fn to_segment(&self) -> String {
        self.to_string()
    }

    fn from_segment(segment: &str) -> Result<Self> {
        segment.parse::<i64>().map_err(|err| {
            Error::invalid_key(format!(
                "segment {segment:?} is not a valid integer key"
            ))
            .with_source(err)
        })
    }
}

impl Key for String {
    fn to_segment(&self) -> String {
        self.clone()
    }

    fn from_segment(segment: &str) -> Result<Self> {
        if segment.is_empty() {
            return Err(Error::invalid_key("string key cannot be empty"));
        }
        Ok(segment.to_owned())
    }
}

/// An ordered tuple of natural keys identifying one managed relationship.
///
/// `KeySet` is the identity codec's typed face: [`encode`](KeySet::encode)
/// produces the [`LocalId`] the caller persists, and
/// [`decode`](KeySet::decode) recovers the tuple, enforcing arity before
/// any remote call happens.
///
/// `decode(encode(keys)) == keys` holds for every encodable tuple.
///
/// Implementations are provided for 1–4 element tuples of [`Key`] scalars:
///
/// ```rust
/// use thinplane::identity::KeySet;
///
/// let keys = (42i64, 7i64);
/// let id = keys.encode().unwrap();
/// assert_eq!(id.as_str(), "42:7");
/// assert_eq!(<(i64, i64)>::decode(&id).unwrap(), keys);
/// ```
pub trait KeySet: Clone + PartialEq + Send + Sync + Sized {
    /// Number of key segments in this tuple.
    const ARITY: usize;

    /// Encodes the tuple into a local identifier.
    ///
    /// Pure and deterministic — no I/O, no server-assigned input.
    fn encode(&self) -> Result<LocalId>;

    /// Decodes a local identifier back into the tuple.
    fn decode(id: &LocalId) -> Result<Self>;
}

macro_rules! impl_key_set {
    ($arity:expr => $($name:ident : $idx:tt),+) => {
        impl<$($name: Key),+> KeySet for ($($name,)+) {
            const ARITY: usize = $arity;

            fn encode(&self) -> Result<LocalId> {
                LocalId::from_segments([$(self.$idx.to_segment()),+])
            }

            fn decode(id: &LocalId) -> Result<Self> {
                let segments = id.segments($arity)?;
                Ok(($($name::from_segment(segments[$idx])?,)+))
            }
        }
    };
}

impl_key_set!(1 => A: 0);
impl_key_set!(2 => A: 0, B: 1);
impl_key_set!(3 => A: 0, B: 1, C: 2);
impl_key_set!(4 => A: 0, B: 1, C: 2, D: 3);
