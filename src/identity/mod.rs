//! Identity codec: stable local identifiers derived from natural keys.
//!
//! A managed relationship is identified by caller-supplied *natural keys*
//! (e.g. `(content_id, group_id)`), not by whatever ID the remote service
//! happens to assign. This module provides:
//!
//! - [`LocalId`]: the persisted identifier, `key1:key2[:key3...]`
//! - [`Key`]: the scalar segment codec (`i64`, `String`)
//! - [`KeySet`]: the tuple codec with arity-checked decoding
//!
//! Encoding is pure and deterministic, so the same relationship always maps
//! to the same identifier regardless of server-side quirks.

mod id;
mod key;

pub use id::{KEY_DELIMITER, LocalId};
pub use key::{Key, KeySet};
