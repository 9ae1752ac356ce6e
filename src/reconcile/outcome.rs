//! Outcome types for reconciliation operations.

use crate::identity::LocalId;

/// Result of a successful mutation attempt.
///
/// Failures never appear here — a transient fault is retried internally
/// and anything fatal is the `Err` arm of the operation's `Result`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    /// The remote state is new or changed.
    Applied(T),
    /// The desired state already existed; the duplicate attempt was
    /// absorbed and `T` describes the pre-existing instance.
    AlreadySatisfied(T),
    /// The resource was already gone (delete of a vanished instance).
    Absent,
}

impl<T> Outcome<T> {
    /// Returns the inner value for `Applied` and `AlreadySatisfied`.
    pub fn into_inner(self) -> Option<T> {
        match self {
            Outcome::Applied(value) | Outcome::AlreadySatisfied(value) => Some(value),
            Outcome::Absent => None,
        }
    }

    /// Returns `true` for `Absent`.
    pub fn is_absent(&self) -> bool {
        matches!(self, Outcome::Absent)
    }
}

/// Identity of a relationship after a successful create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Created<K> {
    /// The canonical local identifier, encoded from server-confirmed keys.
    pub id: LocalId,
    /// The server-confirmed natural keys.
    pub keys: K,
}

/// Remote state observed by a read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observed<K, P> {
    /// The server-confirmed natural keys.
    pub keys: K,
    /// The instance's attributes, projected verbatim.
    pub payload: P,
}

/// Whether a create targets a brand-new resource.
///
/// Transient server faults are retried only for [`CreateMode::New`]:
/// retrying a create against a resource that previously existed would mask
/// real failures on known-good state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CreateMode {
    /// First creation of an instance that never existed.
    #[default]
    New,
    /// Re-issuing create over existing state (last-write-wins reapply).
    Reapply,
}

impl CreateMode {
    /// Returns `true` for [`CreateMode::New`].
    pub fn is_new(self) -> bool {
        matches!(self, CreateMode::New)
    }
}
