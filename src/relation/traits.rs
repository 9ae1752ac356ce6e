//! The capability trait implemented per managed relationship type.

use crate::Result;
use crate::error::Error;
use crate::identity::KeySet;
use crate::resolve::Strategy;

/// The remote capability set for one managed relationship type.
///
/// This trait is the boundary between the reconciliation core and the
/// remote service: one implementation per relationship type, wrapping
/// whatever subset of `{create, fetch, list, update, delete}` the remote
/// API actually offers, plus the glue that projects a remote instance back
/// onto the natural keys and payload.
///
/// The core takes the implementation as an explicit constructor argument
/// of [`Reconciler`](crate::reconcile::Reconciler) — it never reaches into
/// ambient state for a client.
///
/// ## Associated types
///
/// - `Keys`: the natural-key tuple. Caller-supplied, immutable, and the
///   only cross-call identity of the relationship.
/// - `Payload`: the mutable attributes outside the key tuple.
/// - `Instance`: the remote representation, possibly carrying a
///   server-assigned ID that deletion requires.
///
/// ## Defaults
///
/// Methods a relationship type cannot offer default to
/// [`ErrorKind::Unsupported`](crate::ErrorKind::Unsupported) or to the
/// behavior the original services exhibit:
///
/// - [`update`](Relation::update) re-issues [`create`](Relation::create)
///   with the same keys — last-write-wins for types with no partial
///   update.
/// - [`matches`](Relation::matches) compares
///   [`confirmed_keys`](Relation::confirmed_keys) against the target.
/// - [`attach`](Relation::attach) is a no-op for types without a linked
///   sub-resource.
#[async_trait::async_trait]
pub trait Relation: Send + Sync {
    /// Natural-key tuple identifying one relationship.
    type Keys: KeySet;

    /// Mutable attributes outside the key tuple.
    type Payload: Clone + Send + Sync;

    /// Remote representation of a live relationship.
    type Instance: Clone + Send + Sync;

    /// How existence is established for this type.
    ///
    /// [`Strategy::Scan`] is the default because relationship-style
    /// resources typically lack a fetch-by-key endpoint.
    fn strategy(&self) -> Strategy {
        Strategy::Scan
    }

    /// Creates the relationship on the remote service.
    async fn create(
        &self,
        keys: &Self::Keys,
        payload: &Self::Payload,
    ) -> Result<Self::Instance>;

    /// Fetches the relationship directly by its natural keys.
    ///
    /// Only called for [`Strategy::Direct`] types.
    async fn fetch(&self, keys: &Self::Keys) -> Result<Self::Instance> {
        let _ = keys;
        Err(Error::unsupported("direct fetch"))
    }

    /// Lists the scoped superset that contains the relationship, if it
    /// exists.
    ///
    /// Only called for [`Strategy::Scan`] types. Implementations scope the
    /// listing by whichever key prefix the remote API supports (e.g. "all
    /// grants for parent X"); the core filters the rest locally via
    /// [`matches`](Relation::matches).
    async fn list(&self, keys: &Self::Keys) -> Result<Vec<Self::Instance>> {
        let _ = keys;
        Err(Error::unsupported("list"))
    }

    /// Whether a listed instance corresponds to the given natural keys.
    fn matches(&self, instance: &Self::Instance, keys: &Self::Keys) -> bool {
        self.confirmed_keys(instance) == *keys
    }

    /// The natural keys as confirmed by the server.
    ///
    /// The canonical identifier is always encoded from these, not from the
    /// caller's input — some servers normalize or re-key on create.
    fn confirmed_keys(&self, instance: &Self::Instance) -> Self::Keys;

    /// Projects the instance's remote attributes onto the payload shape.
    fn payload_of(&self, instance: &Self::Instance) -> Self::Payload;

    /// Updates the mutable attributes, keeping the natural keys fixed.
    ///
    /// The default re-issues `create` with the same keys: for types whose
    /// remote API has no partial update, a second create keyed identically
    /// is the update (last write wins on the payload).
    async fn update(
        &self,
        keys: &Self::Keys,
        payload: &Self::Payload,
    ) -> Result<Self::Instance> {
        self.create(keys, payload).await
    }

    /// Deletes the relationship.
    ///
    /// Receives the resolved instance rather than the natural keys because
    /// some delete endpoints key on the server-assigned ID even when
    /// creation and read use natural keys.
    async fn delete(&self, instance: &Self::Instance) -> Result<()>;

    /// Creates a linked sub-resource after the primary create succeeds
    /// (e.g. an access credential attached to a new account).
    ///
    /// If this fails, the state machine rolls the primary back with a
    /// best-effort delete before surfacing the error, so no unreferenced
    /// partial resource is left behind.
    async fn attach(
        &self,
        instance: &Self::Instance,
        payload: &Self::Payload,
    ) -> Result<()> {
        let _ = (instance, payload);
        Ok(())
    }
}
