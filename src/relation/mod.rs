//! The remote capability boundary.
//!
//! [`Relation`] is the narrow CRUD surface the reconciliation core drives:
//! one implementation per managed relationship type, injected into the
//! [`Reconciler`](crate::reconcile::Reconciler) explicitly. Everything
//! wire-level — HTTP, authentication, serialization of requests — lives
//! behind it and out of this crate.

mod traits;

pub use traits::Relation;
