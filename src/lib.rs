//! # thinplane
//!
//! Reconciliation core for declarative resources behind thin CRUD control
//! planes.
//!
//! Many remote services expose their interesting state — access grants,
//! attribute assignments, memberships — only through a narrow
//! create/read/update/delete API with three awkward properties: some
//! relationships cannot be fetched by key (existence means listing a
//! superset and filtering), some have no server-assigned identifier at all
//! (identity must be synthesized from caller-supplied fields), and the
//! service is not perfectly idempotent (a duplicate create fails even
//! though the desired state exists, and success paths sometimes answer
//! with transient 5xx faults).
//!
//! This crate implements the reconciliation machinery those services need:
//! stable identity derivation, existence resolution, a failure classifier
//! that gives unstructured remote errors a local taxonomy, and a
//! create/read/update/delete state machine with conflict-as-success and
//! bounded-retry semantics.
//!
//! ## Quick Start
//!
//! ```rust
//! use thinplane::prelude::*;
//! use thinplane::testing::InMemoryGrants;
//!
//! tokio_test::block_on(async {
//!     // The remote capability set is injected explicitly; InMemoryGrants
//!     // stands in for a real client here.
//!     let reconciler = Reconciler::new(InMemoryGrants::new());
//!
//!     // Create derives the persisted identifier from server-confirmed keys.
//!     let created = reconciler
//!         .create(&(42, 7), &"view".to_owned(), CreateMode::New)
//!         .await
//!         .unwrap()
//!         .into_inner()
//!         .unwrap();
//!     assert_eq!(created.id.as_str(), "42:7");
//!
//!     // Read recomputes state from the remote source of truth.
//!     let observed = reconciler.read(&created.id).await.unwrap().unwrap();
//!     assert_eq!(observed.payload, "view");
//!
//!     // Delete is idempotent: a vanished target is Absent, not an error.
//!     assert_eq!(reconciler.delete(&created.id).await.unwrap(), Outcome::Applied(()));
//!     assert_eq!(reconciler.delete(&created.id).await.unwrap(), Outcome::Absent);
//! });
//! ```
//!
//! ## Key Concepts
//!
//! - **Natural keys, not server IDs**: a relationship's identity is the
//!   caller-supplied key tuple, encoded as `key1:key2` in a [`LocalId`].
//!   It survives the remote instance being destroyed and recreated.
//! - **Conflict-as-success**: a create rejected with "already exists"
//!   phrasing resolves the existing instance and reports
//!   [`Outcome::AlreadySatisfied`].
//! - **Absence is not an error**: reads return `Ok(None)` and deletes
//!   return [`Outcome::Absent`] for targets that are already gone.
//! - **Retries are narrow**: transient 5xx faults are retried only while
//!   creating a brand-new resource, inside a wall-clock budget.
//!
//! Implement [`Relation`] for each managed relationship type to plug a
//! real remote client in; the [`testing`] module ships in-memory fakes.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

// Core modules
pub mod classify;
pub mod error;
pub mod identity;
pub mod reconcile;
pub mod relation;
pub mod resolve;

// Testing utilities
pub mod testing;

// Prelude for convenient imports
pub mod prelude;

// Re-export main types at crate root for convenience
pub use classify::{ClassifyContext, Disposition, FailureClassifier, Operation};
pub use error::{Error, ErrorKind, Result};
pub use identity::{Key, KeySet, LocalId};
pub use reconcile::{CreateMode, Created, Observed, Outcome, Reconciler, RetryPolicy};
pub use relation::Relation;
pub use resolve::{Resolver, Strategy};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crate_compiles() {
        // Basic smoke test
        let _ = ErrorKind::NotFound;
    }
}
