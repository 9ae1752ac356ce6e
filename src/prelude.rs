//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types for easy importing:
//!
//! ```rust
//! use thinplane::prelude::*;
//! ```
//!
//! This provides access to:
//! - The reconciler and its outcome types
//! - The relation capability trait
//! - Identity codec types
//! - Error types
//! - Classifier and resolver configuration

pub use crate::{
    classify::{ClassifyContext, Disposition, FailureClassifier, Operation},
    error::{Error, ErrorKind, Result},
    identity::{Key, KeySet, LocalId},
    reconcile::{CreateMode, Created, Observed, Outcome, Reconciler, RetryPolicy},
    relation::Relation,
    resolve::{Resolver, Strategy},
};
