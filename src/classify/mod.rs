//! Transient failure classification.
//!
//! Remote services behind thin CRUD APIs communicate "already exists",
//! "already gone" and "temporary fault" through unstructured error text or
//! coarse status codes. This module gives those conditions a stable local
//! taxonomy:
//!
//! - [`FailureClassifier`]: the single home of error-text matching
//! - [`Disposition`]: what the state machine does with a failure
//! - [`ClassifyContext`] / [`Operation`]: which call failed, and whether
//!   the target is a brand-new resource
//!
//! No other module in the crate branches on raw error text.

mod classifier;
mod context;

pub use classifier::{Disposition, FailureClassifier};
pub use context::{ClassifyContext, Operation};
