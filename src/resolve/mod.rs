//! Existence resolution by natural keys.
//!
//! Some relationship types have a fetch-by-key endpoint; others can only
//! be found by listing a scoped superset and filtering locally. The
//! [`Resolver`] hides that difference behind one question — "does an
//! instance for these keys currently exist?" — and normalizes "no" to
//! `Ok(None)` rather than an error.

mod resolver;

pub use resolver::{Resolver, Strategy};
