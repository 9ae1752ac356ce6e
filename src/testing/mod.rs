//! Test doubles for reconciliation without a live service.
//!
//! Two in-memory fakes cover the two resolution shapes:
//!
//! - [`InMemoryGrants`]: no fetch-by-key endpoint (scan resolution),
//!   composite numeric keys, server-assigned deletion id, non-idempotent
//!   create with "already has access" phrasing.
//! - [`InMemoryAccounts`]: fetch-by-handle endpoint (direct resolution),
//!   single string key, and a linked credential sub-resource whose attach
//!   can be made to fail to exercise rollback.
//!
//! Both support scripted failure injection and count endpoint hits, so
//! tests can assert not just outcomes but which remote calls were made.

mod accounts;
mod grants;

pub use accounts::{Account, AccountProfile, InMemoryAccounts};
pub use grants::{Grant, InMemoryGrants};
