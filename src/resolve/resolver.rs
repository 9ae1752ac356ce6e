//! Resolver implementation.

use std::time::Duration;

use crate::Result;
use crate::classify::{ClassifyContext, Disposition, FailureClassifier};
use crate::error::Error;
use crate::relation::Relation;

/// How existence is established for a relationship type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    /// The remote API supports fetching the instance by its identifier.
    Direct,
    /// The remote API only offers a list scoped by part of the key tuple;
    /// the resolver lists that superset and filters locally.
    #[default]
    Scan,
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strategy::Direct => write!(f, "direct"),
            Strategy::Scan => write!(f, "scan"),
        }
    }
}

/// Resolves whether a remote instance currently exists for a key tuple.
///
/// A lookup that finds nothing is a normal outcome (`Ok(None)`), not a
/// fault: scanning an empty result set, a direct fetch answered with
/// "not found", and a list endpoint 404ing on a vanished parent all
/// normalize to `None`. Any other client failure surfaces directly with
/// its message preserved.
///
/// List-and-filter lookups against large scopes can be slow, so the whole
/// resolution is bounded by a wall-clock timeout (default 5 minutes).
#[derive(Debug, Clone)]
pub struct Resolver {
    timeout: Duration,
}

impl Default for Resolver {
    fn default() -> Self {
        Self { timeout: Duration::from_secs(300) }
    }
}

impl Resolver {
    /// Creates a resolver with the default 5-minute lookup timeout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the wall-clock bound for a single lookup.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the configured lookup timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Resolves the instance for `keys`, using the relation's strategy.
    pub async fn resolve<R: Relation>(
        &self,
        relation: &R,
        classifier: &FailureClassifier,
        keys: &R::Keys,
    ) -> Result<Option<R::Instance>> {
        let lookup = self.resolve_unbounded(relation, classifier, keys);
        match tokio::time::timeout(self.timeout, lookup).await {
            Ok(result) => result,
            Err(_) => Err(Error::timeout(format!(
                "existence lookup exceeded {:?}",
                self.timeout
            ))),
        }
    }

    async fn resolve_unbounded<R: Relation>(
        &self,
        relation: &R,
        classifier: &FailureClassifier,
        keys: &R::Keys,
    ) -> Result<Option<R::Instance>> {
        match relation.strategy() {
            Strategy::Direct => match relation.fetch(keys).await {
                Ok(instance) => Ok(Some(instance)),
                Err(err) => Self::absorb_absent(classifier, err),
            },
            Strategy::Scan => match relation.list(keys).await {
                Ok(instances) => Ok(instances
                    .into_iter()
                    .find(|instance| relation.matches(instance, keys))),
                Err(err) => Self::absorb_absent(classifier, err),
            },
        }
    }

    fn absorb_absent<T>(
        classifier: &FailureClassifier,
        err: Error,
    ) -> Result<Option<T>> {
        match classifier.classify(&err, ClassifyContext::read()) {
            Disposition::Absent => Ok(None),
            _ => Err(err),
        }
    }
}
