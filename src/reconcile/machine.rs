//! The per-resource reconciliation state machine.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::Result;
use crate::classify::{ClassifyContext, Disposition, FailureClassifier};
use crate::error::Error;
use crate::identity::{KeySet, LocalId};
use crate::relation::Relation;
use crate::resolve::Resolver;

use super::{CreateMode, Created, Observed, Outcome, RetryPolicy};

/// Drives create/read/update/delete reconciliation for one relationship
/// type.
///
/// The reconciler holds no state of its own between operations: every call
/// re-derives the current situation from the remote source of truth, using
/// the natural keys as the only cross-call correlation. Its collaborators
/// are injected explicitly:
///
/// - the [`Relation`] capability set for the remote service,
/// - a [`FailureClassifier`] that names raw remote failures,
/// - a [`RetryPolicy`] bounding transient-fault retries during creation,
/// - a [`Resolver`] for existence lookups,
/// - an optional [`CancellationToken`] that aborts in-progress backoff
///   waits.
///
/// ## Example
///
/// ```rust
/// use thinplane::reconcile::{CreateMode, Reconciler};
/// use thinplane::testing::InMemoryGrants;
///
/// tokio_test::block_on(async {
///     let reconciler = Reconciler::new(InMemoryGrants::new());
///
///     let created = reconciler
///         .create(&(42, 7), &"view".to_owned(), CreateMode::New)
///         .await
///         .unwrap();
///     let created = created.into_inner().unwrap();
///     assert_eq!(created.id.as_str(), "42:7");
///
///     let observed = reconciler.read(&created.id).await.unwrap().unwrap();
///     assert_eq!(observed.payload, "view");
/// });
/// ```
pub struct Reconciler<R: Relation> {
    relation: R,
    classifier: FailureClassifier,
    retry: RetryPolicy,
    resolver: Resolver,
    cancel: Option<CancellationToken>,
}

impl<R: Relation> Reconciler<R> {
    /// Creates a reconciler with default classifier, retry policy and
    /// resolver.
    pub fn new(relation: R) -> Self {
        Self {
            relation,
            classifier: FailureClassifier::default(),
            retry: RetryPolicy::default(),
            resolver: Resolver::default(),
            cancel: None,
        }
    }

    /// Replaces the failure classifier (e.g. to register per-type
    /// conflict phrases).
    #[must_use]
    pub fn with_classifier(mut self, classifier: FailureClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Replaces the retry policy for transient create failures.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Replaces the existence resolver configuration.
    #[must_use]
    pub fn with_resolver(mut self, resolver: Resolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Installs a cancellation token; an in-progress retry wait aborts
    /// immediately when the token is cancelled.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Returns the underlying relation.
    pub fn relation(&self) -> &R {
        &self.relation
    }

    /// Creates the relationship, absorbing duplicate-create conflicts and
    /// retrying transient faults within the retry budget.
    ///
    /// On success the canonical identifier is encoded from the
    /// **server-confirmed** keys, which may differ from the caller's input
    /// on services that normalize or re-key. On a conflict the authoritative
    /// instance is resolved by the caller's keys and the operation reports
    /// [`Outcome::AlreadySatisfied`] — the same keys always yield the same
    /// identifier, so a duplicate attempt converges on the identity a
    /// direct create would have produced.
    ///
    /// Transient faults are retried only for [`CreateMode::New`], with
    /// exponential backoff bounded by the policy's wall-clock budget;
    /// exhaustion surfaces the last underlying error unchanged.
    pub async fn create(
        &self,
        keys: &R::Keys,
        payload: &R::Payload,
        mode: CreateMode,
    ) -> Result<Outcome<Created<R::Keys>>> {
        let deadline = Instant::now() + self.retry.budget;
        let mut attempt: u32 = 0;
        loop {
            let err = match self.relation.create(keys, payload).await {
                Ok(instance) => return self.finish_create(instance, payload).await,
                Err(err) => err,
            };

            let ctx = ClassifyContext::create(mode.is_new());
            match self.classifier.classify(&err, ctx) {
                Disposition::ConflictAsSuccess => {
                    tracing::debug!(
                        error = err.message(),
                        "create conflict absorbed, resolving existing instance"
                    );
                    return match self.resolve(keys).await? {
                        Some(instance) => {
                            let confirmed = self.relation.confirmed_keys(&instance);
                            let id = confirmed.encode()?;
                            Ok(Outcome::AlreadySatisfied(Created { id, keys: confirmed }))
                        }
                        None => Err(Error::inconsistent(format!(
                            "create reported an existing instance ({}) but none \
                             was found by its natural keys",
                            err.message()
                        ))),
                    };
                }
                Disposition::Retryable => {
                    attempt += 1;
                    let delay = self.retry.delay_for_attempt(attempt);
                    if Instant::now() + delay > deadline {
                        return Err(err);
                    }
                    tracing::debug!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "transient create failure, backing off"
                    );
                    self.backoff(delay).await?;
                }
                Disposition::Absent | Disposition::Fatal => return Err(err),
            }
        }
    }

    /// Reads the current remote state for a persisted identifier.
    ///
    /// Returns `Ok(None)` when the relationship no longer exists — the
    /// caller should clear its stored state. Never mutates remote state
    /// and is safe to call arbitrarily often (drift detection, post-write
    /// confirmation).
    ///
    /// A malformed identifier fails locally without any remote call.
    pub async fn read(&self, id: &LocalId) -> Result<Option<Observed<R::Keys, R::Payload>>> {
        let keys = R::Keys::decode(id)?;
        match self.resolve(&keys).await? {
            None => Ok(None),
            Some(instance) => Ok(Some(Observed {
                keys: self.relation.confirmed_keys(&instance),
                payload: self.relation.payload_of(&instance),
            })),
        }
    }

    /// Returns whether the relationship currently exists.
    ///
    /// A cheaper probe than [`read`](Reconciler::read) for callers that
    /// only need existence, with the same absent-normalization.
    pub async fn exists(&self, id: &LocalId) -> Result<bool> {
        let keys = R::Keys::decode(id)?;
        Ok(self.resolve(&keys).await?.is_some())
    }

    /// Updates the mutable payload, keeping the natural keys fixed.
    ///
    /// Key fields are immutable by construction — changing identity means
    /// delete-and-create, never an in-place update. Transient faults are
    /// NOT retried here: the resource already exists, and masking a real
    /// failure on known-good state is worse than surfacing it.
    ///
    /// On success the state is re-read to confirm; an unresolvable
    /// instance after a successful update is reported as inconsistent
    /// remote state.
    pub async fn update(
        &self,
        id: &LocalId,
        payload: &R::Payload,
    ) -> Result<Observed<R::Keys, R::Payload>> {
        let keys = R::Keys::decode(id)?;
        self.relation.update(&keys, payload).await?;
        match self.read(id).await? {
            Some(observed) => Ok(observed),
            None => Err(Error::inconsistent(format!(
                "update of {id} succeeded but the instance is no longer resolvable"
            ))),
        }
    }

    /// Deletes the relationship.
    ///
    /// Resolves first, because some delete endpoints key on the
    /// server-assigned ID carried by the instance. An already-absent
    /// target is [`Outcome::Absent`] without touching the delete endpoint;
    /// a delete answered with "not found" is likewise absorbed.
    pub async fn delete(&self, id: &LocalId) -> Result<Outcome<()>> {
        let keys = R::Keys::decode(id)?;
        let Some(instance) = self.resolve(&keys).await? else {
            tracing::debug!(%id, "delete target already absent");
            return Ok(Outcome::Absent);
        };
        match self.relation.delete(&instance).await {
            Ok(()) => Ok(Outcome::Applied(())),
            Err(err) => match self.classifier.classify(&err, ClassifyContext::delete()) {
                Disposition::Absent => {
                    tracing::debug!(%id, "delete raced with concurrent removal");
                    Ok(Outcome::Absent)
                }
                _ => Err(err),
            },
        }
    }

    async fn finish_create(
        &self,
        instance: R::Instance,
        payload: &R::Payload,
    ) -> Result<Outcome<Created<R::Keys>>> {
        if let Err(err) = self.relation.attach(&instance, payload).await {
            // The primary exists but its linked sub-resource does not;
            // leaving it behind would orphan an unreferenced instance.
            if let Err(rollback_err) = self.relation.delete(&instance).await {
                tracing::warn!(
                    error = %rollback_err,
                    "rollback delete of partially created resource failed"
                );
            }
            return Err(err);
        }
        let confirmed = self.relation.confirmed_keys(&instance);
        let id = confirmed.encode()?;
        Ok(Outcome::Applied(Created { id, keys: confirmed }))
    }

    async fn resolve(&self, keys: &R::Keys) -> Result<Option<R::Instance>> {
        self.resolver
            .resolve(&self.relation, &self.classifier, keys)
            .await
    }

    async fn backoff(&self, delay: Duration) -> Result<()> {
        match &self.cancel {
            Some(token) => tokio::select! {
                () = token.cancelled() => Err(Error::cancelled()),
                () = tokio::time::sleep(delay) => Ok(()),
            },
            None => {
                tokio::time::sleep(delay).await;
                Ok(())
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use crate::testing::{AccountProfile, InMemoryAccounts, InMemoryGrants};

    fn grant_reconciler(grants: InMemoryGrants) -> Reconciler<InMemoryGrants> {
        Reconciler::new(grants)
            .with_retry(RetryPolicy::new().with_jitter(0.0))
    }

    #[tokio::test]
    async fn test_create_encodes_server_confirmed_keys() {
        let reconciler = grant_reconciler(InMemoryGrants::new());
        let outcome = reconciler
            .create(&(42, 7), &"view".to_owned(), CreateMode::New)
            .await
            .unwrap();
        let created = outcome.into_inner().unwrap();
        assert_eq!(created.id.as_str(), "42:7");
        assert_eq!(created.keys, (42, 7));
    }

    #[tokio::test]
    async fn test_conflict_as_success_converges_on_same_identifier() {
        let grants = InMemoryGrants::new();
        let reconciler = grant_reconciler(grants);

        let first = reconciler
            .create(&(42, 7), &"view".to_owned(), CreateMode::New)
            .await
            .unwrap();
        let first = first.into_inner().unwrap();

        // The duplicate attempt fails remotely but resolves to the same
        // identity a direct create produced.
        let second = match reconciler
            .create(&(42, 7), &"view".to_owned(), CreateMode::New)
            .await
            .unwrap()
        {
            Outcome::AlreadySatisfied(created) => created,
            other => panic!("expected AlreadySatisfied, got {other:?}"),
        };
        assert_eq!(second.id, first.id);
    }

    #[tokio::test]
    async fn test_conflict_with_nothing_resolvable_is_inconsistent() {
        let grants = InMemoryGrants::new();
        grants.fail_next_create(Error::conflict("group 7 already has access on content 42"));
        let reconciler = grant_reconciler(grants);

        let err = reconciler
            .create(&(42, 7), &"view".to_owned(), CreateMode::New)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Inconsistent);
        assert!(err.message().contains("already has access"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_bound_on_persistent_transient_failure() {
        let grants = InMemoryGrants::new();
        grants.fail_every_create(|| Error::internal("HTTP 500 Internal Server Error"));
        let reconciler = grant_reconciler(grants);

        let started = Instant::now();
        let err = reconciler
            .create(&(42, 7), &"view".to_owned(), CreateMode::New)
            .await
            .unwrap_err();
        let elapsed = started.elapsed();

        assert_eq!(err.kind(), ErrorKind::Internal);
        assert!(err.message().contains("HTTP 500"));
        // Budget is 60s; the loop may overshoot by at most one interval.
        assert!(elapsed <= Duration::from_secs(70), "elapsed {elapsed:?}");
        assert!(reconciler.relation().create_calls() > 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_retry_when_reapplying_over_existing_state() {
        let grants = InMemoryGrants::new();
        grants.fail_every_create(|| Error::internal("HTTP 500 Internal Server Error"));
        let reconciler = grant_reconciler(grants);

        let started = Instant::now();
        let err = reconciler
            .create(&(42, 7), &"view".to_owned(), CreateMode::Reapply)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(started.elapsed(), Duration::ZERO);
        assert_eq!(reconciler.relation().create_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_retry_on_transient_update_failure() {
        let grants = InMemoryGrants::new();
        grants.seed(42, 7, "view");
        grants.fail_next_update(Error::internal("HTTP 500 Internal Server Error"));
        let reconciler = grant_reconciler(grants);

        let started = Instant::now();
        let err = reconciler
            .update(&LocalId::new("42:7"), &"edit".to_owned())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(started.elapsed(), Duration::ZERO);
        assert_eq!(reconciler.relation().update_calls(), 1);
    }

    #[tokio::test]
    async fn test_update_confirms_via_read() {
        let grants = InMemoryGrants::new();
        grants.seed(42, 7, "view");
        let reconciler = grant_reconciler(grants);

        let observed = reconciler
            .update(&LocalId::new("42:7"), &"edit".to_owned())
            .await
            .unwrap();
        assert_eq!(observed.keys, (42, 7));
        assert_eq!(observed.payload, "edit");
    }

    #[tokio::test]
    async fn test_read_projects_remote_attributes() {
        let grants = InMemoryGrants::new();
        grants.seed(42, 7, "view");
        let reconciler = grant_reconciler(grants);

        let observed = reconciler
            .read(&LocalId::new("42:7"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(observed.keys, (42, 7));
        assert_eq!(observed.payload, "view");
    }

    #[tokio::test]
    async fn test_read_absent_is_none_not_error() {
        let reconciler = grant_reconciler(InMemoryGrants::new());
        let observed = reconciler.read(&LocalId::new("42:7")).await.unwrap();
        assert!(observed.is_none());
    }

    #[tokio::test]
    async fn test_malformed_identifier_fails_without_remote_call() {
        let reconciler = grant_reconciler(InMemoryGrants::new());
        let err = reconciler
            .read(&LocalId::new("only-one-part"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedIdentifier);
        assert_eq!(reconciler.relation().list_calls(), 0);
    }

    #[tokio::test]
    async fn test_idempotent_delete_skips_remote_endpoint() {
        let grants = InMemoryGrants::new();
        grants.seed(42, 7, "view");
        let reconciler = grant_reconciler(grants);
        let id = LocalId::new("42:7");

        assert_eq!(reconciler.delete(&id).await.unwrap(), Outcome::Applied(()));
        assert_eq!(reconciler.relation().delete_calls(), 1);

        // Second delete observes absence via the resolver and never hits
        // the delete endpoint again.
        assert_eq!(reconciler.delete(&id).await.unwrap(), Outcome::Absent);
        assert_eq!(reconciler.relation().delete_calls(), 1);
    }

    #[tokio::test]
    async fn test_delete_not_found_race_is_absent() {
        let grants = InMemoryGrants::new();
        grants.seed(42, 7, "view");
        grants.fail_next_delete(Error::new(ErrorKind::Unknown, "Grant Not found"));
        let reconciler = grant_reconciler(grants);

        let outcome = reconciler.delete(&LocalId::new("42:7")).await.unwrap();
        assert_eq!(outcome, Outcome::Absent);
    }

    #[tokio::test]
    async fn test_delete_other_failure_surfaces() {
        let grants = InMemoryGrants::new();
        grants.seed(42, 7, "view");
        grants.fail_next_delete(Error::new(ErrorKind::Forbidden, "not allowed"));
        let reconciler = grant_reconciler(grants);

        let err = reconciler.delete(&LocalId::new("42:7")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_aborts_retry_wait() {
        let grants = InMemoryGrants::new();
        grants.fail_every_create(|| Error::internal("HTTP 500 Internal Server Error"));
        let cancel = CancellationToken::new();
        cancel.cancel();
        let reconciler = grant_reconciler(grants).with_cancellation(cancel);

        let err = reconciler
            .create(&(42, 7), &"view".to_owned(), CreateMode::New)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Cancelled);
        assert_eq!(reconciler.relation().create_calls(), 1);
    }

    #[tokio::test]
    async fn test_attach_failure_rolls_back_primary() {
        let accounts = InMemoryAccounts::new();
        accounts.fail_next_attach(Error::invalid_argument("address rejected"));
        let reconciler = Reconciler::new(accounts);

        let profile = AccountProfile {
            display_name: "Ada".to_owned(),
            email: "ada@example.com".to_owned(),
        };
        let err = reconciler
            .create(&("ada".to_owned(),), &profile, CreateMode::New)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        // The partially created account was rolled back.
        assert_eq!(reconciler.relation().accounts().len(), 0);
        assert_eq!(reconciler.relation().delete_calls(), 1);
    }

    #[tokio::test]
    async fn test_direct_strategy_lifecycle() {
        let accounts = InMemoryAccounts::new();
        let reconciler = Reconciler::new(accounts);

        let profile = AccountProfile {
            display_name: "Ada".to_owned(),
            email: "ada@example.com".to_owned(),
        };
        let created = reconciler
            .create(&("ada".to_owned(),), &profile, CreateMode::New)
            .await
            .unwrap()
            .into_inner()
            .unwrap();
        assert_eq!(created.id.as_str(), "ada");

        let observed = reconciler.read(&created.id).await.unwrap().unwrap();
        assert_eq!(observed.payload.display_name, "Ada");
        assert_eq!(observed.payload.email, "ada@example.com");

        assert!(reconciler.exists(&created.id).await.unwrap());
        assert_eq!(
            reconciler.delete(&created.id).await.unwrap(),
            Outcome::Applied(())
        );
        assert!(!reconciler.exists(&created.id).await.unwrap());
        assert!(reconciler.read(&created.id).await.unwrap().is_none());
    }
}
