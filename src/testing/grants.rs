//! In-memory access-grant service for testing scan-resolved types.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::Result;
use crate::error::{Error, ErrorKind};
use crate::relation::Relation;

/// A live access grant as the fake remote service stores it.
///
/// The server assigns `access_id`; creation, read and listing key on the
/// natural `(content_id, group_id)` pair, but deletion requires the
/// server-assigned id — the same asymmetry real grant APIs exhibit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grant {
    /// Server-assigned identifier, required for deletion.
    pub access_id: i64,
    /// Natural key: the content the grant applies to.
    pub content_id: i64,
    /// Natural key: the group receiving access.
    pub group_id: i64,
    /// Mutable payload: the permission level.
    pub level: String,
}

type ErrorFactory = Box<dyn Fn() -> Error + Send + Sync>;

#[derive(Default)]
struct GrantStore {
    rows: Vec<Grant>,
    next_access_id: i64,
    fail_create: VecDeque<Error>,
    fail_list: VecDeque<Error>,
    fail_update: VecDeque<Error>,
    fail_delete: VecDeque<Error>,
    fail_every_create: Option<ErrorFactory>,
    create_calls: usize,
    list_calls: usize,
    update_calls: usize,
    delete_calls: usize,
}

/// An in-memory fake of a grant service with no fetch-by-key endpoint.
///
/// Existence can only be established by listing all grants for a content
/// id and filtering for the group — the shape that forces
/// [`Strategy::Scan`](crate::resolve::Strategy::Scan). The fake also
/// reproduces the service's non-idempotent create: a duplicate
/// `(content_id, group_id)` pair fails with "already has access" phrasing.
///
/// Failures can be injected per call
/// ([`fail_next_create`](InMemoryGrants::fail_next_create) and friends) or
/// persistently ([`fail_every_create`](InMemoryGrants::fail_every_create)),
/// and every endpoint counts its hits so tests can assert which remote
/// calls actually happened.
///
/// ## Example
///
/// ```rust
/// use thinplane::testing::InMemoryGrants;
///
/// let grants = InMemoryGrants::new();
/// grants.seed(42, 7, "view");
/// assert!(grants.contains(42, 7));
/// assert_eq!(grants.grants().len(), 1);
/// ```
#[derive(Clone)]
pub struct InMemoryGrants {
    store: Arc<Mutex<GrantStore>>,
    list_delay: Duration,
}

impl InMemoryGrants {
    /// Creates an empty fake grant service.
    pub fn new() -> Self {
        Self {
            store: Arc::new(Mutex::new(GrantStore::default())),
            list_delay: Duration::ZERO,
        }
    }

    /// Makes every list call take `delay` of (tokio) time before
    /// answering, for exercising lookup timeouts under paused time.
    #[must_use]
    pub fn with_list_delay(mut self, delay: Duration) -> Self {
        self.list_delay = delay;
        self
    }

    /// Inserts a grant directly into the remote store.
    pub fn seed(&self, content_id: i64, group_id: i64, level: &str) {
        let mut store = self.store.lock();
        store.next_access_id += 1;
        let access_id = store.next_access_id;
        store.rows.push(Grant {
            access_id,
            content_id,
            group_id,
            level: level.to_owned(),
        });
    }

    /// Returns a snapshot of all stored grants.
    pub fn grants(&self) -> Vec<Grant> {
        self.store.lock().rows.clone()
    }

    /// Returns `true` if a grant exists for the key pair.
    pub fn contains(&self, content_id: i64, group_id: i64) -> bool {
        self.store
            .lock()
            .rows
            .iter()
            .any(|g| g.content_id == content_id && g.group_id == group_id)
    }

    /// Queues an error for the next create call.
    pub fn fail_next_create(&self, err: Error) {
        self.store.lock().fail_create.push_back(err);
    }

    /// Makes every create call fail with a freshly built error.
    pub fn fail_every_create<F>(&self, factory: F)
    where
        F: Fn() -> Error + Send + Sync + 'static,
    {
        self.store.lock().fail_every_create = Some(Box::new(factory));
    }

    /// Queues an error for the next list call.
    pub fn fail_next_list(&self, err: Error) {
        self.store.lock().fail_list.push_back(err);
    }

    /// Queues an error for the next update call.
    pub fn fail_next_update(&self, err: Error) {
        self.store.lock().fail_update.push_back(err);
    }

    /// Queues an error for the next delete call.
    pub fn fail_next_delete(&self, err: Error) {
        self.store.lock().fail_delete.push_back(err);
    }

    /// Number of create calls the fake service received.
    pub fn create_calls(&self) -> usize {
        self.store.lock().create_calls
    }

    /// Number of list calls the fake service received.
    pub fn list_calls(&self) -> usize {
        self.store.lock().list_calls
    }

    /// Number of update calls the fake service received.
    pub fn update_calls(&self) -> usize {
        self.store.lock().update_calls
    }

    /// Number of delete calls the fake service received.
    pub fn delete_calls(&self) -> usize {
        self.store.lock().delete_calls
    }
}

impl Default for InMemoryGrants {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Relation for InMemoryGrants {
    type Keys = (i64, i64);
    type Payload = String;
    type Instance = Grant;

    async fn create(&self, keys: &Self::Keys, payload: &Self::Payload) -> Result<Grant> {
        let mut store = self.store.lock();
        store.create_calls += 1;
        if let Some(factory) = &store.fail_every_create {
            return Err(factory());
        }
        if let Some(err) = store.fail_create.pop_front() {
            return Err(err);
        }
        let (content_id, group_id) = *keys;
        if store
            .rows
            .iter()
            .any(|g| g.content_id == content_id && g.group_id == group_id)
        {
            // Real grant services report this through error text only, so
            // the fake does too instead of a typed conflict kind.
            return Err(Error::new(
                ErrorKind::Unknown,
                format!("group {group_id} already has access on content {content_id}"),
            ));
        }
        store.next_access_id += 1;
        let grant = Grant {
            access_id: store.next_access_id,
            content_id,
            group_id,
            level: payload.clone(),
        };
        store.rows.push(grant.clone());
        Ok(grant)
    }

    async fn list(&self, keys: &Self::Keys) -> Result<Vec<Grant>> {
        if self.list_delay > Duration::ZERO {
            tokio::time::sleep(self.list_delay).await;
        }
        let mut store = self.store.lock();
        store.list_calls += 1;
        if let Some(err) = store.fail_list.pop_front() {
            return Err(err);
        }
        // The remote API scopes listing by content only; filtering for the
        // group happens in the resolver.
        let content_id = keys.0;
        Ok(store
            .rows
            .iter()
            .filter(|g| g.content_id == content_id)
            .cloned()
            .collect())
    }

    fn confirmed_keys(&self, instance: &Grant) -> Self::Keys {
        (instance.content_id, instance.group_id)
    }

    fn payload_of(&self, instance: &Grant) -> Self::Payload {
        instance.level.clone()
    }

    async fn update(&self, keys: &Self::Keys, payload: &Self::Payload) -> Result<Grant> {
        let mut store = self.store.lock();
        store.update_calls += 1;
        if let Some(err) = store.fail_update.pop_front() {
            return Err(err);
        }
        let (content_id, group_id) = *keys;
        match store
            .rows
            .iter_mut()
            .find(|g| g.content_id == content_id && g.group_id == group_id)
        {
            Some(grant) => {
                grant.level = payload.clone();
                Ok(grant.clone())
            }
            None => Err(Error::not_found("grant not found")),
        }
    }

    async fn delete(&self, instance: &Grant) -> Result<()> {
        let mut store = self.store.lock();
        store.delete_calls += 1;
        if let Some(err) = store.fail_delete.pop_front() {
            return Err(err);
        }
        // Deletion keys on the server-assigned id, not the natural keys.
        let before = store.rows.len();
        store.rows.retain(|g| g.access_id != instance.access_id);
        if store.rows.len() == before {
            return Err(Error::not_found("grant not found"));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[tokio::test]
    async fn test_create_assigns_server_id() {
        let grants = InMemoryGrants::new();
        let a = grants.create(&(42, 7), &"view".to_owned()).await.unwrap();
        let b = grants.create(&(42, 8), &"edit".to_owned()).await.unwrap();
        assert_ne!(a.access_id, b.access_id);
        assert_eq!(grants.create_calls(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_create_fails_with_text_only() {
        let grants = InMemoryGrants::new();
        grants.seed(42, 7, "view");
        let err = grants.create(&(42, 7), &"view".to_owned()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unknown);
        assert!(err.message().contains("already has access"));
    }

    #[tokio::test]
    async fn test_list_scopes_by_content() {
        let grants = InMemoryGrants::new();
        grants.seed(42, 7, "view");
        grants.seed(42, 8, "edit");
        grants.seed(99, 7, "view");

        let listed = grants.list(&(42, 0)).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed.iter().all(|g| g.content_id == 42));
    }

    #[tokio::test]
    async fn test_delete_by_server_id() {
        let grants = InMemoryGrants::new();
        grants.seed(42, 7, "view");
        let grant = grants.grants().pop().unwrap();

        grants.delete(&grant).await.unwrap();
        assert!(!grants.contains(42, 7));

        let err = grants.delete(&grant).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_update_replaces_level() {
        let grants = InMemoryGrants::new();
        grants.seed(42, 7, "view");
        let updated = grants.update(&(42, 7), &"edit".to_owned()).await.unwrap();
        assert_eq!(updated.level, "edit");
        assert_eq!(grants.grants()[0].level, "edit");
    }

    #[tokio::test]
    async fn test_clone_shares_store() {
        let grants = InMemoryGrants::new();
        let cloned = grants.clone();
        cloned.seed(42, 7, "view");
        assert!(grants.contains(42, 7));
    }

    #[tokio::test]
    async fn test_scripted_failures_fire_once() {
        let grants = InMemoryGrants::new();
        grants.fail_next_create(Error::internal("boom"));
        assert!(grants.create(&(1, 2), &"x".to_owned()).await.is_err());
        assert!(grants.create(&(1, 2), &"x".to_owned()).await.is_ok());
    }
}
