//! In-memory account service for testing direct-resolved types with a
//! linked sub-resource.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::Result;
use crate::error::{Error, ErrorKind};
use crate::relation::Relation;
use crate::resolve::Strategy;

/// Mutable account attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountProfile {
    /// Display name stored on the account itself.
    pub display_name: String,
    /// Address stored on the linked credential.
    pub email: String,
}

/// A live account as the fake remote service stores it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    /// Server-assigned identifier.
    pub id: i64,
    /// Natural key: the caller-chosen handle.
    pub handle: String,
    /// Display name.
    pub display_name: String,
}

#[derive(Default)]
struct AccountStore {
    accounts: Vec<Account>,
    credentials: Vec<(i64, String)>,
    next_id: i64,
    fail_create: VecDeque<Error>,
    fail_attach: VecDeque<Error>,
    fail_fetch: VecDeque<Error>,
    fail_delete: VecDeque<Error>,
    create_calls: usize,
    fetch_calls: usize,
    attach_calls: usize,
    delete_calls: usize,
}

/// An in-memory fake of an account service with a fetch-by-handle
/// endpoint and a linked credential sub-resource.
///
/// The service supports [`Strategy::Direct`] resolution, and its create is
/// two-phase: the account itself, then a credential attached to it. An
/// injected attach failure lets tests observe the reconciler's rollback
/// of the partially created primary.
#[derive(Clone)]
pub struct InMemoryAccounts {
    store: Arc<Mutex<AccountStore>>,
}

impl InMemoryAccounts {
    /// Creates an empty fake account service.
    pub fn new() -> Self {
        Self { store: Arc::new(Mutex::new(AccountStore::default())) }
    }

    /// Returns a snapshot of all stored accounts.
    pub fn accounts(&self) -> Vec<Account> {
        self.store.lock().accounts.clone()
    }

    /// Returns the credential attached to an account, if any.
    pub fn credential_of(&self, account_id: i64) -> Option<String> {
        self.store
            .lock()
            .credentials
            .iter()
            .find(|(id, _)| *id == account_id)
            .map(|(_, email)| email.clone())
    }

    /// Queues an error for the next create call.
    pub fn fail_next_create(&self, err: Error) {
        self.store.lock().fail_create.push_back(err);
    }

    /// Queues an error for the next credential attach.
    pub fn fail_next_attach(&self, err: Error) {
        self.store.lock().fail_attach.push_back(err);
    }

    /// Queues an error for the next fetch call.
    pub fn fail_next_fetch(&self, err: Error) {
        self.store.lock().fail_fetch.push_back(err);
    }

    /// Queues an error for the next delete call.
    pub fn fail_next_delete(&self, err: Error) {
        self.store.lock().fail_delete.push_back(err);
    }

    /// Number of create calls the fake service received.
    pub fn create_calls(&self) -> usize {
        self.store.lock().create_calls
    }

    /// Number of fetch calls the fake service received.
    pub fn fetch_calls(&self) -> usize {
        self.store.lock().fetch_calls
    }

    /// Number of attach calls the fake service received.
    pub fn attach_calls(&self) -> usize {
        self.store.lock().attach_calls
    }

    /// Number of delete calls the fake service received.
    pub fn delete_calls(&self) -> usize {
        self.store.lock().delete_calls
    }
}

impl Default for InMemoryAccounts {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Relation for InMemoryAccounts {
    type Keys = (String,);
    type Payload = AccountProfile;
    type Instance = Account;

    fn strategy(&self) -> Strategy {
        Strategy::Direct
    }

    async fn create(&self, keys: &Self::Keys, payload: &Self::Payload) -> Result<Account> {
        let mut store = self.store.lock();
        store.create_calls += 1;
        if let Some(err) = store.fail_create.pop_front() {
            return Err(err);
        }
        let handle = keys.0.clone();
        if store.accounts.iter().any(|a| a.handle == handle) {
            // Reported through error text only, like the grant fake.
            return Err(Error::new(
                ErrorKind::Unknown,
                format!("an account with handle {handle:?} already exists"),
            ));
        }
        store.next_id += 1;
        let account = Account {
            id: store.next_id,
            handle,
            display_name: payload.display_name.clone(),
        };
        store.accounts.push(account.clone());
        Ok(account)
    }

    async fn fetch(&self, keys: &Self::Keys) -> Result<Account> {
        let mut store = self.store.lock();
        store.fetch_calls += 1;
        if let Some(err) = store.fail_fetch.pop_front() {
            return Err(err);
        }
        store
            .accounts
            .iter()
            .find(|a| a.handle == keys.0)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("account {:?} not found", keys.0)))
    }

    fn confirmed_keys(&self, instance: &Account) -> Self::Keys {
        (instance.handle.clone(),)
    }

    fn payload_of(&self, instance: &Account) -> Self::Payload {
        let email = self
            .credential_of(instance.id)
            .unwrap_or_default();
        AccountProfile { display_name: instance.display_name.clone(), email }
    }

    async fn update(&self, keys: &Self::Keys, payload: &Self::Payload) -> Result<Account> {
        let mut store = self.store.lock();
        let account = store
            .accounts
            .iter_mut()
            .find(|a| a.handle == keys.0)
            .ok_or_else(|| Error::not_found(format!("account {:?} not found", keys.0)))?;
        account.display_name = payload.display_name.clone();
        let account = account.clone();
        for (id, email) in &mut store.credentials {
            if *id == account.id {
                *email = payload.email.clone();
            }
        }
        Ok(account)
    }

    async fn delete(&self, instance: &Account) -> Result<()> {
        let mut store = self.store.lock();
        store.delete_calls += 1;
        if let Some(err) = store.fail_delete.pop_front() {
            return Err(err);
        }
        let before = store.accounts.len();
        store.accounts.retain(|a| a.id != instance.id);
        if store.accounts.len() == before {
            return Err(Error::not_found("account not found"));
        }
        store.credentials.retain(|(id, _)| *id != instance.id);
        Ok(())
    }

    async fn attach(&self, instance: &Account, payload: &Self::Payload) -> Result<()> {
        let mut store = self.store.lock();
        store.attach_calls += 1;
        if let Some(err) = store.fail_attach.pop_front() {
            return Err(err);
        }
        store.credentials.push((instance.id, payload.email.clone()));
        Ok(())
    }
}
