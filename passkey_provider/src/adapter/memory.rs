//! In-memory adapter, usable as a test double and for demos.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::types::{Account, Authenticator, User};
use crate::utils::base64url_encode;

use super::{Adapter, AdapterError};

#[derive(Default)]
struct Inner {
    /// Keyed by user id
    users: HashMap<String, User>,
    accounts: Vec<Account>,
    /// Keyed by base64url credential id
    authenticators: HashMap<String, Authenticator>,
}

/// [`Adapter`] backed by process memory.
///
/// The counter compare-and-set holds the store lock across read-check-write,
/// so concurrent authentications against a cloned credential cannot both
/// pass the strictly-increasing check.
#[derive(Default)]
pub struct MemoryAdapter {
    inner: Mutex<Inner>,
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put_user(&self, user: User) {
        self.inner.lock().await.users.insert(user.id.clone(), user);
    }

    pub async fn put_account(&self, account: Account) {
        let mut inner = self.inner.lock().await;
        inner
            .accounts
            .retain(|a| !(a.provider == account.provider
                && a.provider_account_id == account.provider_account_id));
        inner.accounts.push(account);
    }

    pub async fn put_authenticator(&self, authenticator: Authenticator) {
        let key = base64url_encode(&authenticator.credential_id);
        self.inner.lock().await.authenticators.insert(key, authenticator);
    }
}

#[async_trait]
impl Adapter for MemoryAdapter {
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AdapterError> {
        let inner = self.inner.lock().await;
        Ok(inner.users.values().find(|u| u.email == email).cloned())
    }

    async fn get_user_by_account(
        &self,
        provider: &str,
        provider_account_id: &str,
    ) -> Result<Option<User>, AdapterError> {
        let inner = self.inner.lock().await;
        let Some(account) = inner
            .accounts
            .iter()
            .find(|a| a.provider == provider && a.provider_account_id == provider_account_id)
        else {
            return Ok(None);
        };
        Ok(inner.users.get(&account.user_id).cloned())
    }

    async fn list_linked_accounts(&self, user_id: &str) -> Result<Vec<Account>, AdapterError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .accounts
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn list_authenticators_by_account_id(
        &self,
        provider_account_id: &str,
    ) -> Result<Vec<Authenticator>, AdapterError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .authenticators
            .values()
            .filter(|a| a.provider_account_id == provider_account_id)
            .cloned()
            .collect())
    }

    async fn get_authenticator(
        &self,
        credential_id: &[u8],
    ) -> Result<Option<Authenticator>, AdapterError> {
        let key = base64url_encode(credential_id);
        let inner = self.inner.lock().await;
        Ok(inner.authenticators.get(&key).cloned())
    }

    async fn update_authenticator_counter(
        &self,
        credential_id: &[u8],
        new_counter: u32,
    ) -> Result<(), AdapterError> {
        let key = base64url_encode(credential_id);
        let mut inner = self.inner.lock().await;
        let authenticator = inner
            .authenticators
            .get_mut(&key)
            .ok_or_else(|| AdapterError::Storage(format!("Unknown credential: {key}")))?;

        if new_counter <= authenticator.counter {
            return Err(AdapterError::CounterRegression {
                credential_id: key,
                stored: authenticator.counter,
                reported: new_counter,
            });
        }

        authenticator.counter = new_counter;
        Ok(())
    }
}
