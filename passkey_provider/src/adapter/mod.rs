//! Storage boundary for users, accounts and authenticators.
//!
//! The trait lists exactly the capabilities the orchestrator needs; an
//! adapter that compiles has all of them, so a partially-capable adapter is
//! a type error at integration time rather than a runtime misconfiguration.

mod memory;

use async_trait::async_trait;
use thiserror::Error;

use crate::types::{Account, Authenticator, User};

pub use memory::MemoryAdapter;

#[derive(Debug, Error)]
pub enum AdapterError {
    /// Underlying storage failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// A counter update that does not strictly increase was rejected.
    /// Surfacing this distinctly lets callers flag a possible cloned
    /// credential without failing the ceremony.
    #[error(
        "Counter regression for credential {credential_id}: stored {stored}, reported {reported}"
    )]
    CounterRegression {
        credential_id: String,
        stored: u32,
        reported: u32,
    },
}

/// Persistent storage the orchestrator reads and (for counters) writes.
///
/// All lookups are point reads keyed by email, user id, account id or
/// credential id; the orchestrator never caches results beyond one request.
#[async_trait]
pub trait Adapter: Send + Sync {
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AdapterError>;

    /// Resolve the user owning the account `(provider, provider_account_id)`.
    async fn get_user_by_account(
        &self,
        provider: &str,
        provider_account_id: &str,
    ) -> Result<Option<User>, AdapterError>;

    /// All accounts linked to a user, across providers.
    async fn list_linked_accounts(&self, user_id: &str) -> Result<Vec<Account>, AdapterError>;

    /// All authenticators registered under one provider account id.
    async fn list_authenticators_by_account_id(
        &self,
        provider_account_id: &str,
    ) -> Result<Vec<Authenticator>, AdapterError>;

    async fn get_authenticator(
        &self,
        credential_id: &[u8],
    ) -> Result<Option<Authenticator>, AdapterError>;

    /// Persist a new signature counter for a credential.
    ///
    /// The check that `new_counter` strictly exceeds the stored value must be
    /// atomic with the write: two concurrent authentications against a cloned
    /// credential must not both succeed. Non-increasing values return
    /// [`AdapterError::CounterRegression`].
    async fn update_authenticator_counter(
        &self,
        credential_id: &[u8],
        new_counter: u32,
    ) -> Result<(), AdapterError>;
}
