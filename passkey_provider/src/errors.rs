//! Error types for the ceremony orchestrator.
//!
//! Soft, user-facing rejections are kept in their own [`Rejection`] type so a
//! host framework can never mistake an error message for verified user data;
//! everything else on [`ProviderError`] indicates a deployment or
//! data-integrity bug and should surface as a server error.

use thiserror::Error;

use crate::adapter::AdapterError;
use crate::ceremony::CeremonyError;
use crate::utils::UtilError;

/// User-facing ceremony rejections.
///
/// The `Display` string of each variant is the exact message intended for
/// direct display to the end user (HTTP 400-equivalent).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Anonymous options request without any email to disambiguate
    #[error("email is required to register")]
    EmailRequired,

    /// Logged-in options request without an email for the new credential
    #[error("email is required to register a new passkey")]
    EmailRequiredForNewPasskey,

    /// Explicit authenticate requested for an email with no registered passkey
    #[error("Cannot authenticate: no passkey is registered for this email.")]
    NoAccountToAuthenticate,

    /// Explicit register requested for an email that already has an account
    #[error("Cannot register: this email is already registered.")]
    AlreadyRegistered,

    /// A logged-in session already proves identity
    #[error("Cannot authenticate while logged in.")]
    AuthenticateWhileLoggedIn,

    /// Ceremony response was not an object with a string `id`
    #[error("Invalid response.")]
    InvalidResponse,

    /// Challenge cookie absent, tampered with, or expired
    #[error("Missing challenge cookie.")]
    MissingChallengeCookie,

    /// Registration cookie lost the provider account id generated at issuance
    #[error("Missing provider account id in challenge cookie.")]
    MissingProviderAccountId,

    /// No stored authenticator matches the credential id in the response
    #[error("Authenticator not found.")]
    AuthenticatorNotFound,

    /// The ceremony library rejected the response; detail is logged, not shown
    #[error("Verification failed.")]
    VerificationFailed,
}

/// Errors that can occur while orchestrating a passkey ceremony.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Soft rejection whose message is meant for the end user
    #[error("{0}")]
    Rejection(#[from] Rejection),

    /// Provider misconfiguration (e.g. unusable relying-party origin)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Adapter-managed storage failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Stored records contradict each other, e.g. a verified authenticator
    /// with no owning user; the request must not proceed as authenticated
    #[error("Storage invariant violated: {0}")]
    StorageInvariant(String),

    /// The ceremony library failed outside of response verification
    #[error("Ceremony library error: {0}")]
    Ceremony(String),

    /// Error from utility operations
    #[error("Utils error: {0}")]
    Utils(#[from] UtilError),
}

impl ProviderError {
    /// Whether this error indicates a server-side bug rather than bad user
    /// input. Fatal errors should become 500s, rejections 400s.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Rejection(_))
    }

    /// The soft rejection carried by this error, if any.
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Self::Rejection(rejection) => Some(rejection),
            _ => None,
        }
    }
}

// Custom From implementations that automatically log errors

impl From<AdapterError> for ProviderError {
    fn from(err: AdapterError) -> Self {
        tracing::error!("Adapter error: {}", err);
        Self::Storage(err.to_string())
    }
}

impl From<CeremonyError> for ProviderError {
    fn from(err: CeremonyError) -> Self {
        tracing::error!("Ceremony library error: {}", err);
        Self::Ceremony(err.to_string())
    }
}
