//! Boundary to the FIDO2/WebAuthn ceremony library.
//!
//! The orchestrator never performs option generation or signature
//! verification itself; it delegates both to an implementation of
//! [`CeremonyLibrary`] and treats the returned options as opaque, extracting
//! only the `challenge` and, for registration, the generated `user.id`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::config::RelyingParty;
use crate::errors::ProviderError;
use crate::types::{Authenticator, CredentialDeviceType};

/// Errors raised by the ceremony library.
///
/// A response that does not verify is an error, not a flag on a success
/// value; the verifier wraps these as soft rejections with the detail logged.
#[derive(Debug, Error)]
pub enum CeremonyError {
    /// Option generation failed
    #[error("Options error: {0}")]
    Options(String),

    /// The client response failed cryptographic or policy verification
    #[error("Verification error: {0}")]
    Verification(String),
}

/// WebAuthn user entity embedded in creation options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CeremonyUserEntity {
    /// User handle (base64url); becomes the account's provider account id
    pub id: String,
    pub name: String,
    #[serde(rename = "displayName")]
    pub display_name: String,
}

/// Authenticator selection criteria for creation options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatorSelection {
    pub resident_key: String,
    pub require_resident_key: bool,
    pub user_verification: String,
}

impl AuthenticatorSelection {
    /// Selection used for every registration this provider issues:
    /// discoverable credentials preferred, user verification preferred.
    pub fn passkey_default() -> Self {
        Self {
            resident_key: "preferred".to_string(),
            require_resident_key: true,
            user_verification: "preferred".to_string(),
        }
    }
}

/// Reference to a known credential, for exclude/allow lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialDescriptor {
    #[serde(rename = "type")]
    pub type_: String,
    /// base64url-encoded credential id
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transports: Option<Vec<String>>,
}

impl CredentialDescriptor {
    pub fn from_authenticator(authenticator: &Authenticator) -> Self {
        Self {
            type_: "public-key".to_string(),
            id: crate::utils::base64url_encode(&authenticator.credential_id),
            transports: authenticator.transports.clone(),
        }
    }
}

/// Input to registration ("create credential") option generation.
#[derive(Debug, Clone)]
pub struct RegistrationRequest {
    pub user: CeremonyUserEntity,
    /// Credentials the platform must not offer to re-register
    pub exclude_credentials: Vec<CredentialDescriptor>,
    pub authenticator_selection: AuthenticatorSelection,
}

/// Input to authentication ("get credential") option generation.
#[derive(Debug, Clone)]
pub struct AuthenticationRequest {
    /// Restricts the platform UI to these credentials; empty leaves the
    /// ceremony discoverable (conditional UI autofill)
    pub allow_credentials: Vec<CredentialDescriptor>,
    pub user_verification: String,
}

/// What the verifier requires the library to check a response against.
#[derive(Debug, Clone)]
pub struct ExpectedCeremony {
    pub challenge: String,
    pub origin: String,
    pub rp_id: String,
    pub require_user_verification: bool,
}

/// Structured result of a verified registration response.
#[derive(Debug, Clone)]
pub struct RegistrationInfo {
    pub credential_id: Vec<u8>,
    pub public_key: Vec<u8>,
    pub counter: u32,
    pub device_type: CredentialDeviceType,
    pub backed_up: bool,
    pub transports: Option<Vec<String>>,
}

/// Structured result of a verified authentication response.
#[derive(Debug, Clone)]
pub struct AuthenticationInfo {
    /// Signature counter reported by the authenticator for this ceremony
    pub new_counter: u32,
}

/// The external FIDO2/WebAuthn engine.
///
/// Implementations must bind every verification to the expected challenge,
/// origin and RP id; a mismatch is a [`CeremonyError::Verification`].
#[async_trait]
pub trait CeremonyLibrary: Send + Sync {
    /// Produce creation options containing a fresh challenge.
    async fn registration_options(
        &self,
        rp: &RelyingParty,
        request: RegistrationRequest,
    ) -> Result<Value, CeremonyError>;

    /// Produce request options containing a fresh challenge.
    async fn authentication_options(
        &self,
        rp: &RelyingParty,
        request: AuthenticationRequest,
    ) -> Result<Value, CeremonyError>;

    /// Verify a registration response against the expected ceremony state.
    async fn verify_registration(
        &self,
        expected: &ExpectedCeremony,
        response: &Value,
    ) -> Result<RegistrationInfo, CeremonyError>;

    /// Verify an authentication response against the expected ceremony state
    /// and the stored authenticator.
    async fn verify_authentication(
        &self,
        expected: &ExpectedCeremony,
        authenticator: &Authenticator,
        response: &Value,
    ) -> Result<AuthenticationInfo, CeremonyError>;
}

/// Extract the challenge the library embedded in its options.
pub(crate) fn options_challenge(options: &Value) -> Result<&str, ProviderError> {
    options
        .get("challenge")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            ProviderError::Ceremony("Ceremony options carry no challenge".to_string())
        })
}

/// Extract the generated user handle from creation options.
pub(crate) fn options_user_id(options: &Value) -> Result<&str, ProviderError> {
    options
        .get("user")
        .and_then(|user| user.get("id"))
        .and_then(Value::as_str)
        .ok_or_else(|| {
            ProviderError::Ceremony("Creation options carry no user id".to_string())
        })
}
