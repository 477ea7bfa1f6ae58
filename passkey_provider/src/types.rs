use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Provider id under which passkey accounts are linked to users.
pub const PASSKEY_PROVIDER_ID: &str = "passkey";

/// Which ceremony an options or verification request belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PasskeyAction {
    /// Prove ownership of an already-registered credential
    Authenticate,
    /// Create and register a new credential
    Register,
}

/// A user identity as the adapter stores it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    /// Unique user identifier
    pub id: String,
    /// Email the user registered with
    pub email: String,
    /// When the email was verified, if ever
    pub email_verified: Option<DateTime<Utc>>,
}

/// Durable link between a [`User`] and the identity owning an authenticator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Account {
    /// Id of the owning user
    pub user_id: String,
    /// Always [`PASSKEY_PROVIDER_ID`] for accounts this crate creates
    pub provider: String,
    /// WebAuthn user handle generated when the credential was registered
    pub provider_account_id: String,
}

/// How the credential's private key lives on the client.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum CredentialDeviceType {
    /// Bound to a single authenticator
    SingleDevice,
    /// Synced across the user's devices (the typical passkey)
    MultiDevice,
}

/// Stored credential record for one registered passkey.
///
/// Created at successful registration verification; only `counter` is ever
/// mutated afterwards, at successful authentication verification. The counter
/// must never silently decrease: a non-increasing value on a later ceremony
/// indicates a cloned credential.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Authenticator {
    /// Raw credential id bytes
    pub credential_id: Vec<u8>,
    /// WebAuthn user handle this credential belongs to
    pub provider_account_id: String,
    /// Last signature counter reported by the authenticator
    pub counter: u32,
    /// Public key bytes for the credential
    pub public_key: Vec<u8>,
    /// Single-device or synced credential
    pub device_type: CredentialDeviceType,
    /// Whether the credential is currently backed up
    pub backed_up: bool,
    /// Transports the authenticator advertised at registration
    pub transports: Option<Vec<String>>,
}

/// Verified identity returned by a successful authentication ceremony.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserData {
    pub user: User,
    pub account: Account,
}

/// Adapter-ready records produced by a successful registration ceremony.
///
/// The orchestrator never persists these itself; the host's sign-up pipeline
/// owns the upsert.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegistrationData {
    pub user: User,
    pub account: Account,
    pub authenticator: Authenticator,
}

/// Query input of an options request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OptionsRequest {
    /// Explicit action, if the client sent one
    pub action: Option<PasskeyAction>,
    /// Email from the query string
    pub email: Option<String>,
}

/// Ambient session state of the requester.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    /// Email of the logged-in user; `None` for anonymous requests
    pub email: Option<String>,
}

impl SessionState {
    pub fn logged_in(&self) -> bool {
        self.email.is_some()
    }
}

/// Body of a successful options response.
#[derive(Debug, Clone, Serialize)]
pub struct OptionsBody {
    /// Ceremony options to hand to the browser's credential API verbatim
    pub options: Value,
    /// Which ceremony the challenge cookie was bound to
    pub action: PasskeyAction,
}
