use std::{env, sync::LazyLock};

use serde::{Deserialize, Serialize};

use crate::errors::ProviderError;

/// Relying-party identity every ceremony is bound to.
///
/// The same `id` and `origin` must be used for option generation and response
/// verification; a response produced against a different origin fails
/// verification by design.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RelyingParty {
    /// Human-readable service name shown by the platform authenticator
    pub name: String,
    /// RP identifier, typically the service's domain
    pub id: String,
    /// Expected request origin, scheme included
    pub origin: String,
}

impl RelyingParty {
    pub fn new(
        name: impl Into<String>,
        id: impl Into<String>,
        origin: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
            origin: origin.into(),
        }
    }

    /// Build a relying party from its origin, deriving the RP id from the
    /// host part (scheme and port stripped).
    pub fn from_origin(
        name: impl Into<String>,
        origin: impl Into<String>,
    ) -> Result<Self, ProviderError> {
        let origin = origin.into();
        let id = origin
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .split('/')
            .next()
            .and_then(|host| host.split(':').next())
            .filter(|host| !host.is_empty())
            .map(|host| host.to_string())
            .ok_or_else(|| {
                ProviderError::Config(format!("Could not extract RP ID from origin: {origin}"))
            })?;

        Ok(Self {
            name: name.into(),
            id,
            origin,
        })
    }
}

pub static CHALLENGE_COOKIE_NAME: LazyLock<String> = LazyLock::new(|| {
    env::var("PASSKEY_CHALLENGE_COOKIE_NAME")
        .ok()
        .unwrap_or("__Host-PasskeyChallenge".to_string())
});

/// Challenge lifetime in seconds. The signed cookie expires after this, which
/// bounds how long an issued ceremony stays redeemable.
pub(crate) static CHALLENGE_TIMEOUT: LazyLock<u32> = LazyLock::new(|| {
    env::var("PASSKEY_CHALLENGE_TIMEOUT")
        .map(|v| v.parse::<u32>().unwrap_or(60))
        .unwrap_or(60)
});
