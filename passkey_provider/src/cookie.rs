//! Signed challenge cookie.
//!
//! All ceremony continuity rides in a tamper-evident cookie held by the
//! client: the server keeps no ceremony session. The payload is a small JSON
//! object signed with HMAC-SHA256 over its base64url encoding; expiry is
//! embedded in the payload so a stale cookie fails at decode time.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

use crate::config::CHALLENGE_TIMEOUT;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error)]
pub enum CookieError {
    #[error("Invalid cookie format: {0}")]
    Format(String),

    #[error("Cookie signature mismatch")]
    Signature,

    #[error("Challenge cookie has expired")]
    Expired,
}

/// Ceremony state carried across the stateless request boundary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChallengePayload {
    /// Challenge embedded in the ceremony options shown to the client
    pub challenge: String,
    /// WebAuthn user handle generated at registration issuance; absent for
    /// authentication ceremonies
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_account_id: Option<String>,
    /// Unix timestamp after which the cookie is no longer redeemable
    pub expires_at: i64,
}

/// Encodes and decodes the signed challenge cookie.
///
/// Wire shape: `base64url(payload_json) "." base64url(hmac_sha256(body))`.
#[derive(Clone)]
pub struct ChallengeCookieCodec {
    secret: Vec<u8>,
    ttl: Duration,
}

impl ChallengeCookieCodec {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
            ttl: Duration::seconds(*CHALLENGE_TIMEOUT as i64),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_ttl(secret: impl Into<Vec<u8>>, ttl: Duration) -> Self {
        Self {
            secret: secret.into(),
            ttl,
        }
    }

    fn mac(&self) -> HmacSha256 {
        HmacSha256::new_from_slice(&self.secret).expect("HMAC can take key of any size")
    }

    pub fn encode(
        &self,
        challenge: String,
        provider_account_id: Option<String>,
    ) -> Result<String, CookieError> {
        let payload = ChallengePayload {
            challenge,
            provider_account_id,
            expires_at: (Utc::now() + self.ttl).timestamp(),
        };

        let body = URL_SAFE_NO_PAD.encode(
            serde_json::to_vec(&payload).map_err(|e| CookieError::Format(e.to_string()))?,
        );

        let mut mac = self.mac();
        mac.update(body.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(format!("{body}.{signature}"))
    }

    pub fn decode(&self, cookie: &str) -> Result<ChallengePayload, CookieError> {
        let (body, signature) = cookie
            .rsplit_once('.')
            .ok_or_else(|| CookieError::Format("Missing signature separator".to_string()))?;

        let signature_bytes = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| CookieError::Format("Failed to decode signature".to_string()))?;

        let mut mac = self.mac();
        mac.update(body.as_bytes());
        mac.verify_slice(&signature_bytes)
            .map_err(|_| CookieError::Signature)?;

        let payload_bytes = URL_SAFE_NO_PAD
            .decode(body)
            .map_err(|_| CookieError::Format("Failed to decode payload".to_string()))?;
        let payload: ChallengePayload = serde_json::from_slice(&payload_bytes)
            .map_err(|e| CookieError::Format(e.to_string()))?;

        if payload.expires_at < Utc::now().timestamp() {
            tracing::warn!(
                "Challenge cookie expired at {} (challenge {})",
                payload.expires_at,
                payload.challenge
            );
            return Err(CookieError::Expired);
        }

        Ok(payload)
    }
}
