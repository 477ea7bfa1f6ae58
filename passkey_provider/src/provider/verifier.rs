//! Ceremony response verification.
//!
//! Both flows are read-then-decide-then-mutate: storage is never touched
//! before the ceremony library has accepted the response. Soft rejections
//! carry a user-facing message; a storage invariant violation aborts the
//! request instead, because continuing would authenticate an orphaned
//! identity.

use http::HeaderMap;
use serde_json::Value;

use crate::ceremony::ExpectedCeremony;
use crate::errors::{ProviderError, Rejection};
use crate::types::{
    Account, Authenticator, PASSKEY_PROVIDER_ID, RegistrationData, User, UserData,
};
use crate::utils::{base64url_decode, base64url_encode};

use super::PasskeyProvider;

impl PasskeyProvider {
    /// Verify an authentication response against the challenge cookie and
    /// the stored authenticator, and persist the advanced counter.
    ///
    /// A rejected counter update is logged and does not fail the response:
    /// the ceremony cryptographically succeeded, but the anomaly must stay
    /// observable to operators.
    pub async fn verify_authentication(
        &self,
        headers: &HeaderMap,
        response: &Value,
    ) -> Result<(UserData, HeaderMap), ProviderError> {
        let credential_id = response_credential_id(response)?;
        let payload = self.read_challenge_cookie(headers)?;

        let authenticator = self
            .adapter
            .get_authenticator(&credential_id)
            .await?
            .ok_or_else(|| {
                tracing::debug!("No stored authenticator for response credential");
                Rejection::AuthenticatorNotFound
            })?;

        let expected = self.expected_ceremony(payload.challenge);
        let info = match self
            .ceremony
            .verify_authentication(&expected, &authenticator, response)
            .await
        {
            Ok(info) => info,
            Err(err) => {
                tracing::error!("Authentication ceremony rejected: {err}");
                return Err(Rejection::VerificationFailed.into());
            }
        };

        if info.new_counter == 0 && authenticator.counter == 0 {
            // Authenticator does not implement a signature counter
            tracing::debug!("Counter not supported by authenticator; skipping update");
        } else if let Err(err) = self
            .adapter
            .update_authenticator_counter(&credential_id, info.new_counter)
            .await
        {
            tracing::warn!("Counter update rejected after verified ceremony: {err}");
        }

        let user = self
            .adapter
            .get_user_by_account(PASSKEY_PROVIDER_ID, &authenticator.provider_account_id)
            .await?
            .ok_or_else(|| {
                ProviderError::StorageInvariant(format!(
                    "Authenticator {} has no owning user",
                    base64url_encode(&authenticator.credential_id)
                ))
            })?;

        let account = Account {
            user_id: user.id.clone(),
            provider: PASSKEY_PROVIDER_ID.to_string(),
            provider_account_id: authenticator.provider_account_id.clone(),
        };

        let headers = self.clear_challenge_cookie()?;
        Ok((UserData { user, account }, headers))
    }

    /// Verify a registration response and materialize the adapter-ready
    /// User/Account/Authenticator triple for the caller to persist.
    pub async fn verify_registration(
        &self,
        headers: &HeaderMap,
        response: &Value,
        email: Option<&str>,
    ) -> Result<(RegistrationData, HeaderMap), ProviderError> {
        let Some(email) = email else {
            tracing::debug!("Registration verification without an email");
            return Err(Rejection::EmailRequired.into());
        };

        response_credential_id(response)?;
        let payload = self.read_challenge_cookie(headers)?;

        let Some(provider_account_id) = payload.provider_account_id else {
            tracing::debug!("Challenge cookie carries no provider account id");
            return Err(Rejection::MissingProviderAccountId.into());
        };

        let expected = self.expected_ceremony(payload.challenge);
        let info = match self.ceremony.verify_registration(&expected, response).await {
            Ok(info) => info,
            Err(err) => {
                tracing::error!("Registration ceremony rejected: {err}");
                return Err(Rejection::VerificationFailed.into());
            }
        };

        let user = User {
            id: email.to_owned(),
            email: email.to_owned(),
            email_verified: None,
        };
        let account = Account {
            user_id: email.to_owned(),
            provider: PASSKEY_PROVIDER_ID.to_string(),
            provider_account_id: provider_account_id.clone(),
        };
        let authenticator = Authenticator {
            credential_id: info.credential_id,
            provider_account_id,
            counter: info.counter,
            public_key: info.public_key,
            device_type: info.device_type,
            backed_up: info.backed_up,
            transports: info.transports,
        };

        tracing::debug!("Registration verified for {email}");
        let headers = self.clear_challenge_cookie()?;
        Ok((
            RegistrationData {
                user,
                account,
                authenticator,
            },
            headers,
        ))
    }

    fn expected_ceremony(&self, challenge: String) -> ExpectedCeremony {
        ExpectedCeremony {
            challenge,
            origin: self.rp.origin.clone(),
            rp_id: self.rp.id.clone(),
            require_user_verification: true,
        }
    }
}

/// Shape-check the ceremony response and decode its credential id.
fn response_credential_id(response: &Value) -> Result<Vec<u8>, Rejection> {
    let id = response
        .as_object()
        .and_then(|object| object.get("id"))
        .and_then(Value::as_str)
        .ok_or_else(|| {
            tracing::debug!("Ceremony response is not an object with a string id");
            Rejection::InvalidResponse
        })?;

    base64url_decode(id).map_err(|_| {
        tracing::debug!("Ceremony response id is not base64url");
        Rejection::InvalidResponse
    })
}
