//! Ceremony option issuance.
//!
//! Produces the options handed to the browser's credential API together with
//! the signed cookie that lets the matching verification request prove it is
//! answering this challenge.

use http::HeaderMap;
use serde_json::Value;

use crate::ceremony::{
    AuthenticationRequest, AuthenticatorSelection, CeremonyUserEntity, CredentialDescriptor,
    RegistrationRequest, options_challenge, options_user_id,
};
use crate::errors::ProviderError;
use crate::types::PASSKEY_PROVIDER_ID;
use crate::utils::gen_random_string;

use super::PasskeyProvider;

impl PasskeyProvider {
    /// Issue creation options for registering a new credential under `email`.
    ///
    /// Already-registered credentials are excluded so the platform will not
    /// offer to re-register the same device. The generated user handle rides
    /// in the cookie as the provider account id the verification step will
    /// link the credential to.
    pub(crate) async fn issue_registration(
        &self,
        email: &str,
    ) -> Result<(Value, HeaderMap), ProviderError> {
        let (exclude_credentials, existing_handle) =
            self.passkey_credentials_for_email(email).await?;

        let user_handle = match existing_handle {
            Some(handle) => {
                tracing::debug!("Reusing provider account id for {email}");
                handle
            }
            None => gen_random_string(32)?,
        };

        let request = RegistrationRequest {
            user: CeremonyUserEntity {
                id: user_handle,
                name: email.to_owned(),
                display_name: email.to_owned(),
            },
            exclude_credentials,
            authenticator_selection: AuthenticatorSelection::passkey_default(),
        };

        let options = self.ceremony.registration_options(&self.rp, request).await?;

        let challenge = options_challenge(&options)?.to_owned();
        let provider_account_id = options_user_id(&options)?.to_owned();
        let headers = self.sign_challenge_cookie(challenge, Some(provider_account_id))?;

        tracing::debug!("Issued registration options for {email}");
        Ok((options, headers))
    }

    /// Issue request options for authenticating with an existing credential.
    ///
    /// With a known email the allow list restricts the platform UI to that
    /// account's credentials; without one the ceremony stays discoverable
    /// (conditional UI autofill).
    pub(crate) async fn issue_authentication(
        &self,
        email: Option<&str>,
    ) -> Result<(Value, HeaderMap), ProviderError> {
        let allow_credentials = match email {
            Some(email) => self.passkey_credentials_for_email(email).await?.0,
            None => Vec::new(),
        };

        if allow_credentials.is_empty() {
            tracing::debug!("Issuing discoverable authentication options");
        }

        let request = AuthenticationRequest {
            allow_credentials,
            user_verification: "preferred".to_string(),
        };

        let options = self
            .ceremony
            .authentication_options(&self.rp, request)
            .await?;

        let challenge = options_challenge(&options)?.to_owned();
        let headers = self.sign_challenge_cookie(challenge, None)?;

        Ok((options, headers))
    }

    /// All passkey credentials registered under `email`, plus the provider
    /// account id of the first passkey account that already holds one, so a
    /// new credential for an existing user joins that account.
    async fn passkey_credentials_for_email(
        &self,
        email: &str,
    ) -> Result<(Vec<CredentialDescriptor>, Option<String>), ProviderError> {
        let Some(user) = self.adapter.get_user_by_email(email).await? else {
            return Ok((Vec::new(), None));
        };

        let mut descriptors = Vec::new();
        let mut existing_handle = None;

        for account in self.adapter.list_linked_accounts(&user.id).await? {
            if account.provider != PASSKEY_PROVIDER_ID {
                continue;
            }
            let authenticators = self
                .adapter
                .list_authenticators_by_account_id(&account.provider_account_id)
                .await?;
            if !authenticators.is_empty() && existing_handle.is_none() {
                existing_handle = Some(account.provider_account_id.clone());
            }
            descriptors.extend(
                authenticators
                    .iter()
                    .map(CredentialDescriptor::from_authenticator),
            );
        }

        Ok((descriptors, existing_handle))
    }
}
