//! Ceremony orchestration facade.
//!
//! One [`PasskeyProvider`] instance serves many concurrent requests; there is
//! no in-process ceremony session. Everything a verification needs to match
//! its earlier options request travels in the signed challenge cookie.

mod actions;
mod issuer;
mod verifier;

use std::sync::Arc;

use http::HeaderMap;
use serde_json::Value;

use crate::adapter::Adapter;
use crate::ceremony::CeremonyLibrary;
use crate::config::{CHALLENGE_COOKIE_NAME, CHALLENGE_TIMEOUT, RelyingParty};
use crate::cookie::{ChallengeCookieCodec, ChallengePayload};
use crate::errors::{ProviderError, Rejection};
use crate::types::{
    OptionsBody, OptionsRequest, PasskeyAction, RegistrationData, SessionState, UserData,
};
use crate::utils::{cookie_from_headers, header_set_cookie};

/// Result of a verification request, by ceremony kind.
#[derive(Debug, Clone)]
pub enum CeremonyOutcome {
    /// Adapter-ready records for the host's sign-up pipeline to persist
    Registered(RegistrationData),
    /// Verified existing identity
    Authenticated(UserData),
}

/// Passkey provider for an authentication framework.
///
/// Wraps the ceremony library, the storage adapter and the challenge cookie
/// codec behind the two framework-facing exchanges: an options request that
/// issues a challenge, and a verification request that redeems it.
pub struct PasskeyProvider {
    rp: RelyingParty,
    adapter: Arc<dyn Adapter>,
    ceremony: Arc<dyn CeremonyLibrary>,
    cookies: ChallengeCookieCodec,
}

impl PasskeyProvider {
    pub fn new(
        rp: RelyingParty,
        cookie_secret: impl Into<Vec<u8>>,
        adapter: Arc<dyn Adapter>,
        ceremony: Arc<dyn CeremonyLibrary>,
    ) -> Self {
        Self {
            rp,
            adapter,
            ceremony,
            cookies: ChallengeCookieCodec::new(cookie_secret),
        }
    }

    pub fn relying_party(&self) -> &RelyingParty {
        &self.rp
    }

    /// Handle an options request: resolve the ceremony to run, issue fresh
    /// ceremony options and the signed challenge cookie binding them.
    ///
    /// The returned headers carry the `Set-Cookie` the client must send back
    /// with its verification request. A [`Rejection`] maps to a 400 with its
    /// display string as the body; other errors are server-side bugs.
    pub async fn request_options(
        &self,
        request: &OptionsRequest,
        session: &SessionState,
    ) -> Result<(OptionsBody, HeaderMap), ProviderError> {
        let logged_in = session.logged_in();
        let query_email = request.email.as_deref();
        let effective_email = session.email.as_deref().or(query_email);

        let email_exists = match (logged_in, effective_email) {
            (false, Some(email)) => self.adapter.get_user_by_email(email).await?.is_some(),
            _ => false,
        };

        let resolved = actions::resolve_action(
            request.action,
            logged_in,
            session.email.as_deref(),
            query_email,
            email_exists,
        )?;

        tracing::debug!(
            "Resolved ceremony action {:?} for email {:?}",
            resolved.action,
            resolved.email
        );

        match resolved.action {
            PasskeyAction::Register => {
                let email = resolved.email.as_deref().ok_or(Rejection::EmailRequired)?;
                let (options, headers) = self.issue_registration(email).await?;
                Ok((
                    OptionsBody {
                        options,
                        action: PasskeyAction::Register,
                    },
                    headers,
                ))
            }
            PasskeyAction::Authenticate => {
                let (options, headers) =
                    self.issue_authentication(resolved.email.as_deref()).await?;
                Ok((
                    OptionsBody {
                        options,
                        action: PasskeyAction::Authenticate,
                    },
                    headers,
                ))
            }
        }
    }

    /// Handle a verification request for either ceremony kind.
    pub async fn verify_ceremony(
        &self,
        action: PasskeyAction,
        headers: &HeaderMap,
        response: &Value,
        email: Option<&str>,
    ) -> Result<(CeremonyOutcome, HeaderMap), ProviderError> {
        match action {
            PasskeyAction::Register => {
                let (data, headers) = self.verify_registration(headers, response, email).await?;
                Ok((CeremonyOutcome::Registered(data), headers))
            }
            PasskeyAction::Authenticate => {
                let (data, headers) = self.verify_authentication(headers, response).await?;
                Ok((CeremonyOutcome::Authenticated(data), headers))
            }
        }
    }

    /// Sign the challenge into a cookie and wrap it in a `Set-Cookie` header.
    pub(crate) fn sign_challenge_cookie(
        &self,
        challenge: String,
        provider_account_id: Option<String>,
    ) -> Result<HeaderMap, ProviderError> {
        let cookie = self
            .cookies
            .encode(challenge, provider_account_id)
            .map_err(|e| ProviderError::Config(format!("Failed to sign challenge cookie: {e}")))?;

        let mut headers = HeaderMap::new();
        header_set_cookie(
            &mut headers,
            CHALLENGE_COOKIE_NAME.as_str(),
            &cookie,
            *CHALLENGE_TIMEOUT as i64,
        )?;
        Ok(headers)
    }

    /// Expiring `Set-Cookie` clearing a consumed challenge.
    pub(crate) fn clear_challenge_cookie(&self) -> Result<HeaderMap, ProviderError> {
        let mut headers = HeaderMap::new();
        header_set_cookie(&mut headers, CHALLENGE_COOKIE_NAME.as_str(), "", 0)?;
        Ok(headers)
    }

    /// Decode and validate the challenge cookie from the request headers.
    /// Absent, tampered and expired cookies are indistinguishable to the
    /// caller; the detail stays in the logs.
    pub(crate) fn read_challenge_cookie(
        &self,
        headers: &HeaderMap,
    ) -> Result<ChallengePayload, Rejection> {
        let value = cookie_from_headers(headers, CHALLENGE_COOKIE_NAME.as_str())
            .map_err(|e| {
                tracing::debug!("Cookie header unreadable: {e}");
                Rejection::MissingChallengeCookie
            })?
            .ok_or(Rejection::MissingChallengeCookie)?;

        self.cookies.decode(value).map_err(|e| {
            tracing::debug!("Challenge cookie rejected: {e}");
            Rejection::MissingChallengeCookie
        })
    }
}
