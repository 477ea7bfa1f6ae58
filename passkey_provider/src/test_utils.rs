//! Shared fixtures for unit tests: a mock ceremony library plus helpers to
//! seed storage and craft client responses.

use std::sync::Arc;

use async_trait::async_trait;
use http::HeaderMap;
use http::header::{COOKIE, SET_COOKIE};
use serde_json::{Value, json};

use crate::adapter::MemoryAdapter;
use crate::ceremony::{
    AuthenticationInfo, AuthenticationRequest, CeremonyError, CeremonyLibrary, ExpectedCeremony,
    RegistrationInfo, RegistrationRequest,
};
use crate::config::RelyingParty;
use crate::provider::PasskeyProvider;
use crate::types::{Account, Authenticator, CredentialDeviceType, PASSKEY_PROVIDER_ID, User};
use crate::utils::{base64url_decode, base64url_encode, gen_random_string};

pub(crate) const TEST_ORIGIN: &str = "https://example.com";

pub(crate) fn test_rp() -> RelyingParty {
    RelyingParty::new("Example", "example.com", TEST_ORIGIN)
}

/// Ceremony library double: generates random challenges and verifies
/// responses by comparing the fields a real library would read from the
/// client data and authenticator data.
pub(crate) struct MockCeremonyLibrary {
    /// When false, the library skips the counter check, like an engine that
    /// leaves clone detection entirely to storage
    pub(crate) enforce_counter: bool,
}

impl Default for MockCeremonyLibrary {
    fn default() -> Self {
        Self {
            enforce_counter: true,
        }
    }
}

fn check_client_data(
    expected: &ExpectedCeremony,
    response: &Value,
    ceremony_type: &str,
) -> Result<(), CeremonyError> {
    if response["challenge"].as_str() != Some(expected.challenge.as_str()) {
        return Err(CeremonyError::Verification(
            "Challenge mismatch".to_string(),
        ));
    }
    if response["origin"].as_str() != Some(expected.origin.as_str()) {
        return Err(CeremonyError::Verification(format!(
            "Invalid origin. Expected: {}, Got: {}",
            expected.origin, response["origin"]
        )));
    }
    if response["type"].as_str() != Some(ceremony_type) {
        return Err(CeremonyError::Verification(format!(
            "Invalid type. Expected {ceremony_type}"
        )));
    }
    if expected.require_user_verification && response["userVerified"] == Value::Bool(false) {
        return Err(CeremonyError::Verification(
            "User verification required but not performed".to_string(),
        ));
    }
    Ok(())
}

fn response_credential(response: &Value) -> Result<Vec<u8>, CeremonyError> {
    response["id"]
        .as_str()
        .and_then(|id| base64url_decode(id).ok())
        .ok_or_else(|| CeremonyError::Verification("Malformed credential id".to_string()))
}

#[async_trait]
impl CeremonyLibrary for MockCeremonyLibrary {
    async fn registration_options(
        &self,
        rp: &RelyingParty,
        request: RegistrationRequest,
    ) -> Result<Value, CeremonyError> {
        Ok(json!({
            "challenge": gen_random_string(32)
                .map_err(|e| CeremonyError::Options(e.to_string()))?,
            "rp": {"name": rp.name, "id": rp.id},
            "user": {
                "id": request.user.id,
                "name": request.user.name,
                "displayName": request.user.display_name,
            },
            "pubKeyCredParams": [
                {"type": "public-key", "alg": -7},
                {"type": "public-key", "alg": -257},
            ],
            "excludeCredentials": request.exclude_credentials,
            "authenticatorSelection": request.authenticator_selection,
            "timeout": 60000,
            "attestation": "none",
        }))
    }

    async fn authentication_options(
        &self,
        rp: &RelyingParty,
        request: AuthenticationRequest,
    ) -> Result<Value, CeremonyError> {
        Ok(json!({
            "challenge": gen_random_string(32)
                .map_err(|e| CeremonyError::Options(e.to_string()))?,
            "rpId": rp.id,
            "allowCredentials": request.allow_credentials,
            "userVerification": request.user_verification,
            "timeout": 60000,
        }))
    }

    async fn verify_registration(
        &self,
        expected: &ExpectedCeremony,
        response: &Value,
    ) -> Result<RegistrationInfo, CeremonyError> {
        check_client_data(expected, response, "webauthn.create")?;
        Ok(RegistrationInfo {
            credential_id: response_credential(response)?,
            public_key: b"mock-public-key".to_vec(),
            counter: response["counter"].as_u64().unwrap_or(0) as u32,
            device_type: CredentialDeviceType::MultiDevice,
            backed_up: response["backedUp"].as_bool().unwrap_or(true),
            transports: Some(vec!["internal".to_string()]),
        })
    }

    async fn verify_authentication(
        &self,
        expected: &ExpectedCeremony,
        authenticator: &Authenticator,
        response: &Value,
    ) -> Result<AuthenticationInfo, CeremonyError> {
        check_client_data(expected, response, "webauthn.get")?;
        if response_credential(response)? != authenticator.credential_id {
            return Err(CeremonyError::Verification(
                "Credential mismatch".to_string(),
            ));
        }

        let new_counter = response["counter"].as_u64().unwrap_or(0) as u32;
        if self.enforce_counter && new_counter != 0 && new_counter <= authenticator.counter {
            return Err(CeremonyError::Verification(format!(
                "Counter did not increase: stored {}, reported {}",
                authenticator.counter, new_counter
            )));
        }

        Ok(AuthenticationInfo { new_counter })
    }
}

pub(crate) fn test_provider(adapter: Arc<MemoryAdapter>) -> PasskeyProvider {
    PasskeyProvider::new(
        test_rp(),
        b"unit-test-secret".to_vec(),
        adapter,
        Arc::new(MockCeremonyLibrary::default()),
    )
}

pub(crate) fn permissive_provider(adapter: Arc<MemoryAdapter>) -> PasskeyProvider {
    PasskeyProvider::new(
        test_rp(),
        b"unit-test-secret".to_vec(),
        adapter,
        Arc::new(MockCeremonyLibrary {
            enforce_counter: false,
        }),
    )
}

/// Seed a user with one registered passkey credential.
pub(crate) async fn seed_registered_user(
    adapter: &MemoryAdapter,
    email: &str,
    user_id: &str,
    provider_account_id: &str,
    credential_id: &[u8],
    counter: u32,
) {
    adapter
        .put_user(User {
            id: user_id.to_string(),
            email: email.to_string(),
            email_verified: None,
        })
        .await;
    adapter
        .put_account(Account {
            user_id: user_id.to_string(),
            provider: PASSKEY_PROVIDER_ID.to_string(),
            provider_account_id: provider_account_id.to_string(),
        })
        .await;
    adapter
        .put_authenticator(Authenticator {
            credential_id: credential_id.to_vec(),
            provider_account_id: provider_account_id.to_string(),
            counter,
            public_key: b"mock-public-key".to_vec(),
            device_type: CredentialDeviceType::MultiDevice,
            backed_up: true,
            transports: Some(vec!["internal".to_string()]),
        })
        .await;
}

/// Turn the `Set-Cookie` from an options response into the `Cookie` header a
/// client would send with its verification request.
pub(crate) fn cookie_jar(issue_headers: &HeaderMap) -> HeaderMap {
    let set_cookie = issue_headers
        .get(SET_COOKIE)
        .expect("issuance must set the challenge cookie")
        .to_str()
        .unwrap();
    let pair = set_cookie.split(';').next().unwrap();

    let mut headers = HeaderMap::new();
    headers.insert(COOKIE, pair.parse().unwrap());
    headers
}

/// Client response answering creation `options`, as the mock library reads it.
pub(crate) fn registration_response(
    options: &Value,
    origin: &str,
    credential_id: &[u8],
    counter: u32,
) -> Value {
    json!({
        "id": base64url_encode(credential_id),
        "type": "webauthn.create",
        "challenge": options["challenge"],
        "origin": origin,
        "counter": counter,
        "userVerified": true,
    })
}

/// Client response answering request `options`, as the mock library reads it.
pub(crate) fn authentication_response(
    options: &Value,
    origin: &str,
    credential_id: &[u8],
    counter: u32,
) -> Value {
    json!({
        "id": base64url_encode(credential_id),
        "type": "webauthn.get",
        "challenge": options["challenge"],
        "origin": origin,
        "counter": counter,
        "userVerified": true,
    })
}
