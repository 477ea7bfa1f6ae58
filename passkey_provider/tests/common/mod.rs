//! Fixtures shared by the integration tests: a mock ceremony library built on
//! the public trait, seeded storage, and client-response builders.

use std::sync::Arc;

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use http::HeaderMap;
use http::header::{COOKIE, SET_COOKIE};
use serde_json::{Value, json};

use passkey_provider::{
    Account, AuthenticationInfo, AuthenticationRequest, Authenticator, CeremonyError,
    CeremonyLibrary, CredentialDeviceType, ExpectedCeremony, MemoryAdapter,
    PASSKEY_PROVIDER_ID, PasskeyProvider, RegistrationData, RegistrationInfo,
    RegistrationRequest, RelyingParty, User,
};

pub const TEST_ORIGIN: &str = "https://example.com";

/// Mock engine: random challenges out, field-by-field comparison of the
/// client data in, counter check like a real library's clone detection.
pub struct MockCeremonyLibrary;

fn check_client_data(
    expected: &ExpectedCeremony,
    response: &Value,
    ceremony_type: &str,
) -> Result<(), CeremonyError> {
    if response["challenge"].as_str() != Some(expected.challenge.as_str()) {
        return Err(CeremonyError::Verification("Challenge mismatch".to_string()));
    }
    if response["origin"].as_str() != Some(expected.origin.as_str()) {
        return Err(CeremonyError::Verification("Origin mismatch".to_string()));
    }
    if response["type"].as_str() != Some(ceremony_type) {
        return Err(CeremonyError::Verification("Type mismatch".to_string()));
    }
    Ok(())
}

fn random_challenge() -> String {
    let mut bytes = [0u8; 32];
    ring::rand::SecureRandom::fill(&ring::rand::SystemRandom::new(), &mut bytes)
        .expect("rng must be available in tests");
    URL_SAFE_NO_PAD.encode(bytes)
}

#[async_trait]
impl CeremonyLibrary for MockCeremonyLibrary {
    async fn registration_options(
        &self,
        rp: &RelyingParty,
        request: RegistrationRequest,
    ) -> Result<Value, CeremonyError> {
        Ok(json!({
            "challenge": random_challenge(),
            "rp": {"name": rp.name, "id": rp.id},
            "user": {
                "id": request.user.id,
                "name": request.user.name,
                "displayName": request.user.display_name,
            },
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
            "challenge": random_challenge(),
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
        let credential_id = response["id"]
            .as_str()
            .and_then(|id| URL_SAFE_NO_PAD.decode(id).ok())
            .ok_or_else(|| CeremonyError::Verification("Malformed credential id".to_string()))?;

        Ok(RegistrationInfo {
            credential_id,
            public_key: b"mock-public-key".to_vec(),
            counter: response["counter"].as_u64().unwrap_or(0) as u32,
            device_type: CredentialDeviceType::MultiDevice,
            backed_up: true,
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

        let new_counter = response["counter"].as_u64().unwrap_or(0) as u32;
        if new_counter != 0 && new_counter <= authenticator.counter {
            return Err(CeremonyError::Verification(format!(
                "Counter did not increase: stored {}, reported {}",
                authenticator.counter, new_counter
            )));
        }

        Ok(AuthenticationInfo { new_counter })
    }
}

pub fn test_provider(adapter: Arc<MemoryAdapter>) -> PasskeyProvider {
    let rp = RelyingParty::from_origin("Example", TEST_ORIGIN).unwrap();
    PasskeyProvider::new(rp, b"integration-test-secret".to_vec(), adapter, Arc::new(MockCeremonyLibrary))
}

/// Seed a user with one registered passkey credential.
pub async fn seed_registered_user(
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

/// Persist the records a verified registration hands back, the way a host
/// framework's sign-up pipeline would.
pub async fn persist_registration(adapter: &MemoryAdapter, data: &RegistrationData) {
    adapter.put_user(data.user.clone()).await;
    adapter.put_account(data.account.clone()).await;
    adapter.put_authenticator(data.authenticator.clone()).await;
}

/// Turn the `Set-Cookie` from an options response into the `Cookie` header a
/// client would send back.
pub fn cookie_jar(issue_headers: &HeaderMap) -> HeaderMap {
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

pub fn registration_response(
    options: &Value,
    origin: &str,
    credential_id: &[u8],
    counter: u32,
) -> Value {
    json!({
        "id": URL_SAFE_NO_PAD.encode(credential_id),
        "type": "webauthn.create",
        "challenge": options["challenge"],
        "origin": origin,
        "counter": counter,
        "userVerified": true,
    })
}

pub fn authentication_response(
    options: &Value,
    origin: &str,
    credential_id: &[u8],
    counter: u32,
) -> Value {
    json!({
        "id": URL_SAFE_NO_PAD.encode(credential_id),
        "type": "webauthn.get",
        "challenge": options["challenge"],
        "origin": origin,
        "counter": counter,
        "userVerified": true,
    })
}
