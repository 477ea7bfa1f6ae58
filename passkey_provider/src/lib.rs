//! passkey-provider - Passkey ceremony orchestration for authentication
//! frameworks
//!
//! This crate decides whether an incoming request starts a registration or an
//! authentication ceremony, issues a one-time challenge carried in a signed
//! cookie, and verifies the client's ceremony response against it. The
//! cryptographic engine ([`CeremonyLibrary`]) and the storage layer
//! ([`Adapter`]) are collaborator boundaries the host plugs in.

mod adapter;
mod ceremony;
mod config;
mod cookie;
mod errors;
mod provider;
mod types;
mod utils;

#[cfg(test)]
mod test_utils;

pub use adapter::{Adapter, AdapterError, MemoryAdapter};

pub use ceremony::{
    AuthenticationInfo, AuthenticationRequest, AuthenticatorSelection, CeremonyError,
    CeremonyLibrary, CeremonyUserEntity, CredentialDescriptor, ExpectedCeremony,
    RegistrationInfo, RegistrationRequest,
};

pub use config::{CHALLENGE_COOKIE_NAME, RelyingParty};

pub use cookie::{ChallengeCookieCodec, ChallengePayload, CookieError};

pub use errors::{ProviderError, Rejection};

pub use provider::{CeremonyOutcome, PasskeyProvider};

pub use types::{
    Account, Authenticator, CredentialDeviceType, OptionsBody, OptionsRequest,
    PASSKEY_PROVIDER_ID, PasskeyAction, RegistrationData, SessionState, User, UserData,
};
