//! Decides whether an options request starts a registration or an
//! authentication ceremony.
//!
//! A logged-in session already proves identity, so the only ceremony it may
//! start is adding a new credential. An anonymous caller disambiguates via an
//! email whose registration status picks the action; an explicit action is
//! accepted but must stay consistent with those facts.

use crate::errors::Rejection;
use crate::types::PasskeyAction;

/// Outcome of action resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAction {
    pub action: PasskeyAction,
    /// Effective email (`session_email ?? query_email`) the ceremony is for
    pub email: Option<String>,
}

/// Resolve the ceremony to run from session state and query input.
///
/// `email_exists` is whether the effective email already has a registered
/// user; callers compute it before resolving (it is ignored for logged-in
/// sessions).
pub(crate) fn resolve_action(
    explicit: Option<PasskeyAction>,
    logged_in: bool,
    session_email: Option<&str>,
    query_email: Option<&str>,
    email_exists: bool,
) -> Result<ResolvedAction, Rejection> {
    let email = session_email.or(query_email);

    if logged_in {
        if explicit == Some(PasskeyAction::Authenticate) {
            return Err(Rejection::AuthenticateWhileLoggedIn);
        }
        let Some(email) = email else {
            return Err(Rejection::EmailRequiredForNewPasskey);
        };
        return Ok(ResolvedAction {
            action: PasskeyAction::Register,
            email: Some(email.to_owned()),
        });
    }

    let Some(email) = email else {
        return Err(Rejection::EmailRequired);
    };

    let action = match explicit {
        Some(PasskeyAction::Authenticate) if !email_exists => {
            return Err(Rejection::NoAccountToAuthenticate);
        }
        Some(PasskeyAction::Register) if email_exists => {
            return Err(Rejection::AlreadyRegistered);
        }
        Some(action) => action,
        None if email_exists => PasskeyAction::Authenticate,
        None => PasskeyAction::Register,
    };

    Ok(ResolvedAction {
        action,
        email: Some(email.to_owned()),
    })
}
