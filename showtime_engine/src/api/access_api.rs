use std::fmt::{Debug, Display};

use log::*;

use crate::{
    db_types::{Principal, ADMIN_ROLE},
    identity::IdentityLookup,
};

/// The outcome of an authorization check. Callers typically collapse the two failure cases into the same response,
/// but they are kept apart here so they can be logged differently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    Authorized,
    Denied(String),
    LookupFailed(String),
}

impl AccessDecision {
    pub fn is_authorized(&self) -> bool {
        matches!(self, AccessDecision::Authorized)
    }
}

impl Display for AccessDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccessDecision::Authorized => write!(f, "authorized"),
            AccessDecision::Denied(reason) => write!(f, "denied: {reason}"),
            AccessDecision::LookupFailed(e) => write!(f, "lookup failed: {e}"),
        }
    }
}

pub struct AccessApi<I> {
    identity: I,
}

impl<I> Debug for AccessApi<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AccessApi")
    }
}

impl<I> AccessApi<I>
where I: IdentityLookup
{
    pub fn new(identity: I) -> Self {
        Self { identity }
    }

    /// Check whether `principal` holds the admin role.
    pub async fn check_admin(&self, principal: Option<&Principal>) -> AccessDecision {
        let Some(principal) = principal else {
            return AccessDecision::LookupFailed("the request has no authenticated principal".into());
        };
        match self.identity.fetch_user_role(&principal.user_id).await {
            Ok(Some(role)) if role == ADMIN_ROLE => {
                trace!("🔐️ {principal} is an admin");
                AccessDecision::Authorized
            },
            Ok(Some(role)) => AccessDecision::Denied(format!("{principal} has role '{role}'")),
            Ok(None) => AccessDecision::Denied(format!("{principal} has no role")),
            Err(e) => AccessDecision::LookupFailed(e.to_string()),
        }
    }
}
