use crate::domain::person::PersonId;

use super::{identity::Identity, permission::Permission};

#[derive(Debug, PartialEq, thiserror::Error)]
#[error("user {identity} is not allowed to access this resource (requires {rule})")]
pub struct AccessDenied {
    pub identity: PersonId,
    pub rule: AccessRule,
}

/// Access requirement of one endpoint.
#[derive(Debug, Clone, PartialEq)]
pub enum AccessRule {
    /// The permission must be held.
    Require(Permission),
    /// The permission must be held, unless the acting identity is the target.
    RequireOrOwner(Permission, PersonId),
}

impl AccessRule {
    pub fn evaluate(&self, identity: &Identity) -> Result<(), AccessDenied> {
        let allowed = match self {
            AccessRule::Require(permission) => identity.has_permission(*permission),
            AccessRule::RequireOrOwner(permission, target) => {
                identity.has_permission(*permission) || identity.owns(target)
            }
        };
        if allowed {
            return Ok(());
        }
        tracing::debug!(user_id = %identity.id(), rule = %self, "Access denied");
        Err(AccessDenied {
            identity: *identity.id(),
            rule: self.clone(),
        })
    }
}

impl std::fmt::Display for AccessRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccessRule::Require(permission) => write!(f, "{}", permission),
            AccessRule::RequireOrOwner(permission, target) => {
                write!(f, "{} or ownership of person {}", permission, target)
            }
        }
    }
}
