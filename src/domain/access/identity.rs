use std::collections::HashSet;

use crate::domain::person::PersonId;

use super::permission::Permission;

/// The authenticated principal behind the current request.
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    id: PersonId,
    username: String,
    permissions: HashSet<Permission>,
}

impl Identity {
    pub fn new(id: PersonId, username: &str, permissions: &[Permission]) -> Self {
        Self {
            id,
            username: username.to_string(),
            permissions: permissions.iter().copied().collect(),
        }
    }

    pub fn id(&self) -> &PersonId {
        &self.id
    }

    pub fn username(&self) -> &String {
        &self.username
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }

    pub fn owns(&self, target: &PersonId) -> bool {
        &self.id == target
    }
}
