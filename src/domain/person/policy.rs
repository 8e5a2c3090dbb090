//! Access rule of every person endpoint, evaluated before any handler logic.

use crate::domain::access::{AccessRule, Permission};

use super::person::PersonId;

pub fn view_person(target: PersonId) -> AccessRule {
    AccessRule::RequireOrOwner(Permission::ViewPerson, target)
}

pub fn view_my_profile() -> AccessRule {
    AccessRule::Require(Permission::ViewMyProfile)
}

pub fn delete_person(target: PersonId) -> AccessRule {
    AccessRule::RequireOrOwner(Permission::UpdatePerson, target)
}

pub fn update_person(target: PersonId) -> AccessRule {
    AccessRule::RequireOrOwner(Permission::UpdatePerson, target)
}

pub fn list_persons() -> AccessRule {
    AccessRule::Require(Permission::ViewPersonsList)
}

pub fn search_persons() -> AccessRule {
    AccessRule::Require(Permission::ViewPersonsList)
}
