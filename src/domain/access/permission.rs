use std::{fmt::Display, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    ViewPerson,
    UpdatePerson,
    ViewMyProfile,
    ViewPersonsList,
}

impl FromStr for Permission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "VIEW_PERSON" => Ok(Permission::ViewPerson),
            "UPDATE_PERSON" => Ok(Permission::UpdatePerson),
            "VIEW_MY_PROFILE" => Ok(Permission::ViewMyProfile),
            "VIEW_PERSONS_LIST" => Ok(Permission::ViewPersonsList),
            _ => Err(format!("Invalid permission: {}", s)),
        }
    }
}

impl Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Permission::ViewPerson => f.write_str("VIEW_PERSON"),
            Permission::UpdatePerson => f.write_str("UPDATE_PERSON"),
            Permission::ViewMyProfile => f.write_str("VIEW_MY_PROFILE"),
            Permission::ViewPersonsList => f.write_str("VIEW_PERSONS_LIST"),
        }
    }
}
