use std::{fmt::Display, num::ParseIntError, str::FromStr};

/// Identifier shared by a person and its user account.
///
/// It travels as a string on the wire but is always an integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PersonId(i64);

impl PersonId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl FromStr for PersonId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().parse::<i64>()?))
    }
}

impl Display for PersonId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Person {
    id: PersonId,
    first_name: String,
    last_name: String,
    email: String,
}

impl Person {
    pub fn new(id: PersonId, first_name: &str, last_name: &str, email: &str) -> Self {
        Self {
            id,
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            email: email.to_string(),
        }
    }

    pub fn id(&self) -> &PersonId {
        &self.id
    }
    pub fn first_name(&self) -> &String {
        &self.first_name
    }
    pub fn last_name(&self) -> &String {
        &self.last_name
    }
    pub fn email(&self) -> &String {
        &self.email
    }
}
