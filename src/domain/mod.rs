pub mod access;
pub mod person;
