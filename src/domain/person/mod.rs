mod manager;
mod person;
pub mod policy;
mod repository;

pub use manager::PersonManager;
pub use person::{Person, PersonId};
pub use repository::{PersonRepository, PersonRepositoryError};
