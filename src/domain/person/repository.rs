use super::person::{Person, PersonId};

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum PersonRepositoryError {
    #[error("person not found")]
    PersonNotFound,
    #[error("internal error: {0}")]
    InternalError(String),
}

#[async_trait::async_trait]
pub trait PersonRepository: PersonClone + Send + Sync {
    /// Overwrites every editable field. Fails with `PersonNotFound` when no
    /// record carries the person's id.
    async fn update_person(&self, person: &Person) -> Result<(), PersonRepositoryError>;
    async fn get_person_by_id(&self, id: &PersonId) -> Result<Person, PersonRepositoryError>;
    async fn get_persons(&self) -> Result<Vec<Person>, PersonRepositoryError>;
    async fn search_persons(&self, search_term: &str)
        -> Result<Vec<Person>, PersonRepositoryError>;
    /// Removes the person and the user account sharing its id in one
    /// transaction. Either both are gone afterwards or neither changed.
    /// A person without an account is still removed.
    async fn delete_person_and_user(&self, id: &PersonId) -> Result<(), PersonRepositoryError>;
}

pub trait PersonClone {
    fn clone_box(&self) -> Box<dyn PersonRepository>;
}

impl<T> PersonClone for T
where
    T: 'static + PersonRepository + Clone,
{
    fn clone_box(&self) -> Box<dyn PersonRepository> {
        Box::new(self.clone())
    }
}

impl Clone for Box<dyn PersonRepository> {
    fn clone(&self) -> Box<dyn PersonRepository> {
        self.clone_box()
    }
}
