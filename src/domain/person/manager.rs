use super::{
    person::{Person, PersonId},
    repository::{PersonRepository, PersonRepositoryError},
};

#[derive(Clone)]
pub struct PersonManager {
    person_repository: Box<dyn PersonRepository>,
}

impl PersonManager {
    pub fn new(person_repository: Box<dyn PersonRepository>) -> Self {
        return PersonManager { person_repository };
    }

    pub async fn update_person(&self, person: Person) -> Result<(), PersonRepositoryError> {
        self.person_repository.update_person(&person).await
    }

    pub async fn get_person_by_id(&self, id: &PersonId) -> Result<Person, PersonRepositoryError> {
        self.person_repository.get_person_by_id(id).await
    }

    pub async fn get_persons(&self) -> Result<Vec<Person>, PersonRepositoryError> {
        self.person_repository.get_persons().await
    }

    pub async fn search_persons(
        &self,
        search_term: &str,
    ) -> Result<Vec<Person>, PersonRepositoryError> {
        self.person_repository.search_persons(search_term).await
    }

    /// Removes the person and its user account as one unit.
    pub async fn delete_person(&self, id: &PersonId) -> Result<(), PersonRepositoryError> {
        self.person_repository.delete_person_and_user(id).await
    }
}

#[cfg(test)]
pub mod tests {
    use async_trait::async_trait;
    use mockall::mock;

    use crate::{
        domain::person::{Person, PersonId, PersonRepository, PersonRepositoryError},
        infrastructure::memory::MemoryPersonRepository,
    };

    use super::PersonManager;

    mock! {
        pub PersonRepo {}
        impl Clone for PersonRepo {
            fn clone(&self) -> Self;
        }
        #[async_trait]
        impl PersonRepository for PersonRepo {
            async fn update_person(&self, person: &Person) -> Result<(), PersonRepositoryError>;
            async fn get_person_by_id(&self, id: &PersonId) -> Result<Person, PersonRepositoryError>;
            async fn get_persons(&self) -> Result<Vec<Person>, PersonRepositoryError>;
            async fn search_persons(&self, search_term: &str) -> Result<Vec<Person>, PersonRepositoryError>;
            async fn delete_person_and_user(&self, id: &PersonId) -> Result<(), PersonRepositoryError>;
        }
    }

    fn person(id: i64) -> Person {
        Person::new(PersonId::new(id), "Ada", "Lovelace", "ada@example.com")
    }

    #[tokio::test]
    async fn test_delete_removes_person_and_user() {
        let persons =
            MemoryPersonRepository::with_persons(&[person(7), person(8)]).with_users(&[7, 8]);
        let manager = PersonManager::new(Box::new(persons.clone()));

        assert_eq!(manager.delete_person(&PersonId::new(7)).await, Ok(()));
        assert!(!persons.contains(&PersonId::new(7)));
        assert!(!persons.has_user(&PersonId::new(7)));
        assert!(persons.contains(&PersonId::new(8)));
        assert!(persons.has_user(&PersonId::new(8)));
    }

    #[tokio::test]
    async fn test_delete_twice_is_not_found() {
        let persons = MemoryPersonRepository::with_persons(&[person(7)]).with_users(&[7]);
        let manager = PersonManager::new(Box::new(persons.clone()));

        assert_eq!(manager.delete_person(&PersonId::new(7)).await, Ok(()));
        assert_eq!(
            manager.delete_person(&PersonId::new(7)).await,
            Err(PersonRepositoryError::PersonNotFound)
        );
        assert!(!persons.contains(&PersonId::new(7)));
    }

    #[tokio::test]
    async fn test_failed_user_deletion_keeps_both_records() {
        let persons = MemoryPersonRepository::with_persons(&[person(7)])
            .with_users(&[7])
            .failing_user_deletion("timeout");
        let manager = PersonManager::new(Box::new(persons.clone()));

        let res = manager.delete_person(&PersonId::new(7)).await;
        assert!(matches!(res, Err(PersonRepositoryError::InternalError(_))));
        assert_eq!(persons.get_person_by_id_sync(&PersonId::new(7)), Some(person(7)));
        assert!(persons.has_user(&PersonId::new(7)));
    }

    #[tokio::test]
    async fn test_delete_without_user_account_succeeds() {
        let persons = MemoryPersonRepository::with_persons(&[person(7)]);
        let manager = PersonManager::new(Box::new(persons.clone()));

        assert_eq!(manager.delete_person(&PersonId::new(7)).await, Ok(()));
        assert!(!persons.contains(&PersonId::new(7)));
    }

    #[tokio::test]
    async fn test_delete_is_a_single_store_call() {
        let mut repository = MockPersonRepo::new();
        repository.expect_get_person_by_id().never();
        repository
            .expect_delete_person_and_user()
            .withf(|id| id == &PersonId::new(7))
            .times(1)
            .returning(|_| Err(PersonRepositoryError::InternalError("rolled back".to_string())));
        let manager = PersonManager::new(Box::new(repository));

        assert_eq!(
            manager.delete_person(&PersonId::new(7)).await,
            Err(PersonRepositoryError::InternalError("rolled back".to_string()))
        );
    }
}
