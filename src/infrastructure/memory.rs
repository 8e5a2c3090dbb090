//! In-memory store used by the handler and manager tests.

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::{Arc, Mutex},
};

use crate::domain::person::{Person, PersonId, PersonRepository, PersonRepositoryError};

#[derive(Clone, Default)]
pub struct MemoryPersonRepository {
    persons: Arc<Mutex<BTreeMap<PersonId, Person>>>,
    users: Arc<Mutex<BTreeSet<PersonId>>>,
    failure: Option<String>,
    user_deletion_failure: Option<String>,
}

impl MemoryPersonRepository {
    pub fn with_persons(persons: &[Person]) -> Self {
        let repository = Self::default();
        {
            let mut map = repository.persons.lock().unwrap();
            for person in persons {
                map.insert(*person.id(), person.clone());
            }
        }
        repository
    }

    pub fn with_users(self, ids: &[i64]) -> Self {
        self.users
            .lock()
            .unwrap()
            .extend(ids.iter().map(|id| PersonId::new(*id)));
        self
    }

    /// Every call fails with an internal error.
    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Default::default()
        }
    }

    /// Removing a user account fails, which rolls the whole deletion back.
    pub fn failing_user_deletion(self, message: &str) -> Self {
        Self {
            user_deletion_failure: Some(message.to_string()),
            ..self
        }
    }

    pub fn contains(&self, id: &PersonId) -> bool {
        self.persons.lock().unwrap().contains_key(id)
    }

    pub fn has_user(&self, id: &PersonId) -> bool {
        self.users.lock().unwrap().contains(id)
    }

    pub fn get_person_by_id_sync(&self, id: &PersonId) -> Option<Person> {
        self.persons.lock().unwrap().get(id).cloned()
    }

    fn check(&self) -> Result<(), PersonRepositoryError> {
        match &self.failure {
            Some(message) => Err(PersonRepositoryError::InternalError(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl PersonRepository for MemoryPersonRepository {
    async fn update_person(&self, person: &Person) -> Result<(), PersonRepositoryError> {
        self.check()?;
        match self.persons.lock().unwrap().get_mut(person.id()) {
            Some(stored) => {
                *stored = person.clone();
                Ok(())
            }
            None => Err(PersonRepositoryError::PersonNotFound),
        }
    }

    async fn get_person_by_id(&self, id: &PersonId) -> Result<Person, PersonRepositoryError> {
        self.check()?;
        self.get_person_by_id_sync(id)
            .ok_or(PersonRepositoryError::PersonNotFound)
    }

    async fn get_persons(&self) -> Result<Vec<Person>, PersonRepositoryError> {
        self.check()?;
        Ok(self.persons.lock().unwrap().values().cloned().collect())
    }

    async fn search_persons(
        &self,
        search_term: &str,
    ) -> Result<Vec<Person>, PersonRepositoryError> {
        self.check()?;
        let term = search_term.to_lowercase();
        Ok(self
            .persons
            .lock()
            .unwrap()
            .values()
            .filter(|p| {
                p.first_name().to_lowercase().contains(&term)
                    || p.last_name().to_lowercase().contains(&term)
            })
            .cloned()
            .collect())
    }

    async fn delete_person_and_user(&self, id: &PersonId) -> Result<(), PersonRepositoryError> {
        self.check()?;
        let mut persons = self.persons.lock().unwrap();
        let mut users = self.users.lock().unwrap();
        if !persons.contains_key(id) {
            return Err(PersonRepositoryError::PersonNotFound);
        }
        if let Some(message) = &self.user_deletion_failure {
            return Err(PersonRepositoryError::InternalError(message.clone()));
        }
        persons.remove(id);
        users.remove(id);
        Ok(())
    }
}
