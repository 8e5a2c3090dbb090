pub mod keycloak;
pub mod person;
pub mod router;
pub mod session;
pub mod token;
pub mod view;
