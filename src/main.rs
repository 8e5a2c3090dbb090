use std::sync::Arc;

use application::api::{
    router::{APIError, MainRouter, RouterConfig},
    session::SessionStore,
    view::JsonViewRenderer,
};
use config::AppConfig;
use domain::person::PersonManager;
use dotenv::dotenv;
use infrastructure::{connect, person::postgres::postgres_repository::PostgresPersonRepository};
use tokio::runtime::Runtime;

mod application;
mod config;
mod domain;
mod infrastructure;
mod logging;

fn main() {
    dotenv().ok();
    logging::setup_logging().expect("Cannot setup logging");
    // Check of env variables before starting the app.
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let rt = Runtime::new().expect("Cannot start the tokio runtime");
    rt.block_on(async {
        let pool = connect(&config.database_url, config.database_timeout)
            .await
            .expect("Cannot connect to the DB");
        let person_repository = PostgresPersonRepository::new(pool, config.database_timeout)
            .await
            .expect("Cannot create the persons and users tables");
        let person_manager = PersonManager::new(Box::new(person_repository));
        let session_store =
            SessionStore::new(config.session_capacity, config.session_idle_timeout);
        let main_router = MainRouter::new(
            person_manager,
            session_store,
            Arc::new(JsonViewRenderer),
            RouterConfig {
                bind_address: config.bind_address,
                keycloak_certs_url: config.keycloak_certs_url.clone(),
                token_audience: config.token_audience.clone(),
                keys_cache_ttl: config.keys_cache_ttl,
                allowed_origins: config.allowed_origins.clone(),
            },
        );
        if let Err(APIError::ConfigurationError(e)) = main_router.run().await {
            tracing::error!("An error occured: {}", e);
        }
    })
}
