use jsonwebtoken::DecodingKey;
use lazy_static::lazy_static;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

#[derive(Debug, thiserror::Error)]
pub enum KeysError {
    #[error("cannot fetch the identity provider certificates: {0}")]
    Fetch(#[from] reqwest::Error),
    #[error("invalid identity provider key: {0}")]
    InvalidKey(#[from] jsonwebtoken::errors::Error),
}

#[derive(Deserialize)]
struct KeycloakCerts {
    keys: Vec<KeycloakKey>,
}

#[derive(Deserialize)]
struct KeycloakKey {
    kid: String,
    n: String,
    e: String,
    kty: String,
}

struct CachedKeys {
    keys: HashMap<String, DecodingKey>,
    last_fetched: Option<Instant>,
}

lazy_static! {
    static ref KEYCLOAK_KEYS_CACHE: Mutex<CachedKeys> = Mutex::new(CachedKeys {
        keys: HashMap::new(),
        last_fetched: None,
    });
}

/// Returns the provider's RSA verification keys by key id, refetching them
/// once the cached set is older than `ttl`.
pub async fn get_keycloak_keys(
    certs_url: &str,
    ttl: Duration,
) -> Result<HashMap<String, DecodingKey>, KeysError> {
    let mut cache = KEYCLOAK_KEYS_CACHE.lock().await;

    if let Some(last_fetched) = cache.last_fetched {
        if last_fetched.elapsed() < ttl {
            return Ok(cache.keys.clone());
        }
    }

    let client = Client::new();
    let response = client.get(certs_url).send().await?.error_for_status()?;
    let keycloak_certs: KeycloakCerts = response.json().await?;

    let mut keys = HashMap::new();
    for key in keycloak_certs.keys {
        if key.kty == "RSA" {
            let decoding_key = DecodingKey::from_rsa_components(&key.n, &key.e)?;
            keys.insert(key.kid, decoding_key);
        }
    }
    tracing::info!("Fetched {} verification keys", keys.len());

    cache.keys = keys.clone();
    cache.last_fetched = Some(Instant::now());

    Ok(keys)
}
