use std::{net::SocketAddr, str::FromStr, time::Duration};

use hyper::header::HeaderValue;

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} not found in env file")]
    Missing(&'static str),
    #[error("{name} must be {expected}, got {value:?}")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    /// Timeout of one database operation, in milliseconds.
    pub database_timeout: u64,
    pub keycloak_certs_url: String,
    pub token_audience: String,
    pub keys_cache_ttl: Duration,
    pub bind_address: SocketAddr,
    pub session_idle_timeout: Duration,
    pub session_capacity: usize,
    /// Browser origins allowed to call the API with their cookies. Empty means
    /// same-origin only.
    pub allowed_origins: Vec<HeaderValue>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| lookup(name).ok_or(ConfigError::Missing(name));
        let parsed = |name: &'static str, default: &str, expected: &'static str| {
            let value = lookup(name).unwrap_or(default.to_string());
            value
                .parse::<u64>()
                .map_err(|_| ConfigError::Invalid {
                    name,
                    expected,
                    value,
                })
        };

        let bind_address = lookup("BIND_ADDRESS").unwrap_or("0.0.0.0:3000".to_string());
        let session_capacity = parsed("SESSION_CAPACITY", "10000", "a positive integer")?;
        if session_capacity == 0 {
            return Err(ConfigError::Invalid {
                name: "SESSION_CAPACITY",
                expected: "a positive integer",
                value: "0".to_string(),
            });
        }

        let allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(|origin| {
                // a wildcard cannot be combined with credentialed requests
                HeaderValue::from_str(origin)
                    .ok()
                    .filter(|value| value.as_bytes() != b"*")
                    .ok_or_else(|| ConfigError::Invalid {
                        name: "CORS_ALLOWED_ORIGINS",
                        expected: "a comma separated list of origins",
                        value: origin.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            database_timeout: parsed("DATABASE_TIMEOUT", "100", "an u64")?,
            keycloak_certs_url: required("KEYCLOAK_CERTS_URL")?,
            token_audience: lookup("TOKEN_AUDIENCE")
                .unwrap_or("person-access-front-end".to_string()),
            keys_cache_ttl: Duration::from_secs(parsed("KEYS_CACHE_TTL", "3600", "an u64")?),
            bind_address: SocketAddr::from_str(&bind_address).map_err(|_| {
                ConfigError::Invalid {
                    name: "BIND_ADDRESS",
                    expected: "a socket address",
                    value: bind_address.clone(),
                }
            })?,
            session_idle_timeout: Duration::from_secs(parsed(
                "SESSION_IDLE_TIMEOUT",
                "1800",
                "an u64",
            )?),
            session_capacity: session_capacity as usize,
            allowed_origins,
        })
    }
}

#[cfg(test)]
pub mod tests {
    use std::{collections::HashMap, time::Duration};

    use super::{AppConfig, ConfigError};

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    const REQUIRED: [(&str, &str); 2] = [
        ("DATABASE_URL", "postgres://localhost/person_access"),
        ("KEYCLOAK_CERTS_URL", "http://localhost:8080/certs"),
    ];

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup(&REQUIRED)).unwrap();
        assert_eq!(config.database_timeout, 100);
        assert_eq!(config.token_audience, "person-access-front-end");
        assert_eq!(config.bind_address.port(), 3000);
        assert_eq!(config.session_idle_timeout, Duration::from_secs(1800));
        assert_eq!(config.keys_cache_ttl, Duration::from_secs(3600));
        assert_eq!(config.session_capacity, 10000);
        assert!(config.allowed_origins.is_empty());
    }

    #[test]
    fn test_allowed_origins() {
        let mut vars = REQUIRED.to_vec();
        vars.push((
            "CORS_ALLOWED_ORIGINS",
            "https://app.example.com, http://localhost:5173",
        ));
        let config = AppConfig::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(
            config.allowed_origins,
            vec!["https://app.example.com", "http://localhost:5173"]
        );

        let mut vars = REQUIRED.to_vec();
        vars.push(("CORS_ALLOWED_ORIGINS", "https://app\u{1}.example.com"));
        assert!(matches!(
            AppConfig::from_lookup(lookup(&vars)).unwrap_err(),
            ConfigError::Invalid {
                name: "CORS_ALLOWED_ORIGINS",
                ..
            }
        ));

        let mut vars = REQUIRED.to_vec();
        vars.push(("CORS_ALLOWED_ORIGINS", "*"));
        assert!(AppConfig::from_lookup(lookup(&vars)).is_err());
    }

    #[test]
    fn test_missing_and_invalid_values() {
        assert_eq!(
            AppConfig::from_lookup(lookup(&[REQUIRED[1]])).unwrap_err(),
            ConfigError::Missing("DATABASE_URL")
        );

        let mut vars = REQUIRED.to_vec();
        vars.push(("DATABASE_TIMEOUT", "soon"));
        assert!(matches!(
            AppConfig::from_lookup(lookup(&vars)).unwrap_err(),
            ConfigError::Invalid {
                name: "DATABASE_TIMEOUT",
                ..
            }
        ));

        let mut vars = REQUIRED.to_vec();
        vars.push(("SESSION_CAPACITY", "0"));
        assert!(AppConfig::from_lookup(lookup(&vars)).is_err());

        let mut vars = REQUIRED.to_vec();
        vars.push(("BIND_ADDRESS", "localhost"));
        assert!(AppConfig::from_lookup(lookup(&vars)).is_err());
    }
}
