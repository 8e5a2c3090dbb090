use std::{collections::HashMap, str::FromStr};

use jsonwebtoken::{decode_header, DecodingKey, Validation};
use serde::Deserialize;

use crate::domain::{
    access::{Identity, Permission},
    person::PersonId,
};

use super::router::{HttpError, UNAUTHENTICATED_ERROR};

/// Claims carried by the identity provider's access token.
#[derive(Debug, Deserialize)]
pub struct AuthToken {
    sub: String,
    #[serde(default)]
    preferred_username: Option<String>,
    #[serde(default)]
    permissions: Vec<String>,
}

impl AuthToken {
    pub fn username(&self) -> String {
        return self
            .preferred_username
            .clone()
            .unwrap_or("Unknown_user".to_owned());
    }

    /// Permissions this service knows about. Grants meant for other services
    /// are skipped.
    pub fn permissions(&self) -> Vec<Permission> {
        self.permissions
            .iter()
            .filter_map(|p| Permission::from_str(p).ok())
            .collect()
    }

    pub fn identity(&self) -> Result<Identity, HttpError<'static>> {
        let id = PersonId::from_str(&self.sub).map_err(|_| {
            HttpError::new(
                400,
                "InvalidToken",
                "The token subject is not a valid person identifier",
            )
        })?;
        Ok(Identity::new(id, &self.username(), &self.permissions()))
    }
}

pub fn extract_token(
    raw_token: &str,
    keys: &HashMap<String, DecodingKey>,
    validation: &Validation,
) -> Result<AuthToken, HttpError<'static>> {
    let invalid_token = HttpError::new(400, "InvalidToken", "The token you provided is invalid");
    if raw_token.is_empty() {
        return Err(UNAUTHENTICATED_ERROR);
    }
    let token_part = match raw_token.strip_prefix("Bearer ") {
        Some(token) => token,
        None => return Err(invalid_token),
    };
    let header = match decode_header(token_part) {
        Ok(v) => v,
        Err(_) => return Err(invalid_token),
    };
    let kid = match header.kid {
        Some(kid) => kid,
        None => return Err(invalid_token),
    };
    let decoding_key = match keys.get(&kid) {
        Some(key) => key,
        None => return Err(invalid_token),
    };
    match jsonwebtoken::decode::<AuthToken>(token_part, decoding_key, validation) {
        Ok(res) => Ok(res.claims),
        Err(e) => {
            tracing::info!("Token error : {:?}", e);
            Err(invalid_token)
        }
    }
}
