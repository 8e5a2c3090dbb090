use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use cached::{Cached, SizedCache};
use cookie::{Cookie, SameSite};
use subtle::ConstantTimeEq;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::{access::Identity, person::PersonId};

pub const SESSION_COOKIE: &str = "SESSION";

/// Server side state of one browser session.
#[derive(Debug, Clone)]
pub struct Session {
    id: String,
    user_id: PersonId,
    csrf_token: String,
    last_seen: Instant,
}

impl Session {
    fn new(user_id: PersonId) -> Self {
        Self {
            id: Uuid::new_v4().simple().to_string(),
            user_id,
            csrf_token: Uuid::new_v4().to_string(),
            last_seen: Instant::now(),
        }
    }

    pub fn id(&self) -> &String {
        &self.id
    }

    pub fn user_id(&self) -> &PersonId {
        &self.user_id
    }

    pub fn csrf_token(&self) -> &String {
        &self.csrf_token
    }

    /// The submitted token must match the session's token exactly. The
    /// comparison time does not depend on where the two tokens differ.
    pub fn verify_csrf_token(&self, submitted: &str) -> bool {
        self.csrf_token
            .as_bytes()
            .ct_eq(submitted.as_bytes())
            .into()
    }

    /// `Set-Cookie` value binding a browser to this session.
    pub fn cookie(&self) -> String {
        Cookie::build((SESSION_COOKIE, self.id.as_str()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .build()
            .to_string()
    }
}

/// Everything a handler knows about its caller, resolved once per request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub identity: Identity,
    pub session: Session,
}

#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<Mutex<SizedCache<String, Session>>>,
    idle_timeout: Duration,
}

impl SessionStore {
    /// `capacity` must be positive; the least recently used session is evicted
    /// once it is reached.
    pub fn new(capacity: usize, idle_timeout: Duration) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(SizedCache::with_size(capacity))),
            idle_timeout,
        }
    }

    /// Returns the caller's live session, or starts a new one. The flag is
    /// true when the session was just created and its cookie must be sent.
    ///
    /// A session is only reused by the identity that created it.
    pub async fn resolve(&self, session_id: Option<&str>, identity: &Identity) -> (Session, bool) {
        let mut sessions = self.sessions.lock().await;
        if let Some(session_id) = session_id {
            let key = session_id.to_string();
            let mut expired = false;
            if let Some(session) = sessions.cache_get_mut(&key) {
                if session.last_seen.elapsed() >= self.idle_timeout {
                    expired = true;
                } else if session.user_id == *identity.id() {
                    session.last_seen = Instant::now();
                    return (session.clone(), false);
                }
            }
            if expired {
                sessions.cache_remove(&key);
            }
        }
        let session = Session::new(*identity.id());
        tracing::debug!(user_id = %identity.id(), "Starting a new session");
        sessions.cache_set(session.id.clone(), session.clone());
        (session, true)
    }
}

/// Finds the session id in a `Cookie` request header.
pub fn session_id_from_cookies(cookie_header: &str) -> Option<String> {
    Cookie::split_parse(cookie_header)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
}
