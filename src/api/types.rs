//! Shared state for the HTTP layer.

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::predict::Predictor;

/// Name of the cookie carrying the session id
pub const SESSION_COOKIE: &str = "session";

/// Default listen address
pub const DEFAULT_ADDR: &str = "127.0.0.1:5000";

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    pub addr: SocketAddr,
    /// Email to password. Demo accounts only, no hashing.
    pub credentials: HashMap<String, String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let credentials = [
            ("test@example.com", "1234"),
            ("yash@example.com", "password"),
        ]
        .into_iter()
        .map(|(email, password)| (email.to_string(), password.to_string()))
        .collect();

        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 5000)),
            credentials,
        }
    }
}

impl ServerConfig {
    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    /// True when `email` exists and `password` matches exactly
    pub fn check_credentials(&self, email: &str, password: &str) -> bool {
        self.credentials
            .get(email)
            .is_some_and(|expected| expected == password)
    }
}

/// In-memory set of logged-in session ids
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: HashSet<String>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session and return its id
    pub fn open(&mut self) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        self.sessions.insert(id.clone());
        id
    }

    /// Drop a session; returns whether it existed
    pub fn close(&mut self, id: &str) -> bool {
        self.sessions.remove(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.sessions.contains(id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// State handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub predictor: Arc<Predictor>,
    pub config: Arc<ServerConfig>,
    pub sessions: Arc<Mutex<SessionStore>>,
}

impl AppState {
    pub fn new(predictor: Arc<Predictor>, config: ServerConfig) -> Self {
        Self {
            predictor,
            config: Arc::new(config),
            sessions: Arc::new(Mutex::new(SessionStore::new())),
        }
    }

    pub fn lock_sessions(&self) -> Result<std::sync::MutexGuard<'_, SessionStore>, ApiError> {
        self.sessions
            .lock()
            .map_err(|_| ApiError::Internal("session lock poisoned".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_credentials() {
        let config = ServerConfig::default();
        assert!(config.check_credentials("test@example.com", "1234"));
        assert!(config.check_credentials("yash@example.com", "password"));
        assert!(!config.check_credentials("test@example.com", "password"));
        assert!(!config.check_credentials("nobody@example.com", "1234"));
        assert_eq!(config.addr.to_string(), DEFAULT_ADDR);
    }

    #[test]
    fn session_open_close() {
        let mut store = SessionStore::new();
        let id = store.open();
        assert!(store.contains(&id));
        assert_eq!(store.len(), 1);
        assert!(store.close(&id));
        assert!(!store.close(&id));
        assert!(store.is_empty());
    }
}
