use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Key/value persistence the host shell provides (browser local storage in
/// the real front-end). Synchronous by contract, like the storage it models.
pub trait KeyValueStorage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

#[derive(Clone, Default)]
pub struct MemoryStorage {
    inner: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.inner.lock().unwrap().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.inner.lock().unwrap().insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.inner.lock().unwrap().remove(key);
    }
}

pub const SESSION_KEY: &str = "mall.session.v1";

// Flat keys written by the previous front-end. Read once as a fallback,
// always cleared together with the record.
const LEGACY_KEYS: [&str; 5] = [
    "userAuthenticated",
    "userPhone",
    "userRole",
    "userId",
    "isAuthenticated",
];

/// The whole local session as one versioned record, stored under a single
/// key so it can never be half-cleared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub version: u8,
    pub authenticated: bool,
    pub phone: String,
    pub role: String,
    pub user_id: String,
    pub token: String,
}

impl SessionRecord {
    pub fn new(phone: String, role: String, user_id: String, token: String) -> Self {
        Self {
            version: 1,
            authenticated: true,
            phone,
            role,
            user_id,
            token,
        }
    }
}

/// Single accessor for the local session. All reads and writes of session
/// state go through here.
#[derive(Clone)]
pub struct SessionStore<S> {
    storage: S,
}

impl<S: KeyValueStorage> SessionStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn load(&self) -> Option<SessionRecord> {
        if let Some(raw) = self.storage.get(SESSION_KEY) {
            return serde_json::from_str(&raw).ok();
        }
        self.load_legacy()
    }

    // Storages written before the record existed carry flat string keys.
    // They have no session token, so a corroborated gate will still force a
    // fresh login; a local-only gate keeps working.
    fn load_legacy(&self) -> Option<SessionRecord> {
        if self.storage.get("userAuthenticated").as_deref() == Some("true") {
            return Some(SessionRecord {
                version: 0,
                authenticated: true,
                phone: self.storage.get("userPhone").unwrap_or_default(),
                role: self.storage.get("userRole").unwrap_or_else(|| "user".to_string()),
                user_id: self.storage.get("userId").unwrap_or_default(),
                token: String::new(),
            });
        }
        if self.storage.get("isAuthenticated").as_deref() == Some("true") {
            return Some(SessionRecord {
                version: 0,
                authenticated: true,
                phone: String::new(),
                role: "admin".to_string(),
                user_id: String::new(),
                token: String::new(),
            });
        }
        None
    }

    pub fn save(&self, record: &SessionRecord) {
        if let Ok(raw) = serde_json::to_string(record) {
            self.storage.set(SESSION_KEY, &raw);
        }
    }

    /// Removes the record and every legacy key in one call.
    pub fn clear(&self) {
        self.storage.remove(SESSION_KEY);
        for key in LEGACY_KEYS {
            self.storage.remove(key);
        }
    }
}
