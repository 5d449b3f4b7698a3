//! Session storage seam.
//!
//! Holds the auth token and the learner's identity records between visits.
//! The progression engine only ever reads from it; writes happen in the
//! login flow, which lives outside this workspace.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::Deserialize;

/// Well-known session keys, matching what the login flow writes.
pub mod keys {
    pub const AUTH_TOKEN: &str = "authToken";
    pub const EMPLOYEE_ID: &str = "empID";
    pub const USER_DATA: &str = "userData";
}

/// Key-value session storage.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: String);
    fn remove(&self, key: &str);
}

/// The user record the login flow stores under [`keys::USER_DATA`].
///
/// Several historical field spellings coexist in stored records; the loader
/// tries them in a fixed order.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoredUser {
    #[serde(rename = "empID", default)]
    pub emp_id: Option<String>,
    #[serde(rename = "employeeId", default)]
    pub employee_id: Option<String>,
    #[serde(rename = "_id", default)]
    pub record_id: Option<String>,
    #[serde(rename = "userId", default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

impl StoredUser {
    /// Parses a stored record, tolerating malformed JSON as absent.
    #[must_use]
    pub fn from_json(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }

    /// Employee badge id, preferring the canonical spelling.
    #[must_use]
    pub fn resolve_employee_id(&self) -> Option<&str> {
        self.emp_id.as_deref().or(self.employee_id.as_deref())
    }

    /// Backend user-record id, preferring the primary key field.
    #[must_use]
    pub fn resolve_user_id(&self) -> Option<&str> {
        self.record_id.as_deref().or(self.user_id.as_deref())
    }
}

/// Simple in-memory session store for testing and headless use.
#[derive(Clone, Default)]
pub struct InMemorySessionStore {
    values: Arc<Mutex<HashMap<String, String>>>,
}

impl InMemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for InMemorySessionStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: String) {
        if let Ok(mut values) = self.values.lock() {
            values.insert(key.to_string(), value);
        }
    }

    fn remove(&self, key: &str) {
        if let Ok(mut values) = self.values.lock() {
            values.remove(key);
        }
    }
}
