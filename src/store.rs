//! Session-identifier persistence
//!
//! The backend correlates turns into one conversation through an opaque
//! session id. The id is kept in a small key-value store injected into
//! startup, so the logic is testable without touching the real config
//! directory.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use anyhow::{Result, anyhow};
use uuid::Uuid;

pub const SESSION_ID_KEY: &str = "session_id";

/// Get/set-by-key storage capability
pub trait KvStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

/// File-backed store: one JSON object beside the config file
pub struct FileStore {
    path: PathBuf,
    entries: HashMap<String, String>,
}

impl FileStore {
    pub fn open_default() -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Self::open(config_dir.join("concierge-chat").join("state.json"))
    }

    pub fn open(path: PathBuf) -> Result<Self> {
        let entries = if path.exists() {
            let content = fs::read_to_string(&path)?;
            serde_json::from_str(&content)?
        } else {
            HashMap::new()
        };

        Ok(Self { path, entries })
    }
}

impl KvStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&self.entries)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

/// Return the persisted session id, generating and storing one on first run
pub fn ensure_session_id(store: &mut dyn KvStore) -> Result<String> {
    if let Some(id) = store.get(SESSION_ID_KEY) {
        return Ok(id);
    }

    let id = Uuid::new_v4().to_string();
    store.set(SESSION_ID_KEY, &id)?;
    tracing::debug!(session_id = %id, "generated new session id");
    Ok(id)
}
