use crate::error::Result;
use log::warn;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// Bumped when the notice text changes so it shows again.
pub const NOTICE_KEY: &str = "demo_notice_dismissed_v2";

pub const NOTICE_TEXT: &str = "This demo runs on free-tier cloud infrastructure. \
If inactive, the server may take ~20–40 seconds to wake.";

/// Small string key/value file. Reads never fail: anything unreadable is
/// treated as missing.
#[derive(Debug, Clone)]
pub struct LocalStore {
    path: PathBuf,
}

impl LocalStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Map<String, Value> {
        fs::read_to_string(&self.path)
            .ok()
            .and_then(|text| serde_json::from_str::<Value>(&text).ok())
            .and_then(|value| match value {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .unwrap_or_default()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        match self.load().remove(key) {
            Some(Value::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Writes through a temp file and a rename. Errors are logged, not returned.
    pub fn set(&self, key: &str, value: &str) {
        if let Err(e) = self.try_set(key, value) {
            warn!("Failed to persist '{}' to {}: {}", key, self.path.display(), e);
        }
    }

    fn try_set(&self, key: &str, value: &str) -> Result<()> {
        let mut map = self.load();
        map.insert(key.to_string(), Value::String(value.to_string()));

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(&Value::Object(map))?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// The "server may be asleep" banner and its persisted dismissal.
#[derive(Debug, Clone)]
pub struct Notice {
    store: LocalStore,
    hidden: bool,
}

impl Notice {
    pub fn load(store: LocalStore) -> Self {
        let hidden = store.get(NOTICE_KEY).as_deref() == Some("1");
        Self { store, hidden }
    }

    pub fn is_visible(&self) -> bool {
        !self.hidden
    }

    pub fn dismiss(&mut self) {
        self.store.set(NOTICE_KEY, "1");
        self.hidden = true;
    }
}
