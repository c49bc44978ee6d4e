//! Durable client-local storage, string keys to string values.

use crate::client::ClientError;
use log::warn;
use std::collections::BTreeMap;
use std::fs;
use std::path::{ Path, PathBuf };
use std::sync::Mutex;

pub const TRANSCRIPT_KEY: &str = "chat-relay-transcript";
pub const CONVERSATION_ID_KEY: &str = "chat-relay-conversationId";
pub const MESSAGE_ID_KEY: &str = "chat-relay-messageId";

pub trait ClientStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, ClientError>;
    fn set(&self, key: &str, value: &str) -> Result<(), ClientError>;
    fn remove(&self, key: &str) -> Result<(), ClientError>;
}

#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ClientStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, ClientError> {
        Ok(self.entries().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ClientError> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), ClientError> {
        self.entries().remove(key);
        Ok(())
    }
}

/// All entries kept as one JSON object in a single file, rewritten on every
/// change.
pub struct FileStorage {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStorage {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read_to_string(&path) {
            Ok(raw) =>
                serde_json::from_str(&raw).unwrap_or_else(|e| {
                    warn!("Ignoring unreadable client storage {}: {}", path.display(), e);
                    BTreeMap::new()
                }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(e.into());
            }
        };
        Ok(Self { path, entries: Mutex::new(entries) })
    }

    fn update<F>(&self, change: F) -> Result<(), ClientError>
        where F: FnOnce(&mut BTreeMap<String, String>)
    {
        let mut entries = self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        change(&mut entries);
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&*entries)?)?;
        Ok(())
    }
}

impl ClientStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, ClientError> {
        let entries = self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ClientError> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<(), ClientError> {
        self.update(|entries| {
            entries.remove(key);
        })
    }
}
