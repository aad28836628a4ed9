//! Session store over an injectable durable storage
//!
//! The session is the triple `{token, role, username}`. Storage backends only
//! see batch writes and batch removals, so a store operation never leaves
//! one entry without the others.

use std::{
    collections::HashMap,
    fs,
    io::Write,
    path::{Path, PathBuf},
    sync::Arc,
};

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::constants::{ROLE_KEY, SESSION_FILE_NAME, TOKEN_KEY, USERNAME_KEY};
use crate::error::{ClientError, Result};
use crate::model::{Role, Session};

const SESSION_KEYS: [&str; 3] = [TOKEN_KEY, ROLE_KEY, USERNAME_KEY];

/// Durable key/value storage for session entries
pub trait SessionStorage: Send + Sync {
    fn load(&self, key: &str) -> Result<Option<String>>;

    /// Write all entries in one step
    fn store(&self, entries: &[(&str, &str)]) -> Result<()>;

    /// Remove all keys in one step; missing keys are not an error
    fn remove(&self, keys: &[&str]) -> Result<()>;
}

/// In-process storage, lost on exit
#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for MemoryStorage {
    fn load(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn store(&self, entries: &[(&str, &str)]) -> Result<()> {
        let mut guard = self.entries.lock();
        for (key, value) in entries {
            guard.insert((*key).to_string(), (*value).to_string());
        }
        Ok(())
    }

    fn remove(&self, keys: &[&str]) -> Result<()> {
        let mut guard = self.entries.lock();
        for key in keys {
            guard.remove(*key);
        }
        Ok(())
    }
}

/// JSON file storage surviving restarts.
///
/// The whole map is rewritten through a temporary file and renamed into
/// place, so readers observe either the old or the new triple.
pub struct FileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    /// Storage at `<dir>/session.json`
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self::with_path(dir.as_ref().join(SESSION_FILE_NAME))
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<HashMap<String, String>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }

        let content = fs::read_to_string(&self.path).map_err(|e| {
            ClientError::Storage(format!("failed to read {}: {e}", self.path.display()))
        })?;
        if content.trim().is_empty() {
            return Ok(HashMap::new());
        }

        match serde_json::from_str(&content) {
            Ok(map) => Ok(map),
            Err(e) => {
                warn!(
                    "Session file {} is corrupt, treating as empty: {}",
                    self.path.display(),
                    e
                );
                Ok(HashMap::new())
            }
        }
    }

    fn write_map(&self, map: &HashMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                ClientError::Storage(format!("failed to create {}: {e}", parent.display()))
            })?;
        }

        let tmp = self.path.with_extension("json.tmp");
        let content = serde_json::to_vec_pretty(map)?;
        // a leftover temp file would keep its old permissions
        let _ = fs::remove_file(&tmp);
        open_private(&tmp)
            .and_then(|mut file| file.write_all(&content))
            .map_err(|e| {
                ClientError::Storage(format!("failed to write {}: {e}", tmp.display()))
            })?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            ClientError::Storage(format!("failed to replace {}: {e}", self.path.display()))
        })
    }
}

/// Open a new file readable by the owner only; it holds the bearer token
fn open_private(path: &Path) -> std::io::Result<fs::File> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options.open(path)
}

impl SessionStorage for FileStorage {
    fn load(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.lock.lock();
        Ok(self.read_map()?.remove(key))
    }

    fn store(&self, entries: &[(&str, &str)]) -> Result<()> {
        let _guard = self.lock.lock();
        let mut map = self.read_map()?;
        for (key, value) in entries {
            map.insert((*key).to_string(), (*value).to_string());
        }
        self.write_map(&map)
    }

    fn remove(&self, keys: &[&str]) -> Result<()> {
        let _guard = self.lock.lock();
        let mut map = self.read_map()?;
        let before = map.len();
        for key in keys {
            map.remove(*key);
        }
        if map.len() == before && !self.path.exists() {
            return Ok(());
        }
        self.write_map(&map)
    }
}

/// Holder of the authenticated session
#[derive(Clone)]
pub struct SessionStore {
    storage: Arc<dyn SessionStorage>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        Self { storage }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    /// The full session, or `None` unless all three entries are present
    pub fn current(&self) -> Option<Session> {
        let token = self.read(TOKEN_KEY)?;
        let role = self.read(ROLE_KEY)?;
        let username = self.read(USERNAME_KEY)?;
        Some(Session {
            token,
            role,
            username,
        })
    }

    pub fn is_authenticated(&self) -> bool {
        self.current().is_some()
    }

    pub fn token(&self) -> Option<String> {
        self.current().map(|s| s.token)
    }

    pub fn role(&self) -> Option<Role> {
        self.current().map(|s| s.role_kind())
    }

    /// Role exactly as the backend sent it
    pub fn role_name(&self) -> Option<String> {
        self.current().map(|s| s.role)
    }

    pub fn username(&self) -> Option<String> {
        self.current().map(|s| s.username)
    }

    pub fn set_session(&self, token: &str, role: &str, username: &str) -> Result<()> {
        self.storage.store(&[
            (TOKEN_KEY, token),
            (ROLE_KEY, role),
            (USERNAME_KEY, username),
        ])?;
        debug!("Session stored for user {}", username);
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        self.storage.remove(&SESSION_KEYS)?;
        debug!("Session cleared");
        Ok(())
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.storage.load(key) {
            Ok(value) => value,
            Err(e) => {
                warn!("Failed to read session entry {}: {}", key, e);
                None
            }
        }
    }
}
