// ABOUTME: File-backed key/value store for identities and the saved-users list
// ABOUTME: One JSON object of opaque blobs, no migration format

use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use tokio::fs;
use tracing::{debug, warn};

use labgate_core::{Identity, TokenPayload, UserKind};

use crate::error::{StorageError, StorageResult};

const STORE_FILE: &str = "store.json";
const SAVED_USERS_KEY: &str = "saved_users";

/// Opaque key/value JSON store persisted as a single file.
///
/// Values are written as-is under their keys; a missing or corrupt file
/// reads as empty rather than failing the flow.
pub struct LocalStore {
    path: PathBuf,
}

impl LocalStore {
    /// Store rooted at an explicit directory.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(STORE_FILE),
        }
    }

    /// Store in the default location under the user's home directory.
    pub fn default_location() -> StorageResult<Self> {
        let dir = dirs::home_dir()
            .ok_or(StorageError::NoDataDir)?
            .join(".labgate");
        Ok(Self::new(dir))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read one value by key. Absent keys and unreadable stores yield `None`.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let map = self.load().await;
        let value = map.get(key)?.clone();
        match serde_json::from_value(value) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!("Discarding unreadable value for key {key}: {e}");
                None
            }
        }
    }

    /// Write one value by key, creating the store file as needed.
    pub async fn put<T: Serialize>(&self, key: &str, value: &T) -> StorageResult<()> {
        let mut map = self.load().await;
        map.insert(key.to_string(), serde_json::to_value(value)?);
        self.save(&map).await
    }

    /// Identity last used on a portal, keyed per role.
    pub async fn load_identity(&self, kind: UserKind) -> Option<Identity> {
        self.get(&identity_key(kind)).await
    }

    /// Persist the identity for a portal, overwriting the previous one.
    pub async fn save_identity(&self, kind: UserKind, identity: &Identity) -> StorageResult<()> {
        self.put(&identity_key(kind), &identity.trimmed()).await
    }

    /// Every payload ever generated, in generation order. Duplicates are
    /// kept: identity is not a stored key.
    pub async fn saved_users(&self) -> Vec<TokenPayload> {
        self.get(SAVED_USERS_KEY).await.unwrap_or_default()
    }

    /// Append a generated payload to the saved-users list.
    pub async fn append_saved_user(&self, payload: &TokenPayload) -> StorageResult<()> {
        let mut users = self.saved_users().await;
        users.push(payload.clone());
        self.put(SAVED_USERS_KEY, &users).await
    }

    async fn load(&self) -> Map<String, Value> {
        match fs::read_to_string(&self.path).await {
            Ok(raw) => match serde_json::from_str::<Map<String, Value>>(&raw) {
                Ok(map) => map,
                Err(e) => {
                    warn!("Store file {} is corrupt, starting empty: {e}", self.path.display());
                    Map::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(e) => {
                warn!("Could not read store file {}: {e}", self.path.display());
                Map::new()
            }
        }
    }

    async fn save(&self, map: &Map<String, Value>) -> StorageResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let raw = serde_json::to_string_pretty(map)?;
        fs::write(&self.path, raw).await?;
        debug!("Persisted {} keys to {}", map.len(), self.path.display());
        Ok(())
    }
}

fn identity_key(kind: UserKind) -> String {
    format!("saved_user.{}", kind.storage_key())
}
