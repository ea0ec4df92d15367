use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use tracing::debug;

use crate::account::AccountState;
use crate::error::StoreError;
use crate::types::AccountId;

/// Keyed snapshot persistence for account state.
pub trait SnapshotStore {
    fn load(&self, id: AccountId) -> Result<Option<AccountState>, StoreError>;
    fn save(&mut self, account: &AccountState) -> Result<(), StoreError>;
}

/// Holds serialized snapshots in memory, as a browser's local storage would.
#[derive(Debug, Default)]
pub struct MemoryStore {
    snapshots: HashMap<AccountId, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

impl SnapshotStore for MemoryStore {
    fn load(&self, id: AccountId) -> Result<Option<AccountState>, StoreError> {
        self.snapshots
            .get(&id)
            .map(|raw| serde_json::from_str(raw).map_err(StoreError::from))
            .transpose()
    }

    fn save(&mut self, account: &AccountState) -> Result<(), StoreError> {
        let raw = serde_json::to_string(account)?;
        self.snapshots.insert(account.id, raw);
        Ok(())
    }
}

/// One pretty-printed JSON file per account under a directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(JsonFileStore { dir })
    }

    fn path_for(&self, id: AccountId) -> PathBuf {
        self.dir.join(format!("account-{id}.json"))
    }
}

impl SnapshotStore for JsonFileStore {
    fn load(&self, id: AccountId) -> Result<Option<AccountState>, StoreError> {
        let path = self.path_for(id);
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&path)?;
        let account = serde_json::from_str(&raw)?;
        debug!(path = %path.display(), "snapshot loaded");
        Ok(Some(account))
    }

    fn save(&mut self, account: &AccountState) -> Result<(), StoreError> {
        let path = self.path_for(account.id);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(account)?)?;
        fs::rename(&tmp, &path)?;
        debug!(path = %path.display(), "snapshot saved");
        Ok(())
    }
}
