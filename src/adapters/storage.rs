use crate::core::store::MountStore;
use crate::domain::model::StoreFormat;
use crate::domain::ports::Storage;
use crate::utils::error::Result;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }
}

impl Storage for LocalStorage {
    async fn read_file(&self, path: &str) -> Result<Option<Vec<u8>>> {
        let full_path = self.base_path.join(path);
        match tokio::fs::read(full_path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = self.base_path.join(path);

        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // 先寫暫存檔再 rename，避免中途中斷留下半個檔案
        let mut tmp_name = full_path.clone().into_os_string();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);
        tokio::fs::write(&tmp_path, data).await?;
        tokio::fs::rename(&tmp_path, &full_path).await?;
        Ok(())
    }
}

/// The persisted mount state: one file, JSON or YAML.
#[derive(Debug, Clone)]
pub struct StateFile<S: Storage> {
    storage: S,
    file_name: String,
    format: StoreFormat,
}

impl StateFile<LocalStorage> {
    /// State file at `path`, relative paths resolved against the working dir.
    pub fn local(path: &str, format: StoreFormat) -> Self {
        let path = Path::new(path);
        let parent = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::new(LocalStorage::new(parent), file_name, format)
    }
}

impl<S: Storage> StateFile<S> {
    pub fn new(storage: S, file_name: impl Into<String>, format: StoreFormat) -> Self {
        Self {
            storage,
            file_name: file_name.into(),
            format,
        }
    }

    /// Merges the saved state into `store`. A missing file is not an error.
    pub async fn load_into(&self, store: &MountStore) -> Result<bool> {
        let Some(data) = self.storage.read_file(&self.file_name).await? else {
            tracing::info!("No saved state at {}, starting fresh", self.file_name);
            return Ok(false);
        };

        let contents = String::from_utf8_lossy(&data);
        store.load_str(&contents)?;
        tracing::info!("Loaded saved state from {}", self.file_name);
        Ok(true)
    }

    pub async fn save(&self, store: &MountStore) -> Result<()> {
        let serialized = store.serialize(self.format)?;
        self.storage
            .write_file(&self.file_name, serialized.as_bytes())
            .await?;
        tracing::debug!("State saved to {}", self.file_name);
        Ok(())
    }
}

impl<S: Storage + 'static> StateFile<S> {
    /// Saves every `interval` until the task is aborted. Failed saves are
    /// logged and retried on the next tick.
    pub fn spawn_autosave(self: Arc<Self>, store: MountStore, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // 第一個 tick 立即觸發，跳過
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if let Err(e) = self.save(&store).await {
                    tracing::warn!("Periodic state save failed: {}", e);
                }
            }
        })
    }
}
