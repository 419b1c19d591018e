// # File State Store
//
// File-based implementation of StateStore.
//
// ## Purpose
//
// Remembers the last pushed address across daemon restarts, so a restart
// with an unchanged address does not ping the DDNS service again.
//
// ## File Format
//
// The file holds exactly the address text, nothing else:
//
// ```text
// 203.0.113.7
// ```
//
// Surrounding whitespace is ignored on load. A missing file means "first run".
//
// ## Crash Safety
//
// New contents are written to a temporary sibling and renamed over the
// state file, so a crash mid-write leaves either the old or the new address.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use crate::Error;
use crate::traits::state_store::StateStore;

/// File-based state store
///
/// # Example
///
/// ```rust,no_run
/// use ddns_core::state::FileStateStore;
/// use ddns_core::traits::state_store::StateStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileStateStore::new("/var/lib/ddns/state").await?;
///
///     // Written to disk before returning
///     store.set_last_ip("1.2.3.4").await?;
///
///     assert_eq!(store.get_last_ip().await?, Some("1.2.3.4".to_string()));
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct FileStateStore {
    path: PathBuf,
    state: Arc<RwLock<FileState>>,
}

/// Internal state for file-based store
#[derive(Debug)]
struct FileState {
    last_ip: Option<String>,
    dirty: bool,
}

impl FileStateStore {
    /// Create or load a file state store
    ///
    /// This will:
    /// 1. Create parent directories if needed
    /// 2. Load the address from the file if it exists
    pub async fn new<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::config(format!(
                    "Failed to create state directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let last_ip = Self::load_state(&path).await?;

        Ok(Self {
            path,
            state: Arc::new(RwLock::new(FileState {
                last_ip,
                dirty: false,
            })),
        })
    }

    /// Path of the state file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the address from file
    async fn load_state(path: &Path) -> Result<Option<String>, Error> {
        if !path.exists() {
            tracing::info!("State file {} not found, will be created", path.display());
            return Ok(None);
        }

        tracing::info!("Reading state file {}", path.display());
        let content = fs::read_to_string(path).await.map_err(|e| {
            Error::state_store(format!(
                "Failed to read state file {}: {}",
                path.display(),
                e
            ))
        })?;

        let ip = content.trim();
        if ip.is_empty() {
            tracing::warn!("State file {} is empty, treating as first run", path.display());
            return Ok(None);
        }

        tracing::info!("Read external address of {}", ip);
        Ok(Some(ip.to_string()))
    }

    /// Write the address to a sibling temp file, then rename it into place
    async fn write_state(&self) -> Result<(), Error> {
        let state_guard = self.state.read().await;
        let content = state_guard.last_ip.clone().unwrap_or_default();
        let temp_path = self.temp_path();

        let io_error = |action: &str, e: std::io::Error| {
            Error::state_store(format!("Failed to {} {}: {}", action, temp_path.display(), e))
        };

        let mut file = fs::File::create(&temp_path)
            .await
            .map_err(|e| io_error("create", e))?;
        file.write_all(content.as_bytes())
            .await
            .map_err(|e| io_error("write", e))?;
        file.sync_all().await.map_err(|e| io_error("sync", e))?;
        drop(file);

        fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| {
                Error::state_store(format!(
                    "Failed to rename {} to {}: {}",
                    temp_path.display(),
                    self.path.display(),
                    e
                ))
            })?;

        drop(state_guard);
        self.state.write().await.dirty = false;

        tracing::trace!("State written to {}", self.path.display());
        Ok(())
    }

    /// Get path to temporary file for atomic writes
    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone().into_os_string();
        temp.push(".tmp");
        PathBuf::from(temp)
    }
}

#[async_trait]
impl StateStore for FileStateStore {
    async fn get_last_ip(&self) -> Result<Option<String>, Error> {
        Ok(self.state.read().await.last_ip.clone())
    }

    async fn set_last_ip(&self, ip: &str) -> Result<(), Error> {
        {
            let mut state_guard = self.state.write().await;
            state_guard.last_ip = Some(ip.to_string());
            state_guard.dirty = true;
        }

        tracing::info!("Updating state file {}", self.path.display());
        // Immediate write for durability
        self.write_state().await
    }

    async fn flush(&self) -> Result<(), Error> {
        let dirty = self.state.read().await.dirty;
        if dirty {
            self.write_state().await
        } else {
            Ok(())
        }
    }
}
