// # Memory State Store
//
// In-memory implementation of StateStore.
//
// ## Purpose
//
// Used when no state file is configured. The poll loop still suppresses
// repeated updates within one run, but the first poll after a restart always
// pushes the address.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::Error;
use crate::traits::state_store::StateStore;

/// In-memory state store implementation
///
/// Clones share the same value, which lets tests keep a handle on a store
/// they have handed to the engine.
///
/// # Example
///
/// ```rust,no_run
/// use ddns_core::state::MemoryStateStore;
/// use ddns_core::traits::state_store::StateStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemoryStateStore::new();
///
///     store.set_last_ip("1.2.3.4").await?;
///     assert_eq!(store.get_last_ip().await?, Some("1.2.3.4".to_string()));
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStateStore {
    inner: Arc<RwLock<Option<String>>>,
}

impl MemoryStateStore {
    /// Create a new empty memory state store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already remembers `ip`
    pub fn with_last_ip(ip: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Some(ip.into()))),
        }
    }

    /// Forget the stored address
    pub async fn clear(&self) {
        *self.inner.write().await = None;
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn get_last_ip(&self) -> Result<Option<String>, Error> {
        Ok(self.inner.read().await.clone())
    }

    async fn set_last_ip(&self, ip: &str) -> Result<(), Error> {
        *self.inner.write().await = Some(ip.to_string());
        Ok(())
    }

    async fn flush(&self) -> Result<(), Error> {
        // No-op for memory store (everything is already "persisted")
        Ok(())
    }
}
