// # State Store Trait
//
// Defines the interface for persistent state management.
//
// ## Purpose
//
// The state store remembers the last address pushed to the DDNS service so
// that a restart with an unchanged address does not trigger another update.
//
// ## Implementations
//
// - File-based: plain text file holding just the address
// - In-memory: nothing survives a restart
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::StateStore;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let store = /* StateStore implementation */;
//
//     // Check last known IP
//     let last_ip = store.get_last_ip().await?;
//
//     // Record the address after pushing it
//     store.set_last_ip("203.0.113.7").await?;
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

/// Trait for state store implementations
///
/// One process tracks exactly one address, so the store holds a single value.
///
/// # Trust Level: Trusted (Core Component)
///
/// ## Allowed Capabilities
/// - ✅ Perform I/O for persistent storage
/// - ✅ Cache state in memory (with explicit flush)
///
/// ## Forbidden Capabilities
/// - ❌ Decide when to update (owned by `DdnsEngine`)
/// - ❌ Perform DNS updates (owned by `DnsProvider`)
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Get the last pushed address
    ///
    /// # Returns
    ///
    /// - `Ok(Some(ip))`: The last pushed address
    /// - `Ok(None)`: Nothing recorded yet (first run)
    /// - `Err(Error)`: Storage error
    async fn get_last_ip(&self) -> Result<Option<String>, crate::Error>;

    /// Record `ip` as the last pushed address
    ///
    /// Implementations must make the value durable before returning.
    async fn set_last_ip(&self, ip: &str) -> Result<(), crate::Error>;

    /// Persist any pending changes
    async fn flush(&self) -> Result<(), crate::Error>;
}
