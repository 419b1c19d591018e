// # IP Source Trait
//
// Defines the interface for discovering the current external address.
//
// ## Implementations
//
// - Router status page scraper: `ddns-ip-router` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::IpSource;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let source = /* IpSource implementation */;
//
//     let current_ip = source.current().await?;
//     println!("external address: {}", current_ip);
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

/// Trait for IP source implementations
///
/// A source answers one question per call: what is the external address
/// right now. Scheduling, comparison and retries belong to `DdnsEngine`.
///
/// The address is returned as the text the source found. Routers differ in
/// how they render it, and the state file stores it verbatim, so no parsing
/// into `IpAddr` happens here.
///
/// # Forbidden Capabilities
/// - ❌ Perform DNS updates (use `DnsProvider`)
/// - ❌ Access the state store (use `DdnsEngine`)
/// - ❌ Sleep or poll on its own schedule
#[async_trait]
pub trait IpSource: Send + Sync {
    /// Get the current external address
    ///
    /// # Returns
    ///
    /// - `Ok(String)`: The current address
    /// - `Err(Error)`: `Network`, `Protocol` or `NotFound`
    async fn current(&self) -> Result<String, crate::Error>;

    /// Get the source name (for logging/debugging)
    fn source_name(&self) -> &'static str;
}
