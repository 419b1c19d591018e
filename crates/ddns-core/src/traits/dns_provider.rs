// # DNS Provider Trait
//
// Defines the interface for pushing a new address to a DDNS service.
//
// ## Implementations
//
// - Templated update URL with XML reply: `ddns-provider-push` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::DnsProvider;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let provider = /* DnsProvider implementation */;
//
//     let result = provider.update_record("203.0.113.7").await?;
//     println!("provider answered {}", result.http_status);
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

/// Outcome of a single update request, kept for logging only
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateResult {
    /// HTTP status of the provider reply
    pub http_status: u16,
    /// `ErrCount` reported by the provider, if present
    pub err_count: Option<String>,
    /// `Done` flag reported by the provider, if present
    pub done: Option<String>,
    /// Whether the reply body could be decoded at all
    pub decoded: bool,
}

impl UpdateResult {
    /// A reply whose body could not be decoded
    pub fn undecoded(http_status: u16) -> Self {
        Self {
            http_status,
            err_count: None,
            done: None,
            decoded: false,
        }
    }
}

/// Trait for DNS provider implementations
///
/// # Trust Level: Untrusted
///
/// ## Allowed Capabilities
/// - ✅ Perform HTTP/HTTPS calls to the provider endpoint only
/// - ✅ Parse provider-specific responses
/// - ✅ Return success or failure (engine decides what happens next)
///
/// ## Forbidden Capabilities
/// - ❌ Implement retry logic or backoff (owned by `DdnsEngine`)
/// - ❌ Access state store (owned by `DdnsEngine`)
/// - ❌ Decide whether an update is needed (owned by `DdnsEngine`)
///
/// An undecodable reply is not a failure: the request reached the provider,
/// so implementations log it and return `Ok` with `decoded == false`.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Push `new_ip` to the provider
    ///
    /// # Returns
    ///
    /// - `Ok(UpdateResult)`: The provider answered with a success status
    /// - `Err(Error)`: Transport failure or error status (`Network`)
    async fn update_record(&self, new_ip: &str) -> Result<UpdateResult, crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
