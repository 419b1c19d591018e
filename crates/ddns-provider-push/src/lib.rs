// # Push DDNS Provider
//
// This crate provides a DDNS provider that pushes the address by calling an
// update URL template, the way namecheap's dynamic DNS endpoint works:
//
// ```text
// https://dynamicdns.park-your-domain.com/update?host=www&domain=example.com&password=12345&ip={ip}
// ```
//
// `{ip}` is replaced with the new address and the URL is fetched with a
// plain GET. The reply is decoded as XML for logging only; an undecodable
// reply is logged and otherwise ignored.
//
// ## Security Requirements
//
// - The update URL usually carries the provider password: it NEVER appears
//   in logs, error messages or `Debug` output
//
// ## Coordination
//
// One request per update, no retries. Whether a failed update is retried is
// up to `DdnsEngine` and its failure policy.

mod response;

pub use response::ProviderReply;

use async_trait::async_trait;
use ddns_core::config::{IP_PLACEHOLDER, PushConfig};
use ddns_core::traits::{DnsProvider, UpdateResult};
use ddns_core::{Error, Result};
use std::time::Duration;

/// URL-template DDNS provider
pub struct PushProvider {
    /// Update URL template
    /// ⚠️ NEVER log this value
    url_template: String,

    /// HTTP client for update requests
    client: reqwest::Client,
}

// Custom Debug implementation that hides the update URL
impl std::fmt::Debug for PushProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PushProvider")
            .field("url_template", &"<REDACTED>")
            .finish()
    }
}

impl PushProvider {
    /// Create a push provider
    ///
    /// # Parameters
    ///
    /// - `config`: update URL template, must contain `{ip}`
    /// - `request_timeout`: bound on each update request
    pub fn new(config: &PushConfig, request_timeout: Duration) -> Result<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url_template: config.url.clone(),
            client,
        })
    }

    /// The update URL for `ip`
    pub fn update_url(&self, ip: &str) -> String {
        self.url_template.replace(IP_PLACEHOLDER, ip)
    }
}

#[async_trait]
impl DnsProvider for PushProvider {
    async fn update_record(&self, new_ip: &str) -> Result<UpdateResult> {
        let response = self
            .client
            .get(self.update_url(new_ip))
            .send()
            .await
            // without_url(): reqwest errors embed the URL, which holds the password
            .map_err(|e| Error::network(format!("Update request failed: {}", e.without_url())))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::network(format!("Update request failed: {}", status)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::network(format!("Failed to read update reply: {}", e.without_url())))?;

        let code = status.as_u16();
        let reply = match ProviderReply::decode(&body) {
            Ok(reply) => reply,
            Err(e) => {
                tracing::debug!("{}", e);
                tracing::error!("Could not decode server response ({}): {}", code, body);
                return Ok(UpdateResult::undecoded(code));
            }
        };

        tracing::info!(
            "Server response ({}): errors {} done {}",
            code,
            reply
                .err_count
                .as_deref()
                .unwrap_or("Could not decode error count"),
            reply.done.as_deref().unwrap_or("Could not decode done value")
        );

        Ok(UpdateResult {
            http_status: code,
            err_count: reply.err_count,
            done: reply.done,
            decoded: true,
        })
    }

    fn provider_name(&self) -> &'static str {
        "push"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(url: &str) -> PushProvider {
        PushProvider::new(&PushConfig::new(url), Duration::from_secs(30)).unwrap()
    }

    #[test]
    fn test_update_url_substitution() {
        assert_eq!(provider("http://x/?ip={ip}").update_url("10.0.0.5"), "http://x/?ip=10.0.0.5");
    }

    #[test]
    fn test_every_placeholder_is_substituted() {
        assert_eq!(
            provider("http://x/{ip}?ip={ip}").update_url("1.2.3.4"),
            "http://x/1.2.3.4?ip=1.2.3.4"
        );
    }

    #[test]
    fn test_template_without_placeholder_is_rejected() {
        let result = PushProvider::new(
            &PushConfig::new("http://x/update?host=www"),
            Duration::from_secs(30),
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_url_not_exposed_in_debug() {
        let provider = provider("https://dyn.example.com/update?password=hunter2&ip={ip}");

        let debug_str = format!("{:?}", provider);
        assert!(!debug_str.contains("hunter2"));
        assert!(!debug_str.contains("dyn.example.com"));
        assert!(debug_str.contains("PushProvider"));
    }

    #[test]
    fn test_provider_name() {
        assert_eq!(provider("http://x/?ip={ip}").provider_name(), "push");
    }
}
