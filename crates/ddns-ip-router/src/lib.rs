// # Router IP Source
//
// This crate provides an IP source that reads the external address from a
// home router's status page.
//
// ## Purpose
//
// Consumer routers show their WAN address on an HTML status page but rarely
// offer an API for it. This source fetches that page (answering a Basic-auth
// challenge if the router asks for one) and scans it line by line with the
// configured search/skip/match parameters.
//
// ## Architecture
//
// - [`Fetcher`]: HTTP GET with one round of challenge handling and a
//   per-instance credential cache
// - [`LineExtractor`]: the search/skip/match line scanner
// - [`RouterIpSource`]: both combined behind [`IpSource`]

mod extract;
mod fetch;

pub use extract::LineExtractor;
pub use fetch::Fetcher;

use async_trait::async_trait;
use ddns_core::Result;
use ddns_core::config::FetchSpec;
use ddns_core::traits::IpSource;
use std::time::Duration;

/// IP source backed by a router status page
#[derive(Debug)]
pub struct RouterIpSource {
    spec: FetchSpec,
    fetcher: Fetcher,
    extractor: LineExtractor,
}

impl RouterIpSource {
    /// Create a router IP source
    ///
    /// The match pattern is compiled here, so a bad pattern fails at startup
    /// rather than on the first cycle.
    pub fn new(spec: FetchSpec, request_timeout: Duration) -> Result<Self> {
        spec.validate()?;

        let extractor = LineExtractor::from_spec(&spec)?;
        let fetcher = Fetcher::new(request_timeout)?;

        Ok(Self {
            spec,
            fetcher,
            extractor,
        })
    }
}

#[async_trait]
impl IpSource for RouterIpSource {
    async fn current(&self) -> Result<String> {
        tracing::debug!("Fetching router page {}", self.spec.url);

        let body = self
            .fetcher
            .fetch(&self.spec.url, &self.spec.user, self.spec.password.as_deref())
            .await?;

        Ok(self.extractor.extract(&body)?)
    }

    fn source_name(&self) -> &'static str {
        "router"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_pattern_fails_at_construction() {
        let mut spec = FetchSpec::new("http://192.168.0.1/status");
        spec.match_pattern = "([0-9.]+".to_string();

        assert!(RouterIpSource::new(spec, Duration::from_secs(30)).is_err());
    }

    #[test]
    fn test_missing_url_fails_at_construction() {
        let spec = FetchSpec::default();
        assert!(RouterIpSource::new(spec, Duration::from_secs(30)).is_err());
    }

    #[test]
    fn test_password_not_exposed_in_debug() {
        let mut spec = FetchSpec::new("http://192.168.0.1/status");
        spec.password = Some("router_secret_42".to_string());

        let source = RouterIpSource::new(spec, Duration::from_secs(30)).unwrap();
        let debug_str = format!("{:?}", source);

        assert!(!debug_str.contains("router_secret_42"));
        assert!(debug_str.contains("RouterIpSource"));
    }

    #[test]
    fn test_source_name() {
        let source =
            RouterIpSource::new(FetchSpec::new("http://192.168.0.1/"), Duration::from_secs(30))
                .unwrap();
        assert_eq!(source.source_name(), "router");
    }
}
