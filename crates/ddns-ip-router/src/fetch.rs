// # Router Page Fetcher
//
// Plain HTTP GET with a single round of Basic-auth challenge handling.
//
// ## Flow
//
// 1. URL already authenticated before: authenticated GET directly
// 2. Otherwise anonymous GET
// 3. On 401, read the realm from `WWW-Authenticate: Basic realm="..."`
// 4. Retry once with Basic credentials and remember the realm for the URL
//
// The realm cache lives in the fetcher instance, never in process-global
// state, so two fetchers never share credentials.

use ddns_core::{Error, Result};
use regex::Regex;
use reqwest::StatusCode;
use reqwest::header::WWW_AUTHENTICATE;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;

/// Anchored at the start of the header value
const BASIC_REALM_PATTERN: &str = r#"\ABasic realm="(.*)""#;

/// HTTP fetcher with a per-instance credential cache
pub struct Fetcher {
    client: reqwest::Client,

    /// URL -> realm for challenges answered successfully
    realms: Mutex<HashMap<String, String>>,

    realm_pattern: Regex,
}

impl Fetcher {
    /// Create a fetcher whose requests are bounded by `timeout`
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        let realm_pattern = Regex::new(BASIC_REALM_PATTERN)
            .map_err(|e| Error::Other(format!("Invalid realm pattern: {}", e)))?;

        Ok(Self {
            client,
            realms: Mutex::new(HashMap::new()),
            realm_pattern,
        })
    }

    /// Fetch `url` and return the body as text
    ///
    /// # Errors
    ///
    /// - `Error::Network`: connection failure, timeout, or any HTTP failure
    ///   other than the first 401 challenge
    /// - `Error::Protocol`: 401 without a parseable Basic challenge
    pub async fn fetch(&self, url: &str, user: &str, password: Option<&str>) -> Result<String> {
        let cached = self.realms.lock().await.get(url).cloned();

        if let Some(realm) = cached {
            tracing::debug!("Using cached credentials for realm {:?}", realm);
            let response = self.get(url, Some((user, password))).await?;

            if response.status() == StatusCode::UNAUTHORIZED {
                self.realms.lock().await.remove(url);
                return Err(Error::network(format!(
                    "Router rejected cached credentials for realm {:?}: {}",
                    realm,
                    response.status()
                )));
            }

            return Self::body(response).await;
        }

        let response = self.get(url, None).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Self::body(response).await;
        }

        let realm = self.parse_challenge(&response)?;
        tracing::info!("Router requested authentication for realm {:?}", realm);

        let response = self.get(url, Some((user, password))).await?;
        if !response.status().is_success() {
            return Err(Error::network(format!(
                "Authenticated request failed: {}",
                response.status()
            )));
        }

        self.realms.lock().await.insert(url.to_string(), realm);
        Self::body(response).await
    }

    /// Realm remembered for `url`, if a challenge was answered successfully
    pub async fn cached_realm(&self, url: &str) -> Option<String> {
        self.realms.lock().await.get(url).cloned()
    }

    async fn get(
        &self,
        url: &str,
        credentials: Option<(&str, Option<&str>)>,
    ) -> Result<reqwest::Response> {
        let mut request = self.client.get(url);
        if let Some((user, password)) = credentials {
            request = request.basic_auth(user, password);
        }

        request
            .send()
            .await
            .map_err(|e| Error::network(format!("Request to router failed: {}", e)))
    }

    fn parse_challenge(&self, response: &reqwest::Response) -> Result<String> {
        let header = response
            .headers()
            .get(WWW_AUTHENTICATE)
            .ok_or_else(|| Error::protocol("401 response without WWW-Authenticate header"))?;

        let value = header
            .to_str()
            .map_err(|_| Error::protocol("WWW-Authenticate header is not valid text"))?;

        self.realm_pattern
            .captures(value)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| {
                Error::protocol(format!("Unsupported authentication challenge: {}", value))
            })
    }

    async fn body(response: reqwest::Response) -> Result<String> {
        let status = response.status();
        if !status.is_success() {
            return Err(Error::network(format!("HTTP error: {}", status)));
        }

        response
            .text()
            .await
            .map_err(|e| Error::network(format!("Failed to read router page: {}", e)))
    }
}

impl std::fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fetcher").finish_non_exhaustive()
    }
}
