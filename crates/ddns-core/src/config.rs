//! Configuration types for the DDNS system
//!
//! Configuration is assembled in layers, later layers winning:
//!
//! 1. Built-in defaults ([`DdnsConfig::default`])
//! 2. An optional TOML file ([`ConfigFile`])
//! 3. Environment variables and command-line flags (applied by `ddnsd`)
//!
//! ## File Format
//!
//! ```toml
//! [daemon]
//! sleep = 3600
//! statefile = "/var/lib/ddns/state"
//! on_error = "continue"
//! request_timeout = 30
//! log_level = "info"
//!
//! [fetch]
//! url = "http://192.168.0.1/status"
//! user = "admin"
//! password = "secret"
//! search = "IP Address"
//! skip = 0
//! match = '.*<td>([0-9.]+)'
//!
//! [push]
//! url = "https://dynamicdns.example.com/update?host=www&password=secret&ip={ip}"
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Placeholder substituted with the current address in the push URL
pub const IP_PLACEHOLDER: &str = "{ip}";

/// Default time between polls (one hour)
pub const DEFAULT_SLEEP_SECS: u64 = 3600;

/// Default bound on a single HTTP request
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

const DEFAULT_FETCH_USER: &str = "admin";
const DEFAULT_FETCH_SEARCH: &str = "IP Address";
const DEFAULT_FETCH_MATCH: &str = r".*<td>([0-9.]+)";
const DEFAULT_PUSH_URL: &str = "https://dynamicdns.park-your-domain.com/update?\
                                host=www&domain=example.com&password=12345&ip={ip}";

/// Main DDNS configuration
#[derive(Debug, Clone)]
pub struct DdnsConfig {
    /// Where and how to scrape the router for the external address
    pub fetch: FetchSpec,

    /// DDNS update endpoint
    pub push: PushConfig,

    /// State store configuration
    pub state_store: StateStoreConfig,

    /// Poll loop settings
    pub engine: EngineConfig,

    /// Log sink settings
    pub logging: LoggingConfig,
}

impl DdnsConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self {
            fetch: FetchSpec::default(),
            push: PushConfig::default(),
            state_store: StateStoreConfig::default(),
            engine: EngineConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Defaults overlaid with the contents of a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, crate::Error> {
        let mut config = Self::new();
        ConfigFile::load(path)?.apply(&mut config);
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.fetch.validate()?;
        self.push.validate()?;
        self.state_store.validate()?;
        self.engine.validate()?;
        Ok(())
    }
}

impl Default for DdnsConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Router page location plus the search/skip/match scanning parameters
#[derive(Clone)]
pub struct FetchSpec {
    /// URL of the router page containing the external address
    pub url: String,

    /// HTTP Basic user, sent only after the router challenges
    pub user: String,

    /// HTTP Basic password
    pub password: Option<String>,

    /// Substring identifying the line near the address
    pub search: String,

    /// Lines to skip after the search line; 0 targets the next line
    pub skip: usize,

    /// Pattern with one capture group, matched at the start of the target line
    pub match_pattern: String,
}

impl FetchSpec {
    /// Create a fetch spec for `url` with the default scanning parameters
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Validate the fetch settings
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.url.is_empty() {
            return Err(crate::Error::config(
                "No URL configured to fetch external IP address. \
                 Use --fetch-url or the [fetch] url setting",
            ));
        }

        if !self.url.starts_with("http://") && !self.url.starts_with("https://") {
            return Err(crate::Error::config(format!(
                "Fetch URL must use HTTP or HTTPS scheme. Got: {}",
                self.url
            )));
        }

        if self.search.is_empty() {
            return Err(crate::Error::config("Fetch search string cannot be empty"));
        }

        let pattern = regex::Regex::new(&self.match_pattern).map_err(|e| {
            crate::Error::config(format!(
                "Fetch match pattern {:?} is not a valid regular expression: {}",
                self.match_pattern, e
            ))
        })?;

        // captures_len() counts the implicit whole-match group
        if pattern.captures_len() < 2 {
            tracing::warn!(
                "Fetch match pattern {:?} has no capture group; no address can be extracted",
                self.match_pattern
            );
        }

        Ok(())
    }
}

impl Default for FetchSpec {
    fn default() -> Self {
        Self {
            url: String::new(),
            user: DEFAULT_FETCH_USER.to_string(),
            password: None,
            search: DEFAULT_FETCH_SEARCH.to_string(),
            skip: 0,
            match_pattern: DEFAULT_FETCH_MATCH.to_string(),
        }
    }
}

// The router password never reaches the logs
impl std::fmt::Debug for FetchSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchSpec")
            .field("url", &self.url)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<REDACTED>"))
            .field("search", &self.search)
            .field("skip", &self.skip)
            .field("match_pattern", &self.match_pattern)
            .finish()
    }
}

/// DDNS provider endpoint
#[derive(Clone)]
pub struct PushConfig {
    /// Update URL template containing `{ip}`
    ///
    /// Usually carries the provider password, so it is never logged.
    pub url: String,
}

impl PushConfig {
    /// Create a push configuration from a URL template
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// Validate the push settings
    pub fn validate(&self) -> Result<(), crate::Error> {
        if !self.url.contains(IP_PLACEHOLDER) {
            return Err(crate::Error::config(format!(
                "Push URL must contain the {} placeholder",
                IP_PLACEHOLDER
            )));
        }
        Ok(())
    }
}

impl Default for PushConfig {
    fn default() -> Self {
        Self::new(DEFAULT_PUSH_URL)
    }
}

impl std::fmt::Debug for PushConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PushConfig")
            .field("url", &"<REDACTED>")
            .finish()
    }
}

/// State store configuration
#[derive(Debug, Clone, Default)]
pub enum StateStoreConfig {
    /// Plain-text state file surviving restarts
    File {
        /// Path to the state file
        path: PathBuf,
    },

    /// In-memory state store (not persistent)
    #[default]
    Memory,
}

impl StateStoreConfig {
    /// Validate the state store configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            StateStoreConfig::File { path } if path.as_os_str().is_empty() => {
                Err(crate::Error::config("State file path cannot be empty"))
            }
            _ => Ok(()),
        }
    }
}

/// What the poll loop does when a cycle fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Log the failure and try again after the next sleep
    #[default]
    Continue,
    /// Stop the engine and return the error
    Abort,
}

impl FromStr for FailurePolicy {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "continue" => Ok(FailurePolicy::Continue),
            "abort" => Ok(FailurePolicy::Abort),
            other => Err(crate::Error::config(format!(
                "Failure policy '{}' is not valid. Valid policies: continue, abort",
                other
            ))),
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Time between polls (in seconds)
    pub sleep_secs: u64,

    /// Reaction to a failed fetch, extraction or update
    pub on_error: FailurePolicy,

    /// Bound on each HTTP request (in seconds)
    pub request_timeout_secs: u64,

    /// Capacity of the engine event channel
    ///
    /// When full, events are dropped with a warning.
    pub event_channel_capacity: usize,
}

impl EngineConfig {
    /// Validate the engine configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.sleep_secs == 0 {
            return Err(crate::Error::config("Sleep period must be > 0 seconds"));
        }
        if self.request_timeout_secs == 0 {
            return Err(crate::Error::config("Request timeout must be > 0 seconds"));
        }
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sleep_secs: DEFAULT_SLEEP_SECS,
            on_error: FailurePolicy::default(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            event_channel_capacity: 100,
        }
    }
}

/// Log sink configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Maximum level: trace, debug, info, warn or error
    pub level: String,

    /// Append logs to this file instead of stderr
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

/// Partial configuration as read from a TOML file
///
/// Every key is optional; [`ConfigFile::apply`] overlays only the keys present.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    daemon: DaemonSection,

    #[serde(default)]
    fetch: FetchSection,

    #[serde(default)]
    push: PushSection,

    /// Directory of the file, for resolving relative paths
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct DaemonSection {
    sleep: Option<u64>,
    statefile: Option<PathBuf>,
    on_error: Option<FailurePolicy>,
    request_timeout: Option<u64>,
    log_level: Option<String>,
    log_file: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FetchSection {
    url: Option<String>,
    user: Option<String>,
    password: Option<String>,
    search: Option<String>,
    skip: Option<usize>,
    #[serde(rename = "match")]
    match_pattern: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct PushSection {
    url: Option<String>,
}

impl ConfigFile {
    /// Read and parse a TOML configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, crate::Error> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            crate::Error::config(format!(
                "Configuration file {} cannot be read: {}",
                path.display(),
                e
            ))
        })?;

        let mut file = Self::parse(&content).map_err(|e| match e {
            crate::Error::Config(msg) => {
                crate::Error::config(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })?;
        file.base_dir = path.parent().map(Path::to_path_buf);
        Ok(file)
    }

    /// Parse TOML text; relative paths stay relative to the working directory
    pub fn parse(content: &str) -> Result<Self, crate::Error> {
        toml::from_str(content)
            .map_err(|e| crate::Error::config(format!("Failed to parse configuration: {}", e)))
    }

    /// Overlay the keys present in this file onto `config`
    pub fn apply(self, config: &mut DdnsConfig) {
        let daemon = self.daemon;
        if let Some(sleep) = daemon.sleep {
            config.engine.sleep_secs = sleep;
        }
        if let Some(path) = daemon.statefile {
            config.state_store = StateStoreConfig::File { path };
        }
        if let Some(policy) = daemon.on_error {
            config.engine.on_error = policy;
        }
        if let Some(timeout) = daemon.request_timeout {
            config.engine.request_timeout_secs = timeout;
        }
        if let Some(level) = daemon.log_level {
            config.logging.level = level;
        }
        if let Some(file) = daemon.log_file {
            // A relative log file lives next to the config file
            config.logging.file = Some(match &self.base_dir {
                Some(base) if file.is_relative() => base.join(file),
                _ => file,
            });
        }

        let fetch = self.fetch;
        if let Some(url) = fetch.url {
            config.fetch.url = url;
        }
        if let Some(user) = fetch.user {
            config.fetch.user = user;
        }
        if let Some(password) = fetch.password {
            config.fetch.password = Some(password);
        }
        if let Some(search) = fetch.search {
            config.fetch.search = search;
        }
        if let Some(skip) = fetch.skip {
            config.fetch.skip = skip;
        }
        if let Some(pattern) = fetch.match_pattern {
            config.fetch.match_pattern = pattern;
        }

        if let Some(url) = self.push.url {
            config.push.url = url;
        }
    }
}
