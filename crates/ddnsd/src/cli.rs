//! Command-line and environment configuration layer

use clap::Parser;
use ddns_core::config::{DdnsConfig, FailurePolicy, StateStoreConfig};
use std::path::PathBuf;

/// Poll a router status page and push address changes to a DDNS service
///
/// Settings are layered: built-in defaults, then the --config file, then
/// environment variables and flags.
#[derive(Parser, Debug)]
#[command(name = "ddnsd")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// TOML configuration file
    #[arg(short, long, env = "DDNS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level: trace, debug, info, warn or error
    #[arg(long, env = "DDNS_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Append logs to this file instead of stderr
    #[arg(long, env = "DDNS_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// File remembering the last pushed address across restarts
    #[arg(long, env = "DDNS_STATEFILE")]
    pub statefile: Option<PathBuf>,

    /// Seconds between polls
    #[arg(long, env = "DDNS_SLEEP")]
    pub sleep: Option<u64>,

    /// What to do when a cycle fails: continue or abort
    #[arg(long, env = "DDNS_ON_ERROR")]
    pub on_error: Option<FailurePolicy>,

    /// Seconds before an HTTP request is abandoned
    #[arg(long, env = "DDNS_REQUEST_TIMEOUT")]
    pub request_timeout: Option<u64>,

    /// Router page showing the external address
    #[arg(long, env = "DDNS_FETCH_URL")]
    pub fetch_url: Option<String>,

    /// Router user, sent only when the router asks for credentials
    #[arg(long, env = "DDNS_FETCH_USER")]
    pub fetch_user: Option<String>,

    /// Router password
    #[arg(long, env = "DDNS_FETCH_PASSWORD", hide_env_values = true)]
    pub fetch_password: Option<String>,

    /// Text on the line near the address
    #[arg(long, env = "DDNS_FETCH_SEARCH")]
    pub fetch_search: Option<String>,

    /// Lines between the search line and the address line, minus one
    #[arg(long, env = "DDNS_FETCH_SKIP")]
    pub fetch_skip: Option<usize>,

    /// Regular expression capturing the address in group 1
    #[arg(long, env = "DDNS_FETCH_MATCH")]
    pub fetch_match: Option<String>,

    /// DDNS update URL containing {ip}
    #[arg(long, env = "DDNS_PUSH_URL", hide_env_values = true)]
    pub push_url: Option<String>,

    /// Print the current external address and exit
    #[arg(long, env = "DDNS_ONE_SHOT")]
    pub one_shot: bool,
}

impl Cli {
    /// Build the effective configuration: defaults, file, then flags
    pub fn load_config(&self) -> Result<DdnsConfig, ddns_core::Error> {
        let mut config = match &self.config {
            Some(path) => DdnsConfig::from_file(path)?,
            None => DdnsConfig::new(),
        };
        self.apply(&mut config);
        Ok(config)
    }

    /// Overlay the flags that were given onto `config`
    fn apply(&self, config: &mut DdnsConfig) {
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        if let Some(file) = &self.log_file {
            config.logging.file = Some(file.clone());
        }
        if let Some(path) = &self.statefile {
            config.state_store = StateStoreConfig::File { path: path.clone() };
        }
        if let Some(sleep) = self.sleep {
            config.engine.sleep_secs = sleep;
        }
        if let Some(policy) = self.on_error {
            config.engine.on_error = policy;
        }
        if let Some(timeout) = self.request_timeout {
            config.engine.request_timeout_secs = timeout;
        }

        if let Some(url) = &self.fetch_url {
            config.fetch.url = url.clone();
        }
        if let Some(user) = &self.fetch_user {
            config.fetch.user = user.clone();
        }
        if let Some(password) = &self.fetch_password {
            config.fetch.password = Some(password.clone());
        }
        if let Some(search) = &self.fetch_search {
            config.fetch.search = search.clone();
        }
        if let Some(skip) = self.fetch_skip {
            config.fetch.skip = skip;
        }
        if let Some(pattern) = &self.fetch_match {
            config.fetch.match_pattern = pattern.clone();
        }

        if let Some(url) = &self.push_url {
            config.push.url = url.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("ddnsd").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults_without_flags() {
        let config = parse(&[]).load_config().unwrap();

        assert_eq!(config.engine.sleep_secs, 3600);
        assert_eq!(config.fetch.user, "admin");
        assert!(matches!(config.state_store, StateStoreConfig::Memory));
        assert!(config.fetch.url.is_empty());
    }

    #[test]
    fn flags_fill_in_settings() {
        let config = parse(&[
            "--fetch-url",
            "http://192.168.0.1/status",
            "--fetch-skip",
            "2",
            "--sleep",
            "600",
            "--on-error",
            "abort",
            "--statefile",
            "/tmp/ddns-state",
            "--push-url",
            "http://dyn.example.com/?ip={ip}",
        ])
        .load_config()
        .unwrap();

        assert_eq!(config.fetch.url, "http://192.168.0.1/status");
        assert_eq!(config.fetch.skip, 2);
        assert_eq!(config.engine.sleep_secs, 600);
        assert_eq!(config.engine.on_error, FailurePolicy::Abort);
        assert!(matches!(
            config.state_store,
            StateStoreConfig::File { ref path } if path == &PathBuf::from("/tmp/ddns-state")
        ));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn flags_override_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[daemon]
sleep = 120

[fetch]
url = "http://10.0.0.1/"
search = "WAN IP"
"#
        )
        .unwrap();

        let path = file.path().to_str().unwrap().to_string();
        let config = parse(&["-c", &path, "--sleep", "30"]).load_config().unwrap();

        // Flag wins over the file, the file wins over defaults
        assert_eq!(config.engine.sleep_secs, 30);
        assert_eq!(config.fetch.url, "http://10.0.0.1/");
        assert_eq!(config.fetch.search, "WAN IP");
        assert_eq!(config.fetch.user, "admin");
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let result = parse(&["--config", "/nonexistent/ddns.toml"]).load_config();
        assert!(result.is_err());
    }

    #[test]
    fn invalid_failure_policy_is_rejected() {
        let result = Cli::try_parse_from(["ddnsd", "--on-error", "panic"]);
        assert!(result.is_err());
    }

    #[test]
    fn one_shot_flag() {
        assert!(parse(&["--one-shot"]).one_shot);
        assert!(!parse(&[]).one_shot);
    }
}
