// # ddnsd - DDNS Daemon
//
// Thin integration layer: all polling, comparison and persistence logic lives
// in ddns-core. This binary is responsible for:
// 1. Assembling configuration (defaults, TOML file, environment, flags)
// 2. Setting up logging
// 3. Building the router IP source, push provider and state store
// 4. Running the engine until SIGTERM/SIGINT
//
// ## Example
//
// ```bash
// export DDNS_FETCH_URL=http://192.168.0.1/status
// export DDNS_FETCH_PASSWORD=secret
// export DDNS_PUSH_URL='https://dynamicdns.park-your-domain.com/update?host=www&domain=example.com&password=12345&ip={ip}'
// export DDNS_STATEFILE=/var/lib/ddns/state
//
// ddnsd --sleep 600
// ```
//
// `ddnsd --one-shot` fetches the address once and prints it, which is the
// quickest way to check the search/skip/match settings against a router.

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use ddns_core::config::{DdnsConfig, StateStoreConfig};
use ddns_core::engine::one_shot;
use ddns_core::{DdnsEngine, FileStateStore, MemoryStateStore, StateStore};
use ddns_ip_router::RouterIpSource;
use ddns_provider_push::PushProvider;
use std::fs::OpenOptions;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{Level, debug, error, info};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum DdnsExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error, including a failed one-shot lookup
    RuntimeError = 2,
}

impl From<DdnsExitCode> for ExitCode {
    fn from(code: DdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match cli.load_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    // One-shot mode never pushes, so only the fetch settings matter
    let validation = if cli.one_shot {
        config.fetch.validate()
    } else {
        config.validate()
    };
    if let Err(e) = validation {
        eprintln!("Configuration validation error: {}", e);
        return DdnsExitCode::ConfigError.into();
    }

    let log_level = match parse_log_level(&config.logging.level) {
        Ok(level) => level,
        Err(e) => {
            eprintln!("Configuration validation error: {}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    if let Err(e) = init_tracing(log_level, config.logging.file.as_deref()) {
        eprintln!("Failed to set up logging: {:#}", e);
        return DdnsExitCode::ConfigError.into();
    }

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DdnsExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if cli.one_shot {
            run_one_shot(&config).await
        } else {
            match run_daemon(config).await {
                Ok(()) => DdnsExitCode::CleanShutdown,
                Err(e) => {
                    error!("Daemon error: {:#}", e);
                    DdnsExitCode::RuntimeError
                }
            }
        }
    });

    result.into()
}

fn parse_log_level(level: &str) -> Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" | "warning" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!(
            "Log level '{}' is not valid. \
            Valid levels: trace, debug, info, warn, error",
            level
        ),
    }
}

/// Install the global subscriber, writing to `log_file` if given
fn init_tracing(level: Level, log_file: Option<&Path>) -> Result<()> {
    let builder = FmtSubscriber::builder().with_max_level(level);

    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("cannot open log file {}", path.display()))?;

            let subscriber = builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        None => {
            let subscriber = builder.with_writer(std::io::stderr).finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }

    Ok(())
}

/// Fetch the address once and print it
async fn run_one_shot(config: &DdnsConfig) -> DdnsExitCode {
    let timeout = Duration::from_secs(config.engine.request_timeout_secs);
    let source = match RouterIpSource::new(config.fetch.clone(), timeout) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return DdnsExitCode::ConfigError;
        }
    };

    match one_shot(&source).await {
        Ok(ip) => {
            println!("{}", ip);
            DdnsExitCode::CleanShutdown
        }
        Err(e) => {
            eprintln!("{}", e);
            DdnsExitCode::RuntimeError
        }
    }
}

/// Run the daemon
async fn run_daemon(config: DdnsConfig) -> Result<()> {
    info!("Starting ddnsd daemon");

    let timeout = Duration::from_secs(config.engine.request_timeout_secs);
    let ip_source = RouterIpSource::new(config.fetch.clone(), timeout)?;
    let provider = PushProvider::new(&config.push, timeout)?;

    let state_store: Box<dyn StateStore> = match &config.state_store {
        StateStoreConfig::File { path } => Box::new(FileStateStore::new(path).await?),
        StateStoreConfig::Memory => {
            info!("No state file configured, the first poll will always push");
            Box::new(MemoryStateStore::new())
        }
    };

    info!(
        "Polling {} every {} seconds",
        config.fetch.url, config.engine.sleep_secs
    );

    let (engine, mut event_rx) = DdnsEngine::new(
        Box::new(ip_source),
        Box::new(provider),
        state_store,
        config.engine.clone(),
    )?;

    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            debug!("Engine event: {:?}", event);
        }
    });

    // Signal handlers are installed before the engine starts so an early
    // SIGTERM is not lost
    let shutdown = shutdown_signal()?;
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    tokio::spawn(async move {
        let signal = shutdown.await;
        info!("Received shutdown signal: {}", signal);
        let _ = shutdown_tx.send(());
    });

    engine.run_with_shutdown(shutdown_rx).await?;

    info!("Shutting down daemon");
    Ok(())
}

/// Future resolving to the name of the first SIGTERM or SIGINT received
#[cfg(unix)]
fn shutdown_signal() -> Result<impl std::future::Future<Output = &'static str>> {
    let mut sigterm =
        signal(SignalKind::terminate()).context("Failed to setup SIGTERM handler")?;
    let mut sigint = signal(SignalKind::interrupt()).context("Failed to setup SIGINT handler")?;

    Ok(async move {
        tokio::select! {
            _ = sigterm.recv() => "SIGTERM",
            _ = sigint.recv() => "SIGINT",
        }
    })
}

/// Future resolving on Ctrl-C
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
fn shutdown_signal() -> Result<impl std::future::Future<Output = &'static str>> {
    Ok(async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => "SIGINT",
            Err(e) => {
                error!("Failed to wait for Ctrl-C: {}", e);
                std::future::pending::<&'static str>().await
            }
        }
    })
}
