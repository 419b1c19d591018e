//! Core DDNS engine
//!
//! The DdnsEngine is responsible for:
//! - Polling the IpSource on a fixed period
//! - Comparing the result with the last pushed address
//! - Pushing changed addresses via DnsProvider
//! - Persisting the pushed address in the StateStore
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  IpSource   │─── current() ───────┐
//! └─────────────┘                     │
//!                                     ▼
//!                            ┌──────────────┐
//!                            │ DdnsEngine   │◄── sleep / shutdown
//!                            └──────────────┘
//!                                     │
//!         ┌───────────────────────────┼───────────────────────────┐
//!         │                           │                           │
//!         ▼                           ▼                           ▼
//! ┌─────────────┐           ┌──────────────┐           ┌─────────────┐
//! │ StateStore  │           │ DnsProvider  │           │   Events    │
//! │ (persist)   │           │ (update)     │           │  (notify)   │
//! └─────────────┘           └──────────────┘           └─────────────┘
//! ```
//!
//! ## Cycle
//!
//! 1. Fetch the current address
//! 2. Equal to the last pushed address: nothing to do
//! 3. Otherwise push it via DnsProvider
//! 4. Record it in the StateStore
//! 5. Sleep until the next cycle or shutdown
//!
//! The last pushed address is loaded from the StateStore once, when the
//! engine starts.

use crate::config::{EngineConfig, FailurePolicy};
use crate::error::Result;
use crate::traits::{DnsProvider, IpSource, StateStore, UpdateResult};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

/// Events emitted by the DdnsEngine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Engine started with the address loaded from the state store
    Started { last_ip: Option<String> },

    /// The source reported the current address
    IpObserved { ip: String },

    /// Address unchanged, no update sent
    UpdateSkipped { current_ip: String },

    /// Update request answered by the provider
    UpdateSent {
        previous_ip: Option<String>,
        new_ip: String,
        result: UpdateResult,
    },

    /// Address written to the state store
    StatePersisted { ip: String },

    /// A cycle failed; what happens next depends on the failure policy
    CycleFailed { error: String },

    /// Engine stopped
    Stopped { reason: String },
}

/// Core DDNS engine
///
/// ## Lifecycle
///
/// 1. Create with [`DdnsEngine::new()`]
/// 2. Start with [`DdnsEngine::run_with_shutdown()`]
/// 3. Engine polls until the shutdown channel fires
///
/// ## Threading
///
/// Every cycle runs to completion on the calling task; fetch, compare,
/// notify and persist never overlap. Shutdown is observed between cycles and
/// wakes the engine out of its sleep.
pub struct DdnsEngine {
    /// Source of the current external address
    ip_source: Box<dyn IpSource>,

    /// DDNS provider receiving changed addresses
    provider: Box<dyn DnsProvider>,

    /// Store for the last pushed address
    state_store: Box<dyn StateStore>,

    /// Time between cycles
    sleep_period: Duration,

    /// Reaction to a failed cycle
    on_error: FailurePolicy,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<EngineEvent>,
}

impl DdnsEngine {
    /// Create a new DDNS engine
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields engine events
    pub fn new(
        ip_source: Box<dyn IpSource>,
        provider: Box<dyn DnsProvider>,
        state_store: Box<dyn StateStore>,
        config: EngineConfig,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.event_channel_capacity);

        let engine = Self {
            ip_source,
            provider,
            state_store,
            sleep_period: Duration::from_secs(config.sleep_secs),
            on_error: config.on_error,
            event_tx: tx,
        };

        Ok((engine, rx))
    }

    /// Run the engine until `shutdown_rx` fires (or its sender is dropped)
    ///
    /// The daemon forwards SIGTERM and SIGINT through this channel.
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Clean shutdown
    /// - `Err(Error)`: Fatal error, or a failed cycle under [`FailurePolicy::Abort`]
    pub async fn run_with_shutdown(&self, mut shutdown_rx: oneshot::Receiver<()>) -> Result<()> {

        let mut last_ip = self.state_store.get_last_ip().await?;
        match &last_ip {
            Some(ip) => info!("Last pushed address: {}", ip),
            None => info!("No previous address recorded"),
        }
        self.emit_event(EngineEvent::Started {
            last_ip: last_ip.clone(),
        });

        loop {
            if let Err(e) = self.poll_cycle(&mut last_ip).await {
                self.emit_event(EngineEvent::CycleFailed {
                    error: e.to_string(),
                });

                match self.on_error {
                    FailurePolicy::Continue => {
                        error!("Poll cycle failed, retrying after sleep: {}", e);
                    }
                    FailurePolicy::Abort => {
                        error!("Poll cycle failed, stopping: {}", e);
                        self.emit_event(EngineEvent::Stopped {
                            reason: e.to_string(),
                        });
                        // The cycle error is the one reported to the caller
                        if let Err(flush_err) = self.state_store.flush().await {
                            error!("Failed to flush state: {}", flush_err);
                        }
                        return Err(e);
                    }
                }
            }

            debug!("Sleeping for {} seconds", self.sleep_period.as_secs());
            tokio::select! {
                biased;

                _ = &mut shutdown_rx => break,
                _ = tokio::time::sleep(self.sleep_period) => {}
            }
        }

        info!("Shutdown signal received");
        self.emit_event(EngineEvent::Stopped {
            reason: "Shutdown signal".to_string(),
        });

        // Flush state before exiting
        self.state_store.flush().await?;
        info!("State flushed, engine stopped");

        Ok(())
    }

    /// One fetch → compare → notify → persist pass
    async fn poll_cycle(&self, last_ip: &mut Option<String>) -> Result<()> {
        let current_ip = self.ip_source.current().await?;
        info!("Current external address is {}", current_ip);
        self.emit_event(EngineEvent::IpObserved {
            ip: current_ip.clone(),
        });

        if last_ip.as_deref() == Some(current_ip.as_str()) {
            debug!("External address unchanged, skipping update");
            self.emit_event(EngineEvent::UpdateSkipped { current_ip });
            return Ok(());
        }

        // The update URL is not logged: it usually carries the provider password
        info!(
            "External IP changed, updating DDNS server via {}",
            self.provider.provider_name()
        );
        let result = self.provider.update_record(&current_ip).await?;

        self.emit_event(EngineEvent::UpdateSent {
            previous_ip: last_ip.clone(),
            new_ip: current_ip.clone(),
            result,
        });

        // Persisted even when the reply was undecodable: the request went out.
        // The in-memory address only moves once the store has it, so a failed
        // write is retried on the next cycle.
        self.state_store.set_last_ip(&current_ip).await?;
        *last_ip = Some(current_ip.clone());
        self.emit_event(EngineEvent::StatePersisted { ip: current_ip });

        Ok(())
    }

    /// Emit an engine event
    fn emit_event(&self, event: EngineEvent) {
        // A full channel drops the event rather than blocking the poll loop
        if self.event_tx.try_send(event).is_err() {
            warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
        }
    }
}

/// Fetch the current address once without entering the poll loop
///
/// Used to test a configuration: the caller reports the address or the error.
pub async fn one_shot(ip_source: &dyn IpSource) -> Result<String> {
    info!("Checking external address via {}", ip_source.source_name());
    let ip = ip_source.current().await?;
    info!("Current external address is {}", ip);
    Ok(ip)
}
