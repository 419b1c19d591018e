//! Test doubles and common utilities for poll loop contract tests
//!
//! The doubles are cheap to clone and clones share their counters, so a test
//! can hand one clone to the engine and keep another for assertions.

#![allow(dead_code)]

use ddns_core::config::{EngineConfig, FailurePolicy};
use ddns_core::engine::EngineEvent;
use ddns_core::error::{Error, NotFound, Result};
use ddns_core::traits::{DnsProvider, IpSource, StateStore, UpdateResult};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// One scripted answer from [`ScriptedIpSource`]
#[derive(Debug, Clone)]
pub enum Step {
    /// Report this address
    Ip(&'static str),
    /// Fail as if the search string were missing from the router page
    NotFound,
    /// Fail as if the router were unreachable
    Unreachable,
}

/// An IpSource that replays a script, repeating the final step forever
#[derive(Clone)]
pub struct ScriptedIpSource {
    steps: Arc<Mutex<VecDeque<Step>>>,
    last: Arc<Mutex<Option<Step>>>,
    call_count: Arc<AtomicUsize>,
}

impl ScriptedIpSource {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        Self {
            steps: Arc::new(Mutex::new(steps.into_iter().collect())),
            last: Arc::new(Mutex::new(None)),
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A source that always reports the same address
    pub fn fixed(ip: &'static str) -> Self {
        Self::new([Step::Ip(ip)])
    }

    /// Get the number of times current() was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl IpSource for ScriptedIpSource {
    async fn current(&self) -> Result<String> {
        self.call_count.fetch_add(1, Ordering::SeqCst);

        let step = {
            let mut last = self.last.lock().unwrap();
            if let Some(next) = self.steps.lock().unwrap().pop_front() {
                *last = Some(next);
            }
            last.clone().expect("script must contain at least one step")
        };

        match step {
            Step::Ip(ip) => Ok(ip.to_string()),
            Step::NotFound => Err(Error::from(NotFound::SearchNotFound {
                search: "IP Address".to_string(),
            })),
            Step::Unreachable => Err(Error::network("connection refused")),
        }
    }

    fn source_name(&self) -> &'static str {
        "scripted"
    }
}

/// A DnsProvider that records every address it is asked to push
#[derive(Clone)]
pub struct MockDnsProvider {
    updated_ips: Arc<Mutex<Vec<String>>>,
    failures_left: Arc<AtomicUsize>,
    decoded: bool,
}

impl MockDnsProvider {
    pub fn new() -> Self {
        Self {
            updated_ips: Arc::new(Mutex::new(Vec::new())),
            failures_left: Arc::new(AtomicUsize::new(0)),
            decoded: true,
        }
    }

    /// Fail the first `n` update calls with a network error
    pub fn failing_first(n: usize) -> Self {
        let provider = Self::new();
        provider.failures_left.store(n, Ordering::SeqCst);
        provider
    }

    /// Answer every update with a body that could not be decoded
    pub fn undecodable() -> Self {
        Self {
            decoded: false,
            ..Self::new()
        }
    }

    /// Get the number of times update_record() was called
    pub fn update_call_count(&self) -> usize {
        self.updated_ips.lock().unwrap().len()
    }

    /// Addresses passed to update_record(), in call order
    pub fn updated_ips(&self) -> Vec<String> {
        self.updated_ips.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl DnsProvider for MockDnsProvider {
    async fn update_record(&self, new_ip: &str) -> Result<UpdateResult> {
        self.updated_ips.lock().unwrap().push(new_ip.to_string());

        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(Error::network("provider unreachable"));
        }

        if !self.decoded {
            return Ok(UpdateResult::undecoded(200));
        }

        Ok(UpdateResult {
            http_status: 200,
            err_count: Some("0".to_string()),
            done: Some("true".to_string()),
            decoded: true,
        })
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// A StateStore that tracks calls
#[derive(Clone, Default)]
pub struct MockStateStore {
    state: Arc<Mutex<Option<String>>>,
    set_call_count: Arc<AtomicUsize>,
    flush_call_count: Arc<AtomicUsize>,
    set_failures_left: Arc<AtomicUsize>,
    flush_fails: bool,
}

impl MockStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store left behind by a previous run
    pub fn with_last_ip(ip: &str) -> Self {
        let store = Self::new();
        *store.state.lock().unwrap() = Some(ip.to_string());
        store
    }

    /// Fail the first `n` set_last_ip() calls without storing anything
    pub fn failing_first_set(n: usize) -> Self {
        let store = Self::new();
        store.set_failures_left.store(n, Ordering::SeqCst);
        store
    }

    /// Fail every flush() call
    pub fn failing_flush() -> Self {
        Self {
            flush_fails: true,
            ..Self::new()
        }
    }

    /// Get the number of times set_last_ip() was called
    pub fn set_call_count(&self) -> usize {
        self.set_call_count.load(Ordering::SeqCst)
    }

    /// Get the number of times flush() was called
    pub fn flush_call_count(&self) -> usize {
        self.flush_call_count.load(Ordering::SeqCst)
    }

    /// The currently stored address
    pub fn stored_ip(&self) -> Option<String> {
        self.state.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl StateStore for MockStateStore {
    async fn get_last_ip(&self) -> Result<Option<String>> {
        Ok(self.stored_ip())
    }

    async fn set_last_ip(&self, ip: &str) -> Result<()> {
        self.set_call_count.fetch_add(1, Ordering::SeqCst);

        let failing = self
            .set_failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(Error::state_store("disk full"));
        }

        *self.state.lock().unwrap() = Some(ip.to_string());
        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        self.flush_call_count.fetch_add(1, Ordering::SeqCst);
        if self.flush_fails {
            return Err(Error::state_store("read-only file system"));
        }
        Ok(())
    }
}

/// Engine settings used by the contract tests
pub fn test_engine_config(on_error: FailurePolicy) -> EngineConfig {
    EngineConfig {
        sleep_secs: 60,
        on_error,
        request_timeout_secs: 5,
        event_channel_capacity: 100,
    }
}

/// Receive events until `n` poll cycles have finished
///
/// A cycle finishes with `UpdateSkipped`, `StatePersisted` or `CycleFailed`.
/// Returns every event seen on the way.
pub async fn wait_for_cycles(
    event_rx: &mut mpsc::Receiver<EngineEvent>,
    n: usize,
) -> Vec<EngineEvent> {
    let mut events = Vec::new();
    let mut finished = 0;

    while finished < n {
        let event = event_rx.recv().await.expect("engine event channel closed");
        if matches!(
            event,
            EngineEvent::UpdateSkipped { .. }
                | EngineEvent::StatePersisted { .. }
                | EngineEvent::CycleFailed { .. }
        ) {
            finished += 1;
        }
        events.push(event);
    }

    events
}
