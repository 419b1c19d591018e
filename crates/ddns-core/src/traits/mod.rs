//! Core traits for the DDNS system
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`IpSource`]: Discover the current external address
//! - [`DnsProvider`]: Push an address to the DDNS service
//! - [`StateStore`]: Persist the last pushed address across restarts

pub mod ip_source;
pub mod dns_provider;
pub mod state_store;

pub use ip_source::IpSource;
pub use dns_provider::{DnsProvider, UpdateResult};
pub use state_store::StateStore;
