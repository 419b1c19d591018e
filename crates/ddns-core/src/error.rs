//! Error types for the DDNS system
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for DDNS operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the DDNS system
#[derive(Error, Debug)]
pub enum Error {
    /// Connection failures, timeouts and HTTP failures other than the
    /// single handled 401 challenge
    #[error("Network error: {0}")]
    Network(String),

    /// Malformed authentication challenge from the router
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The IP address could not be located in the router page
    #[error("IP address not found: {0}")]
    NotFound(#[from] NotFound),

    /// Provider reply could not be decoded
    ///
    /// The notifier recovers from this locally; it only escapes when the
    /// decoder is called directly.
    #[error("Could not decode response: {0}")]
    ResponseDecode(String),

    /// State store-related errors
    #[error("State store error: {0}")]
    StateStore(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

/// Reasons the line scanner failed to produce an address
///
/// "Search string never seen" and "target line did not match" are kept apart
/// so the log tells the operator which of `search`, `skip` or `match` is off.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotFound {
    /// The search string does not occur anywhere in the page
    #[error("search string {search:?} not found")]
    SearchNotFound { search: String },

    /// The search string was found but the page ends before the target line
    #[error("page ends before the line {skip} lines after {search:?}")]
    TargetPastEnd { search: String, skip: usize },

    /// The target line does not match the pattern
    #[error("no match found {skip} lines after finding string {search:?}")]
    NoMatch { search: String, skip: usize },

    /// The pattern matched but has no capture group to extract
    #[error("no groups in regular expression {pattern}")]
    NoCaptureGroup { pattern: String },
}

impl Error {
    /// Create a network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Create a protocol error
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// Create a response decode error
    pub fn response_decode(msg: impl Into<String>) -> Self {
        Self::ResponseDecode(msg.into())
    }

    /// Create a state store error
    pub fn state_store(msg: impl Into<String>) -> Self {
        Self::StateStore(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether this error is a failed IP lookup rather than an I/O problem
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
