// # ddns-core
//
// Core library for the router-polling DDNS updater.
//
// ## Architecture Overview
//
// - **IpSource**: Trait for discovering the current external address
// - **DnsProvider**: Trait for pushing a changed address to the DDNS service
// - **StateStore**: Trait for remembering the last pushed address (idempotency)
// - **DdnsEngine**: Poll loop that orchestrates fetch → compare → update → persist
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic is separate from implementations
// 2. **Explicit Failure Policy**: A failed cycle is a value the engine decides on
// 3. **Library-First**: All core functionality can be used as a library
// 4. **Idempotency**: An unchanged address never triggers an update

pub mod traits;
pub mod engine;
pub mod config;
pub mod error;
pub mod state;

// Re-export core types for convenience
pub use traits::{IpSource, DnsProvider, StateStore, UpdateResult};
pub use engine::{DdnsEngine, EngineEvent};
pub use config::{DdnsConfig, EngineConfig, FailurePolicy, FetchSpec, PushConfig, StateStoreConfig};
pub use error::{Error, NotFound, Result};
pub use state::{MemoryStateStore, FileStateStore};
