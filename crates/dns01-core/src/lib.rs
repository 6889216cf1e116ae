// # dns01-core
//
// Core library for the ACME DNS-01 challenge solver.
//
// ## Architecture Overview
//
// - **DnsClient**: Trait for reading and writing records via provider APIs
// - **SecretStore**: Trait for resolving credential references
// - **Solver**: Trait the webhook transport dispatches challenges to
// - **ChallengeResolver**: The solver: config → credentials → split → reconcile
// - **SolverRegistry**: Routes challenge payloads to solvers by name
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic is separate from provider and store implementations
// 2. **Plugin-Based**: Solvers are registered by name, no hard-coded routing
// 3. **Library-First**: Everything the daemon does can be driven from a test harness
// 4. **Idempotency**: Present tolerates repeated calls with the same key

pub mod challenge;
pub mod config;
pub mod domain;
pub mod error;
pub mod registry;
pub mod resolver;
pub mod traits;

// Re-export core types for convenience
pub use challenge::{ChallengeAction, ChallengePayload, ChallengeRequest, ChallengeResponse};
pub use config::{SecretKeySelector, SolverConfig, WebhookConfig};
pub use domain::DomainSplit;
pub use error::{Error, RecordOperation, Result};
pub use registry::SolverRegistry;
pub use resolver::{ChallengeResolver, MIN_TTL, RecordChange};
pub use traits::{DnsClient, DnsClientFactory, DnsRecord, SecretStore, SecretStoreConnector, Solver};
