//! Core traits for the DNS-01 solver
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`DnsClient`]: Read and write records via a provider API
//! - [`SecretStore`]: Resolve credential references
//! - [`Solver`]: Present and clean up challenges

pub mod dns_client;
pub mod secret_store;
pub mod solver;

pub use dns_client::{DnsClient, DnsClientFactory, DnsRecord, TXT};
pub use secret_store::{SecretData, SecretStore, SecretStoreConnector};
pub use solver::{Solver, StopSignal};
