// # Secret Store Trait
//
// Defines the interface used to resolve provider credentials.
//
// ## Purpose
//
// Per-issuer config never holds the API key itself. It names a secret and a
// data key; the store resolves that reference in the challenge's namespace.
//
// ## Implementations
//
// - Kubernetes Secrets: `dns01-secret-kube` crate

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Raw secret data, keyed by data key
pub type SecretData = BTreeMap<String, Vec<u8>>;

/// Trait for credential store implementations
///
/// Implementations must be safe for concurrent use: the solver shares one
/// handle across every in-flight challenge.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Fetch the data of secret `name` in `namespace`
    ///
    /// # Returns
    ///
    /// - `Ok(SecretData)`: The secret's data map (possibly empty)
    /// - `Err(Error)`: The secret is missing or the store is unreachable
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<SecretData, crate::Error>;
}

/// Builds the credential store handle at solver initialization
///
/// This is the client configuration handed to `Solver::initialize`.
#[async_trait]
pub trait SecretStoreConnector: Send + Sync {
    /// Construct a store handle
    ///
    /// Fails with `Error::Connection` if the handle cannot be built.
    async fn connect(&self) -> Result<Arc<dyn SecretStore>, crate::Error>;
}
