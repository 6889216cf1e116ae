// # Solver Trait
//
// The contract the webhook transport dispatches challenges to.

use async_trait::async_trait;
use tokio::sync::watch;

use crate::challenge::ChallengeRequest;
use crate::traits::secret_store::SecretStoreConnector;

/// Stop signal handed to solvers at initialization
///
/// Flips to `true` when the hosting process is shutting down.
pub type StopSignal = watch::Receiver<bool>;

/// Trait for DNS-01 challenge solvers
///
/// `present` must tolerate being called several times with the same key.
#[async_trait]
pub trait Solver: Send + Sync {
    /// Name used to route requests to this solver
    ///
    /// Unique within one webhook deployment.
    fn name(&self) -> &str;

    /// Build long-lived handles (the credential store)
    async fn initialize(
        &self,
        connector: &dyn SecretStoreConnector,
        stop: StopSignal,
    ) -> Result<(), crate::Error>;

    /// Ensure the challenge TXT record exists with the challenge key
    async fn present(&self, challenge: &ChallengeRequest) -> Result<(), crate::Error>;

    /// Remove the challenge TXT record
    async fn cleanup(&self, challenge: &ChallengeRequest) -> Result<(), crate::Error>;
}
