//! Solver registry and challenge dispatch
//!
//! The registry maps solver names to [`Solver`] instances so the webhook
//! transport can route each challenge by the name it was addressed to,
//! avoiding hardcoded if-else chains.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use dns01_core::SolverRegistry;
//!
//! let registry = SolverRegistry::new();
//!
//! // In dns01-provider-gandi
//! dns01_provider_gandi::register(&registry);
//!
//! registry.initialize_all(&connector, stop_rx).await?;
//!
//! let reply = registry.dispatch("gandi", payload).await;
//! ```

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, warn};

use crate::challenge::{ChallengeAction, ChallengePayload, ChallengeResponse};
use crate::error::Result;
use crate::traits::{SecretStoreConnector, Solver, StopSignal};

/// Response reason for requests that never reached a solver
pub const REASON_BAD_REQUEST: &str = "BadRequest";

/// Response reason for solver failures
pub const REASON_SOLVER_FAILED: &str = "InternalError";

/// Solver registry for routing challenges by name
///
/// ## Thread Safety
///
/// The registry uses interior mutability with RwLock, allowing concurrent
/// reads and exclusive writes. Solvers are handed out as `Arc`s so no lock
/// is held while a challenge is being solved.
#[derive(Default)]
pub struct SolverRegistry {
    /// Registered solvers by name
    solvers: RwLock<HashMap<String, Arc<dyn Solver>>>,
}

impl SolverRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a solver under its own name
    ///
    /// A solver registered later under the same name replaces the earlier one.
    pub fn register_solver(&self, solver: Arc<dyn Solver>) {
        let name = solver.name().to_string();
        let mut solvers = self.solvers.write().unwrap_or_else(PoisonError::into_inner);
        if solvers.insert(name.clone(), solver).is_some() {
            warn!("Solver {} registered twice, keeping the latest", name);
        }
    }

    /// Get a solver by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Solver>> {
        let solvers = self.solvers.read().unwrap_or_else(PoisonError::into_inner);
        solvers.get(name).cloned()
    }

    /// List all registered solver names, sorted
    pub fn list_solvers(&self) -> Vec<String> {
        let solvers = self.solvers.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = solvers.keys().cloned().collect();
        names.sort();
        names
    }

    /// Check if a solver name is registered
    pub fn has_solver(&self, name: &str) -> bool {
        let solvers = self.solvers.read().unwrap_or_else(PoisonError::into_inner);
        solvers.contains_key(name)
    }

    /// Initialize every registered solver with the same connector
    ///
    /// Stops at the first failure.
    pub async fn initialize_all(
        &self,
        connector: &dyn SecretStoreConnector,
        stop: StopSignal,
    ) -> Result<()> {
        let solvers: Vec<Arc<dyn Solver>> = {
            let solvers = self.solvers.read().unwrap_or_else(PoisonError::into_inner);
            solvers.values().cloned().collect()
        };

        for solver in solvers {
            solver.initialize(connector, stop.clone()).await?;
        }

        Ok(())
    }

    /// Route a challenge payload to the named solver
    ///
    /// Always returns a response payload; failures are reported through
    /// `success: false` and `status.message` with the request's uid echoed.
    pub async fn dispatch(&self, solver_name: &str, payload: ChallengePayload) -> ChallengePayload {
        let Some(request) = payload.request else {
            return ChallengePayload::from_response(ChallengeResponse::failure(
                "",
                REASON_BAD_REQUEST,
                "payload carries no challenge request",
            ));
        };

        let Some(solver) = self.get(solver_name) else {
            warn!("No solver registered under name {}", solver_name);
            return ChallengePayload::from_response(ChallengeResponse::failure(
                request.uid,
                REASON_BAD_REQUEST,
                format!("no solver registered under name {:?}", solver_name),
            ));
        };

        debug!(
            "Dispatching {:?} for {} to solver {}",
            request.action, request.resolved_fqdn, solver_name
        );

        let result = match request.action {
            ChallengeAction::Present => solver.present(&request).await,
            ChallengeAction::CleanUp => solver.cleanup(&request).await,
        };

        let response = match result {
            Ok(()) => ChallengeResponse::success(request.uid),
            Err(e) => {
                warn!(
                    "{:?} failed for {}: {}",
                    request.action, request.resolved_fqdn, e
                );
                ChallengeResponse::failure(request.uid, REASON_SOLVER_FAILED, e.to_string())
            }
        };

        ChallengePayload::from_response(response)
    }
}
