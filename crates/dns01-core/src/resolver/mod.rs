//! Challenge resolver
//!
//! The ChallengeResolver is the [`Solver`] implementation. For every
//! challenge it:
//! - Decodes the per-issuer [`SolverConfig`]
//! - Resolves the provider API key through the [`SecretStore`]
//! - Builds a [`DnsClient`] scoped to that key
//! - Splits the resolved zone/FQDN into root domain and record name
//! - Reconciles the single TXT record against the desired state
//!
//! ## Reconciliation
//!
//! ```text
//!             lookup(root, subdomain, TXT)
//!                        │
//!          ┌─────────────┴──────────────┐
//!          ▼                            ▼
//!       absent                        present
//!   Present: create             Present: value == "<key>" ? no-op : update
//!   CleanUp: no-op              CleanUp: delete (value not checked)
//! ```
//!
//! Nothing is retried here. A failed provider call is returned to the
//! caller, which owns retry and backoff.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::challenge::ChallengeRequest;
use crate::config::SolverConfig;
use crate::domain::{self, DomainSplit};
use crate::error::{Error, RecordOperation, Result};
use crate::traits::{
    DnsClient, DnsClientFactory, SecretStore, SecretStoreConnector, Solver, StopSignal, TXT,
};

/// Lowest TTL the provider accepts, in seconds
pub const MIN_TTL: u32 = 300;

/// What a Present or CleanUp call did to the challenge record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordChange {
    /// Record did not exist and was created
    Created,
    /// Record existed with another value and was overwritten
    Updated,
    /// Record already held the challenge key (no-op)
    Unchanged,
    /// Record existed and was removed
    Deleted,
    /// Record did not exist, nothing to remove (no-op)
    Absent,
}

/// DNS-01 solver backed by a secret store and a DNS client factory
///
/// ## Lifecycle
///
/// 1. Create with [`ChallengeResolver::new()`]
/// 2. Call [`Solver::initialize()`] once to build the secret store handle
/// 3. Call [`Solver::present()`] / [`Solver::cleanup()`] per challenge
///
/// ## Threading
///
/// The secret store handle is written once at initialization and only read
/// afterwards; concurrent challenges share it.
pub struct ChallengeResolver {
    /// Routing name
    name: String,

    /// Builds provider clients per API key
    clients: Arc<dyn DnsClientFactory>,

    /// Credential store, set by `initialize`
    secrets: RwLock<Option<Arc<dyn SecretStore>>>,
}

impl ChallengeResolver {
    /// Create a resolver that builds provider clients with `clients`
    pub fn new(name: impl Into<String>, clients: Arc<dyn DnsClientFactory>) -> Self {
        Self {
            name: name.into(),
            clients,
            secrets: RwLock::new(None),
        }
    }

    /// Whether `initialize` has stored a secret store
    pub async fn is_initialized(&self) -> bool {
        self.secrets.read().await.is_some()
    }

    /// Present a challenge and report what changed
    pub async fn present_record(&self, challenge: &ChallengeRequest) -> Result<RecordChange> {
        debug!(
            "call function Present: namespace={}, zone={}, fqdn={}",
            challenge.resource_namespace, challenge.resolved_zone, challenge.resolved_fqdn
        );

        let (client, split) = self.prepare(challenge).await?;
        let expected = format!("\"{}\"", challenge.key);
        let values = vec![challenge.key.clone()];

        let existing = client
            .get_record(&split.root, &split.subdomain, TXT)
            .await
            .map_err(|e| Error::record_lookup(e.to_string()))?;

        match existing {
            None => {
                debug!(
                    "No TXT record at {}.{}, creating one with value {}",
                    split.subdomain, split.root, expected
                );
                client
                    .create_record(&split.root, &split.subdomain, TXT, MIN_TTL, &values)
                    .await
                    .map_err(|e| Error::record_write(RecordOperation::Create, e.to_string()))?;

                info!("Created TXT record {}.{}", split.subdomain, split.root);
                Ok(RecordChange::Created)
            }
            Some(record) if record.joined_values() == expected => {
                debug!(
                    "TXT record {}.{} already holds the challenge key",
                    split.subdomain, split.root
                );
                Ok(RecordChange::Unchanged)
            }
            Some(record) => {
                debug!(
                    "TXT record {}.{} has value {}, new value will be {}",
                    split.subdomain,
                    split.root,
                    record.joined_values(),
                    expected
                );
                client
                    .update_record(&split.root, &split.subdomain, TXT, MIN_TTL, &values)
                    .await
                    .map_err(|e| Error::record_write(RecordOperation::Update, e.to_string()))?;

                info!("Updated TXT record {}.{}", split.subdomain, split.root);
                Ok(RecordChange::Updated)
            }
        }
    }

    /// Clean up a challenge and report what changed
    ///
    /// Any TXT record at the computed name is deleted, whatever its value.
    pub async fn cleanup_record(&self, challenge: &ChallengeRequest) -> Result<RecordChange> {
        debug!(
            "call function CleanUp: namespace={}, zone={}, fqdn={}",
            challenge.resource_namespace, challenge.resolved_zone, challenge.resolved_fqdn
        );

        let (client, split) = self.prepare(challenge).await?;

        let existing = client
            .get_record(&split.root, &split.subdomain, TXT)
            .await
            .map_err(|e| Error::record_lookup(e.to_string()))?;

        if existing.is_none() {
            debug!(
                "No TXT record at {}.{}, nothing to clean up",
                split.subdomain, split.root
            );
            return Ok(RecordChange::Absent);
        }

        client
            .delete_record(&split.root, &split.subdomain, TXT)
            .await
            .map_err(|e| Error::record_write(RecordOperation::Delete, e.to_string()))?;

        info!("Deleted TXT record {}.{}", split.subdomain, split.root);
        Ok(RecordChange::Deleted)
    }

    /// Steps shared by Present and CleanUp: config, credentials, client, split
    async fn prepare(
        &self,
        challenge: &ChallengeRequest,
    ) -> Result<(Box<dyn DnsClient>, DomainSplit)> {
        let config = SolverConfig::load(challenge.config.as_deref())?;
        debug!(
            "decoded configuration: secret={}, key={}",
            config.api_key_secret_ref.name, config.api_key_secret_ref.key
        );

        let api_key = self
            .api_key(&config, &challenge.resource_namespace)
            .await?;
        let client = self.clients.create(&api_key)?;

        let split = domain::resolve(&challenge.resolved_fqdn, &challenge.resolved_zone)?;
        debug!(
            "resolved record: root={}, subdomain={}",
            split.root, split.subdomain
        );

        Ok((client, split))
    }

    /// Resolve the provider API key referenced by `config`
    async fn api_key(&self, config: &SolverConfig, namespace: &str) -> Result<String> {
        let selector = &config.api_key_secret_ref;
        debug!(
            "try to load secret `{}` with key `{}`",
            selector.name, selector.key
        );

        if selector.name.is_empty() {
            return Err(Error::secret_lookup(
                namespace,
                "",
                "no secret name configured in apiKeySecretRef",
            ));
        }

        let store = self
            .secrets
            .read()
            .await
            .clone()
            .ok_or_else(|| Error::NotInitialized(self.name.clone()))?;

        let data = match store.get_secret(namespace, &selector.name).await {
            Ok(data) => data,
            Err(e @ Error::SecretLookup { .. }) => return Err(e),
            Err(e) => return Err(Error::secret_lookup(namespace, &selector.name, e.to_string())),
        };

        let bytes = data
            .get(&selector.key)
            .ok_or_else(|| Error::key_not_found(&selector.key, namespace, &selector.name))?;

        String::from_utf8(bytes.clone()).map_err(|_| {
            Error::secret_lookup(
                namespace,
                &selector.name,
                format!("value of key {:?} is not valid UTF-8", selector.key),
            )
        })
    }
}

#[async_trait]
impl Solver for ChallengeResolver {
    fn name(&self) -> &str {
        &self.name
    }

    async fn initialize(
        &self,
        connector: &dyn SecretStoreConnector,
        _stop: StopSignal,
    ) -> Result<()> {
        debug!("call function Initialize for solver {}", self.name);

        let store = connector.connect().await?;
        *self.secrets.write().await = Some(store);

        info!("Solver {} initialized", self.name);
        Ok(())
    }

    async fn present(&self, challenge: &ChallengeRequest) -> Result<()> {
        self.present_record(challenge).await.map(|_| ())
    }

    async fn cleanup(&self, challenge: &ChallengeRequest) -> Result<()> {
        self.cleanup_record(challenge).await.map(|_| ())
    }
}
