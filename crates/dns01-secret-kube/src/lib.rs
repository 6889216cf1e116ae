// # Kubernetes Secret Store
//
// Reads the Gandi API key out of a namespaced Kubernetes Secret.
//
// ## Behavior
//
// - One `GET /api/v1/namespaces/:ns/secrets/:name` per lookup
// - Only the Secret's `data` map is read (base64-decoded by the API types)
// - `stringData` is write-only on the API server and never consulted
// - No caching: a rotated key is picked up on the next challenge
//
// ## Security Requirements
//
// - Secret values NEVER appear in logs

use async_trait::async_trait;
use dns01_core::traits::{SecretData, SecretStore, SecretStoreConnector};
use dns01_core::{Error, Result};
use k8s_openapi::api::core::v1::Secret;
use kube::{Api, Client, Config};
use std::sync::Arc;

/// Secret store backed by the Kubernetes API
#[derive(Clone)]
pub struct KubeSecretStore {
    client: Client,
}

impl KubeSecretStore {
    /// Store reading Secrets through `client`
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl std::fmt::Debug for KubeSecretStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeSecretStore").finish_non_exhaustive()
    }
}

/// Flatten a Secret's `data` into raw bytes per key
pub fn secret_data(secret: Secret) -> SecretData {
    secret
        .data
        .unwrap_or_default()
        .into_iter()
        .map(|(key, value)| (key, value.0))
        .collect()
}

#[async_trait]
impl SecretStore for KubeSecretStore {
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<SecretData> {
        tracing::debug!("Fetching secret {}/{}", namespace, name);

        let api: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        let secret = api
            .get(name)
            .await
            .map_err(|e| Error::secret_lookup(namespace, name, e.to_string()))?;

        let data = secret_data(secret);
        tracing::debug!("Secret {}/{} has {} data keys", namespace, name, data.len());
        Ok(data)
    }
}

/// Builds a [`KubeSecretStore`] when the solver is initialized
///
/// With no explicit config the in-cluster service account (or the local
/// kubeconfig) is inferred.
#[derive(Default)]
pub struct KubeConnector {
    config: Option<Config>,
}

impl KubeConnector {
    /// Connector using an explicit client config
    pub fn new(config: Config) -> Self {
        Self {
            config: Some(config),
        }
    }

    /// Connector inferring the config from the environment
    pub fn infer() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SecretStoreConnector for KubeConnector {
    async fn connect(&self) -> Result<Arc<dyn SecretStore>> {
        let config = match &self.config {
            Some(config) => config.clone(),
            None => Config::infer()
                .await
                .map_err(|e| Error::connection(e.to_string()))?,
        };

        tracing::info!("Connecting to Kubernetes API at {}", config.cluster_url);
        let client = Client::try_from(config).map_err(|e| Error::connection(e.to_string()))?;

        Ok(Arc::new(KubeSecretStore::new(client)))
    }
}
