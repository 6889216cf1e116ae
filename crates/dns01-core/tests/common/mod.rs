//! Test doubles and common utilities for solver contract tests
//!
//! The doubles stand in for the provider API and the credential store and
//! count every call so tests can assert exactly which operations a
//! challenge triggered.

#![allow(dead_code)]

use dns01_core::error::{Error, Result};
use dns01_core::traits::{
    DnsClient, DnsClientFactory, DnsRecord, SecretData, SecretStore, SecretStoreConnector, Solver,
};
use dns01_core::{ChallengeRequest, ChallengeResolver};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const NAMESPACE: &str = "cert-manager";
pub const SECRET_NAME: &str = "gandi-credentials";
pub const SECRET_KEY: &str = "api-key";
pub const API_KEY: &str = "0123456789abcdef";

/// One call made against the mock provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderCall {
    Get { root: String, name: String, record_type: String },
    Create { root: String, name: String, record_type: String, ttl: u32, values: Vec<String> },
    Update { root: String, name: String, record_type: String, ttl: u32, values: Vec<String> },
    Delete { root: String, name: String, record_type: String },
}

type RecordKey = (String, String, String);

/// In-memory provider shared by every client the factory builds
///
/// TXT values are stored double-quoted, the way the provider reports them.
#[derive(Clone, Default)]
pub struct MockDnsBackend {
    records: Arc<Mutex<HashMap<RecordKey, DnsRecord>>>,
    calls: Arc<Mutex<Vec<ProviderCall>>>,
    api_keys: Arc<Mutex<Vec<String>>>,
    fail_lookups: Arc<Mutex<Option<String>>>,
    fail_writes: Arc<Mutex<Option<String>>>,
}

impl MockDnsBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record as if it had been written earlier
    pub fn seed(&self, root: &str, name: &str, record_type: &str, values: &[&str]) {
        self.records.lock().unwrap().insert(
            key(root, name, record_type),
            DnsRecord {
                name: name.to_string(),
                record_type: record_type.to_string(),
                ttl: 300,
                values: values.iter().map(|v| v.to_string()).collect(),
            },
        );
    }

    pub fn record(&self, root: &str, name: &str, record_type: &str) -> Option<DnsRecord> {
        self.records
            .lock()
            .unwrap()
            .get(&key(root, name, record_type))
            .cloned()
    }

    pub fn calls(&self) -> Vec<ProviderCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn create_count(&self) -> usize {
        self.count(|c| matches!(c, ProviderCall::Create { .. }))
    }

    pub fn update_count(&self) -> usize {
        self.count(|c| matches!(c, ProviderCall::Update { .. }))
    }

    pub fn delete_count(&self) -> usize {
        self.count(|c| matches!(c, ProviderCall::Delete { .. }))
    }

    pub fn get_count(&self) -> usize {
        self.count(|c| matches!(c, ProviderCall::Get { .. }))
    }

    /// API keys the factory has been asked to build clients for
    pub fn api_keys(&self) -> Vec<String> {
        self.api_keys.lock().unwrap().clone()
    }

    /// Make every lookup fail with a non-"not found" error
    pub fn fail_lookups_with(&self, message: &str) {
        *self.fail_lookups.lock().unwrap() = Some(message.to_string());
    }

    /// Make every create/update/delete fail
    pub fn fail_writes_with(&self, message: &str) {
        *self.fail_writes.lock().unwrap() = Some(message.to_string());
    }

    fn count(&self, pred: impl Fn(&ProviderCall) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| pred(c)).count()
    }

    fn push(&self, call: ProviderCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn write_failure(&self) -> Result<()> {
        match self.fail_writes.lock().unwrap().clone() {
            Some(message) => Err(Error::provider("mock", message)),
            None => Ok(()),
        }
    }
}

fn key(root: &str, name: &str, record_type: &str) -> RecordKey {
    (root.to_string(), name.to_string(), record_type.to_string())
}

fn quoted(values: &[String]) -> Vec<String> {
    values.iter().map(|v| format!("\"{}\"", v)).collect()
}

/// A mock DnsClient that records calls into a shared backend
pub struct MockDnsClient {
    backend: MockDnsBackend,
}

#[async_trait::async_trait]
impl DnsClient for MockDnsClient {
    async fn get_record(&self, root: &str, name: &str, record_type: &str) -> Result<Option<DnsRecord>> {
        self.backend.push(ProviderCall::Get {
            root: root.to_string(),
            name: name.to_string(),
            record_type: record_type.to_string(),
        });

        if let Some(message) = self.backend.fail_lookups.lock().unwrap().clone() {
            return Err(Error::provider("mock", message));
        }

        Ok(self.backend.record(root, name, record_type))
    }

    async fn create_record(
        &self,
        root: &str,
        name: &str,
        record_type: &str,
        ttl: u32,
        values: &[String],
    ) -> Result<()> {
        self.backend.push(ProviderCall::Create {
            root: root.to_string(),
            name: name.to_string(),
            record_type: record_type.to_string(),
            ttl,
            values: values.to_vec(),
        });
        self.backend.write_failure()?;

        let mut records = self.backend.records.lock().unwrap();
        let record_key = key(root, name, record_type);
        if records.contains_key(&record_key) {
            return Err(Error::provider("mock", "record already exists"));
        }
        records.insert(
            record_key,
            DnsRecord {
                name: name.to_string(),
                record_type: record_type.to_string(),
                ttl,
                values: quoted(values),
            },
        );
        Ok(())
    }

    async fn update_record(
        &self,
        root: &str,
        name: &str,
        record_type: &str,
        ttl: u32,
        values: &[String],
    ) -> Result<()> {
        self.backend.push(ProviderCall::Update {
            root: root.to_string(),
            name: name.to_string(),
            record_type: record_type.to_string(),
            ttl,
            values: values.to_vec(),
        });
        self.backend.write_failure()?;

        self.backend.records.lock().unwrap().insert(
            key(root, name, record_type),
            DnsRecord {
                name: name.to_string(),
                record_type: record_type.to_string(),
                ttl,
                values: quoted(values),
            },
        );
        Ok(())
    }

    async fn delete_record(&self, root: &str, name: &str, record_type: &str) -> Result<()> {
        self.backend.push(ProviderCall::Delete {
            root: root.to_string(),
            name: name.to_string(),
            record_type: record_type.to_string(),
        });
        self.backend.write_failure()?;

        self.backend
            .records
            .lock()
            .unwrap()
            .remove(&key(root, name, record_type));
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// Factory handing out clients bound to one backend
pub struct MockDnsClientFactory {
    backend: MockDnsBackend,
}

impl MockDnsClientFactory {
    pub fn new(backend: MockDnsBackend) -> Self {
        Self { backend }
    }
}

impl DnsClientFactory for MockDnsClientFactory {
    fn create(&self, api_key: &str) -> Result<Box<dyn DnsClient>> {
        self.backend.api_keys.lock().unwrap().push(api_key.to_string());
        Ok(Box::new(MockDnsClient {
            backend: self.backend.clone(),
        }))
    }
}

/// A mock SecretStore backed by a map of (namespace, name) → data
#[derive(Default)]
pub struct MockSecretStore {
    secrets: Mutex<HashMap<(String, String), SecretData>>,
    get_call_count: AtomicUsize,
}

impl MockSecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store with the default credentials secret in place
    pub fn with_api_key() -> Self {
        let store = Self::new();
        store.insert(NAMESPACE, SECRET_NAME, &[(SECRET_KEY, API_KEY)]);
        store
    }

    pub fn insert(&self, namespace: &str, name: &str, data: &[(&str, &str)]) {
        let data: SecretData = data
            .iter()
            .map(|(k, v)| (k.to_string(), v.as_bytes().to_vec()))
            .collect();
        self.secrets
            .lock()
            .unwrap()
            .insert((namespace.to_string(), name.to_string()), data);
    }

    pub fn get_call_count(&self) -> usize {
        self.get_call_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl SecretStore for MockSecretStore {
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<SecretData> {
        self.get_call_count.fetch_add(1, Ordering::SeqCst);
        self.secrets
            .lock()
            .unwrap()
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| {
                Error::secret_lookup(namespace, name, format!("secrets \"{}\" not found", name))
            })
    }
}

/// Connector that hands out a prepared store, or fails when it has none
pub struct MockConnector {
    store: Option<Arc<MockSecretStore>>,
    connect_call_count: AtomicUsize,
}

impl MockConnector {
    pub fn new(store: Arc<MockSecretStore>) -> Self {
        Self {
            store: Some(store),
            connect_call_count: AtomicUsize::new(0),
        }
    }

    pub fn unreachable() -> Self {
        Self {
            store: None,
            connect_call_count: AtomicUsize::new(0),
        }
    }

    pub fn connect_call_count(&self) -> usize {
        self.connect_call_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl SecretStoreConnector for MockConnector {
    async fn connect(&self) -> Result<Arc<dyn SecretStore>> {
        self.connect_call_count.fetch_add(1, Ordering::SeqCst);
        match &self.store {
            Some(store) => Ok(store.clone()),
            None => Err(Error::connection("no kubeconfig available")),
        }
    }
}

/// Build a resolver over `backend` and initialize it with `store`
pub async fn initialized_resolver(
    backend: &MockDnsBackend,
    store: Arc<MockSecretStore>,
) -> ChallengeResolver {
    let resolver = ChallengeResolver::new(
        "gandi",
        Arc::new(MockDnsClientFactory::new(backend.clone())),
    );
    let (_stop_tx, stop_rx) = tokio::sync::watch::channel(false);

    resolver
        .initialize(&MockConnector::new(store), stop_rx)
        .await
        .expect("initialize succeeds");

    resolver
}

/// Challenge for `fqdn` in `zone` referencing the default credentials secret
pub fn challenge(zone: &str, fqdn: &str, key: &str) -> ChallengeRequest {
    ChallengeRequest::new(NAMESPACE, zone, fqdn, key)
        .with_config_json(&format!(
            r#"{{"apiKeySecretRef":{{"name":"{}","key":"{}"}}}}"#,
            SECRET_NAME, SECRET_KEY
        ))
        .expect("valid config json")
}
