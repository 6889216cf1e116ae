// # DNS Client Trait
//
// Defines the record-level interface to a managed DNS provider's API.
//
// ## Implementations
//
// - Gandi LiveDNS: `dns01-provider-gandi` crate
//
// ## Usage
//
// ```rust,ignore
// use dns01_core::DnsClient;
//
// #[tokio::main]
// async fn main() -> dns01_core::Result<()> {
//     let client = /* DnsClient implementation */;
//
//     match client.get_record("example.com", "_acme-challenge", "TXT").await? {
//         Some(record) => println!("present: {:?}", record.values),
//         None => client
//             .create_record("example.com", "_acme-challenge", "TXT", 300, &["token".into()])
//             .await?,
//     }
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

/// Record type manipulated by the DNS-01 solver
pub const TXT: &str = "TXT";

/// One resource record set as reported by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsRecord {
    /// Record name relative to the root domain
    pub name: String,
    /// Record type (e.g. "TXT")
    pub record_type: String,
    /// Time-to-live in seconds
    pub ttl: u32,
    /// Values in provider order; TXT values arrive double-quoted
    pub values: Vec<String>,
}

impl DnsRecord {
    /// All values concatenated in order
    pub fn joined_values(&self) -> String {
        self.values.concat()
    }
}

/// Trait for DNS provider clients
///
/// A client is scoped to one API key and addresses records by
/// (root domain, relative name, type).
///
/// # Trust Level: Untrusted
///
/// Clients perform one API call per method invocation and never retry,
/// back off, cache or spawn tasks. Callers decide what to do with errors.
#[async_trait]
pub trait DnsClient: Send + Sync {
    /// Look up a record
    ///
    /// # Returns
    ///
    /// - `Ok(Some(record))`: The record exists
    /// - `Ok(None)`: The provider reports the record as not found
    /// - `Err(Error)`: Any other failure
    async fn get_record(
        &self,
        root: &str,
        name: &str,
        record_type: &str,
    ) -> Result<Option<DnsRecord>, crate::Error>;

    /// Create a record that does not exist yet
    async fn create_record(
        &self,
        root: &str,
        name: &str,
        record_type: &str,
        ttl: u32,
        values: &[String],
    ) -> Result<(), crate::Error>;

    /// Replace the values of an existing record
    async fn update_record(
        &self,
        root: &str,
        name: &str,
        record_type: &str,
        ttl: u32,
        values: &[String],
    ) -> Result<(), crate::Error>;

    /// Delete a record
    async fn delete_record(
        &self,
        root: &str,
        name: &str,
        record_type: &str,
    ) -> Result<(), crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}

/// Helper trait for constructing DNS clients scoped to an API key
pub trait DnsClientFactory: Send + Sync {
    /// Create a client that authenticates with `api_key`
    ///
    /// The returned client runs in live mode: no debug tracing of
    /// requests, no dry-run.
    fn create(&self, api_key: &str) -> Result<Box<dyn DnsClient>, crate::Error>;
}
