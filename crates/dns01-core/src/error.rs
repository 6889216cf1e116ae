//! Error types for the DNS-01 solver
//!
//! Every failure carries a short human-readable context (what operation
//! failed) in its `Display` output. "Record not found" on a lookup is not
//! an error anywhere in this crate; DNS clients report it as `Ok(None)`.

use thiserror::Error;

/// Result type alias for solver operations
pub type Result<T> = std::result::Result<T, Error>;

/// Provider operation that mutates a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOperation {
    /// Record creation
    Create,
    /// Record update in place
    Update,
    /// Record deletion
    Delete,
}

impl RecordOperation {
    /// Lowercase verb used in error messages and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordOperation::Create => "create",
            RecordOperation::Update => "update",
            RecordOperation::Delete => "delete",
        }
    }
}

impl std::fmt::Display for RecordOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Core error type for the DNS-01 solver
#[derive(Error, Debug)]
pub enum Error {
    /// Per-issuer solver config could not be decoded
    #[error("unable to load config: error decoding solver config: {0}")]
    ConfigDecode(#[source] serde_json::Error),

    /// The referenced secret could not be fetched
    #[error("unable to get API key: unable to get secret `{name}`: {message}")]
    SecretLookup {
        /// Namespace the secret was looked up in
        namespace: String,
        /// Secret name
        name: String,
        /// Underlying store error
        message: String,
    },

    /// The secret exists but does not hold the referenced key
    #[error("unable to get API key: key {key:?} not found in secret \"{namespace}/{name}\"")]
    KeyNotFound {
        /// Data key that was requested
        key: String,
        /// Secret namespace
        namespace: String,
        /// Secret name
        name: String,
    },

    /// The credential store client could not be built
    #[error("unable to get k8s client: {0}")]
    Connection(String),

    /// A solver was used before `initialize` stored a credential store
    #[error("solver {0:?} has not been initialized")]
    NotInitialized(String),

    /// The resolved zone cannot be split into a root domain
    #[error("unable to manage provided domain: {0}")]
    InvalidDomain(String),

    /// Record lookup failed for a reason other than "not found"
    #[error("unable to look up TXT record: {0}")]
    RecordLookup(String),

    /// The provider rejected a create/update/delete call
    #[error("unable to {operation} TXT record: {message}")]
    RecordWrite {
        /// Operation that failed
        operation: RecordOperation,
        /// Provider error message
        message: String,
    },

    /// Process configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Provider-specific error
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },
}

impl Error {
    /// Create a secret lookup error
    pub fn secret_lookup(
        namespace: impl Into<String>,
        name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::SecretLookup {
            namespace: namespace.into(),
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create a "key not found in secret" error
    pub fn key_not_found(
        key: impl Into<String>,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self::KeyNotFound {
            key: key.into(),
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Create a connection error
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Create an invalid domain error
    pub fn invalid_domain(msg: impl Into<String>) -> Self {
        Self::InvalidDomain(msg.into())
    }

    /// Create a record lookup error
    pub fn record_lookup(msg: impl Into<String>) -> Self {
        Self::RecordLookup(msg.into())
    }

    /// Create a record write error
    pub fn record_write(operation: RecordOperation, message: impl Into<String>) -> Self {
        Self::RecordWrite {
            operation,
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_not_found_names_namespace_then_secret() {
        let err = Error::key_not_found("api-key", "cert-manager", "gandi-credentials");
        assert_eq!(
            err.to_string(),
            "unable to get API key: key \"api-key\" not found in secret \"cert-manager/gandi-credentials\""
        );
    }

    #[test]
    fn record_write_includes_operation() {
        let err = Error::record_write(RecordOperation::Update, "quota exceeded");
        assert_eq!(err.to_string(), "unable to update TXT record: quota exceeded");
    }
}
