//! Configuration types for the DNS-01 solver
//!
//! Two layers of configuration exist:
//!
//! - [`SolverConfig`]: per-issuer JSON carried inside every challenge request
//! - [`WebhookConfig`]: process-wide settings read once from the environment

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

/// Environment variable naming the API group the solver is served under
pub const GROUP_NAME_ENV: &str = "GROUP_NAME";

/// Environment variable selecting which registered solver handles payloads
pub const SOLVER_NAME_ENV: &str = "SOLVER_NAME";

/// Environment variable for the log level
pub const LOG_LEVEL_ENV: &str = "LOG_LEVEL";

/// Environment variable overriding the Gandi LiveDNS API base URL
pub const GANDI_API_URL_ENV: &str = "GANDI_API_URL";

/// Reference to one data key inside a namespaced Secret
///
/// The namespace is not part of the selector: secrets are always looked up
/// in the challenge's resource namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretKeySelector {
    /// Secret name
    #[serde(default)]
    pub name: String,

    /// Key within the secret's data
    #[serde(default)]
    pub key: String,
}

/// Per-issuer solver configuration
///
/// Set by users in `issuer.spec.acme.solvers[].dns01.webhook.config`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Where the provider API key lives
    #[serde(rename = "apiKeySecretRef", default)]
    pub api_key_secret_ref: SecretKeySelector,
}

impl SolverConfig {
    /// Decode the raw config carried by a challenge request
    ///
    /// Absent config (or a JSON `null`) yields the zero value.
    pub fn load(raw: Option<&RawValue>) -> Result<Self, crate::Error> {
        let Some(raw) = raw else {
            return Ok(Self::default());
        };

        if raw.get().trim() == "null" {
            return Ok(Self::default());
        }

        serde_json::from_str(raw.get()).map_err(crate::Error::ConfigDecode)
    }
}

/// Process-wide webhook configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookConfig {
    /// API group the solver is registered under (e.g. "acme.example.com")
    pub group_name: String,

    /// Name of the solver that handles incoming payloads
    pub solver_name: String,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Gandi LiveDNS base URL override
    pub gandi_api_url: Option<String>,
}

impl WebhookConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, crate::Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, crate::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let group_name = lookup(GROUP_NAME_ENV)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                crate::Error::config(format!("{} must be specified", GROUP_NAME_ENV))
            })?;

        let config = Self {
            group_name,
            solver_name: lookup(SOLVER_NAME_ENV)
                .filter(|s| !s.is_empty())
                .unwrap_or_else(default_solver_name),
            log_level: lookup(LOG_LEVEL_ENV)
                .filter(|s| !s.is_empty())
                .unwrap_or_else(default_log_level),
            gandi_api_url: lookup(GANDI_API_URL_ENV).filter(|s| !s.is_empty()),
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(crate::Error::config(format!(
                    "{} '{}' is not valid. Valid levels: trace, debug, info, warn, error",
                    LOG_LEVEL_ENV, self.log_level
                )));
            }
        }

        if let Some(ref url) = self.gandi_api_url
            && !url.starts_with("https://")
            && !url.starts_with("http://")
        {
            return Err(crate::Error::config(format!(
                "{} must use HTTP or HTTPS scheme. Got: {}",
                GANDI_API_URL_ENV, url
            )));
        }

        Ok(())
    }
}

fn default_solver_name() -> String {
    "gandi".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}
