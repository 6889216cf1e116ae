//! Challenge request and response types
//!
//! Field names follow cert-manager's `acme.cert-manager.io/v1alpha1`
//! `ChallengePayload` so payloads produced by the issuing controller can be
//! decoded directly.

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

/// API version of challenge payloads
pub const PAYLOAD_API_VERSION: &str = "acme.cert-manager.io/v1alpha1";

/// Kind of challenge payloads
pub const PAYLOAD_KIND: &str = "ChallengePayload";

/// What the caller wants done with the challenge record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChallengeAction {
    /// Publish the TXT record
    #[default]
    Present,
    /// Remove the TXT record
    CleanUp,
}

/// One DNS-01 challenge to present or clean up
///
/// Immutable input to every solver operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeRequest {
    /// Identifier echoed back in the response
    #[serde(default)]
    pub uid: String,

    /// Requested action
    #[serde(default)]
    pub action: ChallengeAction,

    /// Challenge type, always "dns-01" for this solver
    #[serde(rename = "type", default)]
    pub challenge_type: String,

    /// Name being validated, without the `_acme-challenge` prefix
    #[serde(default)]
    pub dns_name: String,

    /// Expected TXT record value (unquoted)
    #[serde(default)]
    pub key: String,

    /// Namespace secrets are resolved in
    #[serde(default)]
    pub resource_namespace: String,

    /// FQDN the record must be published at, trailing dot included
    #[serde(rename = "resolvedFQDN", default)]
    pub resolved_fqdn: String,

    /// Zone the FQDN lives in, trailing dot included
    #[serde(default)]
    pub resolved_zone: String,

    /// Whether ambient credentials may be used (unused by this solver)
    #[serde(default)]
    pub allow_ambient_credentials: bool,

    /// Opaque per-issuer solver config
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Box<RawValue>>,
}

impl ChallengeRequest {
    /// Create a Present request for the given namespace, zone, FQDN and key
    pub fn new(
        resource_namespace: impl Into<String>,
        resolved_zone: impl Into<String>,
        resolved_fqdn: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            challenge_type: "dns-01".to_string(),
            key: key.into(),
            resource_namespace: resource_namespace.into(),
            resolved_fqdn: resolved_fqdn.into(),
            resolved_zone: resolved_zone.into(),
            ..Self::default()
        }
    }

    /// Set the action
    pub fn with_action(mut self, action: ChallengeAction) -> Self {
        self.action = action;
        self
    }

    /// Set the uid
    pub fn with_uid(mut self, uid: impl Into<String>) -> Self {
        self.uid = uid.into();
        self
    }

    /// Attach per-issuer config from a JSON document
    pub fn with_config_json(mut self, json: &str) -> crate::Result<Self> {
        self.config = Some(RawValue::from_string(json.to_string())?);
        Ok(self)
    }
}

/// Status attached to a challenge response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeStatus {
    /// Human-readable failure description
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,

    /// Machine-readable failure reason
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub reason: String,
}

/// Outcome of one challenge request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeResponse {
    /// Uid of the request this answers
    #[serde(default)]
    pub uid: String,

    /// Whether the action succeeded
    #[serde(default)]
    pub success: bool,

    /// Failure details, absent on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ChallengeStatus>,
}

impl ChallengeResponse {
    /// Successful response for `uid`
    pub fn success(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            success: true,
            status: None,
        }
    }

    /// Failed response for `uid`
    pub fn failure(uid: impl Into<String>, reason: &str, message: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            success: false,
            status: Some(ChallengeStatus {
                message: message.into(),
                reason: reason.to_string(),
            }),
        }
    }
}

/// Envelope exchanged with the issuing controller
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengePayload {
    /// Always [`PAYLOAD_API_VERSION`] on output
    #[serde(default)]
    pub api_version: String,

    /// Always [`PAYLOAD_KIND`] on output
    #[serde(default)]
    pub kind: String,

    /// Incoming request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<ChallengeRequest>,

    /// Outgoing response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<ChallengeResponse>,
}

impl ChallengePayload {
    /// Wrap a request
    pub fn from_request(request: ChallengeRequest) -> Self {
        Self {
            api_version: PAYLOAD_API_VERSION.to_string(),
            kind: PAYLOAD_KIND.to_string(),
            request: Some(request),
            response: None,
        }
    }

    /// Wrap a response
    pub fn from_response(response: ChallengeResponse) -> Self {
        Self {
            api_version: PAYLOAD_API_VERSION.to_string(),
            kind: PAYLOAD_KIND.to_string(),
            request: None,
            response: Some(response),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_controller_payload() {
        let json = r#"{
            "apiVersion": "acme.cert-manager.io/v1alpha1",
            "kind": "ChallengePayload",
            "request": {
                "uid": "6f1c",
                "action": "CleanUp",
                "type": "dns-01",
                "dnsName": "foo.example.com",
                "key": "abc123",
                "resourceNamespace": "cert-manager",
                "resolvedFQDN": "_acme-challenge.foo.example.com.",
                "resolvedZone": "example.com.",
                "allowAmbientCredentials": false,
                "config": {"apiKeySecretRef": {"name": "gandi", "key": "api-key"}}
            }
        }"#;

        let payload: ChallengePayload = serde_json::from_str(json).unwrap();
        let request = payload.request.unwrap();

        assert_eq!(request.uid, "6f1c");
        assert_eq!(request.action, ChallengeAction::CleanUp);
        assert_eq!(request.challenge_type, "dns-01");
        assert_eq!(request.resolved_fqdn, "_acme-challenge.foo.example.com.");
        assert_eq!(request.resolved_zone, "example.com.");
        assert!(request.config.unwrap().get().contains("apiKeySecretRef"));
    }

    #[test]
    fn success_response_omits_status() {
        let payload = ChallengePayload::from_response(ChallengeResponse::success("6f1c"));
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["kind"], "ChallengePayload");
        assert_eq!(json["response"]["uid"], "6f1c");
        assert_eq!(json["response"]["success"], true);
        assert!(json["response"].get("status").is_none());
        assert!(json.get("request").is_none());
    }
}
