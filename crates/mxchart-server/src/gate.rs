//! Shared-secret access gate
//!
//! Every render request must carry the configured header with a value equal
//! to the shared secret. The decision is made before the body is read.

use axum::http::{HeaderMap, HeaderName};
use subtle::ConstantTimeEq;

use crate::config::SharedSecret;

/// Identity attached to requests that passed the gate
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Principal {
    /// Caller presented the shared secret
    Trusted,
}

impl Principal {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trusted => "trusted",
        }
    }
}

/// Why a request was turned away
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DenyReason {
    MissingCredential,
    InvalidCredential,
}

impl DenyReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MissingCredential => "missing_credential",
            Self::InvalidCredential => "invalid_credential",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessDecision {
    Allow(Principal),
    Deny(DenyReason),
}

/// Compares one request header against the shared secret
#[derive(Clone, Debug)]
pub struct AccessGate {
    header: HeaderName,
    secret: SharedSecret,
}

impl AccessGate {
    pub fn new(header: HeaderName, secret: SharedSecret) -> Self {
        Self { header, secret }
    }

    pub fn header(&self) -> &HeaderName {
        &self.header
    }

    /// Decide from the request headers alone
    pub fn decide(&self, headers: &HeaderMap) -> AccessDecision {
        let Some(value) = headers.get(&self.header) else {
            return AccessDecision::Deny(DenyReason::MissingCredential);
        };
        self.check(value.as_bytes())
    }

    /// Check a presented credential
    pub fn check(&self, presented: &[u8]) -> AccessDecision {
        if presented.is_empty() {
            return AccessDecision::Deny(DenyReason::MissingCredential);
        }
        // ct_eq is false for slices of different lengths without comparing bytes
        if bool::from(presented.ct_eq(self.secret.as_bytes())) {
            AccessDecision::Allow(Principal::Trusted)
        } else {
            AccessDecision::Deny(DenyReason::InvalidCredential)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn gate() -> AccessGate {
        AccessGate::new(HeaderName::from_static("x-api-key"), SharedSecret::new("s3cret"))
    }

    fn headers(name: &'static str, value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_bytes(name.as_bytes()).unwrap(),
            HeaderValue::from_static(value),
        );
        headers
    }

    #[test]
    fn matching_secret_is_allowed() {
        let decision = gate().decide(&headers("x-api-key", "s3cret"));
        assert_eq!(decision, AccessDecision::Allow(Principal::Trusted));
    }

    #[test]
    fn header_lookup_ignores_case() {
        let decision = gate().decide(&headers("X-API-Key", "s3cret"));
        assert_eq!(decision, AccessDecision::Allow(Principal::Trusted));
    }

    #[test]
    fn missing_header_is_denied() {
        let decision = gate().decide(&HeaderMap::new());
        assert_eq!(decision, AccessDecision::Deny(DenyReason::MissingCredential));
    }

    #[test]
    fn empty_value_is_denied() {
        let decision = gate().decide(&headers("x-api-key", ""));
        assert_eq!(decision, AccessDecision::Deny(DenyReason::MissingCredential));
    }

    #[test]
    fn wrong_secret_is_denied() {
        for presented in ["wrong", "s3cre", "s3cret ", "S3CRET"] {
            assert_eq!(
                gate().check(presented.as_bytes()),
                AccessDecision::Deny(DenyReason::InvalidCredential),
                "{presented:?} must be denied"
            );
        }
    }

    #[test]
    fn secret_under_another_header_is_denied() {
        let decision = gate().decide(&headers("authorization", "s3cret"));
        assert_eq!(decision, AccessDecision::Deny(DenyReason::MissingCredential));
    }

    #[test]
    fn reason_labels() {
        assert_eq!(DenyReason::MissingCredential.as_str(), "missing_credential");
        assert_eq!(DenyReason::InvalidCredential.as_str(), "invalid_credential");
        assert_eq!(Principal::Trusted.as_str(), "trusted");
    }

    #[test]
    fn debug_does_not_leak_secret() {
        assert!(!format!("{:?}", gate()).contains("s3cret"));
    }
}
