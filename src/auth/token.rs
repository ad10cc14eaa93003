//! Cached bearer token record and credential fingerprinting.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Safety margin for expiry checks (60 seconds). A token closer to its
/// expiry than this is treated as already unusable.
pub(crate) const EXPIRY_SAFETY_MARGIN_SECS: i64 = 60;

/// A short-lived bearer token issued in exchange for a long-lived
/// credential.
///
/// Only the SHA-256 fingerprint of the long-lived credential is stored,
/// never the credential itself.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CachedToken {
    /// Bearer token usable against the chat completions API.
    pub token: String,

    /// Unix timestamp after which the token must not be used.
    pub expires_at: i64,

    /// Fingerprint of the long-lived credential that produced this token.
    pub credential_hash: String,
}

impl CachedToken {
    /// Create a record for a freshly exchanged token.
    pub fn new(token: impl Into<String>, expires_at: i64, credential: &str) -> Self {
        Self {
            token: token.into(),
            expires_at,
            credential_hash: fingerprint(credential),
        }
    }

    /// Whether this token can be used on behalf of `credential`.
    ///
    /// Requires a fingerprint match and an expiry at least the safety
    /// margin away.
    #[must_use]
    pub fn is_valid_for(&self, credential: &str) -> bool {
        self.matches(credential) && self.is_fresh()
    }

    /// Fingerprint comparison against a presented credential.
    pub fn matches(&self, credential: &str) -> bool {
        self.credential_hash == fingerprint(credential)
    }

    /// Expiry check with the safety margin applied.
    pub fn is_fresh(&self) -> bool {
        !self.token.is_empty()
            && chrono::Utc::now().timestamp() + EXPIRY_SAFETY_MARGIN_SECS < self.expires_at
    }
}

/// Deterministic SHA-256 fingerprint of a long-lived credential, hex
/// encoded. Used only as a cache key; the credential itself is the secret.
pub fn fingerprint(credential: &str) -> String {
    let hash = Sha256::digest(credential.as_bytes());
    hash.iter().map(|b| format!("{b:02x}")).collect()
}
