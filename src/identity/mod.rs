/// NIP-05 Identity System
///
/// Hosts the local identity directory and verifies remote identifiers
/// against their domain's `/.well-known/nostr.json` document, with
/// caching and trust scoring.

pub mod cache;
pub mod directory;
pub mod engine;
pub mod identifier;
pub mod pubkey;
pub mod resolver;
pub mod trust;

pub use cache::VerificationCache;
pub use engine::{EngineConfig, VerificationEngine};
pub use identifier::Identifier;
pub use pubkey::Pubkey;
pub use resolver::{HttpResolver, ResolveError, ResolverConfig, WellKnownResolver};
pub use trust::{TrustConfig, TrustLevels};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A locally hosted identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    pub pubkey: Pubkey,
    pub relays: Vec<String>,
}

/// The `/.well-known/nostr.json` wire format
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WellKnownDocument {
    pub names: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub relays: BTreeMap<String, Vec<String>>,
}

impl WellKnownDocument {
    /// Look up a name, exact match first, then ASCII case-insensitive
    pub fn pubkey_for(&self, name: &str) -> Option<&str> {
        self.names
            .get(name)
            .or_else(|| {
                self.names
                    .iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case(name))
                    .map(|(_, v)| v)
            })
            .map(String::as_str)
    }

    /// Relays advertised for a pubkey listed in `names`
    ///
    /// Keys are compared in canonical form, so a document may mix hex and
    /// npub between `names` and `relays`. Orphaned relay entries (pubkeys
    /// not present in `names`) and undecodable keys are ignored.
    pub fn relays_for(&self, pubkey: &Pubkey) -> Vec<String> {
        let matches = |raw: &String| Pubkey::normalize(raw).map_or(false, |key| &key == pubkey);

        if !self.names.values().any(matches) {
            return Vec::new();
        }

        self.relays
            .iter()
            .find(|(key, _)| matches(*key))
            .map(|(_, relays)| relays.clone())
            .unwrap_or_default()
    }
}

/// Why a verification did not succeed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    Timeout,
    Unreachable,
    InvalidResponse,
    NotFound,
    PubkeyMismatch,
}

impl FailureReason {
    /// Metrics outcome label: expected negatives are `failed`, transport faults `error`
    pub fn outcome(&self) -> &'static str {
        match self {
            FailureReason::NotFound | FailureReason::PubkeyMismatch => "failed",
            FailureReason::Timeout
            | FailureReason::Unreachable
            | FailureReason::InvalidResponse => "error",
        }
    }
}

/// Result of verifying one identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationRecord {
    pub identifier: String,
    pub domain: String,
    pub name: String,
    pub verified: bool,
    pub pubkey: Option<Pubkey>,
    pub relays: Vec<String>,
    pub trust_level: u32,
    pub verified_at: DateTime<Utc>,
    pub failure_reason: Option<FailureReason>,
    pub error: Option<String>,
}

impl VerificationRecord {
    /// Successful verification
    pub fn verified(
        identifier: &Identifier,
        pubkey: Pubkey,
        relays: Vec<String>,
        trust_level: u32,
    ) -> Self {
        Self {
            identifier: identifier.to_string(),
            domain: identifier.domain().to_string(),
            name: identifier.name().to_string(),
            verified: true,
            pubkey: Some(pubkey),
            relays,
            trust_level,
            verified_at: Utc::now(),
            failure_reason: None,
            error: None,
        }
    }

    /// Failed verification; trust level is always zero
    pub fn unverified(identifier: &Identifier, reason: FailureReason, error: String) -> Self {
        Self {
            identifier: identifier.to_string(),
            domain: identifier.domain().to_string(),
            name: identifier.name().to_string(),
            verified: false,
            pubkey: None,
            relays: Vec::new(),
            trust_level: 0,
            verified_at: Utc::now(),
            failure_reason: Some(reason),
            error: Some(error),
        }
    }

    /// Check the record against a pubkey the caller expects
    ///
    /// A verified record resolving to a different key becomes an unverified
    /// copy with `PubkeyMismatch`. Unverified records are returned unchanged.
    pub fn against_expected(self, expected: Option<&Pubkey>) -> Self {
        let mismatch = match (expected, self.pubkey.as_ref()) {
            (Some(expected), Some(actual)) if self.verified && expected != actual => Some(format!(
                "{} resolves to {}, not {}",
                self.identifier, actual, expected
            )),
            _ => None,
        };

        match mismatch {
            Some(error) => Self {
                verified: false,
                relays: Vec::new(),
                trust_level: 0,
                failure_reason: Some(FailureReason::PubkeyMismatch),
                error: Some(error),
                ..self
            },
            None => self,
        }
    }

    /// Metrics outcome label
    pub fn outcome(&self) -> &'static str {
        match self.failure_reason {
            None if self.verified => "success",
            Some(reason) => reason.outcome(),
            None => "failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const P1: &str = "3bf0c63fcb93463407af97a5e5ee64fa883d107ef9e558472c4eb9aaaefa459d";
    const P2: &str = "82341f882b6eabcd2ba7f1ef90aad961cf074af15b9ef44a09f9d2a8fbfbe6a2";

    fn doc() -> WellKnownDocument {
        let mut doc = WellKnownDocument::default();
        doc.names.insert("Bob".to_string(), P1.to_string());
        doc.relays.insert(P1.to_string(), vec!["wss://relay.one".to_string()]);
        doc.relays.insert(P2.to_string(), vec!["wss://orphan".to_string()]);
        doc
    }

    #[test]
    fn test_name_lookup_case_insensitive_fallback() {
        assert_eq!(doc().pubkey_for("bob"), Some(P1));
        assert_eq!(doc().pubkey_for("Bob"), Some(P1));
        assert_eq!(doc().pubkey_for("carol"), None);
    }

    #[test]
    fn test_orphaned_relays_ignored() {
        let p1 = Pubkey::normalize(P1).unwrap();
        let p2 = Pubkey::normalize(P2).unwrap();
        assert_eq!(doc().relays_for(&p1), vec!["wss://relay.one".to_string()]);
        assert!(doc().relays_for(&p2).is_empty());
    }

    #[test]
    fn test_relays_match_across_encodings() {
        let npub = Pubkey::normalize(P1).unwrap().to_npub().unwrap();
        let mut doc = WellKnownDocument::default();
        doc.names.insert("carol".to_string(), npub);
        doc.relays.insert(P1.to_uppercase(), vec!["wss://carol.relay".to_string()]);

        let p1 = Pubkey::normalize(P1).unwrap();
        assert_eq!(doc.relays_for(&p1), vec!["wss://carol.relay".to_string()]);
    }

    #[test]
    fn test_document_without_relays_parses() {
        let doc: WellKnownDocument =
            serde_json::from_str(&format!(r#"{{"names":{{"bob":"{}"}}}}"#, P1)).unwrap();
        assert!(doc.relays.is_empty());
        assert_eq!(doc.pubkey_for("bob"), Some(P1));
    }

    #[test]
    fn test_expected_pubkey_mismatch() {
        let id = Identifier::parse("bob@example.com").unwrap();
        let record = VerificationRecord::verified(
            &id,
            Pubkey::normalize(P1).unwrap(),
            vec!["wss://relay.one".to_string()],
            3,
        );

        let same = record.clone().against_expected(Some(&Pubkey::normalize(P1).unwrap()));
        assert!(same.verified);
        assert_eq!(same.trust_level, 3);

        let other = record.against_expected(Some(&Pubkey::normalize(P2).unwrap()));
        assert!(!other.verified);
        assert_eq!(other.trust_level, 0);
        assert_eq!(other.failure_reason, Some(FailureReason::PubkeyMismatch));
        assert_eq!(other.outcome(), "failed");
    }

    #[test]
    fn test_record_serializes_snake_case() {
        let id = Identifier::parse("bob@slow-domain.test").unwrap();
        let record = VerificationRecord::unverified(&id, FailureReason::Timeout, "timed out".into());
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["failure_reason"], "timeout");
        assert_eq!(json["trust_level"], 0);
        assert_eq!(json["verified"], false);
        assert!(json["pubkey"].is_null());
        assert_eq!(record.outcome(), "error");
    }
}
