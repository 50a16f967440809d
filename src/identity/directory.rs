/// Directory builder - assembles the local `/.well-known/nostr.json` document
use crate::identity::{Identity, WellKnownDocument};
use std::collections::BTreeMap;

/// Build the full directory document
///
/// Every identity contributes a `names` entry; `relays` only carries
/// identities whose relay list is non-empty.
pub fn build(identities: &BTreeMap<String, Identity>) -> WellKnownDocument {
    let mut doc = WellKnownDocument::default();
    for identity in identities.values() {
        add_identity(&mut doc, identity);
    }
    doc
}

/// Build the document for a single `?name=` query
///
/// Unknown names yield an empty document rather than an error.
pub fn build_for(identities: &BTreeMap<String, Identity>, name: &str) -> WellKnownDocument {
    let mut doc = WellKnownDocument::default();
    if let Some(identity) = identities.get(&name.to_ascii_lowercase()) {
        add_identity(&mut doc, identity);
    }
    doc
}

fn add_identity(doc: &mut WellKnownDocument, identity: &Identity) {
    let pubkey = identity.pubkey.as_hex().to_string();

    if !identity.relays.is_empty() {
        doc.relays.insert(pubkey.clone(), identity.relays.clone());
    }
    doc.names.insert(identity.name.clone(), pubkey);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Pubkey;

    const P1: &str = "3bf0c63fcb93463407af97a5e5ee64fa883d107ef9e558472c4eb9aaaefa459d";
    const P2: &str = "82341f882b6eabcd2ba7f1ef90aad961cf074af15b9ef44a09f9d2a8fbfbe6a2";

    fn identities() -> BTreeMap<String, Identity> {
        let mut map = BTreeMap::new();
        map.insert(
            "a".to_string(),
            Identity {
                name: "a".to_string(),
                pubkey: Pubkey::normalize(P1).unwrap(),
                relays: vec![],
            },
        );
        map.insert(
            "b".to_string(),
            Identity {
                name: "b".to_string(),
                pubkey: Pubkey::normalize(P2).unwrap(),
                relays: vec!["wss://r1".to_string()],
            },
        );
        map
    }

    #[test]
    fn test_build_omits_empty_relays() {
        let doc = build(&identities());

        assert_eq!(doc.names.len(), 2);
        assert_eq!(doc.names["a"], P1);
        assert_eq!(doc.names["b"], P2);
        assert_eq!(doc.relays.len(), 1);
        assert!(!doc.relays.contains_key(P1));
        assert_eq!(doc.relays[P2], vec!["wss://r1".to_string()]);
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(build(&identities())).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "names": { "a": P1, "b": P2 },
                "relays": { P2: ["wss://r1"] }
            })
        );
    }

    #[test]
    fn test_empty_directory_has_no_relays_key() {
        let json = serde_json::to_value(build(&BTreeMap::new())).unwrap();
        assert_eq!(json, serde_json::json!({ "names": {} }));
    }

    #[test]
    fn test_build_for_single_name() {
        let doc = build_for(&identities(), "B");
        assert_eq!(doc.names.len(), 1);
        assert_eq!(doc.names["b"], P2);
        assert_eq!(doc.relays.len(), 1);

        let missing = build_for(&identities(), "zed");
        assert!(missing.names.is_empty());
    }
}
