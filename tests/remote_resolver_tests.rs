//! HttpResolver against a local mock server

use nostrgator_nip05::identity::{
    HttpResolver, Pubkey, ResolveError, ResolverConfig, WellKnownResolver,
};
use serde_json::json;
use std::time::Duration;
use wiremock::{
    matchers::{method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

const P1: &str = "3bf0c63fcb93463407af97a5e5ee64fa883d107ef9e558472c4eb9aaaefa459d";

fn resolver(timeout: Duration) -> HttpResolver {
    HttpResolver::new(ResolverConfig {
        timeout,
        scheme: "http".to_string(),
        ..ResolverConfig::default()
    })
    .unwrap()
}

/// host:port of the mock server, used in place of a domain
fn authority(server: &MockServer) -> String {
    server.address().to_string()
}

#[tokio::test]
async fn test_resolves_document_with_relays() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/.well-known/nostr.json"))
        .and(query_param("name", "bob"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "names": { "bob": P1 },
            "relays": { P1: ["wss://relay.one"] }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let doc = resolver(Duration::from_secs(5))
        .resolve("bob", &authority(&server))
        .await
        .unwrap();

    assert_eq!(doc.pubkey_for("bob"), Some(P1));
    let pubkey = Pubkey::normalize(P1).unwrap();
    assert_eq!(doc.relays_for(&pubkey), vec!["wss://relay.one".to_string()]);
}

#[tokio::test]
async fn test_name_missing_from_document() {
    let server = MockServer::start().await;
    Mock::given(path("/.well-known/nostr.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "names": { "alice": P1 }
        })))
        .mount(&server)
        .await;

    let err = resolver(Duration::from_secs(5))
        .resolve("bob", &authority(&server))
        .await
        .unwrap_err();

    assert!(matches!(err, ResolveError::NotFound { .. }));
}

#[tokio::test]
async fn test_http_404_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(path("/.well-known/nostr.json"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = resolver(Duration::from_secs(5))
        .resolve("bob", &authority(&server))
        .await
        .unwrap_err();

    assert!(matches!(err, ResolveError::NotFound { .. }));
}

#[tokio::test]
async fn test_server_error_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(path("/.well-known/nostr.json"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = resolver(Duration::from_secs(5))
        .resolve("bob", &authority(&server))
        .await
        .unwrap_err();

    assert!(matches!(err, ResolveError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_garbage_body_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(path("/.well-known/nostr.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>hello</html>"))
        .mount(&server)
        .await;

    let err = resolver(Duration::from_secs(5))
        .resolve("bob", &authority(&server))
        .await
        .unwrap_err();

    assert!(matches!(err, ResolveError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let server = MockServer::start().await;
    let padding = "x".repeat(70 * 1024);
    Mock::given(path("/.well-known/nostr.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "names": { "bob": P1 },
            "padding": padding
        })))
        .mount(&server)
        .await;

    let err = resolver(Duration::from_secs(5))
        .resolve("bob", &authority(&server))
        .await
        .unwrap_err();

    assert!(matches!(err, ResolveError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_redirects_are_not_followed() {
    let server = MockServer::start().await;
    Mock::given(path("/.well-known/nostr.json"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("Location", "https://elsewhere.test/"),
        )
        .mount(&server)
        .await;

    let err = resolver(Duration::from_secs(5))
        .resolve("bob", &authority(&server))
        .await
        .unwrap_err();

    assert!(matches!(err, ResolveError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_slow_domain_times_out() {
    let server = MockServer::start().await;
    Mock::given(path("/.well-known/nostr.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "names": { "bob": P1 } }))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let err = resolver(Duration::from_millis(200))
        .resolve("bob", &authority(&server))
        .await
        .unwrap_err();

    assert!(matches!(err, ResolveError::Timeout(_)));
}

#[tokio::test]
async fn test_refused_connection_is_unreachable() {
    // Nothing listens on port 1
    let err = resolver(Duration::from_secs(2))
        .resolve("bob", "127.0.0.1:1")
        .await
        .unwrap_err();

    assert!(matches!(err, ResolveError::Unreachable(_)));
}
