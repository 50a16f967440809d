/// NostrGator NIP-05 - identity hosting and verification service
///
/// Serves a domain's `/.well-known/nostr.json` directory and verifies
/// NIP-05 identifiers hosted on any domain, with a TTL cache in front of
/// remote lookups.
pub mod api;
pub mod config;
pub mod context;
pub mod error;
pub mod identity;
pub mod jobs;
pub mod metrics;
pub mod rate_limit;
pub mod server;
