/// Verification Cache - time-bounded memoization of verification outcomes
use crate::identity::VerificationRecord;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Upper bound on configurable TTL (100 years)
const MAX_TTL_HOURS: u64 = 876_000;

/// Cached verification outcome
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub record: VerificationRecord,
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Verification cache manager
///
/// Negative results are cached too, so expired entries are dropped whenever
/// a lookup or write touches their key, and by [`cleanup_expired`](Self::cleanup_expired).
#[derive(Clone)]
pub struct VerificationCache {
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
    /// TTL applied by `store`; fixed at construction
    ttl: Duration,
}

impl VerificationCache {
    /// Create a new cache with the given default TTL
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Create a cache from a duration in hours (`cache_duration_hours` config)
    pub fn with_hours(hours: u64) -> Self {
        Self::new(Duration::hours(hours.min(MAX_TTL_HOURS) as i64))
    }

    /// Default TTL
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Get a cached record; expired entries are a miss and get evicted
    pub async fn get(&self, identifier: &str) -> Option<VerificationRecord> {
        let now = Utc::now();

        {
            let entries = self.entries.read().await;
            match entries.get(identifier) {
                None => return None,
                Some(entry) if !entry.is_expired(now) => return Some(entry.record.clone()),
                Some(_) => {}
            }
        }

        // Expired - re-check under the write lock, a fresh put may have landed
        let mut entries = self.entries.write().await;
        if entries
            .get(identifier)
            .map_or(false, |entry| entry.is_expired(now))
        {
            entries.remove(identifier);
        }

        None
    }

    /// Cache a record with an explicit TTL, replacing any existing entry
    pub async fn put(&self, identifier: &str, record: VerificationRecord, ttl: Duration) {
        let entry = CacheEntry {
            record,
            expires_at: Utc::now()
                .checked_add_signed(ttl)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        };

        self.entries
            .write()
            .await
            .insert(identifier.to_string(), entry);
    }

    /// Cache a record with the default TTL
    pub async fn store(&self, identifier: &str, record: VerificationRecord) {
        self.put(identifier, record, self.ttl).await;
    }

    /// Remove a cached record (force re-verification)
    pub async fn invalidate(&self, identifier: &str) -> bool {
        self.entries.write().await.remove(identifier).is_some()
    }

    /// Remove every expired entry, returning how many were dropped
    pub async fn cleanup_expired(&self) -> usize {
        let now = Utc::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        before - entries.len()
    }

    /// Number of physically stored entries (may include expired ones)
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
