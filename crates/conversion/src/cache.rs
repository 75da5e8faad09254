//! Conversion status cache abstraction.
//!
//! The cache is the only mutable state shared between the submission side
//! and the callback side. Absence of an entry is meaningful: it says
//! "unknown here" (never submitted, or purged after giving up), which is
//! distinct from `Pending` (a submission is actively being retried).

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use async_trait::async_trait;

use pdfrelay_core::AttachmentId;

/// Where a conversion currently stands, from the poller's point of view.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ConversionState {
    /// Submitted (or being retried); no result yet.
    Pending,
    /// The converted result has been stored.
    Finished,
}

impl ConversionState {
    /// Stable string form, used as the stored cache value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Finished => "finished",
        }
    }

    /// Parse a stored cache value; unknown values map to `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "finished" => Some(Self::Finished),
            _ => None,
        }
    }
}

/// Status cache error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CacheError {
    #[error("cache backend error: {0}")]
    Backend(String),
}

/// Per-key status store with atomic get/set/delete.
///
/// No multi-key transactions are required; races between a late callback
/// and a give-up resolve last-write-wins per key.
#[async_trait]
pub trait StatusCache: Send + Sync {
    /// Current state for `id`, or `None` if unknown (absent or expired).
    async fn get(&self, id: AttachmentId) -> Result<Option<ConversionState>, CacheError>;

    /// Record `state` for `id`. A `ttl` bounds how long the entry lives;
    /// `None` keeps it until deleted or overwritten.
    async fn set(
        &self,
        id: AttachmentId,
        state: ConversionState,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError>;

    /// Forget `id` entirely (pollers will see "unknown").
    async fn delete(&self, id: AttachmentId) -> Result<(), CacheError>;
}

#[async_trait]
impl<S> StatusCache for Arc<S>
where
    S: StatusCache + ?Sized,
{
    async fn get(&self, id: AttachmentId) -> Result<Option<ConversionState>, CacheError> {
        (**self).get(id).await
    }

    async fn set(
        &self,
        id: AttachmentId,
        state: ConversionState,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        (**self).set(id, state, ttl).await
    }

    async fn delete(&self, id: AttachmentId) -> Result<(), CacheError> {
        (**self).delete(id).await
    }
}

/// In-memory status cache for tests/dev.
///
/// Expired entries are treated as absent on read and pruned on writes, so
/// the map stays bounded without a background sweeper.
#[derive(Debug, Default)]
pub struct InMemoryStatusCache {
    entries: RwLock<HashMap<AttachmentId, CacheEntry>>,
}

#[derive(Debug)]
struct CacheEntry {
    state: ConversionState,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

impl InMemoryStatusCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

#[async_trait]
impl StatusCache for InMemoryStatusCache {
    async fn get(&self, id: AttachmentId) -> Result<Option<ConversionState>, CacheError> {
        let entries = self.entries.read().unwrap();
        let now = Instant::now();
        Ok(entries
            .get(&id)
            .filter(|entry| !entry.expired(now))
            .map(|entry| entry.state))
    }

    async fn set(
        &self,
        id: AttachmentId,
        state: ConversionState,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        let mut entries = self.entries.write().unwrap();
        let now = Instant::now();
        entries.retain(|_, entry| !entry.expired(now));
        entries.insert(
            id,
            CacheEntry {
                state,
                expires_at: ttl.map(|ttl| now + ttl),
            },
        );
        Ok(())
    }

    async fn delete(&self, id: AttachmentId) -> Result<(), CacheError> {
        let mut entries = self.entries.write().unwrap();
        entries.remove(&id);
        Ok(())
    }
}
