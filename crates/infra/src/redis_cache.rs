//! Redis-backed status cache for multi-process deployments.
//!
//! The in-memory cache is per-process; when submissions and callbacks land
//! on different workers they need a shared view. Values are the plain
//! "pending"/"finished" strings, TTLs map to key expiry.

use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;

use pdfrelay_conversion::{CacheError, ConversionState, StatusCache};
use pdfrelay_core::AttachmentId;

/// Status cache on a shared Redis instance.
#[derive(Clone)]
pub struct RedisStatusCache {
    conn: redis::aio::MultiplexedConnection,
    prefix: String,
}

impl RedisStatusCache {
    /// Connect to `redis_url` (e.g. "redis://localhost:6379").
    pub async fn connect(redis_url: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(redis_url).map_err(backend)?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(backend)?;
        tracing::debug!(url = redis_url, "connected conversion status cache to redis");
        Ok(Self {
            conn,
            prefix: "pdf-conversion:".to_string(),
        })
    }

    fn key(&self, id: AttachmentId) -> String {
        format!("{}{}", self.prefix, id)
    }
}

fn backend(err: redis::RedisError) -> CacheError {
    CacheError::Backend(err.to_string())
}

#[async_trait]
impl StatusCache for RedisStatusCache {
    async fn get(&self, id: AttachmentId) -> Result<Option<ConversionState>, CacheError> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(self.key(id)).await.map_err(backend)?;
        Ok(value.as_deref().and_then(ConversionState::parse))
    }

    async fn set(
        &self,
        id: AttachmentId,
        state: ConversionState,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let key = self.key(id);
        match ttl {
            Some(ttl) => {
                let secs = ttl.as_secs().max(1);
                let _: () = conn.set_ex(key, state.as_str(), secs).await.map_err(backend)?;
            }
            None => {
                let _: () = conn.set(key, state.as_str()).await.map_err(backend)?;
            }
        }
        Ok(())
    }

    async fn delete(&self, id: AttachmentId) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(self.key(id)).await.map_err(backend)?;
        Ok(())
    }
}
