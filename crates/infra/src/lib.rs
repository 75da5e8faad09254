//! Infrastructure layer: the runtime-facing implementations of the
//! conversion pipeline's collaborator seams.
//!
//! - [`TokioScheduler`]: delayed-task execution on the tokio runtime
//! - [`HttpConversionClient`]: multipart submission over HTTP
//! - `RedisStatusCache` (feature `redis`): a shared status cache for
//!   multi-process deployments

pub mod http_client;
pub mod scheduler;

#[cfg(feature = "redis")]
pub mod redis_cache;

pub use http_client::HttpConversionClient;
pub use scheduler::TokioScheduler;

#[cfg(feature = "redis")]
pub use redis_cache::RedisStatusCache;
