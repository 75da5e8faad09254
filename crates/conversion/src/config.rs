//! Conversion pipeline configuration.
//!
//! Everything the pipeline needs is passed in explicitly at construction
//! time; there is no ambient settings lookup anywhere below this struct.

use std::time::Duration;

/// Token namespace separating conversion tokens from any other signed
/// payloads sharing the key.
pub const DEFAULT_TOKEN_NAMESPACE: &str = "pdf-conversion";

/// How long a `finished` cache entry lives. Expiry only bounds cache
/// growth; the stored PDF itself is unaffected.
pub const DEFAULT_FINISHED_TTL: Duration = Duration::from_secs(15 * 60);

/// Fixed pause when the service is in maintenance (does not count as a
/// failed attempt).
pub const DEFAULT_MAINTENANCE_DELAY: Duration = Duration::from_secs(900);

/// Configuration for the conversion pipeline.
#[derive(Debug, Clone)]
pub struct ConversionConfig {
    /// Conversion service endpoint submissions are posted to.
    pub server_url: String,
    /// Absolute URL of our callback endpoint, sent with each submission.
    pub callback_url: String,
    /// HMAC key for correlation tokens.
    pub signing_key: Vec<u8>,
    /// Namespace mixed into the token MAC.
    pub token_namespace: String,
    /// When true, submissions are deferred instead of sent.
    pub maintenance: bool,
    /// When true, all retry delays collapse to 1s (dev/test only).
    pub debug_fast_retry: bool,
    /// TTL for `finished` cache entries.
    pub finished_ttl: Duration,
    /// Delay applied while in maintenance mode.
    pub maintenance_delay: Duration,
    /// When true, a repeated callback for an already-finished conversion is
    /// acknowledged without storing a second PDF. Off by default: the
    /// remote service is expected to call back once.
    pub dedupe_callbacks: bool,
}

impl ConversionConfig {
    pub fn new(
        server_url: impl Into<String>,
        callback_url: impl Into<String>,
        signing_key: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            server_url: server_url.into(),
            callback_url: callback_url.into(),
            signing_key: signing_key.into(),
            token_namespace: DEFAULT_TOKEN_NAMESPACE.to_string(),
            maintenance: false,
            debug_fast_retry: false,
            finished_ttl: DEFAULT_FINISHED_TTL,
            maintenance_delay: DEFAULT_MAINTENANCE_DELAY,
            dedupe_callbacks: false,
        }
    }

    pub fn with_maintenance(mut self, maintenance: bool) -> Self {
        self.maintenance = maintenance;
        self
    }

    pub fn with_debug_fast_retry(mut self, debug_fast_retry: bool) -> Self {
        self.debug_fast_retry = debug_fast_retry;
        self
    }

    pub fn with_finished_ttl(mut self, ttl: Duration) -> Self {
        self.finished_ttl = ttl;
        self
    }

    pub fn with_dedupe_callbacks(mut self, dedupe: bool) -> Self {
        self.dedupe_callbacks = dedupe;
        self
    }
}
