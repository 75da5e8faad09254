//! `pdfrelay-conversion` — the conversion pipeline core.
//!
//! ## Design
//!
//! - One submission attempt is a discrete unit of work; the pipeline never
//!   blocks a thread between attempts
//! - Transient service failures are retried on a bounded, increasing
//!   backoff schedule, then given up
//! - An HMAC-signed correlation token ties the asynchronous callback back
//!   to the originating attachment without server-side session state
//! - A status cache (pending/finished) lets clients poll for completion
//!
//! ## Components
//!
//! - [`BackoffPolicy`]: attempt → delay mapping with a saturating schedule
//! - [`Submitter`]: the submission state machine
//! - [`CallbackHandler`]: validates and applies the service's callback
//! - [`StatusQuery`]: answers "which of these are finished/pending"
//! - [`StatusCache`] / [`ConversionClient`] / [`TaskScheduler`]: the
//!   collaborator seams (implementations live in `pdfrelay-infra`)

pub mod backoff;
pub mod cache;
pub mod callback;
pub mod client;
pub mod config;
pub mod correlation;
pub mod query;
pub mod scheduler;
pub mod submit;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

#[cfg(test)]
mod integration_tests;

pub use backoff::{BackoffPolicy, MAX_TRIES, RETRY_DELAYS};
pub use cache::{CacheError, ConversionState, InMemoryStatusCache, StatusCache};
pub use callback::{
    CALLBACK_SUCCESS_STATUS, CallbackError, CallbackHandler, CallbackOutcome, ConversionCallback,
    PDF_CONTENT_TYPE,
};
pub use client::{
    ClientError, ConversionClient, ConversionRequest, FilePart, PDF_CONVERTER, ServiceResponse,
};
pub use config::ConversionConfig;
pub use correlation::CorrelationPayload;
pub use query::{ContainerRenderer, QueryError, StatusQuery, StatusReport};
pub use scheduler::{ScheduledTask, TaskScheduler};
pub use submit::{SourceBlob, SubmissionJob, SubmitError, SubmitOutcome, Submitter, dispatch_submission};
