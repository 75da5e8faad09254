//! The submission state machine.
//!
//! One call to [`Submitter::submit`] is one attempt: build the request,
//! post it, classify the outcome. The three-way [`SubmitOutcome`] tells the
//! caller what happened; scheduling the next attempt is the dispatcher's
//! job, so nothing here ever sleeps.
//!
//! Failure taxonomy: transport errors, non-success statuses and bodies
//! missing the "ok" marker are all transient and retried on the backoff
//! schedule. A token-encoding failure is a programming error and aborts
//! the job immediately.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use pdfrelay_core::{AttachmentId, secure_filename};
use pdfrelay_signing::{TokenCodec, TokenError};

use crate::backoff::BackoffPolicy;
use crate::cache::StatusCache;
use crate::client::{ConversionClient, ConversionRequest, FilePart, PDF_CONVERTER};
use crate::config::ConversionConfig;
use crate::correlation::CorrelationPayload;
use crate::scheduler::TaskScheduler;

/// Placeholder stem for filenames that sanitize to nothing.
const FALLBACK_FILENAME_STEM: &str = "attachment";

/// The bytes to convert, with their declared name and type. Immutable for
/// the lifetime of the job.
#[derive(Debug, Clone)]
pub struct SourceBlob {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// One in-flight conversion request.
///
/// There is no persistent job table: a job lives as the value moved through
/// successive scheduled attempts, plus its status cache entry.
#[derive(Debug, Clone)]
pub struct SubmissionJob {
    pub attachment_id: AttachmentId,
    /// Failed attempts so far (zero-based).
    pub attempt: u32,
    pub source: SourceBlob,
}

impl SubmissionJob {
    pub fn new(attachment_id: AttachmentId, source: SourceBlob) -> Self {
        Self {
            attachment_id,
            attempt: 0,
            source,
        }
    }
}

/// What one submission attempt decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The service accepted the job; the callback will arrive later.
    Succeeded,
    /// Try again after `delay` (transient failure, or maintenance pause).
    Scheduled { delay: Duration },
    /// The attempt budget is exhausted; the job's cache entry is gone.
    GivenUp { attempts: u32 },
}

/// Non-retryable submission error.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// The correlation token could not be built. Not a service failure, so
    /// it is never retried.
    #[error(transparent)]
    Token(#[from] TokenError),
}

/// Submits attachments to the conversion service.
pub struct Submitter<C, S> {
    config: ConversionConfig,
    codec: TokenCodec,
    backoff: BackoffPolicy,
    client: C,
    cache: S,
}

impl<C, S> Submitter<C, S>
where
    C: ConversionClient,
    S: StatusCache,
{
    pub fn new(config: ConversionConfig, client: C, cache: S) -> Self {
        let codec = TokenCodec::new(config.signing_key.clone(), config.token_namespace.clone());
        let backoff = BackoffPolicy::new(config.debug_fast_retry);
        Self {
            config,
            codec,
            backoff,
            client,
            cache,
        }
    }

    /// Perform one submission attempt for `job`.
    ///
    /// Mutates `job.attempt` on failure; a maintenance pause leaves it
    /// untouched (a pause is not a failure).
    pub async fn submit(&self, job: &mut SubmissionJob) -> Result<SubmitOutcome, SubmitError> {
        if self.config.maintenance {
            tracing::info!(
                attachment_id = %job.attachment_id,
                delay_secs = self.config.maintenance_delay.as_secs(),
                "conversion service in maintenance; deferring submission"
            );
            return Ok(SubmitOutcome::Scheduled {
                delay: self.config.maintenance_delay,
            });
        }

        let request = self.build_request(job)?;

        let failure = match self.client.submit(request).await {
            Ok(response) if response.accepted() => None,
            Ok(response) => Some(format!(
                "unexpected response from server (status {}): {}",
                response.status,
                truncate(&response.body, 200)
            )),
            Err(err) => Some(err.to_string()),
        };

        let Some(reason) = failure else {
            tracing::info!(attachment_id = %job.attachment_id, "submitted attachment for conversion");
            return Ok(SubmitOutcome::Succeeded);
        };

        // Delay is indexed by failures already made, before counting this one.
        let delay = self.backoff.delay_for(job.attempt);
        job.attempt += 1;

        if self.backoff.exhausted(job.attempt) {
            tracing::error!(
                attachment_id = %job.attachment_id,
                attempts = job.attempt,
                error = %reason,
                "could not submit attachment; giving up"
            );
            if let Err(err) = self.cache.delete(job.attachment_id).await {
                tracing::warn!(
                    attachment_id = %job.attachment_id,
                    error = %err,
                    "failed to drop status cache entry after giving up"
                );
            }
            Ok(SubmitOutcome::GivenUp {
                attempts: job.attempt,
            })
        } else {
            tracing::warn!(
                attachment_id = %job.attachment_id,
                attempt = job.attempt,
                max_tries = self.backoff.max_tries(),
                delay_secs = delay.as_secs(),
                error = %reason,
                "could not submit attachment; retry scheduled"
            );
            Ok(SubmitOutcome::Scheduled { delay })
        }
    }

    fn build_request(&self, job: &SubmissionJob) -> Result<ConversionRequest, SubmitError> {
        let token = self.codec.encode(&CorrelationPayload {
            attachment_id: job.attachment_id,
        })?;

        Ok(ConversionRequest {
            converter: PDF_CONVERTER,
            callback_url: self.config.callback_url.clone(),
            correlation_token: token,
            file: FilePart {
                filename: secure_filename(&job.source.filename, FALLBACK_FILENAME_STEM),
                content_type: job.source.content_type.clone(),
                bytes: job.source.bytes.clone(),
            },
        })
    }
}

/// Run `job` to completion through the scheduler: each attempt is a
/// discrete scheduled task, and a `Scheduled` outcome re-dispatches the
/// next one. `Succeeded` and `GivenUp` end the chain; a token error aborts
/// it with an error log.
pub fn dispatch_submission<C, S, T>(
    scheduler: Arc<T>,
    submitter: Arc<Submitter<C, S>>,
    job: SubmissionJob,
    delay: Duration,
) where
    C: ConversionClient + 'static,
    S: StatusCache + 'static,
    T: TaskScheduler + ?Sized + 'static,
{
    let next = Arc::clone(&scheduler);
    scheduler.schedule(
        delay,
        Box::pin(async move {
            let mut job = job;
            match submitter.submit(&mut job).await {
                Ok(SubmitOutcome::Scheduled { delay }) => {
                    dispatch_submission(next, submitter, job, delay);
                }
                Ok(SubmitOutcome::Succeeded | SubmitOutcome::GivenUp { .. }) => {}
                Err(err) => {
                    tracing::error!(
                        attachment_id = %job.attachment_id,
                        error = %err,
                        "submission aborted on non-retryable error"
                    );
                }
            }
        }),
    );
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{ConversionState, InMemoryStatusCache};
    use crate::testing::ScriptedClient;

    fn config() -> ConversionConfig {
        ConversionConfig::new(
            "http://convert.example/convert",
            "http://app.example/conversion/callback",
            b"test-signing-key".to_vec(),
        )
    }

    fn job() -> SubmissionJob {
        SubmissionJob::new(
            AttachmentId::new(42),
            SourceBlob {
                filename: "quarterly report é.docx".to_string(),
                content_type: "application/msword".to_string(),
                bytes: b"doc-bytes".to_vec(),
            },
        )
    }

    #[tokio::test]
    async fn accepted_submission_succeeds_without_touching_the_attempt_counter() {
        let client = Arc::new(ScriptedClient::accepting());
        let cache = Arc::new(InMemoryStatusCache::new());
        let submitter = Submitter::new(config(), client.clone(), cache);

        let mut job = job();
        let outcome = submitter.submit(&mut job).await.unwrap();

        assert_eq!(outcome, SubmitOutcome::Succeeded);
        assert_eq!(job.attempt, 0);
        assert_eq!(client.requests().len(), 1);
    }

    #[tokio::test]
    async fn request_carries_the_wire_contract() {
        let client = Arc::new(ScriptedClient::accepting());
        let cache = Arc::new(InMemoryStatusCache::new());
        let submitter = Submitter::new(config(), client.clone(), cache);

        submitter.submit(&mut job()).await.unwrap();

        let request = client.requests().remove(0);
        assert_eq!(request.converter, "pdf");
        assert_eq!(request.callback_url, "http://app.example/conversion/callback");
        // Sanitized for the wire, extension preserved.
        assert_eq!(request.file.filename, "quarterly_report_.docx");
        assert_eq!(request.file.content_type, "application/msword");
        assert_eq!(request.file.bytes, b"doc-bytes");

        // The token decodes back to the job's attachment id.
        let codec = TokenCodec::new(b"test-signing-key".to_vec(), "pdf-conversion");
        let payload: CorrelationPayload = codec.decode(&request.correlation_token).unwrap();
        assert_eq!(payload.attachment_id, AttachmentId::new(42));
    }

    #[tokio::test]
    async fn first_failure_schedules_a_thirty_second_retry() {
        let client = Arc::new(ScriptedClient::failing());
        let cache = Arc::new(InMemoryStatusCache::new());
        let submitter = Submitter::new(config(), client, cache);

        let mut job = job();
        let outcome = submitter.submit(&mut job).await.unwrap();

        assert_eq!(
            outcome,
            SubmitOutcome::Scheduled { delay: Duration::from_secs(30) }
        );
        assert_eq!(job.attempt, 1);
    }

    #[tokio::test]
    async fn a_response_without_the_marker_is_a_failure() {
        let client = Arc::new(ScriptedClient::accepting());
        client.push_response(Ok(crate::client::ServiceResponse {
            status: 200,
            body: "server busy".to_string(),
        }));
        let cache = Arc::new(InMemoryStatusCache::new());
        let submitter = Submitter::new(config(), client, cache);

        let mut job = job();
        let outcome = submitter.submit(&mut job).await.unwrap();

        assert!(matches!(outcome, SubmitOutcome::Scheduled { .. }));
        assert_eq!(job.attempt, 1);
    }

    #[tokio::test]
    async fn exhausting_the_budget_gives_up_and_clears_the_cache() {
        let client = Arc::new(ScriptedClient::failing());
        let cache = Arc::new(InMemoryStatusCache::new());
        cache
            .set(AttachmentId::new(42), ConversionState::Pending, None)
            .await
            .unwrap();
        let submitter = Submitter::new(config(), client, cache.clone());

        let mut job = job();
        job.attempt = 19;
        let outcome = submitter.submit(&mut job).await.unwrap();

        assert_eq!(outcome, SubmitOutcome::GivenUp { attempts: 20 });
        assert_eq!(cache.get(AttachmentId::new(42)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn maintenance_defers_without_counting_or_calling_out() {
        let client = Arc::new(ScriptedClient::accepting());
        let cache = Arc::new(InMemoryStatusCache::new());
        let submitter = Submitter::new(config().with_maintenance(true), client.clone(), cache);

        let mut job = job();
        let outcome = submitter.submit(&mut job).await.unwrap();

        assert_eq!(
            outcome,
            SubmitOutcome::Scheduled { delay: Duration::from_secs(900) }
        );
        assert_eq!(job.attempt, 0);
        assert!(client.requests().is_empty());
    }

    #[tokio::test]
    async fn debug_fast_retry_collapses_delays() {
        let client = Arc::new(ScriptedClient::failing());
        let cache = Arc::new(InMemoryStatusCache::new());
        let submitter = Submitter::new(config().with_debug_fast_retry(true), client, cache);

        let mut job = job();
        let outcome = submitter.submit(&mut job).await.unwrap();

        assert_eq!(
            outcome,
            SubmitOutcome::Scheduled { delay: Duration::from_secs(1) }
        );
    }
}
