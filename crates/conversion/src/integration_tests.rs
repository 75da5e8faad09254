//! Integration tests for the full conversion pipeline.
//!
//! Tests: submission → retry chain → give-up / success → callback →
//! status cache → polling classification.
//!
//! The scheduler is cranked by hand, so 20-attempt retry chains run in
//! microseconds and every scheduled delay is observable.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use pdfrelay_attachments::{
        Attachment, AttachmentCreated, AttachmentFile, AttachmentStore, AttachmentType, Folder,
        InMemoryAttachmentStore, NewAttachment, ProtectionMode,
    };
    use pdfrelay_core::{AttachmentId, UserId};
    use pdfrelay_events::{EventBus, InMemoryEventBus};

    use crate::cache::{ConversionState, InMemoryStatusCache, StatusCache};
    use crate::callback::{CallbackHandler, CallbackOutcome, ConversionCallback};
    use crate::config::ConversionConfig;
    use crate::query::StatusQuery;
    use crate::submit::{SourceBlob, SubmissionJob, Submitter, dispatch_submission};
    use crate::testing::{FakeRenderer, ManualScheduler, ScriptedClient};

    struct Pipeline {
        store: Arc<InMemoryAttachmentStore>,
        cache: Arc<InMemoryStatusCache>,
        bus: Arc<InMemoryEventBus<AttachmentCreated>>,
        client: Arc<ScriptedClient>,
        scheduler: Arc<ManualScheduler>,
        submitter: Arc<Submitter<Arc<ScriptedClient>, Arc<InMemoryStatusCache>>>,
        callbacks: CallbackHandler<
            Arc<InMemoryAttachmentStore>,
            Arc<InMemoryStatusCache>,
            Arc<InMemoryEventBus<AttachmentCreated>>,
        >,
        source: Attachment,
    }

    fn config() -> ConversionConfig {
        ConversionConfig::new(
            "http://convert.example/convert",
            "http://app.example/conversion/callback",
            b"integration-signing-key".to_vec(),
        )
    }

    fn pipeline(config: ConversionConfig, client: ScriptedClient) -> Pipeline {
        let store = InMemoryAttachmentStore::arc();
        let cache = InMemoryStatusCache::arc();
        let bus = Arc::new(InMemoryEventBus::new());
        let client = Arc::new(client);
        let scheduler = ManualScheduler::arc();

        let folder_id = store
            .create_folder(Folder::new("Docs", ProtectionMode::Public))
            .unwrap();
        let source = store
            .insert(NewAttachment {
                folder_id,
                owner: UserId::new(),
                title: "Отчёт".to_string(),
                description: String::new(),
                kind: AttachmentType::File,
                file: AttachmentFile {
                    filename: "отчёт 2024.docx".to_string(),
                    content_type: "application/msword".to_string(),
                    data: b"doc-bytes".to_vec(),
                },
            })
            .unwrap();

        let submitter = Arc::new(Submitter::new(config.clone(), client.clone(), cache.clone()));
        let callbacks = CallbackHandler::new(config, store.clone(), cache.clone(), bus.clone());

        Pipeline {
            store,
            cache,
            bus,
            client,
            scheduler,
            submitter,
            callbacks,
            source,
        }
    }

    fn job_for(source: &Attachment) -> SubmissionJob {
        SubmissionJob::new(
            source.id,
            SourceBlob {
                filename: source.file.filename.clone(),
                content_type: source.file.content_type.clone(),
                bytes: source.file.data.clone(),
            },
        )
    }

    async fn mark_pending(p: &Pipeline) {
        p.cache
            .set(p.source.id, ConversionState::Pending, None)
            .await
            .unwrap();
    }

    /// Crank the scheduler dry, collecting each task's scheduled delay.
    async fn drain(scheduler: &ManualScheduler) -> Vec<Duration> {
        let mut delays = Vec::new();
        while let Some(delay) = scheduler.run_next().await {
            delays.push(delay);
        }
        delays
    }

    #[tokio::test]
    async fn a_job_that_always_fails_runs_twenty_attempts_then_vanishes() {
        let p = pipeline(config(), ScriptedClient::failing());
        mark_pending(&p).await;

        dispatch_submission(
            p.scheduler.clone(),
            p.submitter.clone(),
            job_for(&p.source),
            Duration::ZERO,
        );
        let delays = drain(&p.scheduler).await;

        // Exactly 20 attempts: the initial one plus 19 retries, then the
        // chain stops scheduling.
        assert_eq!(delays.len(), 20);
        assert_eq!(p.client.requests().len(), 20);
        assert_eq!(p.scheduler.pending(), 0);

        // The retry delays walk the schedule and saturate at two hours.
        let secs: Vec<u64> = delays.iter().map(Duration::as_secs).collect();
        assert_eq!(
            &secs[..10],
            &[0, 30, 60, 120, 300, 600, 1800, 3600, 3600, 7200]
        );
        assert!(secs[10..].iter().all(|&s| s == 7200));

        // Pollers now see "unknown", not an eternally pending job.
        assert_eq!(p.cache.get(p.source.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn a_success_on_a_later_attempt_stops_the_chain() {
        let p = pipeline(config(), ScriptedClient::accepting());
        p.client.push_response(Err(crate::client::ClientError::Transport(
            "connection refused".to_string(),
        )));
        mark_pending(&p).await;

        dispatch_submission(
            p.scheduler.clone(),
            p.submitter.clone(),
            job_for(&p.source),
            Duration::ZERO,
        );
        let delays = drain(&p.scheduler).await;

        assert_eq!(
            delays,
            vec![Duration::ZERO, Duration::from_secs(30)]
        );
        assert_eq!(p.client.requests().len(), 2);
        // Success only means "the service took the job": still pending
        // until the callback lands.
        assert_eq!(
            p.cache.get(p.source.id).await.unwrap(),
            Some(ConversionState::Pending)
        );
    }

    #[tokio::test]
    async fn submission_sanitizes_the_filename_on_the_wire() {
        let p = pipeline(config(), ScriptedClient::accepting());

        dispatch_submission(
            p.scheduler.clone(),
            p.submitter.clone(),
            job_for(&p.source),
            Duration::ZERO,
        );
        drain(&p.scheduler).await;

        let request = p.client.requests().remove(0);
        // "отчёт 2024.docx" has a fully non-ASCII stem up to the year:
        // placeholder not needed, digits survive, extension preserved.
        assert_eq!(request.file.filename, "_2024.docx");
        assert_eq!(request.file.content_type, "application/msword");
    }

    #[tokio::test]
    async fn the_callback_completes_what_submission_started() {
        let p = pipeline(config(), ScriptedClient::accepting());
        mark_pending(&p).await;
        let events = p.bus.subscribe();

        dispatch_submission(
            p.scheduler.clone(),
            p.submitter.clone(),
            job_for(&p.source),
            Duration::ZERO,
        );
        drain(&p.scheduler).await;

        // The callback echoes the exact token the submission sent out.
        let token = p.client.requests().remove(0).correlation_token;
        let outcome = p
            .callbacks
            .handle(ConversionCallback {
                correlation: token,
                status: "1".to_string(),
                content: b"%PDF-1.7".to_vec(),
            })
            .await
            .unwrap();

        let CallbackOutcome::Applied { attachment_id } = outcome else {
            panic!("expected Applied, got {outcome:?}");
        };
        let pdf = p.store.get(attachment_id).unwrap().unwrap();
        assert_eq!(pdf.file.content_type, "application/pdf");
        assert!(pdf.file.filename.ends_with(".pdf"));

        assert_eq!(
            p.cache.get(p.source.id).await.unwrap(),
            Some(ConversionState::Finished)
        );
        assert!(events.try_recv().is_ok());

        // And the poller sees it.
        let query = StatusQuery::new(p.store.clone(), p.cache.clone(), FakeRenderer);
        let report = query.query(None, &[p.source.id]).await.unwrap();
        assert_eq!(report.finished, vec![p.source.id]);
        assert!(report.containers.contains_key(&p.source.id));
    }

    #[tokio::test]
    async fn maintenance_mode_defers_forever_without_spending_attempts() {
        let p = pipeline(config().with_maintenance(true), ScriptedClient::accepting());

        dispatch_submission(
            p.scheduler.clone(),
            p.submitter.clone(),
            job_for(&p.source),
            Duration::ZERO,
        );

        // Run a few cycles: every one re-schedules at the fixed pause and
        // never reaches the network.
        for expected in [Duration::ZERO, Duration::from_secs(900), Duration::from_secs(900)] {
            let delay = p.scheduler.run_next().await.unwrap();
            assert_eq!(delay, expected);
        }
        assert!(p.client.requests().is_empty());
        assert_eq!(p.scheduler.next_delay(), Some(Duration::from_secs(900)));
    }

    #[tokio::test]
    async fn a_late_callback_after_give_up_still_applies() {
        // The race from the concurrency model: give-up deleted the cache
        // entry, then the service calls back anyway. Last write wins per
        // key: the callback re-creates the entry as finished.
        let p = pipeline(config(), ScriptedClient::failing());
        mark_pending(&p).await;

        dispatch_submission(
            p.scheduler.clone(),
            p.submitter.clone(),
            job_for(&p.source),
            Duration::ZERO,
        );
        drain(&p.scheduler).await;
        assert_eq!(p.cache.get(p.source.id).await.unwrap(), None);

        let token = p.client.requests().remove(0).correlation_token;
        let outcome = p
            .callbacks
            .handle(ConversionCallback {
                correlation: token,
                status: "1".to_string(),
                content: b"%PDF-1.7".to_vec(),
            })
            .await
            .unwrap();

        assert!(matches!(outcome, CallbackOutcome::Applied { .. }));
        assert_eq!(
            p.cache.get(p.source.id).await.unwrap(),
            Some(ConversionState::Finished)
        );
    }

    #[tokio::test]
    async fn query_classifies_mixed_ids_end_to_end() {
        let p = pipeline(config(), ScriptedClient::accepting());
        let finished = p.source.id;
        let pending = AttachmentId::new(1000);
        let absent = AttachmentId::new(2000);

        p.cache
            .set(finished, ConversionState::Finished, None)
            .await
            .unwrap();
        p.cache
            .set(pending, ConversionState::Pending, None)
            .await
            .unwrap();

        let query = StatusQuery::new(p.store.clone(), p.cache.clone(), FakeRenderer);
        let report = query
            .query(None, &[finished, pending, absent])
            .await
            .unwrap();

        assert_eq!(report.finished, vec![finished]);
        assert_eq!(report.pending, vec![pending]);
        assert_eq!(report.containers.len(), 1);
    }
}
