//! Infrastructure wiring: store, cache, bus, submitter, callback handler
//! and status query, assembled behind one shared [`AppServices`] value.

use std::sync::Arc;
use std::time::Duration;

use pdfrelay_attachments::{Attachment, AttachmentCreated, Folder, InMemoryAttachmentStore};
use pdfrelay_conversion::{
    CacheError, CallbackHandler, ContainerRenderer, ConversionClient, ConversionConfig,
    ConversionState, InMemoryStatusCache, SourceBlob, StatusCache, StatusQuery, SubmissionJob,
    Submitter, TaskScheduler, dispatch_submission,
};
use pdfrelay_events::InMemoryEventBus;
use pdfrelay_infra::{HttpConversionClient, TokioScheduler};

/// Submitter over the type-erased client/cache the app wires up.
pub type AppSubmitter = Submitter<Arc<dyn ConversionClient>, Arc<dyn StatusCache>>;

/// Callback handler over the app's store, cache and bus.
pub type AppCallbackHandler = CallbackHandler<
    Arc<InMemoryAttachmentStore>,
    Arc<dyn StatusCache>,
    Arc<InMemoryEventBus<AttachmentCreated>>,
>;

/// Status query over the app's store, cache and renderer.
pub type AppStatusQuery =
    StatusQuery<Arc<InMemoryAttachmentStore>, Arc<dyn StatusCache>, Arc<dyn ContainerRenderer>>;

/// Everything the handlers need, shared via `Extension`.
pub struct AppServices {
    pub store: Arc<InMemoryAttachmentStore>,
    pub cache: Arc<dyn StatusCache>,
    pub scheduler: Arc<dyn TaskScheduler>,
    pub bus: Arc<InMemoryEventBus<AttachmentCreated>>,
    pub submitter: Arc<AppSubmitter>,
    pub callbacks: AppCallbackHandler,
    pub query: AppStatusQuery,
}

impl AppServices {
    /// Wire services around explicit collaborators (tests swap in fakes).
    pub fn new(
        config: ConversionConfig,
        client: Arc<dyn ConversionClient>,
        scheduler: Arc<dyn TaskScheduler>,
        cache: Arc<dyn StatusCache>,
    ) -> Self {
        let store = InMemoryAttachmentStore::arc();
        let bus = Arc::new(InMemoryEventBus::new());
        let renderer: Arc<dyn ContainerRenderer> = Arc::new(FolderContainerRenderer);

        let submitter = Arc::new(Submitter::new(config.clone(), client, cache.clone()));
        let callbacks =
            CallbackHandler::new(config.clone(), store.clone(), cache.clone(), bus.clone());
        let query = StatusQuery::new(store.clone(), cache.clone(), renderer);

        Self {
            store,
            cache,
            scheduler,
            bus,
            submitter,
            callbacks,
            query,
        }
    }

    /// Mark `attachment` pending and kick off the submission chain.
    pub async fn start_conversion(&self, attachment: &Attachment) -> Result<(), CacheError> {
        self.cache
            .set(attachment.id, ConversionState::Pending, None)
            .await?;

        let job = SubmissionJob::new(
            attachment.id,
            SourceBlob {
                filename: attachment.file.filename.clone(),
                content_type: attachment.file.content_type.clone(),
                bytes: attachment.file.data.clone(),
            },
        );
        dispatch_submission(
            self.scheduler.clone(),
            self.submitter.clone(),
            job,
            Duration::ZERO,
        );
        Ok(())
    }
}

/// Production wiring: HTTP client + tokio scheduler + in-memory cache.
pub fn build_services(config: ConversionConfig) -> anyhow::Result<AppServices> {
    let client: Arc<dyn ConversionClient> =
        Arc::new(HttpConversionClient::new(config.server_url.clone())?);
    let scheduler: Arc<dyn TaskScheduler> = Arc::new(TokioScheduler::new());
    let cache: Arc<dyn StatusCache> = InMemoryStatusCache::arc();
    Ok(AppServices::new(config, client, scheduler, cache))
}

/// Production wiring with a shared Redis status cache, for deployments
/// where submissions and callbacks land on different workers.
#[cfg(feature = "redis")]
pub async fn build_services_with_redis(
    config: ConversionConfig,
    redis_url: &str,
) -> anyhow::Result<AppServices> {
    let client: Arc<dyn ConversionClient> =
        Arc::new(HttpConversionClient::new(config.server_url.clone())?);
    let scheduler: Arc<dyn TaskScheduler> = Arc::new(TokioScheduler::new());
    let cache: Arc<dyn StatusCache> =
        Arc::new(pdfrelay_infra::RedisStatusCache::connect(redis_url).await?);
    Ok(AppServices::new(config, client, scheduler, cache))
}

/// Default renderer: the HTML fragment a polling client swaps in for a
/// finished conversion.
struct FolderContainerRenderer;

impl ContainerRenderer for FolderContainerRenderer {
    fn render(&self, attachment: &Attachment, folder: &Folder) -> String {
        format!(
            r#"<div class="attachment-folder" data-folder="{}"><a href="/attachments/{}">{}</a></div>"#,
            folder.id,
            attachment.id,
            escape_html(&attachment.title),
        )
    }
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
