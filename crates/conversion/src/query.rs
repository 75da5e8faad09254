//! Polling support: which conversions are finished, which are pending.
//!
//! Absent cache entries are omitted entirely — the caller cannot tell
//! "never submitted" from "gave up", which is deliberate (see the cache
//! module). For finished ids a presentation payload is rendered, but only
//! when the requesting viewer may see the containing folder; unauthorized
//! ids are skipped silently so the endpoint is not an existence oracle.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use pdfrelay_attachments::{Attachment, AttachmentStore, Folder, StoreError};
use pdfrelay_core::{AttachmentId, UserId};

use crate::cache::{CacheError, ConversionState, StatusCache};

/// Renders the presentation payload for a finished conversion (the
/// fragment a client swaps into its page). External collaborator.
pub trait ContainerRenderer: Send + Sync {
    fn render(&self, attachment: &Attachment, folder: &Folder) -> String;
}

impl<R> ContainerRenderer for Arc<R>
where
    R: ContainerRenderer + ?Sized,
{
    fn render(&self, attachment: &Attachment, folder: &Folder) -> String {
        (**self).render(attachment, folder)
    }
}

/// Classification of the requested ids.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub finished: Vec<AttachmentId>,
    pub pending: Vec<AttachmentId>,
    pub containers: HashMap<AttachmentId, String>,
}

/// Status query error.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// Answers "which of these conversions are done" from the status cache.
pub struct StatusQuery<A, S, R> {
    store: A,
    cache: S,
    renderer: R,
}

impl<A, S, R> StatusQuery<A, S, R>
where
    A: AttachmentStore,
    S: StatusCache,
    R: ContainerRenderer,
{
    pub fn new(store: A, cache: S, renderer: R) -> Self {
        Self {
            store,
            cache,
            renderer,
        }
    }

    /// Classify `ids` and render containers for the finished ones the
    /// viewer is allowed to see.
    pub async fn query(
        &self,
        viewer: Option<UserId>,
        ids: &[AttachmentId],
    ) -> Result<StatusReport, QueryError> {
        let mut report = StatusReport::default();

        for &id in ids {
            match self.cache.get(id).await? {
                Some(ConversionState::Finished) => report.finished.push(id),
                Some(ConversionState::Pending) => report.pending.push(id),
                None => {}
            }
        }

        for &id in &report.finished {
            let Some(attachment) = self.store.get(id)? else {
                continue;
            };
            if attachment.is_deleted {
                continue;
            }
            let Some(folder) = self.store.folder(attachment.folder_id)? else {
                continue;
            };
            if folder.is_deleted || !folder.can_view(viewer) {
                continue;
            }
            report
                .containers
                .insert(id, self.renderer.render(&attachment, &folder));
        }

        Ok(report)
    }
}
