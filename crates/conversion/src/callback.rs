//! Inbound callback validation and result application.
//!
//! The conversion service calls back with the correlation token we minted
//! at submission time, a status flag, and the converted bytes. The handler
//! trusts nothing: the token must verify, the referenced attachment must
//! still exist, and the status must be the success sentinel before any
//! state changes.
//!
//! Response polarity matters to the remote service: a failure response may
//! make it retry or alert, while a success response stops it. A callback
//! for a deliberately deleted document is therefore acknowledged as
//! success — there is nothing left to retry for.

use chrono::Utc;
use thiserror::Error;

use pdfrelay_attachments::{
    AttachmentCreated, AttachmentFile, AttachmentStore, AttachmentType, NewAttachment, StoreError,
    pdf_title,
};
use pdfrelay_core::{AttachmentId, filename::split_extension};
use pdfrelay_events::EventBus;
use pdfrelay_signing::{TokenCodec, TokenError};

use crate::cache::{CacheError, ConversionState, StatusCache};
use crate::config::ConversionConfig;
use crate::correlation::CorrelationPayload;

/// Status value the service sends for a successful conversion.
pub const CALLBACK_SUCCESS_STATUS: &str = "1";

/// Content type of every converted artifact.
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// A parsed inbound callback (transport-agnostic).
#[derive(Debug, Clone)]
pub struct ConversionCallback {
    /// The signed correlation token (`directory` form field).
    pub correlation: String,
    /// Reported conversion status (`status` form field; "1" = success).
    pub status: String,
    /// The converted bytes (`content` file part).
    pub content: Vec<u8>,
}

/// How a callback was resolved. All variants are acknowledged as success
/// to the remote caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// The converted file was stored as a new attachment.
    Applied { attachment_id: AttachmentId },
    /// The source document (or its folder) is gone; acknowledged so the
    /// remote service stops retrying, but nothing was stored.
    SourceGone,
    /// A repeated delivery for an already-finished conversion was ignored
    /// (only with `dedupe_callbacks` enabled).
    Deduplicated,
}

/// Why a callback was rejected. All variants are reported as failure to
/// the remote caller; none of them mutate any state.
#[derive(Debug, Error)]
pub enum CallbackError {
    /// The correlation token did not verify (forged, corrupted, or from a
    /// different namespace/key).
    #[error("invalid correlation token")]
    InvalidToken(#[source] TokenError),

    /// The service reported something other than the success sentinel.
    #[error("unexpected callback status {status:?}")]
    UnexpectedStatus { status: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// Validates callbacks and applies their results.
pub struct CallbackHandler<A, S, B> {
    config: ConversionConfig,
    codec: TokenCodec,
    store: A,
    cache: S,
    bus: B,
}

impl<A, S, B> CallbackHandler<A, S, B>
where
    A: AttachmentStore,
    S: StatusCache,
    B: EventBus<AttachmentCreated>,
{
    pub fn new(config: ConversionConfig, store: A, cache: S, bus: B) -> Self {
        let codec = TokenCodec::new(config.signing_key.clone(), config.token_namespace.clone());
        Self {
            config,
            codec,
            store,
            cache,
            bus,
        }
    }

    /// Process one inbound callback.
    pub async fn handle(
        &self,
        callback: ConversionCallback,
    ) -> Result<CallbackOutcome, CallbackError> {
        let payload: CorrelationPayload = match self.codec.decode(&callback.correlation) {
            Ok(payload) => payload,
            Err(err) => {
                // Token logged for forensics: it is the only lead on where
                // a forged or corrupted callback came from.
                tracing::error!(
                    token = %callback.correlation,
                    error = %err,
                    "received callback with invalid correlation token"
                );
                return Err(CallbackError::InvalidToken(err));
            }
        };
        let attachment_id = payload.attachment_id;

        let Some(source) = self.store.get(attachment_id)? else {
            tracing::info!(%attachment_id, "attachment gone before its conversion arrived");
            return Ok(CallbackOutcome::SourceGone);
        };
        let folder = self.store.folder(source.folder_id)?;
        if source.is_deleted || folder.as_ref().is_none_or(|f| f.is_deleted) {
            tracing::info!(%attachment_id, "attachment deleted before its conversion arrived");
            return Ok(CallbackOutcome::SourceGone);
        }

        if callback.status != CALLBACK_SUCCESS_STATUS {
            tracing::error!(
                %attachment_id,
                status = %callback.status,
                "conversion service reported failure"
            );
            return Err(CallbackError::UnexpectedStatus {
                status: callback.status,
            });
        }

        if self.config.dedupe_callbacks
            && self.cache.get(attachment_id).await? == Some(ConversionState::Finished)
        {
            tracing::info!(%attachment_id, "duplicate callback ignored; conversion already applied");
            return Ok(CallbackOutcome::Deduplicated);
        }

        let (stem, _) = split_extension(&source.file.filename);
        let created = self.store.insert(NewAttachment {
            folder_id: source.folder_id,
            owner: source.owner,
            title: pdf_title(&source.title),
            description: source.description.clone(),
            kind: AttachmentType::File,
            file: AttachmentFile {
                filename: format!("{stem}.pdf"),
                content_type: PDF_CONTENT_TYPE.to_string(),
                data: callback.content,
            },
        })?;

        self.cache
            .set(
                attachment_id,
                ConversionState::Finished,
                Some(self.config.finished_ttl),
            )
            .await?;

        let event = AttachmentCreated {
            attachment_id: created.id,
            derived_from: Some(attachment_id),
            folder_id: created.folder_id,
            occurred_at: Utc::now(),
        };
        if let Err(err) = self.bus.publish(event) {
            tracing::warn!(
                attachment_id = %created.id,
                ?err,
                "failed to publish attachment-created event"
            );
        }

        tracing::info!(
            source_id = %attachment_id,
            attachment_id = %created.id,
            "stored converted PDF attachment"
        );
        Ok(CallbackOutcome::Applied {
            attachment_id: created.id,
        })
    }
}
