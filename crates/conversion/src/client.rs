//! Conversion service client abstraction.
//!
//! The remote service is opaque: one attempt posts a multipart form and the
//! submitter classifies whatever comes back. The transport lives in
//! `pdfrelay-infra`; this module owns the request/response shapes and the
//! acceptance rule.

use std::sync::Arc;

use async_trait::async_trait;

/// Converter selector sent with every submission.
pub const PDF_CONVERTER: &str = "pdf";

/// The file part of a submission (already sanitized for the wire).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// One submission to the conversion service.
///
/// Maps to the service's multipart form: `converter`, `urlresponse` (where
/// to deliver the callback), `dirresponse` (the signed correlation token)
/// and the `uploadedfile` part.
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    pub converter: &'static str,
    pub callback_url: String,
    pub correlation_token: String,
    pub file: FilePart,
}

/// What the service answered to a submission.
#[derive(Debug, Clone)]
pub struct ServiceResponse {
    pub status: u16,
    pub body: String,
}

impl ServiceResponse {
    /// The service accepted the job: HTTP success AND the body carries the
    /// literal "ok" marker. Anything else counts as a failed attempt.
    pub fn accepted(&self) -> bool {
        (200..300).contains(&self.status) && self.body.contains("ok")
    }
}

/// Client-side (transport) error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ClientError {
    /// Connection refused, timeout, DNS failure, broken transfer, ...
    #[error("transport error: {0}")]
    Transport(String),

    /// The request could not even be constructed (e.g. bad content type).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// One-shot submission to the remote conversion service.
#[async_trait]
pub trait ConversionClient: Send + Sync {
    /// Perform a single submission attempt. At-most-once per call: the
    /// client itself never retries.
    async fn submit(&self, request: ConversionRequest) -> Result<ServiceResponse, ClientError>;
}

#[async_trait]
impl<C> ConversionClient for Arc<C>
where
    C: ConversionClient + ?Sized,
{
    async fn submit(&self, request: ConversionRequest) -> Result<ServiceResponse, ClientError> {
        (**self).submit(request).await
    }
}
