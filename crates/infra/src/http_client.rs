//! HTTP transport for conversion submissions.

use async_trait::async_trait;
use std::time::Duration;

use pdfrelay_conversion::{ClientError, ConversionClient, ConversionRequest, ServiceResponse};

/// Default per-attempt timeout. A timed-out attempt is just another
/// transport failure; the retry schedule owns recovery.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Submits conversion requests over HTTP as the service's multipart form.
#[derive(Debug, Clone)]
pub struct HttpConversionClient {
    http: reqwest::Client,
    server_url: String,
}

impl HttpConversionClient {
    pub fn new(server_url: impl Into<String>) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ClientError::InvalidRequest(e.to_string()))?;
        Ok(Self {
            http,
            server_url: server_url.into(),
        })
    }
}

#[async_trait]
impl ConversionClient for HttpConversionClient {
    async fn submit(&self, request: ConversionRequest) -> Result<ServiceResponse, ClientError> {
        let part = reqwest::multipart::Part::bytes(request.file.bytes)
            .file_name(request.file.filename)
            .mime_str(&request.file.content_type)
            .map_err(|e| ClientError::InvalidRequest(format!("content type: {e}")))?;

        let form = reqwest::multipart::Form::new()
            .text("converter", request.converter)
            .text("urlresponse", request.callback_url)
            .text("dirresponse", request.correlation_token)
            .part("uploadedfile", part);

        let response = self
            .http
            .post(&self.server_url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        Ok(ServiceResponse { status, body })
    }
}
