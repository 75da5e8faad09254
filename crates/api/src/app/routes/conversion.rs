use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Multipart, RawQuery},
    http::StatusCode,
    response::IntoResponse,
};

use pdfrelay_conversion::{CallbackError, ConversionCallback};
use pdfrelay_core::AttachmentId;

use crate::app::{dto, errors};
use crate::app::services::AppServices;
use crate::context::ViewerContext;

/// Inbound callback from the conversion service.
///
/// The response polarity is the contract: `success: false` tells the
/// service the delivery did not land (it may retry or alert), while
/// `success: true` ends its interest in the job. Infrastructure failures
/// on our side are 500s so the service retries later.
pub async fn callback(
    Extension(services): Extension<Arc<AppServices>>,
    multipart: Multipart,
) -> axum::response::Response {
    let callback = match parse_callback(multipart).await {
        Ok(callback) => callback,
        Err(response) => return response,
    };

    match services.callbacks.handle(callback).await {
        Ok(_) => Json(dto::CallbackResponse { success: true }).into_response(),
        Err(CallbackError::Store(e)) => errors::store_error_to_response(e),
        Err(CallbackError::Cache(e)) => errors::cache_error_to_response(e),
        Err(CallbackError::InvalidToken(_) | CallbackError::UnexpectedStatus { .. }) => {
            Json(dto::CallbackResponse { success: false }).into_response()
        }
    }
}

/// Polling endpoint: `GET /conversion/check?a=1&a=2&a=3`.
pub async fn check(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(viewer): Extension<ViewerContext>,
    RawQuery(query): RawQuery,
) -> axum::response::Response {
    let ids = match parse_ids(query.as_deref().unwrap_or("")) {
        Ok(ids) => ids,
        Err(response) => return response,
    };

    match services.query.query(viewer.viewer(), &ids).await {
        Ok(report) => Json(report).into_response(),
        Err(e) => errors::query_error_to_response(e),
    }
}

/// Parse the repeated `a` parameters by hand: serde-based query extractors
/// reject repeated keys, and the ids are bare integers with nothing to
/// URL-decode.
fn parse_ids(query: &str) -> Result<Vec<AttachmentId>, axum::response::Response> {
    let mut ids = Vec::new();
    for pair in query.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        if key != "a" {
            continue;
        }
        match value.parse() {
            Ok(id) => ids.push(id),
            Err(_) => {
                return Err(errors::json_error(
                    StatusCode::BAD_REQUEST,
                    "invalid_id",
                    format!("invalid attachment id: {value}"),
                ));
            }
        }
    }
    Ok(ids)
}

/// Pull the callback form out of the multipart body: `directory` (the
/// correlation token), `status`, and the `content` file part.
async fn parse_callback(
    mut multipart: Multipart,
) -> Result<ConversionCallback, axum::response::Response> {
    let mut correlation: Option<String> = None;
    let mut status: Option<String> = None;
    let mut content: Option<Vec<u8>> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                return Err(errors::json_error(
                    StatusCode::BAD_REQUEST,
                    "invalid_multipart",
                    e.to_string(),
                ));
            }
        };

        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("directory") => correlation = Some(field_text(field).await?),
            Some("status") => status = Some(field_text(field).await?),
            Some("content") => {
                let data = field.bytes().await.map_err(|e| {
                    errors::json_error(StatusCode::BAD_REQUEST, "invalid_multipart", e.to_string())
                })?;
                content = Some(data.to_vec());
            }
            _ => {}
        }
    }

    let (Some(correlation), Some(status), Some(content)) = (correlation, status, content) else {
        return Err(errors::json_error(
            StatusCode::BAD_REQUEST,
            "missing_field",
            "directory, status and content are required",
        ));
    };

    Ok(ConversionCallback { correlation, status, content })
}

async fn field_text(
    field: axum::extract::multipart::Field<'_>,
) -> Result<String, axum::response::Response> {
    field.text().await.map_err(|e| {
        errors::json_error(StatusCode::BAD_REQUEST, "invalid_multipart", e.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_a_parameters_are_collected_in_order() {
        let ids = parse_ids("a=3&a=1&a=2").unwrap();
        assert_eq!(
            ids,
            vec![AttachmentId::new(3), AttachmentId::new(1), AttachmentId::new(2)]
        );
    }

    #[test]
    fn unrelated_parameters_are_ignored() {
        let ids = parse_ids("a=1&b=9&flag").unwrap();
        assert_eq!(ids, vec![AttachmentId::new(1)]);
    }

    #[test]
    fn empty_queries_yield_no_ids() {
        assert!(parse_ids("").unwrap().is_empty());
    }

    #[test]
    fn malformed_ids_are_rejected() {
        assert!(parse_ids("a=abc").is_err());
        assert!(parse_ids("a=").is_err());
    }
}
