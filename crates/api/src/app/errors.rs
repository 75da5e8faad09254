use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use pdfrelay_attachments::StoreError;
use pdfrelay_conversion::{CacheError, QueryError};

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    match err {
        StoreError::NotFound(_) | StoreError::FolderNotFound(_) => {
            json_error(StatusCode::NOT_FOUND, "not_found", err.to_string())
        }
        StoreError::Storage(msg) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", msg)
        }
    }
}

pub fn cache_error_to_response(err: CacheError) -> axum::response::Response {
    json_error(StatusCode::INTERNAL_SERVER_ERROR, "cache_error", err.to_string())
}

pub fn query_error_to_response(err: QueryError) -> axum::response::Response {
    match err {
        QueryError::Store(e) => store_error_to_response(e),
        QueryError::Cache(e) => cache_error_to_response(e),
    }
}
