use axum::{
    Router,
    routing::{get, post},
};

pub mod attachments;
pub mod conversion;
pub mod system;

/// Router for all application endpoints (mounted under the app's
/// middleware stack; `/health` stays outside it).
pub fn router() -> Router {
    Router::new()
        .route("/folders", post(attachments::create_folder))
        .route("/attachments", post(attachments::upload))
        .route("/attachments/:id/convert", post(attachments::convert))
        .route("/conversion/callback", post(conversion::callback))
        .route("/conversion/check", get(conversion::check))
}
