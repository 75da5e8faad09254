use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::Response,
};

use pdfrelay_core::UserId;

use crate::context::ViewerContext;

/// Header the authenticating proxy uses to assert the viewer identity.
pub const VIEWER_HEADER: &str = "x-viewer-id";

/// Attach a [`ViewerContext`] to every request.
///
/// Requests without the header are anonymous (public folders are still
/// viewable); a present-but-malformed header is rejected.
pub async fn viewer_middleware(mut req: Request, next: Next) -> Result<Response, StatusCode> {
    let ctx = match req.headers().get(VIEWER_HEADER) {
        None => ViewerContext::anonymous(),
        Some(value) => {
            let value = value.to_str().map_err(|_| StatusCode::UNAUTHORIZED)?;
            let viewer: UserId = value.trim().parse().map_err(|_| StatusCode::UNAUTHORIZED)?;
            ViewerContext::new(viewer)
        }
    };

    req.extensions_mut().insert(ctx);
    Ok(next.run(req).await)
}
