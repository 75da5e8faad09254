//! Correlation token payload.
//!
//! This is everything a callback needs to find its way home. The token is
//! signed (see `pdfrelay-signing`), so no server-side session state backs
//! it up; the payload must therefore be self-contained.

use serde::{Deserialize, Serialize};

use pdfrelay_core::AttachmentId;

/// Payload embedded in the signed correlation token.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrelationPayload {
    pub attachment_id: AttachmentId,
}
