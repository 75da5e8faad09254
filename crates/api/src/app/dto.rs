//! Request/response DTOs and JSON mapping.

use serde::{Deserialize, Serialize};

use pdfrelay_core::{AttachmentId, FolderId, UserId};

/// Body of `POST /folders`.
#[derive(Debug, Deserialize)]
pub struct CreateFolderRequest {
    pub title: String,
    /// When present, only these users may view the folder; otherwise the
    /// folder is public.
    #[serde(default)]
    pub restricted_to: Option<Vec<UserId>>,
}

#[derive(Debug, Serialize)]
pub struct CreateFolderResponse {
    pub id: FolderId,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub id: AttachmentId,
}

#[derive(Debug, Serialize)]
pub struct ConvertResponse {
    pub id: AttachmentId,
    pub state: &'static str,
}

/// Body of the callback response; the remote service keys off `success`.
#[derive(Debug, Serialize, Deserialize)]
pub struct CallbackResponse {
    pub success: bool,
}
