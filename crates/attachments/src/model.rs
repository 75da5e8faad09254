//! Attachment and folder domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pdfrelay_core::{AttachmentId, FolderId, UserId};

/// Kind of attachment.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentType {
    /// A stored file (the only kind the conversion pipeline produces).
    File,
    /// A link to an external resource.
    Link,
}

/// Who may view a folder's contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtectionMode {
    /// Anyone, including anonymous viewers.
    Public,
    /// Only the listed users.
    Restricted { allowed: Vec<UserId> },
}

/// A folder: the container attachments live in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    pub id: FolderId,
    pub title: String,
    pub protection: ProtectionMode,
    pub is_deleted: bool,
}

impl Folder {
    pub fn new(title: impl Into<String>, protection: ProtectionMode) -> Self {
        Self {
            id: FolderId::new(),
            title: title.into(),
            protection,
            is_deleted: false,
        }
    }

    /// Whether `viewer` may see this folder's contents.
    ///
    /// Anonymous viewers (`None`) only see public folders.
    pub fn can_view(&self, viewer: Option<UserId>) -> bool {
        match &self.protection {
            ProtectionMode::Public => true,
            ProtectionMode::Restricted { allowed } => {
                viewer.is_some_and(|user| allowed.contains(&user))
            }
        }
    }
}

/// The stored bytes of an attachment plus their declared metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentFile {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// An attachment: one document inside a folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: AttachmentId,
    pub folder_id: FolderId,
    pub owner: UserId,
    pub title: String,
    pub description: String,
    pub kind: AttachmentType,
    pub file: AttachmentFile,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
}

/// An attachment about to be inserted (the store assigns the id).
#[derive(Debug, Clone)]
pub struct NewAttachment {
    pub folder_id: FolderId,
    pub owner: UserId,
    pub title: String,
    pub description: String,
    pub kind: AttachmentType,
    pub file: AttachmentFile,
}

/// Title for the PDF rendition derived from `source_title`.
pub fn pdf_title(source_title: &str) -> String {
    format!("{source_title} (PDF)")
}
