//! Attachment storage implementations.

use std::collections::HashMap;
use std::sync::{
    Arc, RwLock,
    atomic::{AtomicI64, Ordering},
};

use chrono::Utc;

use pdfrelay_core::{AttachmentId, FolderId};

use crate::model::{Attachment, Folder, NewAttachment};

/// Attachment store abstraction.
pub trait AttachmentStore: Send + Sync {
    /// Insert a new attachment, assigning its id.
    fn insert(&self, attachment: NewAttachment) -> Result<Attachment, StoreError>;

    /// Get an attachment by id (including soft-deleted ones).
    fn get(&self, id: AttachmentId) -> Result<Option<Attachment>, StoreError>;

    /// Get a folder by id.
    fn folder(&self, id: FolderId) -> Result<Option<Folder>, StoreError>;

    /// Create a folder.
    fn create_folder(&self, folder: Folder) -> Result<FolderId, StoreError>;

    /// Soft-delete an attachment.
    fn delete(&self, id: AttachmentId) -> Result<(), StoreError>;
}

impl<S> AttachmentStore for Arc<S>
where
    S: AttachmentStore + ?Sized,
{
    fn insert(&self, attachment: NewAttachment) -> Result<Attachment, StoreError> {
        (**self).insert(attachment)
    }

    fn get(&self, id: AttachmentId) -> Result<Option<Attachment>, StoreError> {
        (**self).get(id)
    }

    fn folder(&self, id: FolderId) -> Result<Option<Folder>, StoreError> {
        (**self).folder(id)
    }

    fn create_folder(&self, folder: Folder) -> Result<FolderId, StoreError> {
        (**self).create_folder(folder)
    }

    fn delete(&self, id: AttachmentId) -> Result<(), StoreError> {
        (**self).delete(id)
    }
}

/// Attachment store error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("attachment not found: {0}")]
    NotFound(AttachmentId),
    #[error("folder not found: {0}")]
    FolderNotFound(FolderId),
    #[error("storage error: {0}")]
    Storage(String),
}

/// In-memory attachment store for tests/dev.
///
/// Attachment ids are assigned from a process-local sequence, mirroring the
/// integer primary keys a database-backed store would hand out.
#[derive(Debug)]
pub struct InMemoryAttachmentStore {
    attachments: RwLock<HashMap<AttachmentId, Attachment>>,
    folders: RwLock<HashMap<FolderId, Folder>>,
    next_id: AtomicI64,
}

impl InMemoryAttachmentStore {
    pub fn new() -> Self {
        Self {
            attachments: RwLock::new(HashMap::new()),
            folders: RwLock::new(HashMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Soft-delete a folder (attachments inside become invisible to the
    /// conversion pipeline).
    pub fn delete_folder(&self, id: FolderId) -> Result<(), StoreError> {
        let mut folders = self.folders.write().unwrap();
        let folder = folders.get_mut(&id).ok_or(StoreError::FolderNotFound(id))?;
        folder.is_deleted = true;
        Ok(())
    }
}

impl Default for InMemoryAttachmentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AttachmentStore for InMemoryAttachmentStore {
    fn insert(&self, attachment: NewAttachment) -> Result<Attachment, StoreError> {
        {
            let folders = self.folders.read().unwrap();
            if !folders.contains_key(&attachment.folder_id) {
                return Err(StoreError::FolderNotFound(attachment.folder_id));
            }
        }

        let id = AttachmentId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        let stored = Attachment {
            id,
            folder_id: attachment.folder_id,
            owner: attachment.owner,
            title: attachment.title,
            description: attachment.description,
            kind: attachment.kind,
            file: attachment.file,
            is_deleted: false,
            created_at: Utc::now(),
        };

        let mut attachments = self.attachments.write().unwrap();
        attachments.insert(id, stored.clone());
        Ok(stored)
    }

    fn get(&self, id: AttachmentId) -> Result<Option<Attachment>, StoreError> {
        let attachments = self.attachments.read().unwrap();
        Ok(attachments.get(&id).cloned())
    }

    fn folder(&self, id: FolderId) -> Result<Option<Folder>, StoreError> {
        let folders = self.folders.read().unwrap();
        Ok(folders.get(&id).cloned())
    }

    fn create_folder(&self, folder: Folder) -> Result<FolderId, StoreError> {
        let mut folders = self.folders.write().unwrap();
        let id = folder.id;
        folders.insert(id, folder);
        Ok(id)
    }

    fn delete(&self, id: AttachmentId) -> Result<(), StoreError> {
        let mut attachments = self.attachments.write().unwrap();
        let attachment = attachments.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        attachment.is_deleted = true;
        Ok(())
    }
}
