//! `pdfrelay-attachments` — the document store this service converts from
//! and writes back into.
//!
//! The conversion core only needs a narrow slice of a real document
//! management system: look up a source attachment, notice that it (or its
//! folder) has been deleted, check who may view a folder, and persist a
//! derived attachment next to its source. That slice is modeled here.

pub mod events;
pub mod model;
pub mod store;

pub use events::AttachmentCreated;
pub use model::{
    Attachment, AttachmentFile, AttachmentType, Folder, NewAttachment, ProtectionMode, pdf_title,
};
pub use store::{AttachmentStore, InMemoryAttachmentStore, StoreError};
