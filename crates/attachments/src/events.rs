//! Domain events emitted by attachment operations.

use chrono::{DateTime, Utc};

use pdfrelay_core::{AttachmentId, FolderId};
use pdfrelay_events::Event;

/// A new attachment was stored (e.g. a converted PDF was attached next to
/// its source document).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentCreated {
    /// The newly stored attachment.
    pub attachment_id: AttachmentId,
    /// The source document it was derived from, when applicable.
    pub derived_from: Option<AttachmentId>,
    pub folder_id: FolderId,
    pub occurred_at: DateTime<Utc>,
}

impl Event for AttachmentCreated {
    fn event_type(&self) -> &'static str {
        "attachments.attachment.created"
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }
}
