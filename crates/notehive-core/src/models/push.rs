use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Payload fanned out to subscribers when a new file is catalogued.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFileEvent {
    pub record_id: Uuid,
    pub program: String,
    pub semester: String,
    pub subject: String,
    pub filename: String,
}

impl NewFileEvent {
    /// Human-readable notification body.
    pub fn message_body(&self) -> String {
        format!(
            "New notes uploaded: {} ({} / semester {} / {})",
            self.filename, self.program, self.semester, self.subject
        )
    }
}
