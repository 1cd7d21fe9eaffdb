//! Free-text notes attached to customers and work orders.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::validation::{self, FieldError};
use super::{LineId, UserId};

/// Maximum note length in characters.
pub const NOTE_MAX: usize = 2_000;

/// A timestamped note written by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: LineId,
    pub author_id: UserId,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// Request body for adding a note.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
pub struct AddNoteRequest {
    #[schema(example = "Customer reports a squeal when braking")]
    pub body: String,
}

impl Note {
    /// Validate `body` and stamp a new note.
    pub fn new(author_id: UserId, body: &str, now: DateTime<Utc>) -> Result<Self, FieldError> {
        let body = validation::text("body", body, 1, NOTE_MAX)?;
        Ok(Self {
            id: LineId::random(),
            author_id,
            body,
            created_at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_blank_body() {
        let err = Note::new(UserId::random(), "  ", Utc::now()).expect_err("blank");
        assert_eq!(err.field(), "body");
    }

    #[test]
    fn trims_body() {
        let note = Note::new(UserId::random(), " brakes squeal ", Utc::now()).expect("valid");
        assert_eq!(note.body, "brakes squeal");
    }
}
