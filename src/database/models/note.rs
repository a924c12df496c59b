use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{reject_nul, FieldErrors};
use crate::auth::ownership::Owned;

pub const MAX_TITLE_LEN: usize = 255;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub is_pinned: bool,
    pub is_archived: bool,
    pub is_checklist: bool,
    pub created_by: Uuid,
    pub updated_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Owned for Note {
    fn owner_id(&self) -> Uuid {
        self.created_by
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistItem {
    pub id: Uuid,
    pub note_id: Uuid,
    pub position: i32,
    pub text: String,
    pub is_checked: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    pub id: Uuid,
    pub note_id: Uuid,
    #[serde(rename = "time")]
    pub remind_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct NoteAttachment {
    pub id: Uuid,
    pub note_id: Uuid,
    pub file_name: String,
    pub url: String,
    pub content_type: String,
    pub created_at: DateTime<Utc>,
}

/// A note together with all of its children, as returned by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteDetail {
    #[serde(flatten)]
    pub note: Note,
    pub checklist_items: Vec<ChecklistItem>,
    pub reminders: Vec<Reminder>,
    pub attachments: Vec<NoteAttachment>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChecklistItemInput {
    pub text: String,
    pub is_checked: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReminderInput {
    pub time: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AttachmentInput {
    pub file_name: String,
    pub url: String,
    pub content_type: Option<String>,
}

/// Create/update payload. Updates replace the note and all of its children.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NoteInput {
    pub title: String,
    pub description: String,
    pub is_pinned: bool,
    pub is_archived: bool,
    pub is_checklist: bool,
    pub checklist_items: Vec<ChecklistItemInput>,
    pub reminders: Vec<ReminderInput>,
    pub attachments: Vec<AttachmentInput>,
}

impl NoteInput {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();

        if self.title.chars().count() > MAX_TITLE_LEN {
            errors.insert(
                "title".to_string(),
                format!("Must be at most {} characters", MAX_TITLE_LEN),
            );
        }
        reject_nul(&mut errors, "title", &self.title);
        reject_nul(&mut errors, "description", &self.description);
        for (i, item) in self.checklist_items.iter().enumerate() {
            let field = format!("checklistItems[{}].text", i);
            if item.text.trim().is_empty() {
                errors.insert(field, "Must not be empty".to_string());
            } else {
                reject_nul(&mut errors, field, &item.text);
            }
        }
        for (i, attachment) in self.attachments.iter().enumerate() {
            if attachment.file_name.trim().is_empty() {
                errors.insert(format!("attachments[{}].fileName", i), "Must not be empty".to_string());
            } else {
                reject_nul(&mut errors, format!("attachments[{}].fileName", i), &attachment.file_name);
            }
            if attachment.url.trim().is_empty() {
                errors.insert(format!("attachments[{}].url", i), "Must not be empty".to_string());
            } else {
                reject_nul(&mut errors, format!("attachments[{}].url", i), &attachment.url);
            }
            if let Some(content_type) = &attachment.content_type {
                reject_nul(&mut errors, format!("attachments[{}].contentType", i), content_type);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
