use std::collections::HashMap;

use chrono::Utc;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{
    AttachmentInput, ChecklistItem, ChecklistItemInput, Note, NoteAttachment, NoteDetail, NoteInput,
    Reminder, ReminderInput,
};

const SELECT_NOTE: &str = r#"
    SELECT id, title, description, is_pinned, is_archived, is_checklist,
           created_by, updated_by, created_at, updated_at, deleted_at
    FROM notes
"#;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

pub async fn create(conn: &mut PgConnection, owner: Uuid, input: &NoteInput) -> Result<Note, DatabaseError> {
    let now = Utc::now();
    let note = sqlx::query_as::<_, Note>(
        r#"
        INSERT INTO notes (id, title, description, is_pinned, is_archived, is_checklist,
                           created_by, updated_by, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $7, $8, $8)
        RETURNING id, title, description, is_pinned, is_archived, is_checklist,
                  created_by, updated_by, created_at, updated_at, deleted_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&input.title)
    .bind(&input.description)
    .bind(input.is_pinned)
    .bind(input.is_archived)
    .bind(input.is_checklist)
    .bind(owner)
    .bind(now)
    .fetch_one(&mut *conn)
    .await?;
    Ok(note)
}

pub async fn get_by_id(conn: &mut PgConnection, id: Uuid) -> Result<Option<Note>, DatabaseError> {
    let sql = format!("{} WHERE id = $1 AND deleted_at IS NULL", SELECT_NOTE);
    let note = sqlx::query_as::<_, Note>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(note)
}

pub async fn get_by_id_for_update(conn: &mut PgConnection, id: Uuid) -> Result<Option<Note>, DatabaseError> {
    let sql = format!("{} WHERE id = $1 AND deleted_at IS NULL FOR UPDATE", SELECT_NOTE);
    let note = sqlx::query_as::<_, Note>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(note)
}

/// Pinned notes first, then most recently edited.
pub async fn list_by_owner(conn: &mut PgConnection, owner: Uuid) -> Result<Vec<Note>, DatabaseError> {
    let sql = format!(
        "{} WHERE created_by = $1 AND deleted_at IS NULL ORDER BY is_pinned DESC, updated_at DESC",
        SELECT_NOTE
    );
    let notes = sqlx::query_as::<_, Note>(&sql)
        .bind(owner)
        .fetch_all(&mut *conn)
        .await?;
    Ok(notes)
}

pub async fn update(
    conn: &mut PgConnection,
    id: Uuid,
    editor: Uuid,
    input: &NoteInput,
) -> Result<Note, DatabaseError> {
    let note = sqlx::query_as::<_, Note>(
        r#"
        UPDATE notes
        SET title = $2, description = $3, is_pinned = $4, is_archived = $5, is_checklist = $6,
            updated_by = $7, updated_at = $8
        WHERE id = $1 AND deleted_at IS NULL
        RETURNING id, title, description, is_pinned, is_archived, is_checklist,
                  created_by, updated_by, created_at, updated_at, deleted_at
        "#,
    )
    .bind(id)
    .bind(&input.title)
    .bind(&input.description)
    .bind(input.is_pinned)
    .bind(input.is_archived)
    .bind(input.is_checklist)
    .bind(editor)
    .bind(Utc::now())
    .fetch_one(&mut *conn)
    .await?;
    Ok(note)
}

pub async fn soft_delete(conn: &mut PgConnection, id: Uuid) -> Result<bool, DatabaseError> {
    let result = sqlx::query("UPDATE notes SET deleted_at = $2 WHERE id = $1 AND deleted_at IS NULL")
        .bind(id)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

// --- children -------------------------------------------------------------

/// Inserts checklist items one row at a time, keeping request order in `position`.
pub async fn insert_checklist_items(
    conn: &mut PgConnection,
    note_id: Uuid,
    items: &[ChecklistItemInput],
) -> Result<Vec<ChecklistItem>, DatabaseError> {
    let mut inserted = Vec::with_capacity(items.len());
    for (position, item) in items.iter().enumerate() {
        let row = sqlx::query_as::<_, ChecklistItem>(
            r#"
            INSERT INTO checklist_items (id, note_id, position, text, is_checked)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, note_id, position, text, is_checked, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(note_id)
        .bind(position as i32)
        .bind(item.text.trim())
        .bind(item.is_checked)
        .fetch_one(&mut *conn)
        .await?;
        inserted.push(row);
    }
    Ok(inserted)
}

pub async fn insert_reminders(
    conn: &mut PgConnection,
    note_id: Uuid,
    reminders: &[ReminderInput],
) -> Result<Vec<Reminder>, DatabaseError> {
    let mut inserted = Vec::with_capacity(reminders.len());
    for reminder in reminders {
        let row = sqlx::query_as::<_, Reminder>(
            r#"
            INSERT INTO reminders (id, note_id, remind_at)
            VALUES ($1, $2, $3)
            RETURNING id, note_id, remind_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(note_id)
        .bind(reminder.time)
        .fetch_one(&mut *conn)
        .await?;
        inserted.push(row);
    }
    Ok(inserted)
}

pub async fn insert_attachments(
    conn: &mut PgConnection,
    note_id: Uuid,
    attachments: &[AttachmentInput],
) -> Result<Vec<NoteAttachment>, DatabaseError> {
    let mut inserted = Vec::with_capacity(attachments.len());
    for attachment in attachments {
        let content_type = attachment
            .content_type
            .as_deref()
            .filter(|ct| !ct.trim().is_empty())
            .unwrap_or(DEFAULT_CONTENT_TYPE);

        let row = sqlx::query_as::<_, NoteAttachment>(
            r#"
            INSERT INTO note_attachments (id, note_id, file_name, url, content_type)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, note_id, file_name, url, content_type, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(note_id)
        .bind(attachment.file_name.trim())
        .bind(attachment.url.trim())
        .bind(content_type)
        .fetch_one(&mut *conn)
        .await?;
        inserted.push(row);
    }
    Ok(inserted)
}

/// Inserts every child collection of `input` under `note`.
pub async fn insert_children(
    conn: &mut PgConnection,
    note: Note,
    input: &NoteInput,
) -> Result<NoteDetail, DatabaseError> {
    let checklist_items = insert_checklist_items(conn, note.id, &input.checklist_items).await?;
    let reminders = insert_reminders(conn, note.id, &input.reminders).await?;
    let attachments = insert_attachments(conn, note.id, &input.attachments).await?;

    Ok(NoteDetail { note, checklist_items, reminders, attachments })
}

/// Hard-deletes all children of a note.
pub async fn delete_children(conn: &mut PgConnection, note_id: Uuid) -> Result<(), DatabaseError> {
    for table in ["checklist_items", "reminders", "note_attachments"] {
        sqlx::query(&format!("DELETE FROM {} WHERE note_id = $1", table))
            .bind(note_id)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

/// Loads children for one note.
pub async fn load_detail(conn: &mut PgConnection, note: Note) -> Result<NoteDetail, DatabaseError> {
    let mut details = load_details(conn, vec![note]).await?;
    details
        .pop()
        .ok_or_else(|| DatabaseError::NotFound("note".to_string()))
}

/// Loads children for many notes with one query per child table.
pub async fn load_details(conn: &mut PgConnection, notes: Vec<Note>) -> Result<Vec<NoteDetail>, DatabaseError> {
    if notes.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<Uuid> = notes.iter().map(|n| n.id).collect();

    let items = sqlx::query_as::<_, ChecklistItem>(
        r#"
        SELECT id, note_id, position, text, is_checked, created_at
        FROM checklist_items
        WHERE note_id = ANY($1)
        ORDER BY position
        "#,
    )
    .bind(&ids)
    .fetch_all(&mut *conn)
    .await?;

    let reminders = sqlx::query_as::<_, Reminder>(
        "SELECT id, note_id, remind_at FROM reminders WHERE note_id = ANY($1) ORDER BY remind_at",
    )
    .bind(&ids)
    .fetch_all(&mut *conn)
    .await?;

    let attachments = sqlx::query_as::<_, NoteAttachment>(
        r#"
        SELECT id, note_id, file_name, url, content_type, created_at
        FROM note_attachments
        WHERE note_id = ANY($1)
        ORDER BY created_at, file_name
        "#,
    )
    .bind(&ids)
    .fetch_all(&mut *conn)
    .await?;

    Ok(assemble(notes, items, reminders, attachments))
}

fn assemble(
    notes: Vec<Note>,
    items: Vec<ChecklistItem>,
    reminders: Vec<Reminder>,
    attachments: Vec<NoteAttachment>,
) -> Vec<NoteDetail> {
    let mut items_by_note: HashMap<Uuid, Vec<ChecklistItem>> = HashMap::new();
    for item in items {
        items_by_note.entry(item.note_id).or_default().push(item);
    }
    let mut reminders_by_note: HashMap<Uuid, Vec<Reminder>> = HashMap::new();
    for reminder in reminders {
        reminders_by_note.entry(reminder.note_id).or_default().push(reminder);
    }
    let mut attachments_by_note: HashMap<Uuid, Vec<NoteAttachment>> = HashMap::new();
    for attachment in attachments {
        attachments_by_note.entry(attachment.note_id).or_default().push(attachment);
    }

    notes
        .into_iter()
        .map(|note| NoteDetail {
            checklist_items: items_by_note.remove(&note.id).unwrap_or_default(),
            reminders: reminders_by_note.remove(&note.id).unwrap_or_default(),
            attachments: attachments_by_note.remove(&note.id).unwrap_or_default(),
            note,
        })
        .collect()
}
