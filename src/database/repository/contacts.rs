use chrono::Utc;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{Contact, ContactInput};

const SELECT_CONTACT: &str = r#"
    SELECT id, first_name, last_name, email, phone, address,
           created_by, updated_by, created_at, updated_at, deleted_at
    FROM contacts
"#;

pub async fn create(conn: &mut PgConnection, owner: Uuid, input: &ContactInput) -> Result<Contact, DatabaseError> {
    let now = Utc::now();
    let contact = sqlx::query_as::<_, Contact>(
        r#"
        INSERT INTO contacts (id, first_name, last_name, email, phone, address,
                              created_by, updated_by, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $7, $8, $8)
        RETURNING id, first_name, last_name, email, phone, address,
                  created_by, updated_by, created_at, updated_at, deleted_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(input.first_name.trim())
    .bind(input.last_name.trim())
    .bind(input.email.trim())
    .bind(input.phone.trim())
    .bind(&input.address)
    .bind(owner)
    .bind(now)
    .fetch_one(&mut *conn)
    .await?;
    Ok(contact)
}

pub async fn get_by_id(conn: &mut PgConnection, id: Uuid) -> Result<Option<Contact>, DatabaseError> {
    let sql = format!("{} WHERE id = $1 AND deleted_at IS NULL", SELECT_CONTACT);
    let contact = sqlx::query_as::<_, Contact>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(contact)
}

pub async fn get_by_id_for_update(conn: &mut PgConnection, id: Uuid) -> Result<Option<Contact>, DatabaseError> {
    let sql = format!("{} WHERE id = $1 AND deleted_at IS NULL FOR UPDATE", SELECT_CONTACT);
    let contact = sqlx::query_as::<_, Contact>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(contact)
}

pub async fn list_by_owner(conn: &mut PgConnection, owner: Uuid) -> Result<Vec<Contact>, DatabaseError> {
    let sql = format!(
        "{} WHERE created_by = $1 AND deleted_at IS NULL ORDER BY last_name, first_name, created_at",
        SELECT_CONTACT
    );
    let contacts = sqlx::query_as::<_, Contact>(&sql)
        .bind(owner)
        .fetch_all(&mut *conn)
        .await?;
    Ok(contacts)
}

/// Full replacement of the contact's fields.
pub async fn update(
    conn: &mut PgConnection,
    id: Uuid,
    editor: Uuid,
    input: &ContactInput,
) -> Result<Contact, DatabaseError> {
    let contact = sqlx::query_as::<_, Contact>(
        r#"
        UPDATE contacts
        SET first_name = $2, last_name = $3, email = $4, phone = $5, address = $6,
            updated_by = $7, updated_at = $8
        WHERE id = $1 AND deleted_at IS NULL
        RETURNING id, first_name, last_name, email, phone, address,
                  created_by, updated_by, created_at, updated_at, deleted_at
        "#,
    )
    .bind(id)
    .bind(input.first_name.trim())
    .bind(input.last_name.trim())
    .bind(input.email.trim())
    .bind(input.phone.trim())
    .bind(&input.address)
    .bind(editor)
    .bind(Utc::now())
    .fetch_one(&mut *conn)
    .await?;
    Ok(contact)
}

pub async fn soft_delete(conn: &mut PgConnection, id: Uuid) -> Result<bool, DatabaseError> {
    let result = sqlx::query("UPDATE contacts SET deleted_at = $2 WHERE id = $1 AND deleted_at IS NULL")
        .bind(id)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected() > 0)
}
