use chrono::Utc;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{Account, UpdateAccountInput};

const SELECT_ACCOUNT: &str = r#"
    SELECT id, clerk_id, email, first_name, last_name, image_url, password_hash,
           created_at, updated_at, deleted_at
    FROM accounts
"#;

/// Values for a new account row; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub clerk_id: Option<String>,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub image_url: String,
    pub password_hash: Option<String>,
}

pub async fn create(conn: &mut PgConnection, new: NewAccount) -> Result<Account, DatabaseError> {
    let account = sqlx::query_as::<_, Account>(
        r#"
        INSERT INTO accounts (id, clerk_id, email, first_name, last_name, image_url, password_hash)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id, clerk_id, email, first_name, last_name, image_url, password_hash,
                  created_at, updated_at, deleted_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(new.clerk_id)
    .bind(new.email)
    .bind(new.first_name)
    .bind(new.last_name)
    .bind(new.image_url)
    .bind(new.password_hash)
    .fetch_one(&mut *conn)
    .await?;

    Ok(account)
}

pub async fn get_by_id(conn: &mut PgConnection, id: Uuid) -> Result<Option<Account>, DatabaseError> {
    let sql = format!("{} WHERE id = $1 AND deleted_at IS NULL", SELECT_ACCOUNT);
    let account = sqlx::query_as::<_, Account>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(account)
}

/// Same as `get_by_id` but locks the row until the surrounding transaction ends.
pub async fn get_by_id_for_update(conn: &mut PgConnection, id: Uuid) -> Result<Option<Account>, DatabaseError> {
    let sql = format!("{} WHERE id = $1 AND deleted_at IS NULL FOR UPDATE", SELECT_ACCOUNT);
    let account = sqlx::query_as::<_, Account>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(account)
}

pub async fn find_by_email(conn: &mut PgConnection, email: &str) -> Result<Option<Account>, DatabaseError> {
    let sql = format!("{} WHERE lower(email) = lower($1) AND deleted_at IS NULL", SELECT_ACCOUNT);
    let account = sqlx::query_as::<_, Account>(&sql)
        .bind(email)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(account)
}

pub async fn find_by_clerk_id(conn: &mut PgConnection, clerk_id: &str) -> Result<Option<Account>, DatabaseError> {
    let sql = format!("{} WHERE clerk_id = $1 AND deleted_at IS NULL", SELECT_ACCOUNT);
    let account = sqlx::query_as::<_, Account>(&sql)
        .bind(clerk_id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(account)
}

/// Accounts visible to `owner`: only its own.
pub async fn list_by_owner(conn: &mut PgConnection, owner: Uuid) -> Result<Vec<Account>, DatabaseError> {
    let sql = format!("{} WHERE id = $1 AND deleted_at IS NULL ORDER BY created_at", SELECT_ACCOUNT);
    let accounts = sqlx::query_as::<_, Account>(&sql)
        .bind(owner)
        .fetch_all(&mut *conn)
        .await?;
    Ok(accounts)
}

pub async fn exists(conn: &mut PgConnection, id: Uuid) -> Result<bool, DatabaseError> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM accounts WHERE id = $1 AND deleted_at IS NULL)",
    )
    .bind(id)
    .fetch_one(&mut *conn)
    .await?;
    Ok(exists)
}

/// Replace the editable profile fields.
pub async fn update(
    conn: &mut PgConnection,
    id: Uuid,
    input: &UpdateAccountInput,
) -> Result<Account, DatabaseError> {
    let account = sqlx::query_as::<_, Account>(
        r#"
        UPDATE accounts
        SET email = $2, first_name = $3, last_name = $4, image_url = $5, updated_at = $6
        WHERE id = $1 AND deleted_at IS NULL
        RETURNING id, clerk_id, email, first_name, last_name, image_url, password_hash,
                  created_at, updated_at, deleted_at
        "#,
    )
    .bind(id)
    .bind(input.email.trim())
    .bind(&input.first_name)
    .bind(&input.last_name)
    .bind(&input.image_url)
    .bind(Utc::now())
    .fetch_one(&mut *conn)
    .await?;
    Ok(account)
}

pub async fn update_image_url(conn: &mut PgConnection, id: Uuid, image_url: &str) -> Result<Account, DatabaseError> {
    let account = sqlx::query_as::<_, Account>(
        r#"
        UPDATE accounts
        SET image_url = $2, updated_at = $3
        WHERE id = $1 AND deleted_at IS NULL
        RETURNING id, clerk_id, email, first_name, last_name, image_url, password_hash,
                  created_at, updated_at, deleted_at
        "#,
    )
    .bind(id)
    .bind(image_url)
    .bind(Utc::now())
    .fetch_one(&mut *conn)
    .await?;
    Ok(account)
}

/// Marks the account deleted. Returns false if it was already gone.
pub async fn soft_delete(conn: &mut PgConnection, id: Uuid) -> Result<bool, DatabaseError> {
    let result = sqlx::query("UPDATE accounts SET deleted_at = $2 WHERE id = $1 AND deleted_at IS NULL")
        .bind(id)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected() > 0)
}
