// handlers/public/users/signup.rs - POST /users

use axum::{extract::rejection::JsonRejection, extract::State, Json};

use crate::app::AppState;
use crate::auth::hash_password;
use crate::database::models::{Account, CreateAccountInput};
use crate::database::repository::accounts::{self, NewAccount};
use crate::error::ApiError;
use crate::handlers::{bind_body, invalid};
use crate::middleware::{ApiResponse, ApiResult};

/// Creates an account. Requires either `clerkId` (externally managed identity)
/// or a local `password`; duplicates by identity or email are a 409.
pub async fn signup_post(
    State(state): State<AppState>,
    body: Result<Json<CreateAccountInput>, JsonRejection>,
) -> ApiResult<Account> {
    let input = bind_body(body)?;
    input.validate().map_err(|errors| {
        if input.clerk_id().is_none() && input.password().is_none() {
            ApiError::validation_error("Password is required for manual sign-up", Some(errors))
        } else {
            invalid("user", errors)
        }
    })?;

    let email = input.email.trim().to_string();
    let password_hash = input.password().map(hash_password).transpose()?;

    let mut tx = state.db.begin().await?;

    if let Some(clerk_id) = input.clerk_id() {
        if accounts::find_by_clerk_id(&mut *tx, clerk_id).await?.is_some() {
            tracing::warn!("Sign-up rejected: identity {} already registered", clerk_id);
            return Err(ApiError::conflict("User already exists"));
        }
    }
    if accounts::find_by_email(&mut *tx, &email).await?.is_some() {
        tracing::warn!("Sign-up rejected: email {} already registered", email);
        return Err(ApiError::conflict("User already exists"));
    }

    let account = accounts::create(
        &mut *tx,
        NewAccount {
            clerk_id: input.clerk_id().map(str::to_string),
            email,
            first_name: input.first_name.trim().to_string(),
            last_name: input.last_name.trim().to_string(),
            image_url: input.image_url.clone().unwrap_or_default(),
            password_hash,
        },
    )
    .await?;

    tx.commit().await?;

    tracing::info!("Created account {}", account.id);
    Ok(ApiResponse::created(account))
}
