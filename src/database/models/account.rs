use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{looks_like_email, reject_nul, FieldErrors};
use crate::auth::ownership::Owned;

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: Uuid,
    pub clerk_id: Option<String>,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub image_url: String,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing)]
    pub deleted_at: Option<DateTime<Utc>>,
}

// An account is owned by itself.
impl Owned for Account {
    fn owner_id(&self) -> Uuid {
        self.id
    }
}

/// Sign-up payload. Either `clerk_id` (externally managed identity) or
/// `password` (local credential) must be present.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateAccountInput {
    pub clerk_id: Option<String>,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub image_url: Option<String>,
    pub password: Option<String>,
}

impl CreateAccountInput {
    pub fn clerk_id(&self) -> Option<&str> {
        self.clerk_id.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref().filter(|s| !s.is_empty())
    }

    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();

        if self.clerk_id().is_none() && self.password().is_none() {
            errors.insert(
                "password".to_string(),
                "Password is required for manual sign-up".to_string(),
            );
        }
        if let Some(password) = self.password() {
            if password.chars().count() < MIN_PASSWORD_LEN {
                errors.insert(
                    "password".to_string(),
                    format!("Must be at least {} characters", MIN_PASSWORD_LEN),
                );
            }
        }
        if !looks_like_email(self.email.trim()) {
            errors.insert("email".to_string(), "Must be a valid email address".to_string());
        }
        reject_nul(&mut errors, "clerkId", self.clerk_id.as_deref().unwrap_or_default());
        reject_nul(&mut errors, "firstName", &self.first_name);
        reject_nul(&mut errors, "lastName", &self.last_name);
        reject_nul(&mut errors, "imageUrl", self.image_url.as_deref().unwrap_or_default());

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Profile edit payload; every field is replaced.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateAccountInput {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub image_url: String,
}

impl UpdateAccountInput {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        if !looks_like_email(self.email.trim()) {
            errors.insert("email".to_string(), "Must be a valid email address".to_string());
        }
        reject_nul(&mut errors, "firstName", &self.first_name);
        reject_nul(&mut errors, "lastName", &self.last_name);
        reject_nul(&mut errors, "imageUrl", &self.image_url);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
