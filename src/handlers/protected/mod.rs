// handlers/protected/mod.rs - endpoints behind jwt_auth_middleware and
// validate_account_middleware. Every handler receives `Extension<AuthUser>`.
pub mod contacts;
pub mod files;
pub mod notes;
pub mod users;
