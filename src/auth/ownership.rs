use uuid::Uuid;

use crate::error::ApiError;

/// A resource whose access is restricted to the account that created it.
pub trait Owned {
    fn owner_id(&self) -> Uuid;
}

/// Hands back the resource only if `caller` owns it. A missing resource and a
/// resource owned by someone else produce the same 404.
pub fn authorize<T: Owned>(caller: Uuid, resource: Option<T>, what: &str) -> Result<T, ApiError> {
    match resource {
        Some(resource) if resource.owner_id() == caller => Ok(resource),
        Some(resource) => {
            tracing::warn!(
                "Ownership check failed: {} owned by {} requested by {}",
                what,
                resource.owner_id(),
                caller
            );
            Err(not_found(what))
        }
        None => Err(not_found(what)),
    }
}

fn not_found(what: &str) -> ApiError {
    ApiError::not_found(format!("{} not found", what))
}
