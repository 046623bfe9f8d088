use uuid::Uuid;

use blogs_shared::errors::{AppError, AppResult, ErrorCode};

use crate::gate::Session;
use crate::storage::StorageError;

pub mod auth;
pub mod blogs;
pub mod categories;
pub mod collections;
pub mod comments;
pub mod health;
pub mod search;
pub mod users;

pub(crate) fn ensure_owner(owner_id: Uuid, session: &Session, resource: &str) -> AppResult<()> {
    if owner_id == session.user_id() {
        Ok(())
    } else {
        Err(AppError::new(
            ErrorCode::NotOwner,
            format!("you do not own this {resource}"),
        ))
    }
}

/// Reports a storage conflict under `code`; other failures pass through.
pub(crate) fn on_conflict(
    code: ErrorCode,
    message: &'static str,
) -> impl Fn(StorageError) -> AppError {
    move |err| match err {
        StorageError::Conflict(_) => AppError::new(code, message),
        other => other.into(),
    }
}
