pub mod account;
pub mod contact;
pub mod note;

use std::collections::HashMap;

pub use account::{Account, CreateAccountInput, UpdateAccountInput};
pub use contact::{Contact, ContactInput};
pub use note::{
    AttachmentInput, ChecklistItem, ChecklistItemInput, Note, NoteAttachment, NoteDetail, NoteInput,
    Reminder, ReminderInput,
};

/// Field name -> problem, reported back to the client on 400.
pub type FieldErrors = HashMap<String, String>;

pub(crate) fn looks_like_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !value.contains(|c: char| c.is_whitespace() || c.is_control())
        }
        None => false,
    }
}

/// Postgres text columns cannot store NUL; report it as a field error instead.
pub(crate) fn reject_nul(errors: &mut FieldErrors, field: impl Into<String>, value: &str) {
    if value.contains('\0') {
        errors.insert(field.into(), "Must not contain NUL characters".to_string());
    }
}
