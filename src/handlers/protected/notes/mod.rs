// handlers/protected/notes - notes with checklist items, reminders and attachments
//
// Children are always written with their note and replaced wholesale on update.
pub mod collection; // GET/POST /notes
pub mod record;     // GET/PUT/DELETE /notes/:id

pub use collection::list as notes_list;
pub use collection::post as notes_post;
pub use record::delete as note_delete;
pub use record::get as note_get;
pub use record::put as note_put;
