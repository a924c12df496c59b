pub mod collection; // GET/POST /contacts
pub mod record;     // GET/PUT/DELETE /contacts/:id

pub use collection::list as contacts_list;
pub use collection::post as contacts_post;
pub use record::delete as contact_delete;
pub use record::get as contact_get;
pub use record::put as contact_put;
