// handlers/protected/users - the caller's own account
//
// Any id other than the caller's is answered with 404.
pub mod collection; // GET /users
pub mod image;      // POST /users/:id/image
pub mod record;     // GET/PUT/DELETE /users/:id

pub use collection::list as users_list;
pub use image::post as user_image_post;
pub use record::delete as user_delete;
pub use record::get as user_get;
pub use record::put as user_put;
