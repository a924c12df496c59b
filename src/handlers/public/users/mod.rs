pub mod signup; // POST /users

pub use signup::signup_post;
