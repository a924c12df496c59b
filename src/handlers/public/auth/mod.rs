// handlers/public/auth/mod.rs - token acquisition
pub mod login; // POST /auth/login

pub use login::login_post;
