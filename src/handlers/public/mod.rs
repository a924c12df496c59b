// handlers/public/mod.rs - endpoints reachable without a bearer token
//
// POST /auth/login  - exchange email + password for a token
// POST /users       - sign-up
pub mod auth;
pub mod users;
