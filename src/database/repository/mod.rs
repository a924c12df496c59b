//! Row-level persistence. Every function takes a plain connection so the
//! caller decides whether it runs inside a transaction.

pub mod accounts;
pub mod contacts;
pub mod notes;
