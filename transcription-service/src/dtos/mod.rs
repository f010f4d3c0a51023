pub mod auth;
pub mod transcribe;
