pub mod auth;
pub mod crypto;
pub mod event;
pub mod files;
pub mod log;
pub mod user;
