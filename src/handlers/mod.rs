pub mod auth;
pub mod event;
pub mod event_actions;
pub mod files;
pub mod user;
pub mod user_events;
