pub mod auth_cmd;
pub mod booking;
pub mod common;
pub mod completions;
pub mod config;
pub mod machines;
pub mod profile;
pub mod summary;
pub mod watch;
