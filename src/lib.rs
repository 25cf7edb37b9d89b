// Public API for integration tests and potential library usage

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod persistence;
pub mod protocol;
pub mod sessions;
pub mod spin;
pub mod state;
pub mod tickets;
pub mod types;
pub mod ws;
