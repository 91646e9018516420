//! helpdesk - ticketing backend
//!
//! Library exports for the server binary and integration tests.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod services;
pub mod state;
pub mod validation;

pub use config::config;
pub use error::{Error, Result};
pub use state::AppState;
