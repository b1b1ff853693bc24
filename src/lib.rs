pub mod config;
pub mod db;
pub mod error;

// Recipe persistence
pub mod store;

// Query resolution and listings
pub mod listing;
pub mod resolver;

// HTTP API
pub mod api;

// Command-line client
pub mod cli;

// Re-exports
pub use config::Settings;
pub use error::{Error, Result};
