/// Database configuration and connection management
pub mod database;

/// Article/task catalog loading from config.toml
pub mod catalog;

/// Runtime settings from environment variables
pub mod settings;
