/// Database connection and schema creation
pub mod database;

/// Application settings loading from config.toml and the environment
pub mod settings;

pub use settings::Settings;
