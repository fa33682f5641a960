//! Application Configuration
//!
//! All settings come from the environment with local-development defaults.

use std::path::PathBuf;

/// Runtime configuration for the backend
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Directory holding one JSON profile per user
    pub data_dir: PathBuf,
    /// SQLite database for the activity timeline
    pub db_path: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);
        let data_dir = std::env::var("LEARNING_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data/user_profiles"));
        let db_path = std::env::var("LEARNING_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("learning_memory.db"));

        Self {
            host,
            port,
            data_dir,
            db_path,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

