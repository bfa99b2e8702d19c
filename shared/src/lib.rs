pub mod config;
pub mod state;
pub mod storage;
pub mod vision;

pub use config::{AppConfig, ConfigError, StorageConfig};
pub use state::AppState;
