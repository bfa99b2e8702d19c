use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash-preview-05-20";
pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_TABLE_NAME: &str = "roadscan";
pub const DEFAULT_MEDIA_ROOT: &str = "media";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} environment variable not set. Please set it in your .env file.")]
    Missing(&'static str),
}

/// Where uploaded images live
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    Local { media_root: PathBuf },
    S3 { bucket: String },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Vision service credential
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_api_base: String,

    /// DynamoDB table holding assessments
    pub table_name: String,

    pub storage: StorageConfig,
}

impl AppConfig {
    /// Loads configuration from the process environment (and `.env`, if present).
    ///
    /// Required environment variables:
    /// - `GEMINI_API_KEY`: credential for the vision service
    ///
    /// Optional environment variables:
    /// - `GEMINI_MODEL` (default: `gemini-2.5-flash-preview-05-20`)
    /// - `GEMINI_API_BASE` (default: `https://generativelanguage.googleapis.com/v1beta`)
    /// - `TABLE_NAME` (default: `roadscan`)
    /// - `IMAGE_BUCKET`: store uploads in this S3 bucket instead of on disk
    /// - `MEDIA_ROOT`: local upload directory (default: `media`)
    ///
    /// # Errors
    ///
    /// Returns an error if the credential is missing or empty.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same rules as `from_env`, reading values through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Blank values count as unset
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let gemini_api_key = get("GEMINI_API_KEY").ok_or(ConfigError::Missing("GEMINI_API_KEY"))?;

        let storage = match get("IMAGE_BUCKET") {
            Some(bucket) => StorageConfig::S3 { bucket },
            None => StorageConfig::Local {
                media_root: get("MEDIA_ROOT")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_MEDIA_ROOT)),
            },
        };

        Ok(Self {
            gemini_api_key,
            gemini_model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            gemini_api_base: get("GEMINI_API_BASE")
                .unwrap_or_else(|| DEFAULT_GEMINI_API_BASE.to_string()),
            table_name: get("TABLE_NAME").unwrap_or_else(|| DEFAULT_TABLE_NAME.to_string()),
            storage,
        })
    }
}
