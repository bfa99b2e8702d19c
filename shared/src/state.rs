use aws_sdk_dynamodb::Client as DynamoClient;
use aws_sdk_s3::Client as S3Client;
use roadscan_atoms::assessments::DynamoAssessmentStore;

use crate::config::{AppConfig, ConfigError};
use crate::storage::ImageStorage;
use crate::vision::{GeminiClient, RoadAnalyzer};

/// Everything a request needs, built once per cold start
pub struct AppState {
    pub store: DynamoAssessmentStore,
    pub analyzer: RoadAnalyzer<GeminiClient, ImageStorage>,
}

impl AppState {
    /// # Errors
    ///
    /// Fails when the vision credential is missing; there is no state without it.
    pub fn new(
        aws_config: &aws_config::SdkConfig,
        config: &AppConfig,
    ) -> Result<Self, ConfigError> {
        let gemini = GeminiClient::from_config(config)?;
        let images = ImageStorage::from_config(&config.storage, S3Client::new(aws_config));
        let store =
            DynamoAssessmentStore::new(DynamoClient::new(aws_config), config.table_name.clone());

        tracing::info!(
            "AppState ready: table={}, model={}, storage={:?}",
            config.table_name,
            config.gemini_model,
            config.storage,
        );

        Ok(Self {
            store,
            analyzer: RoadAnalyzer::new(gemini, images),
        })
    }
}
