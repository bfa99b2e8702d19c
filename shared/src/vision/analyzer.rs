use roadscan_atoms::assessments::AnalysisResult;

use super::error::{AnalysisError, ContractError};
use super::gemini::VisionModel;
use super::preprocess::{prepare_image, PreparedImage};
use super::prompt::ROAD_ASSESSMENT_PROMPT;
use super::validator;
use crate::storage::{ImageStore, StorageError};

/// Vision request adapter: image location in, validated result (or a tagged failure) out.
///
/// One model call per `analyze`, no retries, no caching.
pub struct RoadAnalyzer<M, S> {
    model: M,
    images: S,
}

impl<M: VisionModel, S: ImageStore> RoadAnalyzer<M, S> {
    pub fn new(model: M, images: S) -> Self {
        Self { model, images }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn images(&self) -> &S {
        &self.images
    }

    async fn load_image(&self, image_location: &str) -> Result<PreparedImage, AnalysisError> {
        let bytes = self.images.load(image_location).await.map_err(|e| match e {
            StorageError::NotFound(path) => {
                tracing::error!("Image file not found: {}", path);
                AnalysisError::ImageNotFound(path)
            }
            StorageError::Io(reason) => {
                tracing::error!("Error reading image {}: {}", image_location, reason);
                AnalysisError::ImageUnreadable(reason)
            }
        })?;

        prepare_image(&bytes)
            .inspect_err(|e| tracing::error!("Error opening image {}: {}", image_location, e))
    }

    /// Analyze a road/pavement image.
    ///
    /// # Errors
    ///
    /// Input, service and contract failures, each logged here with its own message.
    pub async fn analyze(&self, image_location: &str) -> Result<AnalysisResult, AnalysisError> {
        let image = self.load_image(image_location).await?;

        let raw = self
            .model
            .generate(ROAD_ASSESSMENT_PROMPT, Some(&image))
            .await
            .inspect_err(|e| match e {
                AnalysisError::EmptyResponse => {
                    tracing::error!("Empty response from vision service")
                }
                other => tracing::error!("Error analyzing image with vision service: {}", other),
            })?;

        let result = validator::validate(&raw).map_err(|e| {
            match &e {
                ContractError::Parse { reason, .. } => {
                    tracing::error!("Failed to parse JSON response: {}", reason);
                    tracing::error!("Raw response: {}", raw);
                }
                other => {
                    tracing::error!("Response violates contract: {}; raw response: {}", other, raw)
                }
            }
            AnalysisError::from(e)
        })?;

        tracing::info!(
            "✅ Successfully analyzed image: {} (severity={}, condition_score={})",
            image_location,
            result.severity,
            result.condition_score,
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vision::error::ErrorKind;
    use image::{DynamicImage, ImageOutputFormat, Rgba, RgbaImage};
    use roadscan_atoms::assessments::Severity;
    use std::collections::HashMap;
    use std::io::Cursor;
    use std::sync::Mutex;

    struct MemoryImages(HashMap<String, Vec<u8>>);

    impl ImageStore for MemoryImages {
        async fn put(
            &self,
            _key: &str,
            _bytes: Vec<u8>,
            _content_type: &str,
        ) -> Result<(), StorageError> {
            Ok(())
        }

        async fn load(&self, key: &str) -> Result<Vec<u8>, StorageError> {
            self.0
                .get(key)
                .cloned()
                .ok_or_else(|| StorageError::NotFound(key.to_string()))
        }
    }

    /// Replays a canned reply and records what it was sent
    struct ScriptedModel {
        reply: Result<String, AnalysisError>,
        seen: Mutex<Vec<(String, Option<PreparedImage>)>>,
    }

    impl ScriptedModel {
        fn replying(reply: Result<String, AnalysisError>) -> Self {
            Self { reply, seen: Mutex::new(Vec::new()) }
        }

        fn calls(&self) -> usize {
            self.seen.lock().unwrap().len()
        }
    }

    impl VisionModel for ScriptedModel {
        async fn generate(
            &self,
            prompt: &str,
            image: Option<&PreparedImage>,
        ) -> Result<String, AnalysisError> {
            self.seen.lock().unwrap().push((prompt.to_string(), image.cloned()));
            self.reply.clone()
        }
    }

    fn road_png() -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(16, 16, Rgba([90, 90, 90, 255])));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageOutputFormat::Png).unwrap();
        buf
    }

    fn analyzer(reply: Result<String, AnalysisError>) -> RoadAnalyzer<ScriptedModel, MemoryImages> {
        let images = MemoryImages(HashMap::from([
            ("uploads/road.png".to_string(), road_png()),
            ("uploads/broken.png".to_string(), b"\x89PNG but not really".to_vec()),
        ]));
        RoadAnalyzer::new(ScriptedModel::replying(reply), images)
    }

    const GOOD_REPLY: &str = "```json\n{\"crack_percentage\": 23.5, \"pothole_probability\": 0.8, \"severity\": \"High\", \"condition_score\": 45}\n```";

    #[tokio::test]
    async fn test_successful_analysis() {
        let analyzer = analyzer(Ok(GOOD_REPLY.to_string()));
        let result = analyzer.analyze("uploads/road.png").await.unwrap();

        assert_eq!(result.crack_percentage, 23.5);
        assert_eq!(result.pothole_probability, 0.8);
        assert_eq!(result.severity, Severity::High);
        assert_eq!(result.condition_score, 45);
        assert_eq!(analyzer.model().calls(), 1);
    }

    #[tokio::test]
    async fn test_model_receives_fixed_prompt_and_rgb_jpeg() {
        let analyzer = analyzer(Ok(GOOD_REPLY.to_string()));
        analyzer.analyze("uploads/road.png").await.unwrap();

        let seen = analyzer.model().seen.lock().unwrap();
        let (prompt, attached) = &seen[0];
        assert_eq!(prompt, ROAD_ASSESSMENT_PROMPT);

        let attached = attached.as_ref().expect("image should be attached");
        assert_eq!(attached.mime_type, "image/jpeg");
        let decoded = image::load_from_memory(&attached.bytes).unwrap();
        assert_eq!(decoded.color(), image::ColorType::Rgb8);
    }

    #[tokio::test]
    async fn test_missing_image_never_calls_the_model() {
        let analyzer = analyzer(Ok(GOOD_REPLY.to_string()));
        let err = analyzer.analyze("uploads/missing.png").await.unwrap_err();

        assert_eq!(err, AnalysisError::ImageNotFound("uploads/missing.png".to_string()));
        assert_eq!(err.kind(), ErrorKind::Input);
        assert_eq!(analyzer.model().calls(), 0);
    }

    #[tokio::test]
    async fn test_undecodable_image_never_calls_the_model() {
        let analyzer = analyzer(Ok(GOOD_REPLY.to_string()));
        let err = analyzer.analyze("uploads/broken.png").await.unwrap_err();

        assert!(matches!(err, AnalysisError::ImageDecode(_)));
        assert_eq!(analyzer.model().calls(), 0);
    }

    #[tokio::test]
    async fn test_service_failure_is_reported() {
        let analyzer = analyzer(Err(AnalysisError::Service("connection reset".to_string())));
        let err = analyzer.analyze("uploads/road.png").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Service);
    }

    #[tokio::test]
    async fn test_empty_response_is_a_service_error() {
        let analyzer = analyzer(Err(AnalysisError::EmptyResponse));
        let err = analyzer.analyze("uploads/road.png").await.unwrap_err();
        assert_eq!(err, AnalysisError::EmptyResponse);
        assert_eq!(err.kind(), ErrorKind::Service);
    }

    #[tokio::test]
    async fn test_contract_violation_is_reported() {
        let reply = r#"{"crack_percentage": 10, "pothole_probability": 0.1, "severity": "Critical", "condition_score": 80}"#;
        let analyzer = analyzer(Ok(reply.to_string()));
        let err = analyzer.analyze("uploads/road.png").await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Contract);
        assert!(matches!(
            err,
            AnalysisError::Contract(ContractError::InvalidField { field: "severity", .. })
        ));
    }

    #[tokio::test]
    async fn test_prose_reply_is_a_contract_error() {
        let analyzer = analyzer(Ok("The road looks fine to me.".to_string()));
        let err = analyzer.analyze("uploads/road.png").await.unwrap_err();
        assert!(matches!(err, AnalysisError::Contract(ContractError::Parse { .. })));
    }
}
