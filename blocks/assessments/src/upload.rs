use lambda_http::{Body, Error, Response, http::StatusCode};
use roadscan_atoms::assessments::{AssessmentStore, AssessmentView};
use roadscan_shared::storage::ImageStore;
use roadscan_shared::vision::{RoadAnalyzer, VisionModel};

use crate::lifecycle::create_and_analyze;

fn bad_request(message: &str) -> Result<Response<Body>, Error> {
    Ok(Response::builder()
        .status(StatusCode::BAD_REQUEST)
        .header("Content-Type", "application/json")
        .body(serde_json::json!({ "error": message }).to_string().into())
        .map_err(Box::new)?)
}

fn server_error(message: &str) -> Result<Response<Body>, Error> {
    Ok(Response::builder()
        .status(StatusCode::INTERNAL_SERVER_ERROR)
        .header("Content-Type", "application/json")
        .body(serde_json::json!({ "error": message }).to_string().into())
        .map_err(Box::new)?)
}

/// HTTP handler: POST /assessments
///
/// The request body is the raw image. Stores it, then creates and analyzes the
/// assessment in the same request; the response is the final record.
pub async fn upload_assessment_handler<S, M, I>(
    store: &S,
    analyzer: &RoadAnalyzer<M, I>,
    user_id: &str,
    body: &[u8],
) -> Result<Response<Body>, Error>
where
    S: AssessmentStore,
    M: VisionModel,
    I: ImageStore,
{
    tracing::info!("📥 upload_assessment_handler: user_id={}, bytes={}", user_id, body.len());

    if body.is_empty() {
        return bad_request("No image provided");
    }

    // Same gate as an image form field: the bytes must look like a known image format
    let format = match image::guess_format(body) {
        Ok(format) => format,
        Err(e) => {
            tracing::warn!("Rejected upload from user_id={}: {}", user_id, e);
            return bad_request("Unsupported image format");
        }
    };

    let extension = format.extensions_str().first().copied().unwrap_or("img");
    let image_key = format!("uploads/{}/{}.{}", user_id, uuid::Uuid::new_v4(), extension);

    if let Err(e) = analyzer
        .images()
        .put(&image_key, body.to_vec(), format.to_mime_type())
        .await
    {
        tracing::error!("❌ Failed to store upload: key={}, error={}", image_key, e);
        return server_error("Failed to store image");
    }

    match create_and_analyze(store, analyzer, user_id, &image_key).await {
        Ok(assessment) => {
            tracing::info!(
                "✅ upload_assessment_handler done: assessment_id={}, status={}",
                assessment.assessment_id,
                assessment.analysis_status,
            );

            Ok(Response::builder()
                .status(StatusCode::CREATED)
                .header("Content-Type", "application/json")
                .body(serde_json::to_string(&AssessmentView::from(assessment))?.into())
                .map_err(Box::new)?)
        }
        Err(e) => {
            tracing::error!(
                "❌ upload_assessment_handler failed: user_id={}, error={}",
                user_id,
                e
            );
            server_error(&e)
        }
    }
}
