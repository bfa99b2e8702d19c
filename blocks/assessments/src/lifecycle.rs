use roadscan_atoms::assessments::{AnalysisStatus, Assessment, AssessmentStore};
use roadscan_shared::storage::ImageStore;
use roadscan_shared::vision::{RoadAnalyzer, VisionModel};

/// Create an assessment for an uploaded image and run it through the analyzer.
///
/// Three durable writes: pending, analyzing, then completed or failed.
/// A failed analysis is an `Ok` with a failed record; `Err` means a write failed.
pub async fn create_and_analyze<S, M, I>(
    store: &S,
    analyzer: &RoadAnalyzer<M, I>,
    user_id: &str,
    image_location: &str,
) -> Result<Assessment, String>
where
    S: AssessmentStore,
    M: VisionModel,
    I: ImageStore,
{
    let mut assessment = Assessment::new(user_id, image_location);
    store.create(&assessment).await?;

    assessment.begin_analysis().map_err(|e| e.to_string())?;
    store.update(&assessment).await?;

    tracing::info!(
        "🔍 Analyzing assessment_id={}, image={}",
        assessment.assessment_id,
        image_location,
    );

    let outcome = match analyzer.analyze(image_location).await {
        Ok(result) => assessment.complete(result),
        Err(e) => {
            tracing::warn!(
                "❌ Analysis failed: assessment_id={}, kind={:?}, error={}",
                assessment.assessment_id,
                e.kind(),
                e
            );
            assessment.fail()
        }
    };
    outcome.map_err(|e| e.to_string())?;

    store.update(&assessment).await?;

    if assessment.analysis_status == AnalysisStatus::Completed {
        tracing::info!("✅ Assessment completed: assessment_id={}", assessment.assessment_id);
    }

    Ok(assessment)
}
