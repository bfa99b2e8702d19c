use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Coarse damage classification returned by the vision model
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "Low",
            Severity::Medium => "Medium",
            Severity::High => "High",
        }
    }
}

impl FromStr for Severity {
    type Err = String;

    /// Exact literals only: "low" or " High" are not severities.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Low" => Ok(Severity::Low),
            "Medium" => Ok(Severity::Medium),
            "High" => Ok(Severity::High),
            other => Err(format!("Invalid severity: {}", other)),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle marker on an Assessment
///
/// pending -> analyzing -> completed | failed
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    Pending,
    Analyzing,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionError {
    pub from: AnalysisStatus,
    pub to: AnalysisStatus,
}

impl fmt::Display for TransitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid analysis_status transition: {} -> {}", self.from, self.to)
    }
}

impl std::error::Error for TransitionError {}

impl AnalysisStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisStatus::Pending => "pending",
            AnalysisStatus::Analyzing => "analyzing",
            AnalysisStatus::Completed => "completed",
            AnalysisStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, AnalysisStatus::Completed | AnalysisStatus::Failed)
    }

    /// Total transition function. Nothing leaves completed or failed.
    pub fn transition(self, next: AnalysisStatus) -> Result<AnalysisStatus, TransitionError> {
        use AnalysisStatus::*;

        match (self, next) {
            (Pending, Analyzing) | (Analyzing, Completed) | (Analyzing, Failed) => Ok(next),
            (from, to) => Err(TransitionError { from, to }),
        }
    }
}

impl FromStr for AnalysisStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(AnalysisStatus::Pending),
            "analyzing" => Ok(AnalysisStatus::Analyzing),
            "completed" => Ok(AnalysisStatus::Completed),
            "failed" => Ok(AnalysisStatus::Failed),
            other => Err(format!("Invalid analysis_status: {}", other)),
        }
    }
}

impl fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated output of one vision call. Never persisted on its own.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AnalysisResult {
    pub crack_percentage: f64,
    pub pothole_probability: f64,
    pub severity: Severity,
    pub condition_score: u32,
}

/// Assessment domain model - one per uploaded road/pavement image
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Assessment {
    pub assessment_id: String,
    pub user_id: String,
    /// Storage key of the uploaded image
    pub image: String,

    // Populated together on completion, null otherwise
    pub crack_percentage: Option<f64>,
    pub pothole_probability: Option<f64>,
    pub severity: Option<Severity>,
    pub condition_score: Option<u32>,

    pub analysis_status: AnalysisStatus,
    pub created_at: String,
    pub updated_at: String,
}

impl Assessment {
    pub fn new(user_id: &str, image: &str) -> Self {
        let now = chrono::Utc::now().to_rfc3339();

        Assessment {
            assessment_id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            image: image.to_string(),
            crack_percentage: None,
            pothole_probability: None,
            severity: None,
            condition_score: None,
            analysis_status: AnalysisStatus::Pending,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    fn move_to(&mut self, next: AnalysisStatus) -> Result<(), TransitionError> {
        self.analysis_status = self.analysis_status.transition(next)?;
        self.updated_at = chrono::Utc::now().to_rfc3339();
        Ok(())
    }

    pub fn begin_analysis(&mut self) -> Result<(), TransitionError> {
        self.move_to(AnalysisStatus::Analyzing)
    }

    /// Copies the result onto the record verbatim and marks it completed.
    pub fn complete(&mut self, result: AnalysisResult) -> Result<(), TransitionError> {
        self.move_to(AnalysisStatus::Completed)?;
        self.crack_percentage = Some(result.crack_percentage);
        self.pothole_probability = Some(result.pothole_probability);
        self.severity = Some(result.severity);
        self.condition_score = Some(result.condition_score);
        Ok(())
    }

    /// Marks the record failed. Analysis fields stay null.
    pub fn fail(&mut self) -> Result<(), TransitionError> {
        self.move_to(AnalysisStatus::Failed)
    }

    /// The four analysis fields, when all of them are present.
    pub fn result(&self) -> Option<AnalysisResult> {
        Some(AnalysisResult {
            crack_percentage: self.crack_percentage?,
            pothole_probability: self.pothole_probability?,
            severity: self.severity?,
            condition_score: self.condition_score?,
        })
    }

    /// Human-readable condition description based on score
    pub fn condition_description(&self) -> &'static str {
        match self.condition_score {
            None => "Not analyzed",
            Some(score) if score >= 80 => "Excellent",
            Some(score) if score >= 60 => "Good",
            Some(score) if score >= 40 => "Fair",
            Some(score) if score >= 20 => "Poor",
            Some(_) => "Very Poor",
        }
    }
}

/// API shape of an assessment: the record plus its derived description
#[derive(Debug, Serialize, Clone)]
pub struct AssessmentView {
    #[serde(flatten)]
    pub assessment: Assessment,
    pub condition_description: &'static str,
}

impl From<Assessment> for AssessmentView {
    fn from(assessment: Assessment) -> Self {
        let condition_description = assessment.condition_description();
        AssessmentView {
            assessment,
            condition_description,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_result() -> AnalysisResult {
        AnalysisResult {
            crack_percentage: 23.5,
            pothole_probability: 0.8,
            severity: Severity::High,
            condition_score: 45,
        }
    }

    fn has_no_analysis_fields(a: &Assessment) -> bool {
        a.crack_percentage.is_none()
            && a.pothole_probability.is_none()
            && a.severity.is_none()
            && a.condition_score.is_none()
    }

    #[test]
    fn test_new_assessment_is_pending_and_empty() {
        let a = Assessment::new("user-1", "uploads/user-1/a.jpg");
        assert_eq!(a.analysis_status, AnalysisStatus::Pending);
        assert!(has_no_analysis_fields(&a));
        assert_eq!(a.created_at, a.updated_at);
        assert!(uuid::Uuid::parse_str(&a.assessment_id).is_ok());
    }

    #[test]
    fn test_allowed_transitions() {
        use AnalysisStatus::*;
        assert_eq!(Pending.transition(Analyzing), Ok(Analyzing));
        assert_eq!(Analyzing.transition(Completed), Ok(Completed));
        assert_eq!(Analyzing.transition(Failed), Ok(Failed));
    }

    #[test]
    fn test_terminal_states_reject_every_transition() {
        use AnalysisStatus::*;
        for from in [Completed, Failed] {
            assert!(from.is_terminal());
            for to in [Pending, Analyzing, Completed, Failed] {
                assert_eq!(from.transition(to), Err(TransitionError { from, to }));
            }
        }
    }

    #[test]
    fn test_pending_cannot_skip_analyzing() {
        use AnalysisStatus::*;
        assert!(Pending.transition(Completed).is_err());
        assert!(Pending.transition(Failed).is_err());
        assert!(Pending.transition(Pending).is_err());
        assert!(Analyzing.transition(Pending).is_err());
    }

    #[test]
    fn test_complete_copies_result_verbatim() {
        let mut a = Assessment::new("user-1", "img.jpg");
        a.begin_analysis().unwrap();
        a.complete(sample_result()).unwrap();

        assert_eq!(a.analysis_status, AnalysisStatus::Completed);
        assert_eq!(a.result(), Some(sample_result()));
    }

    #[test]
    fn test_fail_leaves_fields_null() {
        let mut a = Assessment::new("user-1", "img.jpg");
        a.begin_analysis().unwrap();
        a.fail().unwrap();

        assert_eq!(a.analysis_status, AnalysisStatus::Failed);
        assert!(has_no_analysis_fields(&a));
        assert_eq!(a.result(), None);
    }

    #[test]
    fn test_rejected_transition_leaves_record_untouched() {
        let mut a = Assessment::new("user-1", "img.jpg");
        let before = a.clone();

        assert!(a.complete(sample_result()).is_err());
        assert_eq!(a, before);

        a.begin_analysis().unwrap();
        a.fail().unwrap();
        let failed = a.clone();
        assert!(a.complete(sample_result()).is_err());
        assert_eq!(a, failed);
    }

    #[test]
    fn test_condition_description_bands() {
        let mut a = Assessment::new("user-1", "img.jpg");
        assert_eq!(a.condition_description(), "Not analyzed");

        for (score, expected) in [
            (100, "Excellent"),
            (80, "Excellent"),
            (79, "Good"),
            (60, "Good"),
            (40, "Fair"),
            (20, "Poor"),
            (19, "Very Poor"),
            (0, "Very Poor"),
        ] {
            a.condition_score = Some(score);
            assert_eq!(a.condition_description(), expected, "score {}", score);
        }
    }

    #[test]
    fn test_status_and_severity_literals() {
        assert_eq!("analyzing".parse::<AnalysisStatus>(), Ok(AnalysisStatus::Analyzing));
        assert!("Analyzing".parse::<AnalysisStatus>().is_err());
        assert_eq!("Medium".parse::<Severity>(), Ok(Severity::Medium));
        assert!("Critical".parse::<Severity>().is_err());
        assert!("low".parse::<Severity>().is_err());
    }

    #[test]
    fn test_view_serializes_flat_with_description() {
        let mut a = Assessment::new("user-1", "img.jpg");
        a.begin_analysis().unwrap();
        a.complete(sample_result()).unwrap();

        let json = serde_json::to_value(AssessmentView::from(a)).unwrap();
        assert_eq!(json["analysis_status"], "completed");
        assert_eq!(json["severity"], "High");
        assert_eq!(json["condition_score"], 45);
        assert_eq!(json["condition_description"], "Fair");
    }

    #[test]
    fn test_view_serializes_nulls_for_failed_record() {
        let mut a = Assessment::new("user-1", "img.jpg");
        a.begin_analysis().unwrap();
        a.fail().unwrap();

        let json = serde_json::to_value(AssessmentView::from(a)).unwrap();
        assert_eq!(json["analysis_status"], "failed");
        assert!(json["crack_percentage"].is_null());
        assert!(json["severity"].is_null());
        assert_eq!(json["condition_description"], "Not analyzed");
    }
}
