/// Fixed instruction sent with every road image. The field names, ranges and
/// severity literals here are the ones `validator::check` enforces.
pub const ROAD_ASSESSMENT_PROMPT: &str = r#"
Analyze the given road or pavement image. Identify:
- Crack percentage (0-100)
- Pothole probability (0-1)
- Surface damage
- Severity (Low, Medium, High)
- Condition score (integer 0-100, higher is better)

Return STRICT JSON only like:
{
  "crack_percentage": 23.5,
  "pothole_probability": 0.8,
  "severity": "High",
  "condition_score": 45
}

Important: Return ONLY the JSON object, no additional text or explanations.
"#;

/// Text-only prompt used to check that the service answers at all
pub const CONNECTION_CHECK_PROMPT: &str = "Hello, respond with 'Connection successful!'";
