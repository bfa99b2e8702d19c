use aws_sdk_dynamodb::Client as DynamoClient;
use aws_sdk_dynamodb::types::AttributeValue;
use super::model::{AnalysisResult, AnalysisStatus, Assessment, Severity};
use std::collections::HashMap;
use std::future::Future;
use std::str::FromStr;

/// Create / update / read interface the lifecycle drives.
/// All errors are plain strings, "Assessment not found" when the owner has no such record.
pub trait AssessmentStore {
    fn create(&self, assessment: &Assessment) -> impl Future<Output = Result<(), String>> + Send;

    fn update(&self, assessment: &Assessment) -> impl Future<Output = Result<(), String>> + Send;

    fn get(
        &self,
        user_id: &str,
        assessment_id: &str,
    ) -> impl Future<Output = Result<Assessment, String>> + Send;

    fn list_for_user(
        &self,
        user_id: &str,
    ) -> impl Future<Output = Result<Vec<Assessment>, String>> + Send;
}

/// DynamoDB-backed store:
/// PK = "USER#{user_id}"
/// SK = "ASSESSMENT#{assessment_id}"
#[derive(Clone)]
pub struct DynamoAssessmentStore {
    client: DynamoClient,
    table_name: String,
}

impl DynamoAssessmentStore {
    pub fn new(client: DynamoClient, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }
}

impl AssessmentStore for DynamoAssessmentStore {
    async fn create(&self, assessment: &Assessment) -> Result<(), String> {
        create_assessment(&self.client, &self.table_name, assessment).await
    }

    async fn update(&self, assessment: &Assessment) -> Result<(), String> {
        update_assessment(&self.client, &self.table_name, assessment).await
    }

    async fn get(&self, user_id: &str, assessment_id: &str) -> Result<Assessment, String> {
        get_assessment(&self.client, &self.table_name, user_id, assessment_id).await
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Assessment>, String> {
        load_assessments_for_user(&self.client, &self.table_name, user_id).await
    }
}

fn keys(user_id: &str, assessment_id: &str) -> (String, String) {
    (format!("USER#{}", user_id), format!("ASSESSMENT#{}", assessment_id))
}

/// Full item for a put. Null analysis fields are simply absent.
pub(crate) fn item_for_assessment(assessment: &Assessment) -> HashMap<String, AttributeValue> {
    let (pk, sk) = keys(&assessment.user_id, &assessment.assessment_id);

    let mut item = HashMap::from([
        ("PK".to_string(), AttributeValue::S(pk)),
        ("SK".to_string(), AttributeValue::S(sk)),
        ("image".to_string(), AttributeValue::S(assessment.image.clone())),
        (
            "analysis_status".to_string(),
            AttributeValue::S(assessment.analysis_status.as_str().to_string()),
        ),
        ("created_at".to_string(), AttributeValue::S(assessment.created_at.clone())),
        ("updated_at".to_string(), AttributeValue::S(assessment.updated_at.clone())),
    ]);

    if let Some(result) = assessment.result() {
        for (name, value) in analysis_attributes(&result) {
            item.insert(name.to_string(), value);
        }
    }

    item
}

fn analysis_attributes(result: &AnalysisResult) -> [(&'static str, AttributeValue); 4] {
    [
        ("crack_percentage", AttributeValue::N(result.crack_percentage.to_string())),
        ("pothole_probability", AttributeValue::N(result.pothole_probability.to_string())),
        ("severity", AttributeValue::S(result.severity.as_str().to_string())),
        ("condition_score", AttributeValue::N(result.condition_score.to_string())),
    ]
}

fn read_number<T: FromStr>(
    item: &HashMap<String, AttributeValue>,
    name: &str,
) -> Result<Option<T>, String> {
    match item.get(name) {
        None | Some(AttributeValue::Null(_)) => Ok(None),
        Some(AttributeValue::N(n)) => n
            .parse::<T>()
            .map(Some)
            .map_err(|_| format!("Invalid {}: {}", name, n)),
        Some(_) => Err(format!("Invalid {}: not a number", name)),
    }
}

/// Rebuild a record from a DynamoDB item (pure, no I/O)
pub(crate) fn assessment_from_item(
    user_id: &str,
    assessment_id: &str,
    item: &HashMap<String, AttributeValue>,
) -> Result<Assessment, String> {
    let get_s = |name: &str| item.get(name).and_then(|v| v.as_s().ok()).map(|s| s.to_string());

    // Unknown literals are rejected rather than defaulted
    let analysis_status = get_s("analysis_status")
        .ok_or_else(|| "Missing analysis_status".to_string())?
        .parse::<AnalysisStatus>()?;
    let severity = get_s("severity").map(|s| s.parse::<Severity>()).transpose()?;

    let assessment = Assessment {
        assessment_id: assessment_id.to_string(),
        user_id: user_id.to_string(),
        image: get_s("image").unwrap_or_default(),
        crack_percentage: read_number(item, "crack_percentage")?,
        pothole_probability: read_number(item, "pothole_probability")?,
        severity,
        condition_score: read_number(item, "condition_score")?,
        analysis_status,
        created_at: get_s("created_at").unwrap_or_default(),
        updated_at: get_s("updated_at").unwrap_or_default(),
    };

    // All four analysis fields when completed, none of them otherwise
    let any_field = assessment.crack_percentage.is_some()
        || assessment.pothole_probability.is_some()
        || assessment.severity.is_some()
        || assessment.condition_score.is_some();
    match (assessment.analysis_status, assessment.result()) {
        (AnalysisStatus::Completed, None) => {
            Err("Invalid completed assessment: missing analysis fields".to_string())
        }
        (status, _) if status != AnalysisStatus::Completed && any_field => Err(format!(
            "Invalid {} assessment: analysis fields present",
            status
        )),
        _ => Ok(assessment),
    }
}

/// Persist a freshly created assessment
pub async fn create_assessment(
    client: &DynamoClient,
    table_name: &str,
    assessment: &Assessment,
) -> Result<(), String> {
    client
        .put_item()
        .table_name(table_name)
        .set_item(Some(item_for_assessment(assessment)))
        .condition_expression("attribute_not_exists(PK)")
        .send()
        .await
        .map_err(|e| format!("DynamoDB put_item error: {}", e))?;

    tracing::info!(
        "📝 Assessment created: assessment_id={}, user_id={}, status={}",
        assessment.assessment_id,
        assessment.user_id,
        assessment.analysis_status,
    );

    Ok(())
}

/// SET expression, names and values for an update (pure, no I/O).
/// The analysis fields are only written once a result exists.
pub(crate) fn update_parts(
    assessment: &Assessment,
) -> (String, HashMap<String, String>, HashMap<String, AttributeValue>) {
    let mut update_expr = vec![
        "#analysis_status = :analysis_status".to_string(),
        "updated_at = :updated_at".to_string(),
    ];
    let mut expr_names = HashMap::new();
    let mut expr_values = HashMap::new();

    expr_names.insert("#analysis_status".to_string(), "analysis_status".to_string());
    expr_values.insert(
        ":analysis_status".to_string(),
        AttributeValue::S(assessment.analysis_status.as_str().to_string()),
    );
    expr_values.insert(
        ":updated_at".to_string(),
        AttributeValue::S(assessment.updated_at.clone()),
    );

    if let Some(result) = assessment.result() {
        for (name, value) in analysis_attributes(&result) {
            update_expr.push(format!("{} = :{}", name, name));
            expr_values.insert(format!(":{}", name), value);
        }
    }

    (format!("SET {}", update_expr.join(", ")), expr_names, expr_values)
}

/// Write status, updated_at and (once completed) the analysis fields
pub async fn update_assessment(
    client: &DynamoClient,
    table_name: &str,
    assessment: &Assessment,
) -> Result<(), String> {
    let (pk, sk) = keys(&assessment.user_id, &assessment.assessment_id);
    let (update_expression, expr_names, expr_values) = update_parts(assessment);

    let mut builder = client
        .update_item()
        .table_name(table_name)
        .key("PK", AttributeValue::S(pk))
        .key("SK", AttributeValue::S(sk))
        .update_expression(update_expression)
        .condition_expression("attribute_exists(PK)");

    for (k, v) in expr_names {
        builder = builder.expression_attribute_names(k, v);
    }

    for (k, v) in expr_values {
        builder = builder.expression_attribute_values(k, v);
    }

    builder.send().await.map_err(|e| format!("DynamoDB update_item error: {}", e))?;

    tracing::info!(
        "🔄 Assessment updated: assessment_id={}, status={}",
        assessment.assessment_id,
        assessment.analysis_status,
    );

    Ok(())
}

/// Get a specific assessment. Only reachable through its owner's partition.
pub async fn get_assessment(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
    assessment_id: &str,
) -> Result<Assessment, String> {
    let (pk, sk) = keys(user_id, assessment_id);

    let result = client
        .get_item()
        .table_name(table_name)
        .key("PK", AttributeValue::S(pk))
        .key("SK", AttributeValue::S(sk))
        .send()
        .await
        .map_err(|e| format!("DynamoDB get_item error: {}", e))?;

    if let Some(item) = result.item() {
        assessment_from_item(user_id, assessment_id, item)
    } else {
        Err("Assessment not found".to_string())
    }
}

/// Load all assessments of a user, newest first
pub async fn load_assessments_for_user(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
) -> Result<Vec<Assessment>, String> {
    let pk = format!("USER#{}", user_id);

    let mut assessments = Vec::new();
    let mut start_key: Option<HashMap<String, AttributeValue>> = None;

    loop {
        let page = client
            .query()
            .table_name(table_name)
            .key_condition_expression("PK = :pk AND begins_with(SK, :sk_prefix)")
            .expression_attribute_values(":pk", AttributeValue::S(pk.clone()))
            .expression_attribute_values(":sk_prefix", AttributeValue::S("ASSESSMENT#".to_string()))
            .set_exclusive_start_key(start_key.take())
            .send()
            .await
            .map_err(|e| format!("DynamoDB query error: {}", e))?;

        for item in page.items() {
            if let Some(sk) = item.get("SK").and_then(|v| v.as_s().ok()) {
                if let Some(assessment_id) = sk.strip_prefix("ASSESSMENT#") {
                    match assessment_from_item(user_id, assessment_id, item) {
                        Ok(assessment) => assessments.push(assessment),
                        Err(e) => tracing::warn!(
                            "⚠️ Skipping unreadable assessment: assessment_id={}, error={}",
                            assessment_id,
                            e
                        ),
                    }
                }
            }
        }

        start_key = next_start_key(page.last_evaluated_key());
        if start_key.is_none() {
            break;
        }
    }

    sort_newest_first(&mut assessments);

    Ok(assessments)
}

/// Key to resume a query from; None once DynamoDB reports the last page
fn next_start_key(
    last_evaluated_key: Option<&HashMap<String, AttributeValue>>,
) -> Option<HashMap<String, AttributeValue>> {
    last_evaluated_key.filter(|key| !key.is_empty()).cloned()
}

// RFC 3339 strings from the same clock sort lexicographically
fn sort_newest_first(assessments: &mut [Assessment]) {
    assessments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}
