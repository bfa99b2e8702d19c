use lambda_http::{Body, Error as LambdaError, Response, http::StatusCode};
use super::model::AssessmentView;
use super::service::AssessmentStore;

/// HTTP Handler: GET /assessments (dashboard, newest first)
pub async fn list_assessments_handler<S: AssessmentStore>(
    store: &S,
    user_id: &str,
) -> Result<Response<Body>, LambdaError> {
    match store.list_for_user(user_id).await {
        Ok(assessments) => {
            let views: Vec<AssessmentView> =
                assessments.into_iter().map(AssessmentView::from).collect();
            Ok(Response::builder()
                .status(StatusCode::OK)
                .header("Content-Type", "application/json")
                .body(serde_json::to_string(&views)?.into())
                .map_err(Box::new)?)
        }
        Err(e) => {
            tracing::error!(
                "❌ list_assessments_handler failed: user_id={}, error={}",
                user_id,
                e
            );
            Ok(Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .header("Content-Type", "application/json")
                .body(serde_json::json!({"error": e}).to_string().into())
                .map_err(Box::new)?)
        }
    }
}

/// HTTP Handler: GET /assessments/{id}
pub async fn get_assessment_handler<S: AssessmentStore>(
    store: &S,
    user_id: &str,
    assessment_id: &str,
) -> Result<Response<Body>, LambdaError> {
    match store.get(user_id, assessment_id).await {
        Ok(assessment) => Ok(Response::builder()
            .status(StatusCode::OK)
            .header("Content-Type", "application/json")
            .body(serde_json::to_string(&AssessmentView::from(assessment))?.into())
            .map_err(Box::new)?),
        Err(e) if e == "Assessment not found" => Ok(Response::builder()
            .status(StatusCode::NOT_FOUND)
            .header("Content-Type", "application/json")
            .body(serde_json::json!({"error": e}).to_string().into())
            .map_err(Box::new)?),
        Err(e) => {
            tracing::error!(
                "❌ get_assessment_handler failed: user_id={}, assessment_id={}, error={}",
                user_id,
                assessment_id,
                e
            );
            Ok(Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .header("Content-Type", "application/json")
                .body(serde_json::json!({"error": e}).to_string().into())
                .map_err(Box::new)?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessments::model::Assessment;
    use std::sync::Mutex;

    struct MemoryStore {
        records: Mutex<Vec<Assessment>>,
        broken: bool,
    }

    impl MemoryStore {
        fn with(records: Vec<Assessment>) -> Self {
            Self { records: Mutex::new(records), broken: false }
        }
    }

    impl AssessmentStore for MemoryStore {
        async fn create(&self, assessment: &Assessment) -> Result<(), String> {
            self.records.lock().unwrap().push(assessment.clone());
            Ok(())
        }

        async fn update(&self, _assessment: &Assessment) -> Result<(), String> {
            Ok(())
        }

        async fn get(&self, user_id: &str, assessment_id: &str) -> Result<Assessment, String> {
            if self.broken {
                return Err("DynamoDB get_item error: timeout".to_string());
            }
            self.records
                .lock()
                .unwrap()
                .iter()
                .find(|a| a.user_id == user_id && a.assessment_id == assessment_id)
                .cloned()
                .ok_or_else(|| "Assessment not found".to_string())
        }

        async fn list_for_user(&self, user_id: &str) -> Result<Vec<Assessment>, String> {
            if self.broken {
                return Err("DynamoDB query error: timeout".to_string());
            }
            Ok(self
                .records
                .lock()
                .unwrap()
                .iter()
                .filter(|a| a.user_id == user_id)
                .cloned()
                .collect())
        }
    }

    fn json_body(resp: &Response<Body>) -> serde_json::Value {
        serde_json::from_slice(resp.body()).unwrap()
    }

    #[tokio::test]
    async fn test_get_is_scoped_to_owner() {
        let mine = Assessment::new("alice", "a.jpg");
        let store = MemoryStore::with(vec![mine.clone()]);

        let resp = get_assessment_handler(&store, "alice", &mine.assessment_id).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(json_body(&resp)["assessment_id"], mine.assessment_id.as_str());
        assert_eq!(json_body(&resp)["condition_description"], "Not analyzed");

        let resp = get_assessment_handler(&store, "mallory", &mine.assessment_id).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_get_store_failure_is_500() {
        let store = MemoryStore { records: Mutex::new(vec![]), broken: true };
        let resp = get_assessment_handler(&store, "alice", "x").await.unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_list_returns_only_own_records() {
        let store = MemoryStore::with(vec![
            Assessment::new("alice", "a.jpg"),
            Assessment::new("bob", "b.jpg"),
            Assessment::new("alice", "c.jpg"),
        ]);

        let resp = list_assessments_handler(&store, "alice").await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = json_body(&resp);
        let items = body.as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|v| v["user_id"] == "alice"));
    }
}
