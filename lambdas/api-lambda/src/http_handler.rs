use assessments_block::upload;
use lambda_http::{
    http::{Method, StatusCode},
    Body, Error, Request, Response,
};
use lambda_http::http::header::{HeaderValue, VARY};
use roadscan_atoms::assessments;
use roadscan_shared::AppState;
use std::sync::Arc;

/// Set by the upstream authorizer once the caller is authenticated
const USER_ID_HEADER: &str = "X-User-Id";

fn with_cors_headers(mut resp: Response<Body>) -> Response<Body> {
    let headers = resp.headers_mut();
    headers.insert("Access-Control-Allow-Origin", HeaderValue::from_static("*"));
    headers.insert(
        "Access-Control-Allow-Methods",
        HeaderValue::from_static("GET,POST,OPTIONS"),
    );
    headers.insert(
        "Access-Control-Allow-Headers",
        HeaderValue::from_static("Content-Type,Authorization,X-User-Id"),
    );
    headers.append(VARY, HeaderValue::from_static("Origin"));

    resp
}

#[derive(Debug, PartialEq, Eq)]
enum Route<'a> {
    Preflight,
    VisionHealth,
    ListAssessments,
    UploadAssessment,
    GetAssessment(&'a str),
    MethodNotAllowed,
    NotFound,
}

fn route<'a>(method: &Method, path: &'a str) -> Route<'a> {
    if method == Method::OPTIONS {
        return Route::Preflight;
    }

    let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    match (method, parts.as_slice()) {
        (&Method::GET, ["health", "vision"]) => Route::VisionHealth,
        (&Method::GET, ["assessments"]) => Route::ListAssessments,
        (&Method::POST, ["assessments"]) => Route::UploadAssessment,
        (&Method::GET, ["assessments", assessment_id]) => Route::GetAssessment(assessment_id),
        (_, ["health", "vision"]) | (_, ["assessments"]) | (_, ["assessments", _]) => {
            Route::MethodNotAllowed
        }
        _ => Route::NotFound,
    }
}

fn caller_id(event: &Request) -> Option<String> {
    event
        .headers()
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Main Lambda handler - routes requests to health, dashboard, upload and result endpoints
pub(crate) async fn function_handler(
    event: Request,
    state: Arc<AppState>,
) -> Result<Response<Body>, Error> {
    let method = event.method();
    let path = event.uri().path();
    let body = event.body();
    tracing::info!("🚀 API Lambda invoked - Method: {} Path: {}", method, path);

    let resp = match route(method, path) {
        Route::Preflight => Response::builder()
            .status(StatusCode::OK)
            .body(Body::Empty)
            .map_err(Box::new)?,

        Route::VisionHealth => {
            let connected = state.analyzer.model().test_connection().await;
            Response::builder()
                .status(StatusCode::OK)
                .header("Content-Type", "application/json")
                .body(serde_json::json!({ "connected": connected }).to_string().into())
                .map_err(Box::new)?
        }

        Route::MethodNotAllowed => {
            json_error(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")?
        }

        Route::NotFound => {
            tracing::warn!("⚠️ No route matched - Method: {} Path: {}", method, path);
            json_error(StatusCode::NOT_FOUND, "Not found")?
        }

        authenticated => {
            let Some(user_id) = caller_id(&event) else {
                let resp = json_error(StatusCode::UNAUTHORIZED, "Authentication required")?;
                return Ok(with_cors_headers(resp));
            };

            match authenticated {
                Route::ListAssessments => {
                    assessments::list_assessments_handler(&state.store, &user_id).await?
                }
                Route::UploadAssessment => {
                    upload::upload_assessment_handler(&state.store, &state.analyzer, &user_id, body)
                        .await?
                }
                Route::GetAssessment(assessment_id) => {
                    assessments::get_assessment_handler(&state.store, &user_id, assessment_id)
                        .await?
                }
                _ => json_error(StatusCode::NOT_FOUND, "Not found")?,
            }
        }
    };

    Ok(with_cors_headers(resp))
}

fn json_error(status: StatusCode, message: &str) -> Result<Response<Body>, Error> {
    Ok(Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(serde_json::json!({ "error": message }).to_string().into())
        .map_err(Box::new)?)
}
