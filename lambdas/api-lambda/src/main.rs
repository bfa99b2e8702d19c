use lambda_http::{run, service_fn, Error, Request};
use roadscan_shared::{AppConfig, AppState};
use std::sync::Arc;

mod http_handler;

#[tokio::main]
async fn main() -> Result<(), Error> {
    lambda_http::tracing::init_default_subscriber();

    // Missing credential ends the cold start here, never per request
    let config = AppConfig::from_env()?;
    let aws_config = aws_config::load_from_env().await;
    let state = Arc::new(AppState::new(&aws_config, &config)?);

    run(service_fn(move |event: Request| {
        let state = Arc::clone(&state);
        async move { http_handler::function_handler(event, state).await }
    }))
    .await
}
