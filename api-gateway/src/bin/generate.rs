//! Generate Lambda - Handles POST /api/generate.
//!
//! Validates the entry, builds the template prompt and asks the model for the
//! card fields. Model failures degrade to placeholder content; only request
//! validation errors are returned as errors.

use lambda_http::http::Method;
use lambda_http::{run, service_fn, Body, Error, Request, Response};
use shared::http::{error_response, from_error, json_response};
use shared::{
    key_or_none, resolve_api_key, Config, GenerateRequest, GenerateResponse, OpenAiChatClient,
    Orchestrator, TemplateRegistry,
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Application state shared across requests.
struct AppState {
    orchestrator: Orchestrator<OpenAiChatClient>,
}

impl AppState {
    async fn new() -> Result<Self, Error> {
        let config = Config::from_env()?;
        let api_key = key_or_none(
            resolve_api_key(
                config.openai_api_key.as_deref(),
                config.openai_api_key_secret_arn.as_deref(),
            )
            .await,
            "openai",
        );

        if api_key.is_none() {
            warn!("No OpenAI API key configured; every generation will use placeholders");
        }

        let http_client = reqwest::Client::builder()
            .timeout(config.generation_timeout)
            .build()?;
        let generator = OpenAiChatClient::new(http_client, &config, api_key);

        Ok(Self {
            orchestrator: Orchestrator::new(
                TemplateRegistry::builtin(),
                generator,
                config.generation_timeout,
            ),
        })
    }
}

async fn handler(state: Arc<AppState>, event: Request) -> Result<Response<Body>, Error> {
    if event.method() != Method::POST {
        return error_response(405, "Method not allowed");
    }

    let request: GenerateRequest = shared::parse_body!(event.body());

    info!(
        entry_type = request.entry_type.as_str(),
        template_id = request.template_id.as_deref().unwrap_or_default(),
        "Generate request"
    );

    match state.orchestrator.generate(&request).await {
        Ok(result) => json_response(200, &GenerateResponse::from(result)),
        Err(e) => from_error(&e),
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let state = Arc::new(AppState::new().await?);

    run(service_fn(move |event| {
        let state = Arc::clone(&state);
        async move { handler(state, event).await }
    }))
    .await
}
