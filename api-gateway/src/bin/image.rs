//! Image Lambda - Handles POST /api/image.
//!
//! Upstream failures never fail the request: the response carries a stable
//! placeholder image and `fallback: true` instead.

use lambda_http::http::Method;
use lambda_http::{run, service_fn, Body, Error, Request, Response};
use shared::http::{error_response, from_error, json_response};
use shared::{key_or_none, resolve_api_key, Config, ImageRequest, ImageService, OpenAiImageClient};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Application state shared across requests.
struct AppState {
    images: ImageService<OpenAiImageClient>,
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

        // Image models are slower than chat; allow twice the generation budget.
        let http_client = reqwest::Client::builder()
            .timeout(config.generation_timeout * 2)
            .build()?;

        Ok(Self {
            images: ImageService::new(OpenAiImageClient::new(http_client, &config, api_key)),
        })
    }
}

async fn handler(state: Arc<AppState>, event: Request) -> Result<Response<Body>, Error> {
    if event.method() != Method::POST {
        return error_response(405, "Method not allowed");
    }

    let request: ImageRequest = shared::parse_body!(event.body());
    if let Err(e) = request.check() {
        return from_error(&shared::Error::from(e));
    }

    let response = state.images.illustrate(&request.prompt, request.style).await;
    info!(
        duration_ms = response.duration,
        fallback = response.fallback,
        "Image request complete"
    );

    json_response(200, &response)
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
