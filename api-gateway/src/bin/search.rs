//! Search Lambda - Handles POST /api/search.

use lambda_http::http::Method;
use lambda_http::{run, service_fn, Body, Error, Request, Response};
use shared::http::{error_response, from_error, json_response};
use shared::{resolve_api_key, Config, SearchClient, SearchRequest, SearchResponse};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Application state shared across requests.
struct AppState {
    /// `None` when no search key is configured
    search_client: Option<SearchClient>,
}

impl AppState {
    async fn new() -> Result<Self, Error> {
        let config = Config::from_env()?;
        let api_key = resolve_api_key(
            config.tavily_api_key.as_deref(),
            config.tavily_api_key_secret_arn.as_deref(),
        )
        .await?;

        let http_client = reqwest::Client::builder()
            .timeout(config.generation_timeout)
            .build()?;

        Ok(Self {
            search_client: api_key.map(|key| SearchClient::new(http_client, &config, key)),
        })
    }
}

async fn handler(state: Arc<AppState>, event: Request) -> Result<Response<Body>, Error> {
    if event.method() != Method::POST {
        return error_response(405, "Method not allowed");
    }

    let request: SearchRequest = shared::parse_body!(event.body());
    if let Err(e) = request.check() {
        return from_error(&shared::Error::from(e));
    }

    let Some(client) = state.search_client.as_ref() else {
        return from_error(&shared::Error::Config("Search API key not configured".to_string()));
    };

    info!(keyword = %request.keyword, limit = request.limit, "Search request");

    match client.search(&request.keyword, request.limit).await {
        Ok(results) => json_response(
            200,
            &SearchResponse {
                total: results.len(),
                results,
            },
        ),
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
