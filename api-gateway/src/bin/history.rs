//! History Lambda - Saved concept cards.
//!
//! Endpoints:
//! - GET /api/history?limit=20&offset=0 - List records, newest first
//! - POST /api/history - Save a record
//! - DELETE /api/history?id=... - Delete a record

use lambda_http::http::Method;
use lambda_http::{run, service_fn, Body, Error, Request, RequestExt, Response};
use shared::history::{self, HistoryStore, InMemoryHistoryStore, PgHistoryStore};
use shared::http::{error_response, from_error, json_response, Ack};
use shared::{Config, NewHistoryRecord, TemplateRegistry, ValidationError};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_LIMIT: usize = 20;

/// Application state shared across requests.
struct AppState {
    store: Box<dyn HistoryStore>,
    capacity: usize,
}

impl AppState {
    async fn new() -> Result<Self, Error> {
        let config = Config::from_env()?;

        let store: Box<dyn HistoryStore> = match config.database_url.as_deref() {
            Some(database_url) => {
                let pool = shared::db::create_pool(database_url).await?;
                shared::db::run_migrations(&pool).await?;
                info!("Using Postgres history store");
                Box::new(PgHistoryStore::new(pool, config.history_capacity))
            }
            None => {
                info!("Using in-memory history store");
                Box::new(InMemoryHistoryStore::new(config.history_capacity))
            }
        };

        Ok(Self {
            store,
            capacity: config.history_capacity,
        })
    }
}

fn query_usize(event: &Request, name: &str, default: usize) -> Result<usize, ValidationError> {
    match event.query_string_parameters_ref().and_then(|q| q.first(name)) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ValidationError::InvalidField(format!("{} must be a non-negative integer", name))),
        None => Ok(default),
    }
}

async fn list(state: &AppState, event: &Request) -> Result<Response<Body>, Error> {
    let (limit, offset) = match (
        query_usize(event, "limit", DEFAULT_LIMIT),
        query_usize(event, "offset", 0),
    ) {
        (Ok(limit), Ok(offset)) => (limit.min(state.capacity), offset),
        (Err(e), _) | (_, Err(e)) => return from_error(&shared::Error::from(e)),
    };

    match state.store.list(limit, offset).await {
        Ok(page) => json_response(200, &page),
        Err(e) => from_error(&e),
    }
}

async fn save(state: &AppState, event: &Request) -> Result<Response<Body>, Error> {
    let record: NewHistoryRecord = shared::parse_body!(event.body());
    let record = match history::prepare(record, TemplateRegistry::builtin()) {
        Ok(record) => record,
        Err(e) => return from_error(&shared::Error::from(e)),
    };

    match state.store.append(record).await {
        Ok(id) => {
            info!(record_id = %id, "History record saved");
            json_response(200, &Ack::with_id(id))
        }
        Err(e) => from_error(&e),
    }
}

async fn remove(state: &AppState, event: &Request) -> Result<Response<Body>, Error> {
    let id = event
        .query_string_parameters_ref()
        .and_then(|q| q.first("id"))
        .map(str::trim)
        .filter(|id| !id.is_empty());

    let Some(id) = id else {
        return from_error(&shared::Error::from(ValidationError::MissingRecordId));
    };

    match state.store.delete(id).await {
        Ok(deleted) => {
            info!(record_id = %id, deleted, "History delete");
            json_response(200, &Ack::ok())
        }
        Err(e) => from_error(&e),
    }
}

async fn handler(state: Arc<AppState>, event: Request) -> Result<Response<Body>, Error> {
    match *event.method() {
        Method::GET => list(&state, &event).await,
        Method::POST => save(&state, &event).await,
        Method::DELETE => remove(&state, &event).await,
        _ => error_response(405, "Method not allowed"),
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
