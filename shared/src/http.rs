//! HTTP helpers for Lambda functions.

use lambda_http::{Body, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::error;

use crate::Error;

/// Error body returned on every non-2xx response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Acknowledgement body for writes.
#[derive(Debug, Serialize)]
pub struct Ack {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl Ack {
    pub fn ok() -> Self {
        Self {
            success: true,
            id: None,
        }
    }

    pub fn with_id(id: String) -> Self {
        Self {
            success: true,
            id: Some(id),
        }
    }
}

/// Create a JSON response with the given status code and data.
pub fn json_response<T: Serialize>(status: u16, data: &T) -> Result<Response<Body>, lambda_http::Error> {
    let response = Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(data)?))
        .map_err(Box::new)?;

    Ok(response)
}

/// Create an error response with the given status code and message.
pub fn error_response(status: u16, message: impl Into<String>) -> Result<Response<Body>, lambda_http::Error> {
    json_response(
        status,
        &ErrorBody {
            error: message.into(),
        },
    )
}

/// Map a domain error to its HTTP response, logging server-side failures.
pub fn from_error(err: &Error) -> Result<Response<Body>, lambda_http::Error> {
    let status = err.status_code();
    if status >= 500 {
        error!(error = %err, status, "Request failed");
    }

    let message = match err {
        Error::Validation(inner) => inner.to_string(),
        other => other.to_string(),
    };
    error_response(status, message)
}

/// Parse request body as JSON, returning a 400 response on failure.
///
/// Returns `Ok(Ok(T))` on successful parse, `Ok(Err(Response))` on parse error (400),
/// or `Err(lambda_http::Error)` on serialization failure.
pub fn parse_json_body<T: DeserializeOwned>(body: &Body) -> Result<Result<T, Response<Body>>, lambda_http::Error> {
    match serde_json::from_slice(body.as_ref()) {
        Ok(parsed) => Ok(Ok(parsed)),
        Err(e) => {
            let response = error_response(400, format!("Invalid request body: {}", e))?;
            Ok(Err(response))
        }
    }
}

/// Macro to parse request body, returning early with 400 on parse error.
///
/// Usage:
/// ```ignore
/// let request: MyRequest = parse_body!(event.body());
/// ```
#[macro_export]
macro_rules! parse_body {
    ($body:expr) => {
        match shared::http::parse_json_body($body)? {
            Ok(parsed) => parsed,
            Err(response) => return Ok(response),
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;

    fn body_json(response: &Response<Body>) -> serde_json::Value {
        serde_json::from_slice(response.body().as_ref()).unwrap()
    }

    #[test]
    fn test_validation_error_response() {
        let response = from_error(&Error::from(ValidationError::MissingTopic)).unwrap();
        assert_eq!(response.status(), 400);
        assert_eq!(
            body_json(&response),
            serde_json::json!({"error": "topic is required for topic entries"})
        );
    }

    #[test]
    fn test_upstream_error_response() {
        let response = from_error(&Error::Upstream("search failed: 429".into())).unwrap();
        assert_eq!(response.status(), 502);
        assert_eq!(response.headers()["content-type"], "application/json");
    }

    #[test]
    fn test_parse_json_body_rejects_garbage() {
        let parsed: Result<serde_json::Value, _> =
            parse_json_body(&Body::from("not json")).unwrap();
        let response = parsed.unwrap_err();
        assert_eq!(response.status(), 400);
        assert!(body_json(&response)["error"]
            .as_str()
            .unwrap()
            .starts_with("Invalid request body"));
    }

    #[test]
    fn test_ack_shape() {
        assert_eq!(
            serde_json::to_value(Ack::with_id("history-1".into())).unwrap(),
            serde_json::json!({"success": true, "id": "history-1"})
        );
        assert_eq!(
            serde_json::to_value(Ack::ok()).unwrap(),
            serde_json::json!({"success": true})
        );
    }
}
