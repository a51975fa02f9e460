//! Response normalization: the one place an `HttpResponse` becomes an
//! `ApiResult`.
//!
//! # Rules
//! 1. Non-2xx: the body is decoded leniently to pull out the backend's
//!    `detail` field; anything else yields `Request failed with status N`.
//! 2. 204: an empty JSON object, the body is never looked at.
//! 3. Other 2xx: the body must be valid JSON.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::{ApiError, ApiResult};
use crate::http::{HttpResponse, NO_CONTENT};
use crate::transport::TransportError;

/// Name of the error message field in backend error bodies.
pub const MESSAGE_FIELD: &str = "detail";

/// Normalize a raw response into the untyped success payload or an error.
pub fn normalize(response: &HttpResponse) -> ApiResult<Value> {
    if !response.is_success() {
        let message = server_message(&response.body)
            .unwrap_or_else(|| format!("Request failed with status {}", response.status));
        warn!(status = response.status, %message, "request failed");
        return Err(ApiError::HttpStatus {
            status: response.status,
            message,
        });
    }

    if response.status == NO_CONTENT {
        return Ok(Value::Object(Map::new()));
    }

    serde_json::from_str(&response.body).map_err(|e| {
        warn!(status = response.status, error = %e, "response body is not JSON");
        ApiError::decode(e)
    })
}

/// Normalize the outcome of a transport call, folding transport errors into
/// `ApiError::Network`.
pub fn normalize_outcome(outcome: Result<HttpResponse, TransportError>) -> ApiResult<Value> {
    match outcome {
        Ok(response) => normalize(&response),
        Err(err) => {
            warn!(error = %err, "transport failure");
            Err(ApiError::Network {
                message: err.message().to_string(),
            })
        }
    }
}

/// Decode a normalized payload into the operation's result type.
pub fn decode<T: DeserializeOwned>(value: Value) -> ApiResult<T> {
    serde_json::from_value(value).map_err(|e| {
        warn!(error = %e, "unexpected response shape");
        ApiError::decode(e)
    })
}

fn server_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    match value.get(MESSAGE_FIELD)? {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        // Validation errors carry a list; show it as JSON rather than drop it.
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::error::{ErrorKind, UNKNOWN_ERROR};

    #[test]
    fn no_content_ignores_the_body() {
        let value = normalize(&HttpResponse::new(204, "this is not json")).unwrap();
        assert_eq!(value, json!({}));
    }

    #[test]
    fn ok_body_is_decoded() {
        let value = normalize(&HttpResponse::new(200, r#"[{"day":"Mon","views":120}]"#)).unwrap();
        assert_eq!(value[0]["views"], 120);
    }

    #[test]
    fn ok_with_invalid_json_is_decode_failure() {
        let err = normalize(&HttpResponse::new(200, "<html>")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DecodeFailure);
    }

    #[test]
    fn ok_with_empty_body_is_decode_failure() {
        let err = normalize(&HttpResponse::new(200, "")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DecodeFailure);
    }

    #[test]
    fn error_detail_is_used_verbatim() {
        let err = normalize(&HttpResponse::new(404, r#"{"detail":"User not found"}"#)).unwrap_err();
        assert_eq!(err.to_string(), "User not found");
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn error_without_json_mentions_status() {
        let err = normalize(&HttpResponse::new(502, "Bad Gateway")).unwrap_err();
        assert_eq!(err.to_string(), "Request failed with status 502");
    }

    #[test]
    fn error_with_empty_or_null_detail_mentions_status() {
        let err = normalize(&HttpResponse::new(400, r#"{"detail":""}"#)).unwrap_err();
        assert_eq!(err.to_string(), "Request failed with status 400");
        let err = normalize(&HttpResponse::new(400, r#"{"detail":null}"#)).unwrap_err();
        assert_eq!(err.to_string(), "Request failed with status 400");
        let err = normalize(&HttpResponse::new(500, r#"{"error":"boom"}"#)).unwrap_err();
        assert_eq!(err.to_string(), "Request failed with status 500");
    }

    #[test]
    fn structured_detail_is_rendered_as_json() {
        let err = normalize(&HttpResponse::new(422, r#"{"detail":[{"msg":"field required"}]}"#))
            .unwrap_err();
        assert_eq!(err.to_string(), r#"[{"msg":"field required"}]"#);
    }

    #[test]
    fn transport_errors_become_network_failures() {
        let err = normalize_outcome(Err(TransportError::new("connection refused"))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NetworkFailure);
        assert_eq!(err.to_string(), "connection refused");

        let err = normalize_outcome(Err(TransportError::unknown())).unwrap_err();
        assert_eq!(err.to_string(), UNKNOWN_ERROR);
    }

    #[test]
    fn decode_reports_shape_mismatch() {
        let err = decode::<Vec<String>>(json!({})).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DecodeFailure);
    }
}
