//! Response envelopes.
//!
//! Every call through the executor ends in an [`ApiResponse`], whether the
//! server answered with data, answered with an error, or never answered.
//! ServiceNow wraps success bodies as `{ "result": ... }`; the envelope
//! holds the unwrapped value.

use std::error::Error as StdError;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::NowError;

/// Detail used when no HTTP response was received.
pub const REQUEST_ERROR_DETAIL: &str = "Request Error";

/// Detail used when a success body did not match `{ "result": ... }`.
pub const RESPONSE_ERROR_DETAIL: &str = "Response Error";

/// Error payload of a failed call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub message: String,
    #[serde(default)]
    pub detail: Option<String>,
}

impl ApiError {
    pub fn new(message: impl Into<String>, detail: Option<String>) -> Self {
        Self {
            message: message.into(),
            detail,
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.detail {
            Some(detail) => write!(f, "{} ({detail})", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Outcome of one API call.
///
/// `status` is the HTTP status, or a negative transport error number when no
/// response arrived. `result` holds either the unwrapped payload (absent for
/// empty bodies such as a DELETE's 204) or the error, never both.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse<T> {
    pub status: i32,
    /// Canonical reason for `status` (e.g. `Not Found`), or the transport
    /// error name. A custom reason phrase sent by the server is not kept,
    /// and non-standard codes give an empty string.
    pub status_text: String,
    pub result: Result<Option<T>, ApiError>,
}

impl<T> ApiResponse<T> {
    /// Whether the call succeeded.
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// The payload, if the call succeeded and returned one.
    pub fn data(&self) -> Option<&T> {
        self.result.as_ref().ok().and_then(Option::as_ref)
    }

    /// The error, if the call failed.
    pub fn error(&self) -> Option<&ApiError> {
        self.result.as_ref().err()
    }

    /// Consume the envelope, keeping only the payload.
    pub fn into_data(self) -> Option<T> {
        self.result.ok().flatten()
    }

    /// Turn an error envelope into [`NowError::Api`].
    ///
    /// # Errors
    ///
    /// Returns [`NowError::Api`] with the status and error of a failed call.
    pub fn into_result(self) -> crate::Result<Option<T>> {
        let status = self.status;
        self.result.map_err(|error| NowError::Api { status, error })
    }

    /// Map the payload type.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> ApiResponse<U> {
        ApiResponse {
            status: self.status,
            status_text: self.status_text,
            result: self.result.map(|data| data.map(f)),
        }
    }
}

#[derive(Deserialize)]
struct ResultWrapper<T> {
    result: T,
}

/// A transport failure, numbered with libuv error codes so callers can tell
/// DNS failures from refused connections and timeouts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError {
    pub errno: i32,
    pub name: &'static str,
    pub message: String,
}

impl TransportError {
    pub const ENOTFOUND: (i32, &'static str) = (-3008, "ENOTFOUND");
    pub const ECONNREFUSED: (i32, &'static str) = (-111, "ECONNREFUSED");
    pub const ETIMEDOUT: (i32, &'static str) = (-110, "ETIMEDOUT");
    pub const ECONNRESET: (i32, &'static str) = (-104, "ECONNRESET");
    pub const ERR_NETWORK: (i32, &'static str) = (-1, "ERR_NETWORK");

    /// Classify a reqwest error.
    pub fn classify(err: &reqwest::Error) -> Self {
        let chain = error_chain(err).to_lowercase();

        let (errno, name) = if err.is_timeout() {
            Self::ETIMEDOUT
        } else if chain.contains("dns error") || chain.contains("failed to lookup address") {
            Self::ENOTFOUND
        } else if chain.contains("connection reset") {
            Self::ECONNRESET
        } else if err.is_connect() {
            Self::ECONNREFUSED
        } else {
            Self::ERR_NETWORK
        };

        Self {
            errno,
            name,
            message: err.to_string(),
        }
    }
}

fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}

/// What came back from one send, before it is shaped into an envelope.
#[derive(Debug)]
pub(crate) enum Exchange {
    Response { status: StatusCode, body: Vec<u8> },
    Transport(TransportError),
}

impl Exchange {
    pub(crate) fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Response { status, .. } if *status == StatusCode::UNAUTHORIZED)
    }

    /// Build an envelope, unwrapping `{ "result": ... }` on success.
    pub(crate) fn into_envelope<T: DeserializeOwned>(self) -> ApiResponse<T> {
        match self {
            Self::Response { status, body } if status.is_success() => {
                let result = if body.iter().all(u8::is_ascii_whitespace) {
                    Ok(None)
                } else {
                    serde_json::from_slice::<ResultWrapper<T>>(&body)
                        .map(|wrapper| Some(wrapper.result))
                        .map_err(|e| {
                            ApiError::new(e.to_string(), Some(RESPONSE_ERROR_DETAIL.to_string()))
                        })
                };
                ApiResponse {
                    status: i32::from(status.as_u16()),
                    status_text: status_text(status),
                    result,
                }
            }
            other => other.into_failure(),
        }
    }

    /// Build an envelope around the raw body, with no unwrapping.
    pub(crate) fn into_raw_envelope(self) -> ApiResponse<Vec<u8>> {
        match self {
            Self::Response { status, body } if status.is_success() => ApiResponse {
                status: i32::from(status.as_u16()),
                status_text: status_text(status),
                result: Ok(Some(body)),
            },
            other => other.into_failure(),
        }
    }

    fn into_failure<T>(self) -> ApiResponse<T> {
        match self {
            Self::Response { status, body } => ApiResponse {
                status: i32::from(status.as_u16()),
                status_text: status_text(status),
                result: Err(extract_api_error(&body, status)),
            },
            Self::Transport(err) => ApiResponse {
                status: err.errno,
                status_text: err.name.to_string(),
                result: Err(ApiError::new(
                    err.message,
                    Some(REQUEST_ERROR_DETAIL.to_string()),
                )),
            },
        }
    }
}

fn status_text(status: StatusCode) -> String {
    status.canonical_reason().unwrap_or_default().to_string()
}

/// Pull an error out of a failed response body.
///
/// ServiceNow answers `{"error": {"message", "detail"}, "status": "failure"}`;
/// scripted endpoints sometimes return a flat `{"message", "detail"}`.
fn extract_api_error(body: &[u8], status: StatusCode) -> ApiError {
    if let Ok(json) = serde_json::from_slice::<serde_json::Value>(body) {
        if let Some(inner) = json.get("error") {
            if let Ok(err) = serde_json::from_value::<ApiError>(inner.clone()) {
                return err;
            }
            if let Some(msg) = inner.as_str() {
                return ApiError::new(msg, None);
            }
        }
        if let Ok(err) = serde_json::from_value::<ApiError>(json) {
            return err;
        }
    }

    let text = String::from_utf8_lossy(body).trim().to_string();
    if text.is_empty() {
        ApiError::new(format!("HTTP {status}"), None)
    } else {
        ApiError::new(text, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn response(status: u16, body: &str) -> Exchange {
        Exchange::Response {
            status: StatusCode::from_u16(status).unwrap(),
            body: body.as_bytes().to_vec(),
        }
    }

    #[test]
    fn test_success_unwraps_result() {
        let envelope: ApiResponse<Value> =
            response(200, r#"{"result": {"sys_id": "abc123"}}"#).into_envelope();

        assert_eq!(envelope.status, 200);
        assert_eq!(envelope.status_text, "OK");
        assert_eq!(envelope.data(), Some(&json!({"sys_id": "abc123"})));
        assert!(envelope.error().is_none());
    }

    #[test]
    fn test_empty_success_body_has_no_data() {
        let envelope: ApiResponse<Value> = response(204, "").into_envelope();
        assert!(envelope.is_success());
        assert!(envelope.data().is_none());
    }

    #[test]
    fn test_servicenow_error_shape() {
        let envelope: ApiResponse<Value> = response(
            404,
            r#"{"error": {"message": "No Record found", "detail": "Record doesn't exist"}, "status": "failure"}"#,
        )
        .into_envelope();

        assert_eq!(envelope.status, 404);
        assert_eq!(envelope.status_text, "Not Found");
        let err = envelope.error().unwrap();
        assert_eq!(err.message, "No Record found");
        assert_eq!(err.detail.as_deref(), Some("Record doesn't exist"));
        assert!(envelope.data().is_none());
    }

    #[test]
    fn test_plain_text_error_body() {
        let envelope: ApiResponse<Value> = response(500, "boom").into_envelope();
        assert_eq!(envelope.error().unwrap().message, "boom");

        let envelope: ApiResponse<Value> = response(503, "").into_envelope();
        assert!(envelope.error().unwrap().message.contains("503"));
    }

    #[test]
    fn test_missing_result_field_is_a_response_error() {
        let envelope: ApiResponse<Value> = response(200, r#"{"data": 1}"#).into_envelope();
        assert_eq!(envelope.status, 200);
        assert_eq!(
            envelope.error().unwrap().detail.as_deref(),
            Some(RESPONSE_ERROR_DETAIL)
        );
    }

    #[test]
    fn test_transport_failure_envelope() {
        let exchange = Exchange::Transport(TransportError {
            errno: -3008,
            name: "ENOTFOUND",
            message: "dns error".to_string(),
        });
        let envelope: ApiResponse<Value> = exchange.into_envelope();

        assert_eq!(envelope.status, -3008);
        assert_eq!(envelope.status_text, "ENOTFOUND");
        assert_eq!(
            envelope.error().unwrap().detail.as_deref(),
            Some(REQUEST_ERROR_DETAIL)
        );
    }

    #[test]
    fn test_raw_envelope_keeps_body() {
        let envelope = response(200, "hello").into_raw_envelope();
        assert_eq!(envelope.data().map(Vec::as_slice), Some(&b"hello"[..]));
    }

    #[test]
    fn test_into_result() {
        let ok: ApiResponse<Value> = response(200, r#"{"result": 1}"#).into_envelope();
        assert_eq!(ok.into_result().unwrap(), Some(json!(1)));

        let failed: ApiResponse<Value> = response(403, r#"{"error": {"message": "denied"}}"#).into_envelope();
        match failed.into_result() {
            Err(NowError::Api { status, error }) => {
                assert_eq!(status, 403);
                assert_eq!(error.message, "denied");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn test_only_401_is_unauthorized() {
        assert!(response(401, "").is_unauthorized());
        assert!(!response(403, "").is_unauthorized());
    }
}
