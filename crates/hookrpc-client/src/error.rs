use serde_json::Value;
use thiserror::Error;

use hookrpc_common::protocol::HookError;
use hookrpc_common::transport::TransportError;

/// Client-side failures.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server answered with an error envelope.
    #[error(transparent)]
    Proxy(#[from] ProxyError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Object hook error: {0}")]
    Hook(#[from] HookError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("No method selected on this proxy")]
    NoMethod,
}

/// An error envelope returned by the server.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct ProxyError {
    pub message: String,
    pub code: Option<i64>,
    pub data: Option<Value>,
}

impl ProxyError {
    /// Reads the error out of a response object.
    ///
    /// Accepts the flat form (`"error": "<message>", "code": ..., "data": ...`)
    /// and the standard nested form (`"error": {"code", "message", "data"}`).
    pub fn from_response(response: &serde_json::Map<String, Value>) -> Option<Self> {
        let error = response.get("error")?;
        Some(match error {
            Value::Object(nested) => Self {
                message: nested
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                code: nested.get("code").and_then(Value::as_i64),
                data: nested.get("data").cloned(),
            },
            Value::String(message) => Self {
                message: message.clone(),
                code: response.get("code").and_then(Value::as_i64),
                data: response.get("data").cloned(),
            },
            other => Self {
                message: other.to_string(),
                code: response.get("code").and_then(Value::as_i64),
                data: response.get("data").cloned(),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> serde_json::Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_flat_error() {
        let err = ProxyError::from_response(&object(
            json!({"jsonrpc": "2.0", "id": 1, "error": "boom", "code": -32000, "data": "trace"}),
        ))
        .unwrap();
        assert_eq!(err.message, "boom");
        assert_eq!(err.code, Some(-32000));
        assert_eq!(err.data, Some(json!("trace")));
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn test_nested_error() {
        let err = ProxyError::from_response(&object(
            json!({"id": 1, "error": {"code": -32601, "message": "Method not found"}}),
        ))
        .unwrap();
        assert_eq!(err.message, "Method not found");
        assert_eq!(err.code, Some(-32601));
        assert_eq!(err.data, None);
    }

    #[test]
    fn test_no_error_member() {
        assert!(ProxyError::from_response(&object(json!({"id": 1, "result": 2}))).is_none());
    }
}
