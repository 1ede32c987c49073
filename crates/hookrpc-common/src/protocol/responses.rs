//! Response envelopes
//!
//! Success:
//!
//! ```json
//! {"jsonrpc": "2.0", "id": 1, "result": 5}
//! ```
//!
//! Failure keeps the error members flat next to the metadata:
//!
//! ```json
//! {"jsonrpc": "2.0", "id": 3, "error": "Service method 'Calc.nope' not found.", "code": -32601}
//! ```
//!
//! `__subspec__` is echoed whenever the request carried one.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::ServiceError;
use super::requests::RequestMeta;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    #[serde(rename = "jsonrpc", default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(rename = "__subspec__", default, skip_serializing_if = "Option::is_none")]
    pub subspec: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(flatten)]
    pub outcome: Outcome,
}

/// Either a result or an error payload.
///
/// `Failure` is listed first so that an error envelope is never mistaken
/// for a success with a null result when deserializing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Outcome {
    Failure(ErrorPayload),
    Success { result: Value },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    #[serde(rename = "error")]
    pub message: String,
    pub code: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

impl ResponseEnvelope {
    pub fn is_error(&self) -> bool {
        matches!(self.outcome, Outcome::Failure(_))
    }

    pub fn result(&self) -> Option<&Value> {
        match &self.outcome {
            Outcome::Success { result } => Some(result),
            Outcome::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&ErrorPayload> {
        match &self.outcome {
            Outcome::Failure(payload) => Some(payload),
            Outcome::Success { .. } => None,
        }
    }

    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Builds success envelopes.
pub struct ResponseBuilder;

impl ResponseBuilder {
    pub fn success(meta: &RequestMeta, result: Value) -> ResponseEnvelope {
        ResponseEnvelope {
            version: meta.version.clone(),
            subspec: meta.subspec.clone(),
            id: meta.id.clone(),
            outcome: Outcome::Success { result },
        }
    }
}

/// Turns a [`ServiceError`] into an error envelope.
pub struct ErrorMapper;

impl ErrorMapper {
    /// Builds the error envelope for `error`.
    ///
    /// # Arguments
    ///
    /// * `error` - the failure to report
    /// * `meta` - whatever is known about the originating request; unknown
    ///   members are omitted from the envelope
    /// * `include_diagnostics` - attach the failure trace as `data`
    pub fn to_error_envelope(
        error: &ServiceError,
        meta: &RequestMeta,
        include_diagnostics: bool,
    ) -> ResponseEnvelope {
        let data = if include_diagnostics {
            error.diagnostics()
        } else {
            None
        };
        ResponseEnvelope {
            version: meta.version.clone(),
            subspec: meta.subspec.clone(),
            id: meta.id.clone(),
            outcome: Outcome::Failure(ErrorPayload {
                message: error.message(),
                code: error.code(),
                data,
            }),
        }
    }
}
