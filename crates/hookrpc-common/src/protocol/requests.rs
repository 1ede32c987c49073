//! Request envelopes
//!
//! A request is a JSON object:
//!
//! ```json
//! {"jsonrpc": "2.0", "__subspec__": "1a", "method": "Calc.divide",
//!  "params": {"__args__": [10], "__kwargs__": {"b": 2}}, "id": 2}
//! ```
//!
//! `jsonrpc` and `method` are required. A request without an `id` (or with
//! `"id": null`) is a notification.

use serde_json::{Map, Value};

use super::error::{HookError, ServiceError};
use super::hook::ObjectHookRegistry;
use super::params::Params;

/// Protocol version written by this crate
pub const JSONRPC_VERSION: &str = "2.0";
/// Version member
pub const VERSION_KEY: &str = "jsonrpc";
/// Subspec tag member
pub const SUBSPEC_KEY: &str = "__subspec__";
pub const METHOD_KEY: &str = "method";
pub const PARAMS_KEY: &str = "params";
pub const ID_KEY: &str = "id";

/// One validated call or notification.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestEnvelope {
    pub version: String,
    pub subspec: Option<String>,
    pub id: Option<Value>,
    pub method: String,
    pub params: Params,
}

impl RequestEnvelope {
    /// Creates a notification for `method` with no params.
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            version: JSONRPC_VERSION.to_string(),
            subspec: None,
            id: None,
            method: method.into(),
            params: Params::None,
        }
    }

    pub fn with_id(mut self, id: impl Into<Value>) -> Self {
        self.id = Some(id.into()).filter(|id| !id.is_null());
        self
    }

    pub fn with_subspec(mut self, subspec: impl Into<String>) -> Self {
        self.subspec = Some(subspec.into());
        self
    }

    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    /// Metadata echoed into the response.
    pub fn meta(&self) -> RequestMeta {
        RequestMeta::from(self)
    }

    /// Validates a parsed message, running `params` through the object
    /// hooks.
    pub fn decode(message: Value, hooks: &ObjectHookRegistry) -> Result<Self, ServiceError> {
        let mut fields = match message {
            Value::Object(fields) => fields,
            other => {
                return Err(ServiceError::Decode(format!(
                    "Request must be a JSON object, got {}",
                    json_type(&other)
                )))
            }
        };

        let method = required_string(&mut fields, METHOD_KEY)?;
        let version = required_string(&mut fields, VERSION_KEY)?;

        let subspec = match fields.remove(SUBSPEC_KEY) {
            None | Some(Value::Null) => None,
            Some(Value::String(subspec)) => Some(subspec),
            Some(other) => {
                return Err(ServiceError::Decode(format!(
                    "Invalid type \"{}\" for value of \"{}\" keyword. Must be string.",
                    json_type(&other),
                    SUBSPEC_KEY
                )))
            }
        };

        let id = match fields.remove(ID_KEY) {
            None | Some(Value::Null) => None,
            Some(id @ (Value::String(_) | Value::Number(_) | Value::Bool(_))) => Some(id),
            Some(other) => {
                return Err(ServiceError::Decode(format!(
                    "Invalid type \"{}\" for value of \"{}\" keyword. Must be a scalar.",
                    json_type(&other),
                    ID_KEY
                )))
            }
        };

        let params = fields
            .remove(PARAMS_KEY)
            .map(|params| hooks.decode(params))
            .transpose()?;
        let params = Params::parse(params, subspec.as_deref())?;

        Ok(Self {
            version,
            subspec,
            id,
            method,
            params,
        })
    }

    /// Serializes the envelope, describing domain objects in `params`
    /// through their reconstruction spec.
    pub fn encode(&self) -> Result<Value, HookError> {
        let mut fields = Map::new();
        fields.insert(VERSION_KEY.to_string(), Value::String(self.version.clone()));
        if let Some(subspec) = &self.subspec {
            fields.insert(SUBSPEC_KEY.to_string(), Value::String(subspec.clone()));
        }
        fields.insert(METHOD_KEY.to_string(), Value::String(self.method.clone()));
        if let Some(params) = self.params.to_wire()? {
            fields.insert(PARAMS_KEY.to_string(), params);
        }
        if let Some(id) = &self.id {
            fields.insert(ID_KEY.to_string(), id.clone());
        }
        Ok(Value::Object(fields))
    }
}

fn required_string(fields: &mut Map<String, Value>, key: &str) -> Result<String, ServiceError> {
    match fields.remove(key) {
        Some(Value::String(value)) => Ok(value),
        None => Err(ServiceError::Decode(format!(
            "Missing required parameter \"{key}\""
        ))),
        Some(other) => Err(ServiceError::Decode(format!(
            "Invalid type \"{}\" for value of \"{key}\" keyword. Must be string.",
            json_type(&other)
        ))),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// The parts of a request a response echoes back.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestMeta {
    pub version: Option<String>,
    pub id: Option<Value>,
    pub subspec: Option<String>,
}

impl RequestMeta {
    /// Best-effort metadata from a message that failed to decode.
    ///
    /// Members with the wrong type are left out rather than echoed.
    pub fn peek(message: &Value) -> Self {
        let field = |key: &str| message.get(key);
        Self {
            version: field(VERSION_KEY)
                .and_then(Value::as_str)
                .map(str::to_string),
            id: field(ID_KEY)
                .filter(|id| id.is_string() || id.is_number() || id.is_boolean())
                .cloned(),
            subspec: field(SUBSPEC_KEY)
                .and_then(Value::as_str)
                .map(str::to_string),
        }
    }
}

impl From<&RequestEnvelope> for RequestMeta {
    fn from(request: &RequestEnvelope) -> Self {
        Self {
            version: Some(request.version.clone()),
            id: request.id.clone(),
            subspec: request.subspec.clone(),
        }
    }
}
