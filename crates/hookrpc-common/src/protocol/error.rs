//! Protocol error taxonomy
//!
//! Every failure the dispatcher can turn into an error envelope is a
//! [`ServiceError`]. Each variant maps to a JSON-RPC error code:
//!
//! | Variant          | Code     |
//! |------------------|----------|
//! | `Parse`          | `-32700` |
//! | `Decode`         | `-32600` |
//! | `MethodNotFound` | `-32601` |
//! | `Encode`         | `-32603` |
//! | `Application`    | `-32000`, or the code of an attached [`ApplicationError`] |

use thiserror::Error;

/// Invalid JSON was received
pub const PARSE_ERROR: i32 = -32700;
/// The JSON sent is not a valid request envelope
pub const INVALID_REQUEST: i32 = -32600;
/// The method does not exist or is not exposed
pub const METHOD_NOT_FOUND: i32 = -32601;
/// Invalid method parameter(s)
pub const INVALID_PARAMS: i32 = -32602;
/// Internal error, e.g. a result that cannot be encoded
pub const INTERNAL_ERROR: i32 = -32603;
/// Default code for failures raised by a service method
pub const SERVER_ERROR: i32 = -32000;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// The outer text is not JSON at all.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The message is JSON but not a conforming request envelope.
    #[error("{0}")]
    Decode(String),

    #[error("Service method '{0}' not found.")]
    MethodNotFound(String),

    /// A result could not be turned back into JSON.
    #[error("{0}")]
    Encode(String),

    /// Anything raised by the invoked method.
    #[error(transparent)]
    Application(anyhow::Error),
}

impl ServiceError {
    pub fn code(&self) -> i32 {
        match self {
            ServiceError::Parse(_) => PARSE_ERROR,
            ServiceError::Decode(_) => INVALID_REQUEST,
            ServiceError::MethodNotFound(_) => METHOD_NOT_FOUND,
            ServiceError::Encode(_) => INTERNAL_ERROR,
            ServiceError::Application(err) => err
                .downcast_ref::<ApplicationError>()
                .map(|app| app.code)
                .unwrap_or(SERVER_ERROR),
        }
    }

    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Formatted failure trace for the `data` member of an error envelope.
    ///
    /// Only application failures carry one: the cause chain of the
    /// `anyhow::Error`, plus a backtrace when `RUST_BACKTRACE` enables it.
    pub fn diagnostics(&self) -> Option<String> {
        match self {
            ServiceError::Application(err) => Some(format!("{err:?}")),
            _ => None,
        }
    }
}

/// An error a service method raises to pick its own protocol code.
///
/// ```
/// use hookrpc_common::protocol::ApplicationError;
///
/// let err = ApplicationError::with_code(-32042, "quota exceeded");
/// assert_eq!(err.code, -32042);
/// ```
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ApplicationError {
    pub code: i32,
    pub message: String,
}

impl ApplicationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self::with_code(SERVER_ERROR, message)
    }

    pub fn with_code(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::with_code(INVALID_PARAMS, message)
    }
}

impl From<ApplicationError> for ServiceError {
    fn from(err: ApplicationError) -> Self {
        ServiceError::Application(err.into())
    }
}

/// Failures of the object-hook codec.
#[derive(Debug, Error)]
pub enum HookError {
    #[error("Could not decode class. Object hook for class `{0}` not found.")]
    UnknownClass(String),

    #[error("Malformed class hook: {0}")]
    Malformed(String),

    #[error("Could not reconstruct `{class}`: {message}")]
    Construction { class: String, message: String },

    #[error("`{class}` has no attribute `{attribute}` named in its reconstruction spec")]
    MissingAttribute { class: String, attribute: String },
}

impl From<HookError> for ServiceError {
    fn from(err: HookError) -> Self {
        match err {
            HookError::MissingAttribute { .. } => ServiceError::Encode(err.to_string()),
            _ => ServiceError::Decode(err.to_string()),
        }
    }
}
