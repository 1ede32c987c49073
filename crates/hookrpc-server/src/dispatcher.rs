//! Dispatcher
//!
//! The single entry point every transport adapter calls: raw message text
//! in, raw response text out.
//!
//! # Architecture
//!
//! ```text
//! raw text -> JSON -> RequestEnvelope (object hooks applied to params)
//!          -> MethodRegistry::resolve -> CallArgs -> method
//!          -> result encoded through object hooks -> ResponseEnvelope -> raw text
//! ```
//!
//! Every failure along the way becomes an error envelope. Notifications
//! (requests without an `id`) produce an empty string once they have
//! decoded, whether the call succeeded or not.

use serde_json::Value;
use std::sync::Arc;

use hookrpc_common::protocol::{
    encode_value, ErrorMapper, ObjectHookRegistry, RequestEnvelope, RequestMeta, ResponseBuilder,
    ResponseEnvelope, ServiceError, INTERNAL_ERROR,
};

use crate::registry::MethodRegistry;

/// Per-service dispatch settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Attach the failure trace of application errors as `data`.
    pub show_stack_trace: bool,
}

/// Runs requests against one service's method and hook registries.
///
/// `handle` takes `&self` and touches no mutable state besides the hook
/// registry's lock, so one dispatcher can serve concurrent requests from
/// behind an `Arc`.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    methods: Arc<MethodRegistry>,
    hooks: Arc<ObjectHookRegistry>,
    config: DispatcherConfig,
}

impl Dispatcher {
    /// Creates a dispatcher with its own, empty hook registry.
    pub fn new(methods: MethodRegistry) -> Self {
        Self::with_hooks(methods, Arc::new(ObjectHookRegistry::new()))
    }

    /// Creates a dispatcher decoding params through `hooks`.
    pub fn with_hooks(methods: MethodRegistry, hooks: Arc<ObjectHookRegistry>) -> Self {
        Self {
            methods: Arc::new(methods),
            hooks,
            config: DispatcherConfig::default(),
        }
    }

    pub fn with_config(mut self, config: DispatcherConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_stack_trace(mut self, show_stack_trace: bool) -> Self {
        self.config.show_stack_trace = show_stack_trace;
        self
    }

    pub fn config(&self) -> DispatcherConfig {
        self.config
    }

    pub fn methods(&self) -> &MethodRegistry {
        &self.methods
    }

    pub fn hooks(&self) -> &Arc<ObjectHookRegistry> {
        &self.hooks
    }

    /// Handles one raw message.
    ///
    /// Returns the serialized response envelope, or an empty string for a
    /// notification. Text that is not JSON at all gets a `-32700` envelope
    /// with no id.
    pub fn handle(&self, raw: impl AsRef<[u8]>) -> String {
        match self.try_handle(raw) {
            Ok(response) => response,
            Err(err) => {
                tracing::debug!("Rejecting message that is not JSON: {}", err);
                let error = ServiceError::Parse(err.to_string());
                self.serialize(ErrorMapper::to_error_envelope(
                    &error,
                    &RequestMeta::default(),
                    false,
                ))
            }
        }
    }

    /// Like [`handle`](Self::handle), but hands text that is not JSON back
    /// to the caller as an error instead of answering it.
    pub fn try_handle(&self, raw: impl AsRef<[u8]>) -> Result<String, serde_json::Error> {
        let message: Value = serde_json::from_slice(raw.as_ref())?;
        Ok(self
            .dispatch(message)
            .map(|response| self.serialize(response))
            .unwrap_or_default())
    }

    /// Dispatches an already parsed message.
    ///
    /// Returns `None` for a notification.
    pub fn dispatch(&self, message: Value) -> Option<ResponseEnvelope> {
        let peeked = RequestMeta::peek(&message);
        let request = match RequestEnvelope::decode(message, &self.hooks) {
            Ok(request) => request,
            Err(err) => {
                tracing::debug!("Rejecting malformed request: {}", err);
                return Some(self.error_envelope(&err, &peeked));
            }
        };

        let meta = request.meta();
        let method = request.method.clone();
        let notification = request.is_notification();
        tracing::debug!("Dispatching {} (notification: {})", method, notification);

        match (self.invoke(request), notification) {
            (Ok(_), true) => None,
            (Err(err), true) => {
                tracing::warn!("Notification {} failed: {}", method, err);
                None
            }
            (Ok(result), false) => Some(ResponseBuilder::success(&meta, result)),
            (Err(err), false) => {
                tracing::debug!("Method {} failed with code {}: {}", method, err.code(), err);
                Some(self.error_envelope(&err, &meta))
            }
        }
    }

    fn invoke(&self, request: RequestEnvelope) -> Result<Value, ServiceError> {
        let handler = self.methods.resolve(&request.method)?;
        let args = request.params.into_call_args();
        let result = handler(&args).map_err(ServiceError::Application)?;
        Ok(encode_value(&result)?)
    }

    fn error_envelope(&self, error: &ServiceError, meta: &RequestMeta) -> ResponseEnvelope {
        ErrorMapper::to_error_envelope(error, meta, self.config.show_stack_trace)
    }

    fn serialize(&self, response: ResponseEnvelope) -> String {
        response.to_json_string().unwrap_or_else(|err| {
            tracing::error!("Failed to serialize response: {}", err);
            format!(
                r#"{{"error":"Failed to serialize response","code":{}}}"#,
                INTERNAL_ERROR
            )
        })
    }
}
