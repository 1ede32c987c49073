//! Service proxy
//!
//! [`ServiceProxy`] builds request envelopes for a remote service, sends
//! them through a [`Transport`] and turns the response back into a value or
//! a [`ProxyError`].
//!
//! Method names compose by selection: a proxy for service `Calc` that
//! selects `divide` calls `Calc.divide`.
//!
//! # Example
//!
//! ```no_run
//! use hookrpc_client::ServiceProxy;
//! use hookrpc_common::CallArgs;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), hookrpc_client::ClientError> {
//!     let calc = ServiceProxy::http("http://127.0.0.1:9288/")?.select("Calc");
//!     let quotient = calc.select("divide").call(CallArgs::new().arg(10).kwarg("b", 2)).await?;
//!     println!("{quotient:?}");
//!     Ok(())
//! }
//! ```

use rand::Rng;
use serde_json::Value;
use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use hookrpc_common::protocol::{
    CallArgs, ObjectHookRegistry, RequestEnvelope, RpcMap, RpcValue, SUBSPEC_1A,
};

use crate::error::{ClientError, ProxyError};
use crate::transport::{HttpTransport, Transport};

/// Range request ids are drawn from. Ids are random, not guaranteed unique.
pub const ID_RANGE: Range<u32> = 1..100_000;

/// Client-side handle on a remote service or method.
#[derive(Clone)]
pub struct ServiceProxy {
    transport: Arc<dyn Transport>,
    hooks: Arc<ObjectHookRegistry>,
    service_name: Option<String>,
}

impl ServiceProxy {
    /// Creates a proxy for the unnamed namespace, with an empty hook
    /// registry.
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self {
            transport: Arc::new(transport),
            hooks: Arc::new(ObjectHookRegistry::new()),
            service_name: None,
        }
    }

    /// Shorthand for a proxy over [`HttpTransport`].
    pub fn http(url: impl Into<String>) -> Result<Self, ClientError> {
        Ok(Self::new(HttpTransport::new(url)?))
    }

    pub fn with_service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = Some(name.into());
        self
    }

    /// Uses `hooks` to decode domain objects in results.
    pub fn with_hooks(mut self, hooks: Arc<ObjectHookRegistry>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn hooks(&self) -> &Arc<ObjectHookRegistry> {
        &self.hooks
    }

    /// The dotted name calls on this proxy go to.
    pub fn method_name(&self) -> Option<&str> {
        self.service_name.as_deref()
    }

    /// Returns a proxy for `name` below this one.
    pub fn select(&self, name: &str) -> Self {
        let service_name = match &self.service_name {
            Some(parent) => format!("{parent}.{name}"),
            None => name.to_string(),
        };
        Self {
            transport: Arc::clone(&self.transport),
            hooks: Arc::clone(&self.hooks),
            service_name: Some(service_name),
        }
    }

    /// Calls the selected method and returns its result.
    ///
    /// Only the halves of `args` that are non-empty are sent.
    pub async fn call(&self, args: CallArgs) -> Result<RpcValue, ClientError> {
        let id = rand::thread_rng().gen_range(ID_RANGE);
        let request = self.build_request(args, Some(id))?;
        let method = self.method_name().unwrap_or_default();
        tracing::debug!("Calling {} (id {})", method, id);

        let response = self.transport.send(request).await?;
        self.decode_response(&response)
    }

    /// [`call`](Self::call) with the arguments given as separate halves.
    pub async fn invoke(
        &self,
        positional: Vec<RpcValue>,
        keyword: RpcMap,
    ) -> Result<RpcValue, ClientError> {
        self.call(CallArgs::from_parts(positional, keyword)).await
    }

    /// Sends the call as a notification; any response body is ignored.
    pub async fn notify(&self, args: CallArgs) -> Result<(), ClientError> {
        let request = self.build_request(args, None)?;
        self.transport.send(request).await?;
        Ok(())
    }

    fn build_request(&self, args: CallArgs, id: Option<u32>) -> Result<String, ClientError> {
        let method = self.method_name().ok_or(ClientError::NoMethod)?;
        let mut request = RequestEnvelope::new(method)
            .with_subspec(SUBSPEC_1A)
            .with_params(args.into_params());
        if let Some(id) = id {
            request = request.with_id(id);
        }
        Ok(serde_json::to_string(&request.encode()?)?)
    }

    fn decode_response(&self, raw: &str) -> Result<RpcValue, ClientError> {
        let response: Value = serde_json::from_str(raw)?;
        let Value::Object(mut response) = response else {
            return Err(ClientError::InvalidResponse(format!(
                "expected a JSON object, got `{raw}`"
            )));
        };

        if let Some(error) = ProxyError::from_response(&response) {
            return Err(error.into());
        }

        let result = response
            .remove("result")
            .ok_or_else(|| ClientError::InvalidResponse("missing `result` member".to_string()))?;
        Ok(self.hooks.decode(result)?)
    }
}

impl fmt::Debug for ServiceProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceProxy")
            .field("service_name", &self.service_name)
            .field("hooks", &self.hooks)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::FnTransport;
    use serde_json::json;
    use std::sync::Mutex;

    /// Records every request and answers with a canned body.
    fn recording(answer: &'static str) -> (ServiceProxy, Arc<Mutex<Vec<Value>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);
        let proxy = ServiceProxy::new(FnTransport::new(move |request: String| {
            log.lock()
                .unwrap()
                .push(serde_json::from_str(&request).unwrap());
            Ok(answer.to_string())
        }));
        (proxy, seen)
    }

    #[test]
    fn test_select_composes_names() {
        let (proxy, _) = recording("");
        assert_eq!(proxy.method_name(), None);
        assert_eq!(proxy.select("divide").method_name(), Some("divide"));
        assert_eq!(
            proxy.select("Calc").select("divide").method_name(),
            Some("Calc.divide")
        );
        assert_eq!(
            proxy.with_service_name("Calc").select("divide").method_name(),
            Some("Calc.divide")
        );
    }

    #[tokio::test]
    async fn test_request_shape() {
        let (proxy, seen) = recording(r#"{"jsonrpc":"2.0","id":1,"result":5}"#);
        let result = proxy
            .select("Calc.divide")
            .call(CallArgs::new().arg(10).kwarg("b", 2))
            .await
            .unwrap();
        assert_eq!(result, RpcValue::from(5));

        let request = seen.lock().unwrap().remove(0);
        assert_eq!(request["jsonrpc"], json!("2.0"));
        assert_eq!(request["__subspec__"], json!("1a"));
        assert_eq!(request["method"], json!("Calc.divide"));
        assert_eq!(request["params"], json!({"__args__": [10], "__kwargs__": {"b": 2}}));
        let id = request["id"].as_u64().unwrap();
        assert!((1..100_000).contains(&id));
    }

    #[tokio::test]
    async fn test_only_supplied_halves_are_sent() {
        let (proxy, seen) = recording(r#"{"result":null}"#);
        let method = proxy.select("m");
        method.call(CallArgs::new().arg(1)).await.unwrap();
        method.call(CallArgs::new().kwarg("k", 1)).await.unwrap();
        method.call(CallArgs::new()).await.unwrap();

        let requests = seen.lock().unwrap();
        assert_eq!(requests[0]["params"], json!({"__args__": [1]}));
        assert_eq!(requests[1]["params"], json!({"__kwargs__": {"k": 1}}));
        assert!(requests[2].get("params").is_none());
    }

    #[tokio::test]
    async fn test_error_envelope_becomes_proxy_error() {
        let (proxy, _) = recording(r#"{"jsonrpc":"2.0","id":1,"error":"Service method 'x' not found.","code":-32601}"#);
        let err = proxy.select("x").call(CallArgs::new()).await.unwrap_err();
        match err {
            ClientError::Proxy(err) => {
                assert_eq!(err.code, Some(-32601));
                assert_eq!(err.message, "Service method 'x' not found.");
            }
            other => panic!("expected proxy error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_notify_has_no_id() {
        let (proxy, seen) = recording("");
        proxy.select("log").notify(CallArgs::new().arg("hello")).await.unwrap();
        let request = seen.lock().unwrap().remove(0);
        assert!(request.get("id").is_none());
        assert_eq!(request["method"], json!("log"));
    }

    #[tokio::test]
    async fn test_call_without_method() {
        let (proxy, seen) = recording("");
        let err = proxy.call(CallArgs::new()).await.unwrap_err();
        assert!(matches!(err, ClientError::NoMethod));
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_responses() {
        let (proxy, _) = recording("[1, 2]");
        assert!(matches!(
            proxy.select("m").call(CallArgs::new()).await.unwrap_err(),
            ClientError::InvalidResponse(_)
        ));

        let (proxy, _) = recording(r#"{"id": 1}"#);
        assert!(matches!(
            proxy.select("m").call(CallArgs::new()).await.unwrap_err(),
            ClientError::InvalidResponse(_)
        ));

        let (proxy, _) = recording("not json");
        assert!(matches!(
            proxy.select("m").call(CallArgs::new()).await.unwrap_err(),
            ClientError::Json(_)
        ));
    }
}
