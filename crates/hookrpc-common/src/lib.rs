//! HookRPC Common Types and Transport
//!
//! This crate holds the protocol core shared by the hookrpc server and
//! client: JSON-RPC 2.0 envelopes, the "1a" subspec for mixed positional
//! and keyword params, and object hooks for sending domain objects as
//! arguments and results.
//!
//! # Components
//!
//! - [`protocol`] - Values, envelopes, parameter binding, object hooks, errors
//! - [`transport`] - HTTP framing shared by the server and client adapters
//!
//! # Example
//!
//! ```
//! use hookrpc_common::{ObjectHookRegistry, RequestEnvelope, RpcValue};
//! use serde_json::json;
//!
//! let hooks = ObjectHookRegistry::new();
//! let request = RequestEnvelope::decode(
//!     json!({"jsonrpc": "2.0", "__subspec__": "1a", "method": "Calc.divide",
//!            "params": {"__args__": [10], "__kwargs__": {"b": 2}}, "id": 2}),
//!     &hooks,
//! )
//! .unwrap();
//!
//! let args = request.params.into_call_args();
//! assert_eq!(args.positional, vec![RpcValue::from(10)]);
//! assert_eq!(args.keyword["b"], RpcValue::from(2));
//! ```

pub mod protocol;
pub mod transport;

pub use protocol::*;
