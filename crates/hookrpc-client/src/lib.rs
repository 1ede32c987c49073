//! HookRPC Client
//!
//! [`ServiceProxy`] calls methods on a remote hookrpc service. Requests are
//! always sent with subspec `"1a"`, so one call can carry positional and
//! keyword arguments together; domain objects in the arguments are
//! described through their reconstruction spec, and domain objects in
//! results are rebuilt through the proxy's [`ObjectHookRegistry`].
//!
//! The network is behind the [`Transport`] trait: [`HttpTransport`] posts
//! to an HTTP endpoint, [`FnTransport`] wraps any closure.
//!
//! [`ObjectHookRegistry`]: hookrpc_common::ObjectHookRegistry

pub mod error;
pub mod proxy;
pub mod transport;

pub use error::{ClientError, ProxyError};
pub use proxy::ServiceProxy;
pub use transport::{FnTransport, HttpTransport, Transport};
