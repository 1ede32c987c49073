//! HookRPC Server
//!
//! This crate provides the service side of hookrpc: a per-service
//! [`MethodRegistry`] of exposed methods, the [`Dispatcher`] that turns raw
//! request text into raw response text, and two transport adapters around
//! it ([`HttpServer`] and [`CgiHandler`]).

pub mod cgi;
pub mod dispatcher;
pub mod http_server;
pub mod registry;

pub use cgi::CgiHandler;
pub use dispatcher::{Dispatcher, DispatcherConfig};
pub use http_server::{HttpServer, INTERNAL_ERROR_MESSAGE};
pub use registry::{MethodHandler, MethodRegistry, Namespace, Service, ServiceMethod};
