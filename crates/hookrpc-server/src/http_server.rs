//! HTTP Server
//!
//! Serves a [`Dispatcher`] over HTTP/1.1 using hyper.
//!
//! # Architecture
//!
//! The HTTP server:
//! - Listens on a TCP socket for incoming HTTP connections
//! - Spawns a tokio task for each connection
//! - Accepts `POST` only; the body is one raw request envelope
//! - Runs the dispatcher on the blocking pool, since service methods are
//!   plain synchronous functions
//! - Answers `200` with the response envelope, or `204` for notifications
//!
//! # Example
//!
//! ```no_run
//! use hookrpc_server::{Dispatcher, HttpServer, MethodRegistry};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let dispatcher = Arc::new(Dispatcher::new(MethodRegistry::new()));
//!     let server = HttpServer::new(dispatcher);
//!     server.run("127.0.0.1:9288".parse().unwrap()).await.unwrap();
//! }
//! ```

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, StatusCode};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use hookrpc_common::protocol::{ErrorMapper, RequestMeta, ServiceError};
use hookrpc_common::transport::{HttpCodec, HyperRequest, HyperResponse, TransportError};

use crate::dispatcher::Dispatcher;

/// Message sent when a dispatch task dies without producing a response
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal error";

/// HTTP adapter around a dispatcher.
pub struct HttpServer {
    dispatcher: Arc<Dispatcher>,
}

impl HttpServer {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }

    /// Binds `addr` and serves until the accept loop fails.
    ///
    /// # Arguments
    ///
    /// * `addr` - The socket address to bind to
    pub async fn run(self, addr: SocketAddr) -> Result<(), TransportError> {
        let listener = TcpListener::bind(addr).await?;
        self.serve(listener).await
    }

    /// Serves connections from an already bound listener.
    pub async fn serve(self, listener: TcpListener) -> Result<(), TransportError> {
        tracing::info!("HTTP server listening on {}", listener.local_addr()?);

        loop {
            let (stream, peer) = listener.accept().await?;
            tracing::debug!("Accepted connection from {}", peer);

            let io = TokioIo::new(stream);
            let dispatcher = Arc::clone(&self.dispatcher);

            tokio::task::spawn(async move {
                let service = service_fn(move |req| {
                    let dispatcher = Arc::clone(&dispatcher);
                    async move { Self::handle_request(dispatcher, req).await }
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    tracing::error!("Error serving connection: {}", err);
                }
            });
        }
    }

    async fn handle_request(
        dispatcher: Arc<Dispatcher>,
        req: HyperRequest,
    ) -> Result<HyperResponse, TransportError> {
        if req.method() != Method::POST {
            tracing::debug!("Rejecting {} request", req.method());
            let error = ServiceError::Decode("Only POST requests are supported".to_string());
            let envelope = ErrorMapper::to_error_envelope(&error, &RequestMeta::default(), false);
            return Ok(HttpCodec::with_status(
                StatusCode::METHOD_NOT_ALLOWED,
                envelope.to_json_string().unwrap_or_default(),
            ));
        }

        let body = HttpCodec::read_body(req.into_body()).await?;

        let output = match tokio::task::spawn_blocking(move || dispatcher.handle(&body)).await {
            Ok(output) => output,
            Err(err) => {
                // the panic payload stays in the log
                tracing::error!("Dispatch task failed: {}", err);
                let error = ServiceError::Encode(INTERNAL_ERROR_MESSAGE.to_string());
                let envelope =
                    ErrorMapper::to_error_envelope(&error, &RequestMeta::default(), false);
                return Ok(HttpCodec::with_status(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    envelope.to_json_string().unwrap_or_default(),
                ));
            }
        };

        Ok(HttpCodec::rpc_response(output))
    }
}
