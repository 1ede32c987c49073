//! Client transports
//!
//! A [`Transport`] carries one raw request envelope to the service and
//! returns the raw response text. The proxy never looks below this seam.

use async_trait::async_trait;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use std::fmt;
use std::time::Duration;

use hookrpc_common::transport::{HttpCodec, TransportError};

use crate::error::ClientError;

/// Default time allowed for one HTTP round trip
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends `request` and returns the response body. A notification may
    /// get an empty body back.
    async fn send(&self, request: String) -> Result<String, ClientError>;
}

/// Posts envelopes to an HTTP endpoint.
///
/// Plain HTTP only: the client has no TLS connector, so `https://` URLs are
/// rejected by [`HttpTransport::new`].
#[derive(Clone)]
pub struct HttpTransport {
    url: String,
    client: Client<HttpConnector, Full<Bytes>>,
    timeout: Duration,
}

impl HttpTransport {
    /// Creates a transport for `url`, which must be an `http://` URL.
    pub fn new(url: impl Into<String>) -> Result<Self, ClientError> {
        let url = url.into();
        let uri = HttpCodec::parse_url(&url)?;
        if uri.scheme_str() != Some("http") {
            return Err(TransportError::InvalidUrl {
                url,
                reason: "HTTPS is not supported, use an http:// URL".to_string(),
            }
            .into());
        }
        Ok(Self {
            url,
            client: Client::builder(TokioExecutor::new()).build_http(),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("url", &self.url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: String) -> Result<String, ClientError> {
        let http_request = HttpCodec::json_request(&self.url, request)?;

        let response = tokio::time::timeout(self.timeout, self.client.request(http_request))
            .await
            .map_err(|_| TransportError::Timeout(self.timeout))?
            .map_err(|err| TransportError::Client(err.to_string()))?;

        let status = response.status();
        let body = HttpCodec::read_body(response.into_body()).await?;
        let body = String::from_utf8_lossy(&body).into_owned();

        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        tracing::debug!("Received {} byte response from {}", body.len(), self.url);
        Ok(body)
    }
}

/// Adapts a synchronous closure into a [`Transport`].
///
/// Handy for in-process use, e.g. wiring a proxy straight to a
/// dispatcher in tests.
pub struct FnTransport<F> {
    send: F,
}

impl<F> FnTransport<F>
where
    F: Fn(String) -> Result<String, ClientError> + Send + Sync,
{
    pub fn new(send: F) -> Self {
        Self { send }
    }
}

#[async_trait]
impl<F> Transport for FnTransport<F>
where
    F: Fn(String) -> Result<String, ClientError> + Send + Sync,
{
    async fn send(&self, request: String) -> Result<String, ClientError> {
        (self.send)(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_transport_rejects_bad_urls() {
        let err = HttpTransport::new("localhost:9288").unwrap_err();
        assert!(matches!(
            err,
            ClientError::Transport(TransportError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_http_transport_rejects_https() {
        let err = HttpTransport::new("https://127.0.0.1:9288/").unwrap_err();
        match err {
            ClientError::Transport(TransportError::InvalidUrl { url, reason }) => {
                assert_eq!(url, "https://127.0.0.1:9288/");
                assert!(reason.contains("HTTPS is not supported"));
            }
            other => panic!("expected invalid URL, got {other:?}"),
        }
    }

    #[test]
    fn test_http_transport_debug_shows_url() {
        let transport = HttpTransport::new("http://127.0.0.1:9288/").unwrap();
        let rendered = format!("{transport:?}");
        assert!(rendered.contains("http://127.0.0.1:9288/"));
        assert!(rendered.contains("timeout"));
    }

    #[test]
    fn test_http_transport_keeps_url() {
        let transport = HttpTransport::new("http://127.0.0.1:9288/")
            .unwrap()
            .with_timeout(Duration::from_millis(50));
        assert_eq!(transport.url(), "http://127.0.0.1:9288/");
        assert_eq!(transport.timeout, Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_fn_transport() {
        let transport = FnTransport::new(|request: String| Ok(request.to_uppercase()));
        assert_eq!(transport.send("abc".into()).await.unwrap(), "ABC");
    }

    #[tokio::test]
    async fn test_unreachable_server() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/", listener.local_addr().unwrap());
        drop(listener);

        let transport = HttpTransport::new(url).unwrap();
        let err = transport.send("{}".into()).await.unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
    }
}
