//! HTTP Transport Utilities
//!
//! Envelopes travel as `POST` bodies with `Content-Type: application/json`.
//! A response with an empty dispatcher output (a notification) is sent as
//! `204 No Content`.
//!
//! # Example
//!
//! ```
//! use hookrpc_common::transport::http::HttpCodec;
//! use hyper::StatusCode;
//!
//! let response = HttpCodec::rpc_response(r#"{"jsonrpc":"2.0","id":1,"result":5}"#.to_string());
//! assert_eq!(response.status(), StatusCode::OK);
//!
//! let response = HttpCodec::rpc_response(String::new());
//! assert_eq!(response.status(), StatusCode::NO_CONTENT);
//! ```

use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Method, Request, Response, StatusCode, Uri};
use thiserror::Error;

/// Media type of every envelope
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Type alias for Hyper incoming requests
pub type HyperRequest = Request<Incoming>;

/// Type alias for Hyper responses with full body
pub type HyperResponse = Response<Full<Bytes>>;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Hyper(#[from] hyper::Error),

    #[error("Invalid URL `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Request timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Server returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Request failed: {0}")]
    Client(String),
}

/// HTTP framing for envelopes.
pub struct HttpCodec;

impl HttpCodec {
    /// `200 OK` with a JSON body.
    pub fn json_response(body: String) -> HyperResponse {
        Self::with_status(StatusCode::OK, body)
    }

    /// `204 No Content`.
    pub fn no_content() -> HyperResponse {
        let mut response = Response::new(Full::new(Bytes::new()));
        *response.status_mut() = StatusCode::NO_CONTENT;
        response
    }

    /// Wraps dispatcher output: an empty string is a notification and has
    /// no body.
    pub fn rpc_response(body: String) -> HyperResponse {
        if body.is_empty() {
            Self::no_content()
        } else {
            Self::json_response(body)
        }
    }

    /// A JSON body with a custom status code.
    pub fn with_status(status: StatusCode, body: String) -> HyperResponse {
        let mut response = Response::new(Full::new(Bytes::from(body)));
        *response.status_mut() = status;
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
        response
    }

    /// Builds the `POST` carrying a request envelope.
    ///
    /// # Arguments
    ///
    /// * `url` - Endpoint, must be `http://` or `https://`
    /// * `body` - Serialized envelope
    pub fn json_request(url: &str, body: String) -> Result<Request<Full<Bytes>>, TransportError> {
        let uri = Self::parse_url(url)?;
        let mut request = Request::new(Full::new(Bytes::from(body)));
        *request.method_mut() = Method::POST;
        *request.uri_mut() = uri;
        request
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
        Ok(request)
    }

    pub fn parse_url(url: &str) -> Result<Uri, TransportError> {
        let invalid = |reason: String| TransportError::InvalidUrl {
            url: url.to_string(),
            reason,
        };
        let uri: Uri = url.parse().map_err(|err| invalid(format!("{err}")))?;
        match uri.scheme_str() {
            Some("http") | Some("https") => Ok(uri),
            _ => Err(invalid("must start with http:// or https://".to_string())),
        }
    }

    /// Collects an incoming body.
    pub async fn read_body(body: Incoming) -> Result<Bytes, TransportError> {
        Ok(body.collect().await?.to_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_response_headers() {
        let response = HttpCodec::json_response("{}".to_string());
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            JSON_CONTENT_TYPE
        );
    }

    #[test]
    fn test_empty_output_is_no_content() {
        let response = HttpCodec::rpc_response(String::new());
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(response.headers().get(CONTENT_TYPE).is_none());
    }

    #[test]
    fn test_with_status() {
        let response = HttpCodec::with_status(StatusCode::METHOD_NOT_ALLOWED, "{}".into());
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[test]
    fn test_json_request() {
        let request = HttpCodec::json_request("http://127.0.0.1:9288/rpc", "{}".into()).unwrap();
        assert_eq!(request.method(), &Method::POST);
        assert_eq!(request.uri().path(), "/rpc");
        assert_eq!(
            request.headers().get(CONTENT_TYPE).unwrap(),
            JSON_CONTENT_TYPE
        );
    }

    #[test]
    fn test_rejects_non_http_urls() {
        for url in ["127.0.0.1:9288", "ftp://host/", "not a url"] {
            let err = HttpCodec::parse_url(url).unwrap_err();
            assert!(matches!(err, TransportError::InvalidUrl { .. }), "{url}");
        }
    }
}
