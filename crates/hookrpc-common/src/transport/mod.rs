//! Transport helpers
//!
//! The protocol core is transport agnostic: a server hands raw message
//! text to its dispatcher and a client hands raw text to a transport. This
//! module holds what the HTTP adapters on both sides share.
//!
//! # Components
//!
//! - **[`HttpCodec`]**: Build hyper requests/responses around JSON bodies
//! - **[`TransportError`]**: Failures below the protocol layer

pub mod http;

pub use http::{HttpCodec, HyperRequest, HyperResponse, TransportError, JSON_CONTENT_TYPE};
