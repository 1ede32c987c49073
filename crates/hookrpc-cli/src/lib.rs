// Copyright 2025 HookRPC Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! # HookRPC CLI
//!
//! Command-line interface for hookrpc.
//!
//! - `hookrpc serve`: Serve the demo service over HTTP
//! - `hookrpc cgi`: Answer one request as a CGI program
//! - `hookrpc call`: Call a method on a server (outputs raw JSON for scripting)
//!
//! The [`demo`] module holds the service both server commands expose.

pub mod demo;

/// Environment variable enabling failure traces in error envelopes
pub const SHOW_STACK_TRACE_ENV: &str = "HOOKRPC_SHOW_STACK_TRACE";

/// Resolves the stack-trace setting: the command-line flag wins, then
/// [`SHOW_STACK_TRACE_ENV`], then off.
pub fn show_stack_trace(flag: bool) -> bool {
    flag || std::env::var(SHOW_STACK_TRACE_ENV)
        .map(|value| matches!(value.trim(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// Validates that a URL string starts with http:// or https://
pub fn validate_http_url(url: &str, description: &str) -> anyhow::Result<()> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(anyhow::anyhow!(
            "Invalid {}: '{}' must start with http:// or https://",
            description,
            url
        ))
    }
}
