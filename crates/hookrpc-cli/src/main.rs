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

//! # HookRPC CLI Entry Point
//!
//! ## Usage
//!
//! ```bash
//! # Serve the demo service over HTTP
//! hookrpc serve -b 127.0.0.1:9288
//!
//! # Answer one request as a CGI program (CONTENT_LENGTH + stdin)
//! hookrpc cgi
//!
//! # Make an RPC call (outputs raw JSON)
//! hookrpc call http://127.0.0.1:9288 Calc.divide -a '[10]' -k '{"b": 4}'
//! ```
//!
//! Setting `HOOKRPC_SHOW_STACK_TRACE=1` has the same effect as
//! `--show-stack-trace`.

use anyhow::Result;
use argh::FromArgs;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;

use hookrpc_cli::{demo, show_stack_trace, validate_http_url};
use hookrpc_client::ServiceProxy;
use hookrpc_common::protocol::{encode_value, RpcMap, RpcValue};
use hookrpc_server::{CgiHandler, HttpServer};

#[derive(FromArgs)]
/// HookRPC - JSON-RPC 2.0 with object hooks
struct Cli {
    #[argh(subcommand)]
    command: Commands,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum Commands {
    Serve(ServeArgs),
    Cgi(CgiArgs),
    Call(CallArgs),
}

#[derive(FromArgs)]
#[argh(subcommand, name = "serve")]
/// serve the demo service over HTTP
struct ServeArgs {
    /// address to bind the HTTP server to
    #[argh(option, short = 'b', default = "\"127.0.0.1:9288\".into()")]
    bind: String,

    /// attach failure traces to error responses
    #[argh(switch, long = "show-stack-trace")]
    show_stack_trace: bool,
}

#[derive(FromArgs)]
#[argh(subcommand, name = "cgi")]
/// answer a single request as a CGI program
struct CgiArgs {
    /// attach failure traces to error responses
    #[argh(switch, long = "show-stack-trace")]
    show_stack_trace: bool,
}

/// Example:
///
/// ```bash
/// hookrpc call http://127.0.0.1:9288 Geometry.midpoint \
///     -a '[{"__classhook__": {"name": "Point", "__init__": {"__args__": [0, 0]}}},
///          {"__classhook__": {"name": "Point", "__init__": {"__args__": [2, 4]}}}]'
/// ```
#[derive(FromArgs)]
#[argh(subcommand, name = "call")]
/// call an RPC method on a server
struct CallArgs {
    /// address of the server to call (must start with http://)
    #[argh(positional)]
    server_address: String,

    /// dotted name of the method to call
    #[argh(positional)]
    method: String,

    /// JSON array of positional arguments
    #[argh(option, short = 'a', long = "args")]
    args: Option<String>,

    /// JSON object of keyword arguments
    #[argh(option, short = 'k', long = "kwargs")]
    kwargs: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli: Cli = argh::from_env();

    // call keeps stdout clean for piping; cgi owns stdout, so logs go to stderr
    if !matches!(cli.command, Commands::Call(_)) {
        let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    }

    match cli.command {
        Commands::Serve(args) => run_serve(args).await,
        Commands::Cgi(args) => run_cgi(args),
        Commands::Call(args) => run_call(args).await,
    }
}

async fn run_serve(args: ServeArgs) -> Result<()> {
    let addr: SocketAddr = args
        .bind
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid bind address '{}': {}", args.bind, e))?;

    let show_stack_trace = show_stack_trace(args.show_stack_trace);
    if show_stack_trace {
        tracing::info!("Error responses will include stack traces");
    }

    let dispatcher = Arc::new(demo::demo_dispatcher(show_stack_trace));
    tracing::info!(
        "Serving {} object hook(s): {:?}",
        dispatcher.hooks().class_names().len(),
        dispatcher.hooks().class_names()
    );
    HttpServer::new(dispatcher).run(addr).await?;
    Ok(())
}

fn run_cgi(args: CgiArgs) -> Result<()> {
    let dispatcher = demo::demo_dispatcher(show_stack_trace(args.show_stack_trace));
    CgiHandler::new(Arc::new(dispatcher)).run()?;
    Ok(())
}

async fn run_call(args: CallArgs) -> Result<()> {
    validate_http_url(&args.server_address, "server address")?;
    let positional = parse_positional(args.args.as_deref())?;
    let keyword = parse_keyword(args.kwargs.as_deref())?;

    let proxy = ServiceProxy::http(&args.server_address)?
        .with_hooks(demo::demo_hooks())
        .select(&args.method);
    let result = proxy.invoke(positional, keyword).await?;

    println!("{}", serde_json::to_string(&encode_value(&result)?)?);
    Ok(())
}

fn parse_positional(raw: Option<&str>) -> Result<Vec<RpcValue>> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };
    match serde_json::from_str(raw).map_err(|e| anyhow::anyhow!("Invalid JSON in args: {}", e))? {
        Value::Array(items) => Ok(items.into_iter().map(RpcValue::from).collect()),
        other => Err(anyhow::anyhow!(
            "Invalid args: expected a JSON array, got {}",
            other
        )),
    }
}

fn parse_keyword(raw: Option<&str>) -> Result<RpcMap> {
    let Some(raw) = raw else {
        return Ok(RpcMap::new());
    };
    match serde_json::from_str(raw).map_err(|e| anyhow::anyhow!("Invalid JSON in kwargs: {}", e))? {
        Value::Object(members) => Ok(members
            .into_iter()
            .map(|(name, value)| (name, RpcValue::from(value)))
            .collect()),
        other => Err(anyhow::anyhow!(
            "Invalid kwargs: expected a JSON object, got {}",
            other
        )),
    }
}
