//! CGI adapter
//!
//! Answers exactly one request per process: the body is read from stdin
//! (`CONTENT_LENGTH` bytes when the variable is set) and the response is
//! written to stdout as CGI headers followed by the envelope.

use std::io::{self, Read, Write};
use std::sync::Arc;

use hookrpc_common::transport::JSON_CONTENT_TYPE;

use crate::dispatcher::Dispatcher;

pub struct CgiHandler {
    dispatcher: Arc<Dispatcher>,
}

impl CgiHandler {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }

    /// Serves the current CGI request on stdin/stdout.
    pub fn run(&self) -> io::Result<()> {
        let content_length = match std::env::var("CONTENT_LENGTH") {
            Ok(value) if !value.trim().is_empty() => {
                Some(value.trim().parse::<u64>().map_err(|err| {
                    io::Error::new(
                        io::ErrorKind::InvalidInput,
                        format!("invalid CONTENT_LENGTH `{value}`: {err}"),
                    )
                })?)
            }
            _ => None,
        };
        let stdin = io::stdin();
        let stdout = io::stdout();
        self.handle(content_length, stdin.lock(), stdout.lock())
    }

    /// Reads one request from `input` and writes the CGI response to
    /// `output`.
    ///
    /// # Arguments
    ///
    /// * `content_length` - Body size; `None` reads `input` to the end
    /// * `input` - Request body source
    /// * `output` - Response sink
    pub fn handle<R: Read, W: Write>(
        &self,
        content_length: Option<u64>,
        input: R,
        mut output: W,
    ) -> io::Result<()> {
        let mut body = Vec::new();
        match content_length {
            Some(length) => input.take(length).read_to_end(&mut body)?,
            None => {
                let mut input = input;
                input.read_to_end(&mut body)?
            }
        };
        tracing::debug!("CGI request of {} bytes", body.len());

        let response = self.dispatcher.handle(&body);
        if response.is_empty() {
            write!(output, "Status: 204 No Content\r\n\r\n")?;
        } else {
            write!(
                output,
                "Status: 200 OK\r\nContent-Type: {}\r\nContent-Length: {}\r\n\r\n{}",
                JSON_CONTENT_TYPE,
                response.len(),
                response
            )?;
        }
        output.flush()
    }
}
