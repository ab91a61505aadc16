//! Real HTTP transport using ureq
//!
//! Synchronous blocking HTTP client for provider adapters. Always driven
//! from a coordinator worker thread, never from the async runtime.

use crate::adapters::transport_types::{AdapterError, StreamContext, SyncTransport};
use std::io::BufRead;
use tracing::debug;

/// Real HTTP transport using ureq
#[derive(Debug)]
pub struct UreqTransport {
    /// Timeout in seconds for requests
    timeout: u64,
}

impl UreqTransport {
    /// Create transport with the configured request timeout
    pub fn with_timeout(timeout_secs: u64) -> Self {
        Self {
            timeout: timeout_secs,
        }
    }

    fn send(
        &self,
        method: &str,
        url: &str,
        headers: &[(&str, &str)],
        body: Option<&str>,
    ) -> Result<ureq::Response, AdapterError> {
        let mut request =
            ureq::request(method, url).timeout(std::time::Duration::from_secs(self.timeout));
        for (key, value) in headers {
            request = request.set(key, value);
        }

        let result = match body {
            Some(body) => request.send_string(body),
            None => request.call(),
        };

        match result {
            Ok(response) => Ok(response),
            // Keep the body: normalization classifies on it
            Err(ureq::Error::Status(status, response)) => {
                let message = response.into_string().unwrap_or_default();
                Err(AdapterError::Http { status, message })
            }
            Err(ureq::Error::Transport(err)) => Err(AdapterError::Network(err.to_string())),
        }
    }
}

impl SyncTransport for UreqTransport {
    fn post_json(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &str,
    ) -> Result<String, AdapterError> {
        let response = self.send("POST", url, headers, Some(body))?;
        response
            .into_string()
            .map_err(|e| AdapterError::Io(e.to_string()))
    }

    fn get_json(&self, url: &str, headers: &[(&str, &str)]) -> Result<String, AdapterError> {
        let response = self.send("GET", url, headers, None)?;
        response
            .into_string()
            .map_err(|e| AdapterError::Io(e.to_string()))
    }

    fn post_stream<F>(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &str,
        ctx: &StreamContext,
        mut on_line: F,
    ) -> Result<(), AdapterError>
    where
        F: FnMut(&str),
    {
        debug!(url, body_len = body.len(), "Streaming POST");
        let response = self.send("POST", url, headers, Some(body))?;

        // Read line by line, checking cancellation and deadline between
        // lines so dropping the consumer releases the upstream call.
        let reader = response.into_reader();
        let mut buf_reader = std::io::BufReader::new(reader);
        let mut line_buffer = String::new();

        loop {
            ctx.check()?;
            line_buffer.clear();
            let bytes_read = buf_reader.read_line(&mut line_buffer)?;
            if bytes_read == 0 {
                break;
            }
            on_line(line_buffer.trim_end());
        }

        Ok(())
    }
}
