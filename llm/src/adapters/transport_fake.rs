//! Fake transport for testing
//!
//! Uses fixture strings instead of real HTTP calls and counts every call
//! so tests can assert that no provider was contacted.

use crate::adapters::transport_types::{AdapterError, StreamContext, SyncTransport};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Fake transport for testing (fixture strings, call counter)
#[derive(Debug, Default)]
pub struct FakeTransport {
    /// Response body for non-streaming calls
    pub response_body: String,
    /// Stream body returned line-by-line
    pub stream_body: String,
    /// Error to return instead of a body (if set)
    pub error: Option<AdapterError>,
    /// Number of calls made through this transport
    calls: Arc<AtomicUsize>,
}

impl FakeTransport {
    /// Fake transport with given non-streaming response
    pub fn new(response: &str) -> Self {
        Self {
            response_body: response.to_string(),
            ..Default::default()
        }
    }

    /// Fake transport with a streaming response
    pub fn with_stream(stream: &str) -> Self {
        Self {
            stream_body: stream.to_string(),
            ..Default::default()
        }
    }

    /// Fake transport that fails every call with the given error
    pub fn with_error(error: AdapterError) -> Self {
        Self {
            error: Some(error),
            ..Default::default()
        }
    }

    /// Shared handle to the call counter (for spy assertions)
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }

    /// Calls made so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record_call(&self) -> Result<(), AdapterError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

impl SyncTransport for FakeTransport {
    fn post_json(
        &self,
        _url: &str,
        _headers: &[(&str, &str)],
        _body: &str,
    ) -> Result<String, AdapterError> {
        self.record_call()?;
        Ok(self.response_body.clone())
    }

    fn get_json(&self, _url: &str, _headers: &[(&str, &str)]) -> Result<String, AdapterError> {
        self.record_call()?;
        Ok(self.response_body.clone())
    }

    fn post_stream<F>(
        &self,
        _url: &str,
        _headers: &[(&str, &str)],
        _body: &str,
        ctx: &StreamContext,
        mut on_line: F,
    ) -> Result<(), AdapterError>
    where
        F: FnMut(&str),
    {
        self.record_call()?;
        let body = if self.stream_body.is_empty() {
            &self.response_body
        } else {
            &self.stream_body
        };
        for line in body.lines() {
            ctx.check()?;
            on_line(line);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::transport_types::CancelFlag;

    #[test]
    fn test_fake_transport_basic() {
        let transport = FakeTransport::new("test response");
        let result = transport.post_json("http://test", &[], "{}");
        assert_eq!(result.unwrap(), "test response");
        assert_eq!(transport.call_count(), 1);
    }

    #[test]
    fn test_fake_transport_with_error() {
        let transport = FakeTransport::with_error(AdapterError::Network("down".into()));
        let result = transport.post_json("http://test", &[], "{}");
        assert_eq!(result, Err(AdapterError::Network("down".into())));
    }

    #[test]
    fn test_fake_transport_stream() {
        let transport = FakeTransport::with_stream("line1\nline2\nline3");
        let mut lines = Vec::new();
        let ctx = StreamContext::default();
        transport
            .post_stream("http://test", &[], "{}", &ctx, |line| {
                lines.push(line.to_string());
            })
            .unwrap();
        assert_eq!(lines, vec!["line1", "line2", "line3"]);
    }

    #[test]
    fn test_fake_transport_observes_cancellation() {
        let transport = FakeTransport::with_stream("line1\nline2");
        let flag = CancelFlag::new();
        flag.cancel();
        let ctx = StreamContext::unbounded(flag);

        let mut lines = Vec::new();
        let result = transport.post_stream("http://test", &[], "{}", &ctx, |line| {
            lines.push(line.to_string());
        });
        assert_eq!(result, Err(AdapterError::Cancelled));
        assert!(lines.is_empty());
    }

    #[test]
    fn test_call_counter_shared() {
        let transport = FakeTransport::new("ok");
        let counter = transport.call_counter();
        assert_eq!(counter.load(std::sync::atomic::Ordering::SeqCst), 0);
        let _ = transport.get_json("http://test", &[]);
        assert_eq!(counter.load(std::sync::atomic::Ordering::SeqCst), 1);
    }
}
