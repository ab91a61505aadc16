//! HTTP transport for provider adapters
//!
//! Synchronous HTTP client with line streaming. Uses ureq for blocking
//! I/O; adapters run on coordinator worker threads, never on the async
//! runtime.

pub use crate::adapters::transport_fake::FakeTransport;
pub use crate::adapters::transport_types::{
    AdapterError, CancelFlag, StreamContext, SyncTransport,
};
pub use crate::adapters::transport_ureq::UreqTransport;

/// Concrete transport enum
///
/// Wraps all transport types, avoiding dyn compatibility issues with the
/// generic streaming method.
#[derive(Debug)]
pub enum Transport {
    Real(UreqTransport),
    Fake(FakeTransport),
}

impl SyncTransport for Transport {
    fn post_json(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &str,
    ) -> Result<String, AdapterError> {
        match self {
            Transport::Real(t) => t.post_json(url, headers, body),
            Transport::Fake(t) => t.post_json(url, headers, body),
        }
    }

    fn get_json(&self, url: &str, headers: &[(&str, &str)]) -> Result<String, AdapterError> {
        match self {
            Transport::Real(t) => t.get_json(url, headers),
            Transport::Fake(t) => t.get_json(url, headers),
        }
    }

    fn post_stream<F>(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &str,
        ctx: &StreamContext,
        on_line: F,
    ) -> Result<(), AdapterError>
    where
        F: FnMut(&str),
    {
        match self {
            Transport::Real(t) => t.post_stream(url, headers, body, ctx, on_line),
            Transport::Fake(t) => t.post_stream(url, headers, body, ctx, on_line),
        }
    }
}
