//! HTTP transport adapter for BeaconKit: correlation header injection.
//!
//! The tracing core produces correlation tags but never touches outbound requests itself. This crate defines the
//! wire-visible contract between the two: the correlation header name fixed by the backend protocol, and the
//! [`TagInjector`] capability that HTTP client adapters implement to attach a tag to a request they are about to
//! send.
#![deny(warnings)]
#![deny(missing_docs)]

use beaconkit_core::RequestTracer;
use beaconkit_error::{ErrorContext as _, GenericError};
use http::{header::Entry, HeaderMap, HeaderName, HeaderValue, Request};

/// Name of the HTTP header carrying the correlation tag.
///
/// Fixed by the backend protocol; the backend only recognizes tags delivered under this name.
pub const CORRELATION_HEADER: HeaderName = HeaderName::from_static("x-dynatrace");

/// Capability to attach a correlation tag to an outbound request.
///
/// Implemented once per transport adapter, over whatever request or header representation that transport uses.
/// Semantics are set-if-absent: a tag already present, for example pre-seeded from an upstream trace, must never be
/// overwritten.
pub trait TagInjector {
    /// Attaches `tag` under the correlation header, if that slot is not already occupied.
    ///
    /// Returns `true` if the tag was attached, and `false` if a value was already present.
    fn inject_tag_if_absent(&mut self, tag: &HeaderValue) -> bool;

    /// Gets the URL of the request this injector wraps, if the underlying representation carries one.
    ///
    /// Bare header maps carry no URL, so the default is `None`.
    fn request_url(&self) -> Option<String> {
        None
    }
}

impl TagInjector for HeaderMap {
    fn inject_tag_if_absent(&mut self, tag: &HeaderValue) -> bool {
        match self.entry(CORRELATION_HEADER) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                entry.insert(tag.clone());
                true
            }
        }
    }
}

impl<B> TagInjector for Request<B> {
    fn inject_tag_if_absent(&mut self, tag: &HeaderValue) -> bool {
        self.headers_mut().inject_tag_if_absent(tag)
    }

    fn request_url(&self) -> Option<String> {
        Some(self.uri().to_string())
    }
}

/// Attaches the tracer's correlation tag to the outbound request represented by `target`.
///
/// When the target exposes the request URL, it is recorded on the tracer, so that callers wrapping a full request
/// type do not need to call [`RequestTracer::set_url`] themselves.
///
/// Returns whether the tag was attached, or `false` if the correlation header already carried a value.
///
/// # Errors
///
/// If the tag is not a valid header value, or if the tracer was already stopped, an error is returned. The former
/// does not occur for tags produced by the tag codec, which emits only header-safe characters.
pub fn trace_outbound<T>(target: &mut T, tracer: &mut RequestTracer) -> Result<bool, GenericError>
where
    T: TagInjector,
{
    if let Some(url) = target.request_url() {
        tracer
            .set_url(url)
            .error_context("request was traced after its tracer was stopped")?;
    }

    let tag = HeaderValue::from_str(tracer.tag())
        .error_context("correlation tag was not a valid header value")?;

    Ok(target.inject_tag_if_absent(&tag))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use beaconkit_core::{InMemorySink, InstrumentationConfig, MonitoringSession, UNKNOWN_URL};
    use http::{HeaderMap, HeaderValue, Request};

    use super::{trace_outbound, TagInjector, CORRELATION_HEADER};

    fn session() -> MonitoringSession {
        MonitoringSession::new(
            &InstrumentationConfig::new("app-id", 42),
            Arc::new(InMemorySink::new()),
        )
    }

    #[test]
    fn injects_into_empty_headers() {
        let mut headers = HeaderMap::new();
        let tag = HeaderValue::from_static("MT_3_1_42_1_app-id_1_1_0");

        assert!(headers.inject_tag_if_absent(&tag));
        assert_eq!(headers.get(&CORRELATION_HEADER), Some(&tag));
    }

    #[test]
    fn preserves_preseeded_tag() {
        let upstream = HeaderValue::from_static("MT_3_1_7_1_upstream_1_1_0");
        let mut headers = HeaderMap::new();
        headers.insert(CORRELATION_HEADER, upstream.clone());

        let tag = HeaderValue::from_static("MT_3_1_42_1_app-id_1_1_0");
        assert!(!headers.inject_tag_if_absent(&tag));
        assert_eq!(headers.get(&CORRELATION_HEADER), Some(&upstream));
    }

    #[test]
    fn trace_outbound_attaches_tracer_tag() {
        let mut tracer = session().enter_action().trace_web_request();
        let mut headers = HeaderMap::new();

        assert!(trace_outbound(&mut headers, &mut tracer).unwrap());
        assert_eq!(
            headers.get(&CORRELATION_HEADER).unwrap().to_str().unwrap(),
            tracer.tag()
        );

        // A bare header map carries no URL to discover.
        assert_eq!(tracer.url(), UNKNOWN_URL);

        // A second tracer must not clobber the header.
        let mut other = session().enter_action().trace_web_request();
        assert!(!trace_outbound(&mut headers, &mut other).unwrap());
        assert_eq!(
            headers.get(&CORRELATION_HEADER).unwrap().to_str().unwrap(),
            tracer.tag()
        );
    }

    #[test]
    fn trace_outbound_records_url_from_request() {
        let mut tracer = session().enter_action().trace_web_request();
        let mut request = Request::builder()
            .uri("http://example.com/resource")
            .body(())
            .unwrap();

        assert!(trace_outbound(&mut request, &mut tracer).unwrap());

        assert_eq!(tracer.url(), "http://example.com/resource");
        assert_eq!(
            request.headers().get(&CORRELATION_HEADER).unwrap().to_str().unwrap(),
            tracer.tag()
        );
    }

    #[test]
    fn trace_outbound_rejects_stopped_tracer() {
        let mut tracer = session().enter_action().trace_web_request();
        tracer.stop().unwrap();

        let mut request = Request::builder()
            .uri("http://example.com/resource")
            .body(())
            .unwrap();

        assert!(trace_outbound(&mut request, &mut tracer).is_err());
        assert!(request.headers().get(&CORRELATION_HEADER).is_none());
    }
}
