//! Core request-tracing and tag-correlation subsystem for BeaconKit.
//!
//! BeaconKit instruments outgoing web requests made by an application and produces the correlation metadata needed to
//! stitch each request into a distributed trace recorded by a backend collector. This crate holds the core of that
//! work: allocating session-wide sequence numbers, encoding them into compact correlation tags, and tracking the
//! lifecycle of each traced request up to the point where its completed record is handed to a beacon sink.
//!
//! Transport of beacon data to a collector, buffering/retry policy, and HTTP client integration live outside this
//! crate. The only obligations this crate places on those collaborators are the [`BeaconSink`] ingestion contract and
//! the "attach this tag if not already present" header contract implemented by transport adapter crates.
#![deny(warnings)]
#![deny(missing_docs)]

pub mod action;
pub mod config;
pub mod sequence;
pub mod session;
pub mod sink;
pub mod tag;
pub mod time;
pub mod tracer;

pub use self::action::ActionContext;
pub use self::config::{ConfigurationError, InstrumentationConfig};
pub use self::session::MonitoringSession;
pub use self::sink::{BeaconSink, ChannelSink, InMemorySink, WebRequestRecord};
pub use self::tracer::{LifecycleError, RequestTracer, UNKNOWN_URL};
