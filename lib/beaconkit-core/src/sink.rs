//! Beacon sink ingestion contract, and the provided sink implementations.

use std::sync::{
    atomic::{AtomicU64, Ordering::Relaxed},
    Mutex, PoisonError,
};

use tokio::sync::mpsc;
use tracing::warn;

/// Snapshot of one completed traced web request.
///
/// Built by a tracer at the moment it is stopped, after which none of its fields change. Timestamps are
/// session-relative milliseconds; fields the caller never observed carry the sentinel `-1`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WebRequestRecord {
    /// Identifier of the action the request was traced under.
    pub action_id: i32,

    /// Correlation tag attached to the outbound request.
    pub tag: String,

    /// URL of the traced request, or `"<unknown>"` if never set.
    pub url: String,

    /// HTTP response code, or `-1` if never observed.
    pub response_code: i32,

    /// Session-relative time at which the request started, or `-1` if never started.
    pub start_time: i64,

    /// Session-relative time at which the request completed.
    pub end_time: i64,

    /// Sequence number allocated when the tracer was created.
    pub start_sequence_no: i32,

    /// Sequence number allocated when the tracer was stopped.
    pub end_sequence_no: i32,
}

/// Where completed web request records are submitted for eventual transmission.
///
/// `record` has enqueue semantics: it must be non-blocking and fast, it never reports failure back to the tracer, and
/// it must be safe to call concurrently from many tracers finishing at once. Serialization, batching, and delivery of
/// the enqueued records to the collector endpoint are entirely the sink's responsibility.
pub trait BeaconSink: Send + Sync {
    /// Accepts a completed web request record.
    fn record(&self, record: WebRequestRecord);
}

/// A sink that buffers records in memory.
///
/// Useful in tests and for local inspection of what the tracers produced. Not bounded; a transmission layer should
/// use [`ChannelSink`] instead.
#[derive(Debug, Default)]
pub struct InMemorySink {
    records: Mutex<Vec<WebRequestRecord>>,
}

impl InMemorySink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of all records received so far.
    pub fn records(&self) -> Vec<WebRequestRecord> {
        // A panic on another submitting thread must not take the sink down with it; the buffer
        // contents stay well-formed either way, so a poisoned lock is simply recovered.
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl BeaconSink for InMemorySink {
    fn record(&self, record: WebRequestRecord) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record);
    }
}

/// A sink that hands records off to a bounded channel.
///
/// The receiving half is meant to be consumed by a transmission task. When the channel is full, or the receiver has
/// gone away, the record is dropped and counted: tracing must never block or slow the instrumented request path.
#[derive(Debug)]
pub struct ChannelSink {
    tx: mpsc::Sender<WebRequestRecord>,
    dropped: AtomicU64,
}

impl ChannelSink {
    /// Creates a sink buffering up to `capacity` records, returning the receiving half for the transmission layer.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<WebRequestRecord>) {
        let (tx, rx) = mpsc::channel(capacity);
        let sink = Self {
            tx,
            dropped: AtomicU64::new(0),
        };

        (sink, rx)
    }

    /// Returns the number of records dropped because the buffer was full or closed.
    pub fn dropped_records(&self) -> u64 {
        self.dropped.load(Relaxed)
    }
}

impl BeaconSink for ChannelSink {
    fn record(&self, record: WebRequestRecord) {
        if self.tx.try_send(record).is_err() {
            self.dropped.fetch_add(1, Relaxed);
            warn!("Beacon buffer full or closed. Dropping web request record.");
        }
    }
}
