//! Monitoring session.

use std::sync::Arc;

use tracing::debug;

use crate::{
    action::ActionContext,
    config::InstrumentationConfig,
    sequence::SequenceAllocator,
    sink::{BeaconSink, WebRequestRecord},
    tag::{self, SessionIdentity},
    time::SessionClock,
};

// Observed allocator bases: sequence numbers start at 0, action identifiers at 1.
const SEQUENCE_NUMBER_BASE: i32 = 0;
const ACTION_ID_BASE: i32 = 1;

struct SessionState {
    identity: SessionIdentity,
    clock: SessionClock,
    sequence_numbers: SequenceAllocator,
    action_ids: SequenceAllocator,
    sink: Arc<dyn BeaconSink>,
}

/// A monitoring session, scoped to one instrumented application instance.
///
/// The session owns the shared-mutation surface of the tracing core: the sequence number and action identifier
/// allocators, and the session-relative clock. It also carries the identity fields embedded into every correlation
/// tag, and the handle to the beacon sink that completed request records are submitted to.
///
/// Cheap to clone; all clones share the same counters, clock, identity, and sink.
#[derive(Clone)]
pub struct MonitoringSession {
    state: Arc<SessionState>,
}

impl MonitoringSession {
    /// Creates a session from the given configuration, submitting completed records to `sink`.
    pub fn new(config: &InstrumentationConfig, sink: Arc<dyn BeaconSink>) -> Self {
        let identity = SessionIdentity {
            server_id: config.server_id,
            device_id: config.device_id,
            session_number: config.session_number,
            application_id: config.application_id.clone(),
        };

        debug!(
            application_id = %identity.application_id,
            session_number = identity.session_number,
            device_id = identity.device_id,
            "Monitoring session created."
        );

        Self {
            state: Arc::new(SessionState {
                identity,
                clock: SessionClock::new(),
                sequence_numbers: SequenceAllocator::new(SEQUENCE_NUMBER_BASE),
                action_ids: SequenceAllocator::new(ACTION_ID_BASE),
                sink,
            }),
        }
    }

    /// Enters a new action: a logical unit of work under which web requests are traced.
    pub fn enter_action(&self) -> ActionContext {
        let action_id = self.state.action_ids.next();
        debug!(action_id, "Entered action.");

        ActionContext::new(action_id, self.clone())
    }

    /// Allocates the next session-wide sequence number.
    ///
    /// Safe to call concurrently from any number of threads; every call returns a distinct value.
    pub fn next_sequence_number(&self) -> i32 {
        self.state.sequence_numbers.next()
    }

    /// Gets the current session-relative timestamp, in milliseconds.
    pub fn current_timestamp(&self) -> i64 {
        self.state.clock.current_timestamp()
    }

    /// Encodes the correlation tag for the given action and sequence number.
    pub fn create_tag(&self, action_id: i32, sequence_no: i32) -> String {
        tag::encode_tag(&self.state.identity, action_id, sequence_no)
    }

    pub(crate) fn submit(&self, record: WebRequestRecord) {
        self.state.sink.record(record);
    }
}
