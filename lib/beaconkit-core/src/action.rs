//! Action context.

use crate::{session::MonitoringSession, tracer::RequestTracer};

/// A logical unit of work under which outbound web requests are traced.
///
/// Actions carry a numeric identifier unique within their session, allocated when the action is entered. An action
/// may outlive any number of request tracers created under it; dropping the action does not affect tracers already
/// created.
pub struct ActionContext {
    id: i32,
    session: MonitoringSession,
}

impl ActionContext {
    pub(crate) fn new(id: i32, session: MonitoringSession) -> Self {
        Self { id, session }
    }

    /// Gets the action identifier, unique within the session.
    pub fn id(&self) -> i32 {
        self.id
    }

    /// Begins tracing one outbound web request under this action.
    ///
    /// Allocates a sequence number and computes the correlation tag the caller must attach to the request. The
    /// returned tracer is exclusively owned by the caller, which drives its lifecycle.
    pub fn trace_web_request(&self) -> RequestTracer {
        RequestTracer::new(self.session.clone(), self.id)
    }
}
