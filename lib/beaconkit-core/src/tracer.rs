//! Web request tracer lifecycle.

use snafu::Snafu;
use tracing::trace;

use crate::{session::MonitoringSession, sink::WebRequestRecord};

/// URL value of a tracer whose caller never set one.
pub const UNKNOWN_URL: &str = "<unknown>";

/// Sentinel for timestamp fields not yet recorded.
const UNSET_TIME: i64 = -1;

/// Sentinel for the response code and end sequence number before they are observed.
const UNSET: i32 = -1;

/// A lifecycle misuse error.
///
/// The tracer lifecycle is `created -> started -> stopped`, driven by a single logical flow. Calls arriving out of
/// that order are rejected rather than silently overwriting previously recorded values, so a buggy caller cannot
/// produce a record with implausible timing data.
#[derive(Debug, Eq, PartialEq, Snafu)]
pub enum LifecycleError {
    /// `start` was called on a tracer that was already started.
    #[snafu(display("Web request tracer was already started."))]
    AlreadyStarted,

    /// A lifecycle call or field mutation arrived after the tracer was stopped.
    #[snafu(display("Web request tracer was already stopped."))]
    AlreadyStopped,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum LifecycleStage {
    Created,
    Started,
    Stopped,
}

/// Tracer for one outbound web request.
///
/// Created via [`ActionContext::trace_web_request`][crate::action::ActionContext::trace_web_request]. Construction
/// consumes one session sequence number and computes the correlation tag from it; the tag and that sequence number
/// are immutable from then on. The URL and response code may be set any number of times until the tracer is stopped.
///
/// Stopping the tracer consumes a second, strictly later sequence number, and submits the completed record to the
/// session's beacon sink exactly once. A tracer that is never stopped is never submitted.
///
/// Instances are meant to be driven by one logical flow at a time; they do not synchronize field mutation across
/// threads.
pub struct RequestTracer {
    session: MonitoringSession,
    action_id: i32,
    tag: String,
    url: String,
    response_code: i32,
    start_time: i64,
    end_time: i64,
    start_sequence_no: i32,
    end_sequence_no: i32,
    stage: LifecycleStage,
}

impl RequestTracer {
    pub(crate) fn new(session: MonitoringSession, action_id: i32) -> Self {
        // The sequence number consumed here must be the one embedded in the tag: a tag computed from any other
        // value breaks backend correlation.
        let start_sequence_no = session.next_sequence_number();
        let tag = session.create_tag(action_id, start_sequence_no);

        trace!(action_id, start_sequence_no, tag = %tag, "Created web request tracer.");

        Self {
            session,
            action_id,
            tag,
            url: UNKNOWN_URL.to_string(),
            response_code: UNSET,
            start_time: UNSET_TIME,
            end_time: UNSET_TIME,
            start_sequence_no,
            end_sequence_no: UNSET,
            stage: LifecycleStage::Created,
        }
    }

    /// Gets the correlation tag to attach to the outbound request.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Gets the URL of the traced request, or `"<unknown>"` if never set.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Gets the HTTP response code, or `-1` if never observed.
    pub fn response_code(&self) -> i32 {
        self.response_code
    }

    /// Gets the session-relative time at which the request started, or `-1` if not yet started.
    pub fn start_time(&self) -> i64 {
        self.start_time
    }

    /// Gets the session-relative time at which the request completed, or `-1` if not yet stopped.
    pub fn end_time(&self) -> i64 {
        self.end_time
    }

    /// Gets the sequence number allocated when this tracer was created.
    pub fn start_sequence_no(&self) -> i32 {
        self.start_sequence_no
    }

    /// Gets the sequence number allocated when this tracer was stopped, or `-1` if not yet stopped.
    pub fn end_sequence_no(&self) -> i32 {
        self.end_sequence_no
    }

    /// Sets the URL of the traced request.
    ///
    /// # Errors
    ///
    /// If the tracer was already stopped, an error is returned and the URL is left unchanged.
    pub fn set_url<S>(&mut self, url: S) -> Result<(), LifecycleError>
    where
        S: Into<String>,
    {
        self.ensure_not_stopped()?;
        self.url = url.into();
        Ok(())
    }

    /// Sets the HTTP response code of the traced request.
    ///
    /// # Errors
    ///
    /// If the tracer was already stopped, an error is returned and the response code is left unchanged.
    pub fn set_response_code(&mut self, response_code: i32) -> Result<(), LifecycleError> {
        self.ensure_not_stopped()?;
        self.response_code = response_code;
        Ok(())
    }

    /// Marks the request as started, recording the start time from the session clock.
    ///
    /// # Errors
    ///
    /// If the tracer was already started or stopped, an error is returned and the previously recorded start time is
    /// left unchanged.
    pub fn start(&mut self) -> Result<(), LifecycleError> {
        match self.stage {
            LifecycleStage::Created => {
                self.start_time = self.session.current_timestamp();
                self.stage = LifecycleStage::Started;
                Ok(())
            }
            LifecycleStage::Started => Err(LifecycleError::AlreadyStarted),
            LifecycleStage::Stopped => Err(LifecycleError::AlreadyStopped),
        }
    }

    /// Stops the tracer, recording the end time and sequence number and submitting the completed record to the
    /// session's beacon sink.
    ///
    /// This is the terminal lifecycle call: exactly one record is ever submitted per tracer, and no further field
    /// mutation is accepted afterwards. Stopping a tracer that was never started is permitted (the record then
    /// carries a start time of `-1`), since a caller may choose to trace a request without timing its start
    /// separately.
    ///
    /// # Errors
    ///
    /// If the tracer was already stopped, an error is returned and nothing is submitted.
    pub fn stop(&mut self) -> Result<(), LifecycleError> {
        self.ensure_not_stopped()?;

        self.end_time = self.session.current_timestamp();
        self.end_sequence_no = self.session.next_sequence_number();
        self.stage = LifecycleStage::Stopped;

        trace!(
            action_id = self.action_id,
            end_sequence_no = self.end_sequence_no,
            response_code = self.response_code,
            "Stopped web request tracer."
        );

        self.session.submit(WebRequestRecord {
            action_id: self.action_id,
            tag: self.tag.clone(),
            url: self.url.clone(),
            response_code: self.response_code,
            start_time: self.start_time,
            end_time: self.end_time,
            start_sequence_no: self.start_sequence_no,
            end_sequence_no: self.end_sequence_no,
        });

        Ok(())
    }

    fn ensure_not_stopped(&self) -> Result<(), LifecycleError> {
        if self.stage == LifecycleStage::Stopped {
            return Err(LifecycleError::AlreadyStopped);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{LifecycleError, UNKNOWN_URL};
    use crate::{
        action::ActionContext, config::InstrumentationConfig, session::MonitoringSession,
        sink::InMemorySink,
    };

    fn session_with_sink() -> (MonitoringSession, Arc<InMemorySink>) {
        let sink = Arc::new(InMemorySink::new());
        let session = MonitoringSession::new(&InstrumentationConfig::new("app-id", 42), sink.clone());

        (session, sink)
    }

    #[test]
    fn fresh_tracer_carries_sentinels() {
        let (session, _) = session_with_sink();
        let tracer = session.enter_action().trace_web_request();

        assert_eq!(tracer.url(), UNKNOWN_URL);
        assert_eq!(tracer.response_code(), -1);
        assert_eq!(tracer.start_time(), -1);
        assert_eq!(tracer.end_time(), -1);
        assert_eq!(tracer.end_sequence_no(), -1);

        // First allocation in the session, so the tracer consumed sequence number 0.
        assert_eq!(tracer.start_sequence_no(), 0);
    }

    #[test]
    fn start_then_stop_orders_times_and_sequence_numbers() {
        let (session, _) = session_with_sink();
        let mut tracer = session.enter_action().trace_web_request();

        tracer.start().unwrap();
        tracer.stop().unwrap();

        assert!(tracer.start_time() <= tracer.end_time());
        assert!(tracer.start_sequence_no() < tracer.end_sequence_no());
    }

    #[test]
    fn stop_without_start_is_permitted() {
        let (session, sink) = session_with_sink();
        let mut tracer = session.enter_action().trace_web_request();

        tracer.stop().unwrap();

        assert_eq!(tracer.start_time(), -1);
        assert!(tracer.end_time() >= 0);
        assert_eq!(sink.records().len(), 1);
        assert_eq!(sink.records()[0].start_time, -1);
    }

    #[test]
    fn double_start_is_rejected() {
        let (session, _) = session_with_sink();
        let mut tracer = session.enter_action().trace_web_request();

        tracer.start().unwrap();
        let first_start_time = tracer.start_time();

        assert_eq!(tracer.start(), Err(LifecycleError::AlreadyStarted));
        assert_eq!(tracer.start_time(), first_start_time);
    }

    #[test]
    fn double_stop_is_rejected_and_submits_once() {
        let (session, sink) = session_with_sink();
        let mut tracer = session.enter_action().trace_web_request();

        tracer.start().unwrap();
        tracer.stop().unwrap();

        assert_eq!(tracer.stop(), Err(LifecycleError::AlreadyStopped));
        assert_eq!(tracer.start(), Err(LifecycleError::AlreadyStopped));
        assert_eq!(sink.records().len(), 1);
    }

    #[test]
    fn mutation_after_stop_is_rejected() {
        let (session, _) = session_with_sink();
        let mut tracer = session.enter_action().trace_web_request();

        tracer.set_url("http://example.com").unwrap();
        tracer.stop().unwrap();

        assert_eq!(
            tracer.set_url("http://other.example.com"),
            Err(LifecycleError::AlreadyStopped)
        );
        assert_eq!(tracer.set_response_code(500), Err(LifecycleError::AlreadyStopped));
        assert_eq!(tracer.url(), "http://example.com");
        assert_eq!(tracer.response_code(), -1);
    }

    #[test]
    fn tags_differ_across_tracers_in_one_session() {
        let (session, _) = session_with_sink();
        let action = session.enter_action();

        let first = action.trace_web_request();
        let second = action.trace_web_request();

        assert_ne!(first.tag(), second.tag());
    }

    #[test]
    fn traced_request_end_to_end() {
        let (session, sink) = session_with_sink();

        let action = ActionContext::new(42, session.clone());
        let mut tracer = action.trace_web_request();

        assert_eq!(tracer.start_sequence_no(), 0);
        assert!(tracer.tag().starts_with("MT_3_1_42_1_app-id_42_"));
        assert!(tracer.tag().ends_with("_0"));

        tracer.set_url("http://example.com").unwrap();
        tracer.start().unwrap();
        tracer.set_response_code(200).unwrap();
        tracer.stop().unwrap();

        assert_eq!(tracer.url(), "http://example.com");
        assert_eq!(tracer.response_code(), 200);
        assert_eq!(tracer.end_sequence_no(), 1);

        let records = sink.records();
        assert_eq!(records.len(), 1);

        let record = &records[0];
        assert_eq!(record.action_id, action.id());
        assert_eq!(record.tag, tracer.tag());
        assert_eq!(record.url, "http://example.com");
        assert_eq!(record.response_code, 200);
        assert_eq!(record.start_sequence_no, 0);
        assert_eq!(record.end_sequence_no, 1);
        assert!(record.start_time <= record.end_time);
    }
}
