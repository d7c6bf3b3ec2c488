//! Correlation tag encoding.
//!
//! A tag is the opaque token attached to an outbound web request so that the backend can stitch the client-observed
//! timing of that request into the session's server-side trace data. Encoding is write-only on the client: only the
//! backend ever decodes a tag.

use std::{
    cell::Cell,
    sync::atomic::{AtomicI32, Ordering::Relaxed},
};

/// Version of the tag protocol understood by the backend.
pub const PROTOCOL_VERSION: u32 = 3;

const TAG_PREFIX: &str = "MT";

/// Session identity fields embedded into every tag.
///
/// Together with the sequence number, these let the backend correlate a tag with the rest of the beacon data sent for
/// the same session.
#[derive(Clone, Debug)]
pub struct SessionIdentity {
    /// Identifier of the backend server instance the session reports to.
    pub server_id: i32,

    /// Unique identifier of the device the instrumented application runs on.
    pub device_id: i64,

    /// Number of this session within the instrumented application instance.
    pub session_number: i32,

    /// Application identifier assigned by the backend.
    pub application_id: String,
}

/// Encodes the correlation tag for one traceable event.
///
/// The output is deterministic and embeds the sequence number verbatim, so two tags from the same session are never
/// equal unless generated from the same sequence number. Tag layout, fields separated by underscores:
///
/// ```text
/// MT_<version>_<server-id>_<device-id>_<session-number>_<application-id>_<action-id>_<thread-id>_<sequence-no>
/// ```
///
/// All fields are decimal integers except the application identifier, which is percent-encoded so that the tag
/// contains only characters legal in an HTTP header value regardless of how the application was configured.
pub fn encode_tag(identity: &SessionIdentity, action_id: i32, sequence_no: i32) -> String {
    format!(
        "{}_{}_{}_{}_{}_{}_{}_{}_{}",
        TAG_PREFIX,
        PROTOCOL_VERSION,
        identity.server_id,
        identity.device_id,
        identity.session_number,
        urlencoding::encode(&identity.application_id),
        action_id,
        current_thread_id(),
        sequence_no,
    )
}

static NEXT_THREAD_ID: AtomicI32 = AtomicI32::new(1);

thread_local! {
    static THREAD_ID: Cell<i32> = const { Cell::new(0) };
}

// Compact numeric thread identifier for embedding into tags. `std::thread::ThreadId` has no stable
// numeric accessor, so ids are handed out lazily from a process-wide counter on first use per thread.
fn current_thread_id() -> i32 {
    THREAD_ID.with(|id| {
        if id.get() == 0 {
            id.set(NEXT_THREAD_ID.fetch_add(1, Relaxed));
        }
        id.get()
    })
}
