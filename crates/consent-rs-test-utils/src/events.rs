use consent_rs_protocol::{EventMsg, EventPayload, EventSink};
use parking_lot::Mutex;

/// Event sink that stores every event it receives.
#[derive(Debug, Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<EventMsg>>,
}

impl RecordingEventSink {
    pub fn payloads(&self) -> Vec<EventPayload> {
        self.events
            .lock()
            .iter()
            .map(|event| event.payload.clone())
            .collect()
    }

    /// Snake-case event type names, handy for ordering assertions.
    pub fn kinds(&self) -> Vec<&'static str> {
        self.events
            .lock()
            .iter()
            .map(|event| kind_of(&event.payload))
            .collect()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl EventSink for RecordingEventSink {
    fn emit(&self, event: EventMsg) {
        self.events.lock().push(event);
    }
}

fn kind_of(payload: &EventPayload) -> &'static str {
    match payload {
        EventPayload::RequestQueued { .. } => "request_queued",
        EventPayload::PromptStarted { .. } => "prompt_started",
        EventPayload::PromptResolved { .. } => "prompt_resolved",
        EventPayload::StaleResultIgnored { .. } => "stale_result_ignored",
        EventPayload::HostBound { .. } => "host_bound",
        EventPayload::HostBindIgnored { .. } => "host_bind_ignored",
        EventPayload::HostUnbound { .. } => "host_unbound",
        EventPayload::HostDetached { .. } => "host_detached",
        EventPayload::DetachSkipped { .. } => "detach_skipped",
    }
}
