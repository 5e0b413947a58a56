//! Broadcast event bus for coordinator diagnostics.

use consent_rs_config::EventsConfig;
use consent_rs_protocol::{EventMsg, EventSink};
use log::debug;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

/// Broadcast-backed event bus.
#[derive(Clone, Debug)]
pub struct EventBus {
    sender: broadcast::Sender<EventMsg>,
}

impl EventBus {
    /// Create a new event bus with the given channel buffer size.
    ///
    /// A zero buffer is raised to one.
    pub fn new(buffer: usize) -> Self {
        let buffer = buffer.max(1);
        let (sender, _) = broadcast::channel(buffer);
        debug!("event bus initialized (buffer={})", buffer);
        Self { sender }
    }

    /// Build a bus from config, or `None` when events are disabled.
    pub fn from_config(config: &EventsConfig) -> Option<Self> {
        config.enabled.then(|| Self::new(config.buffer))
    }

    /// Subscribe to the event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<EventMsg> {
        self.sender.subscribe()
    }

    /// Subscribe as a `Stream`; lagging receivers yield an error item.
    pub fn stream(&self) -> BroadcastStream<EventMsg> {
        BroadcastStream::new(self.subscribe())
    }
}

impl EventSink for EventBus {
    fn emit(&self, event: EventMsg) {
        // No subscribers is fine.
        let _ = self.sender.send(event);
    }
}
