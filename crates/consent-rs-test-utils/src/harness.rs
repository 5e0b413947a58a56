use crate::{FakeHostFactory, RecordingEventSink};
use consent_rs_config::ConsentConfig;
use consent_rs_core::{LooperDriver, MainLooper, PermissionCoordinator};
use std::sync::Arc;

/// Coordinator wired to fake hosts, a manually driven looper, and an event
/// recorder.
pub struct Harness {
    pub coordinator: PermissionCoordinator,
    pub hosts: Arc<FakeHostFactory>,
    pub looper: LooperDriver,
    pub events: Arc<RecordingEventSink>,
}

pub fn harness() -> Harness {
    harness_with_config(&ConsentConfig::default())
}

pub fn harness_with_config(config: &ConsentConfig) -> Harness {
    let hosts = FakeHostFactory::new();
    let (looper, driver) = MainLooper::new();
    let coordinator = PermissionCoordinator::new(config, hosts.clone(), Arc::new(looper))
        .expect("coordinator");
    let events = Arc::new(RecordingEventSink::default());
    coordinator.set_event_sink(Some(events.clone()));
    Harness {
        coordinator,
        hosts,
        looper: driver,
        events,
    }
}
