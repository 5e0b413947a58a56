//! Prompt host binding, rebinding and deferred detachment.

use consent_rs_config::{BindingConfig, ConsentConfig};
use consent_rs_core::{BindingState, ConsentError, EventPayload, HostLifecycle, PermissionSet};
use consent_rs_test_utils::{FakeContainer, harness, harness_with_config};
use futures_util::FutureExt;
use pretty_assertions::assert_eq;

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

/// Work submitted before any host is bound waits and starts on bind.
#[test]
fn queued_requests_wait_for_first_bind() {
    let h = harness();
    h.coordinator.submit_with(["CAMERA"], |_| {}).expect("submit");

    let snapshot = h.coordinator.snapshot();
    assert_eq!(snapshot.binding, BindingState::Unbound);
    assert_eq!(snapshot.current, None);
    assert_eq!(snapshot.queued, 1);
    assert_eq!(h.hosts.count(), 0);

    h.coordinator
        .rebind(&FakeContainer::activity("main"))
        .expect("bind");
    let host = h.hosts.latest().expect("host");
    assert_eq!(host.calls().len(), 1);
    assert_eq!(h.coordinator.snapshot().queued, 0);
}

/// Rebinding while a live host is bound keeps the first host.
#[test]
fn rebind_with_live_host_is_idempotent() {
    let h = harness();
    let first = FakeContainer::activity("first");
    let second = FakeContainer::activity("second");

    let bound = h.coordinator.rebind(&first).expect("bind");
    let again = h.coordinator.rebind(&second).expect("rebind");

    assert_eq!(bound, again);
    assert_eq!(h.coordinator.bound_host_id(), Some(bound));
    assert_eq!(h.hosts.count(), 1);
    assert!(second.attached().is_empty());
    assert_eq!(h.events.kinds(), vec!["host_bound", "host_bind_ignored"]);
}

/// Hosts are attached under the tag for their container kind.
#[test]
fn hosts_attach_under_container_tag() {
    let defaults = BindingConfig::default();

    let h = harness();
    let activity = FakeContainer::activity("main");
    let host_id = h.coordinator.rebind(&activity).expect("bind");
    assert_eq!(activity.attached(), vec![(defaults.activity_tag.clone(), host_id)]);

    let h = harness();
    let fragment = FakeContainer::fragment("settings");
    let host_id = h.coordinator.rebind(&fragment).expect("bind");
    assert_eq!(fragment.attached(), vec![(defaults.fragment_tag.clone(), host_id)]);
}

/// Tags come from config.
#[test]
fn custom_tags_are_used() {
    let config = ConsentConfig::builder()
        .binding(BindingConfig {
            activity_tag: "host/a".to_string(),
            fragment_tag: "host/f".to_string(),
        })
        .build();
    let h = harness_with_config(&config);
    let fragment = FakeContainer::fragment("settings");
    let host_id = h.coordinator.rebind(&fragment).expect("bind");

    assert_eq!(fragment.attached(), vec![("host/f".to_string(), host_id)]);
    assert!(matches!(
        h.events.payloads().as_slice(),
        [EventPayload::HostBound { tag, .. }] if tag == "host/f"
    ));
}

/// Containers that cannot host prompts are rejected without side effects.
#[test]
fn unsupported_container_is_rejected() {
    let h = harness();
    let container = FakeContainer::unsupported("service");

    let err = h.coordinator.rebind(&container).unwrap_err();
    assert!(matches!(err, ConsentError::UnsupportedContainer(ref name) if name.contains("service")));
    assert_eq!(h.hosts.count(), 0);
    assert_eq!(h.coordinator.binding_state(), BindingState::Unbound);
}

/// A bound host that died without unbind is replaced on the next rebind.
#[test]
fn dead_binding_is_replaced() {
    let h = harness();
    let first = h
        .coordinator
        .rebind(&FakeContainer::activity("first"))
        .expect("bind");
    h.hosts
        .latest()
        .expect("host")
        .set_lifecycle(HostLifecycle::Detached);

    h.coordinator.submit_with(["CAMERA"], |_| {}).expect("submit");
    assert_eq!(h.coordinator.snapshot().current, None);

    let second = h
        .coordinator
        .rebind(&FakeContainer::activity("second"))
        .expect("rebind");
    assert_ne!(first, second);
    assert_eq!(h.hosts.count(), 2);
    assert_eq!(h.hosts.latest().expect("host").calls().len(), 1);
}

/// Detachment waits for the looper and the binding clears at once.
#[test]
fn unbind_defers_detach_to_looper() {
    let mut h = harness();
    h.coordinator
        .rebind(&FakeContainer::activity("main"))
        .expect("bind");
    let host = h.hosts.latest().expect("host");

    h.coordinator.unbind();
    assert_eq!(h.coordinator.bound_host_id(), None);
    assert_eq!(h.coordinator.binding_state(), BindingState::Detaching);
    assert_eq!(host.detach_calls(), 0);

    assert_eq!(h.looper.run_until_idle(), 1);
    assert_eq!(host.detach_calls(), 1);
    assert_eq!(h.coordinator.binding_state(), BindingState::Unbound);
    assert_eq!(
        h.events.kinds(),
        vec!["host_bound", "host_unbound", "host_detached"]
    );
}

/// A host the framework is already removing is left alone.
#[test]
fn detach_is_skipped_for_removing_host() {
    let mut h = harness();
    h.coordinator
        .rebind(&FakeContainer::activity("main"))
        .expect("bind");
    let host = h.hosts.latest().expect("host");

    h.coordinator.unbind();
    host.set_lifecycle(HostLifecycle::Removing);
    h.looper.run_until_idle();

    assert_eq!(host.detach_calls(), 0);
    assert_eq!(h.coordinator.binding_state(), BindingState::Unbound);
    assert_eq!(h.events.kinds().last(), Some(&"detach_skipped"));
}

/// A host dropped along with its container is skipped as well.
#[test]
fn detach_is_skipped_for_destroyed_container() {
    let mut h = harness();
    let container = FakeContainer::activity("main");
    h.coordinator.rebind(&container).expect("bind");
    let host = h.hosts.latest().expect("host");

    h.coordinator.unbind();
    container.destroy();
    host.set_lifecycle(HostLifecycle::Detached);
    h.looper.run_until_idle();

    assert_eq!(host.detach_calls(), 0);
    assert_eq!(h.events.kinds().last(), Some(&"detach_skipped"));
}

/// Unbind with nothing bound does nothing.
#[test]
fn unbind_without_binding_is_noop() {
    let mut h = harness();
    h.coordinator.unbind();
    assert_eq!(h.looper.run_until_idle(), 0);
    assert_eq!(h.coordinator.binding_state(), BindingState::Unbound);
    assert!(h.events.payloads().is_empty());
}

/// Rotation: unbind then rebind immediately; queued and in-flight work both
/// complete against the new host.
#[tokio::test]
async fn work_survives_unbind_and_immediate_rebind() {
    let mut h = harness();
    h.coordinator
        .rebind(&FakeContainer::activity("before"))
        .expect("bind");
    let old_host = h.hosts.latest().expect("host");

    let camera = h.coordinator.submit(["CAMERA"]).expect("submit");
    let mut mic = h.coordinator.submit(["MIC"]).expect("submit");

    h.coordinator.unbind();
    let new_id = h
        .coordinator
        .rebind(&FakeContainer::activity("after"))
        .expect("rebind");
    let new_host = h.hosts.latest().expect("host");
    assert_eq!(h.coordinator.binding_state(), BindingState::Bound);
    assert!(new_host.calls().is_empty());

    h.looper.run_until_idle();
    assert_eq!(old_host.detach_calls(), 1);
    assert_eq!(new_host.detach_calls(), 0);
    assert_eq!(h.coordinator.bound_host_id(), Some(new_id));
    assert!((&mut mic).now_or_never().is_none());

    assert!(h.coordinator.on_result(&strings(&["CAMERA"]), &[true]));
    assert!(camera.await.expect("camera").all_granted());
    assert_eq!(
        new_host.last_call().expect("call").permissions,
        PermissionSet::new(["MIC"]).expect("set")
    );

    assert!(h.coordinator.on_result(&strings(&["MIC"]), &[true]));
    assert!(mic.await.expect("mic").all_granted());
    assert_eq!(old_host.calls().len(), 1);
}

/// A result that lands between unbind and rebind still resolves; the next
/// request waits for the new host.
#[tokio::test]
async fn late_result_between_unbind_and_rebind_resolves() {
    let mut h = harness();
    h.coordinator
        .rebind(&FakeContainer::activity("before"))
        .expect("bind");

    let camera = h.coordinator.submit(["CAMERA"]).expect("submit");
    h.coordinator.submit_with(["MIC"], |_| {}).expect("submit");
    h.coordinator.unbind();

    assert!(h.coordinator.on_result(&strings(&["CAMERA"]), &[false]));
    assert!(camera.await.expect("camera").all_denied());

    let snapshot = h.coordinator.snapshot();
    assert_eq!(snapshot.current, None);
    assert_eq!(snapshot.queued, 1);
    assert_eq!(
        snapshot.next_queued,
        Some(PermissionSet::new(["MIC"]).expect("set"))
    );

    h.looper.run_until_idle();
    h.coordinator
        .rebind(&FakeContainer::activity("after"))
        .expect("rebind");
    let current = h.coordinator.snapshot().current.expect("current");
    assert_eq!(Some(current.host_id), h.coordinator.bound_host_id());
}

/// Events are dropped silently after the sink is cleared.
#[test]
fn clearing_event_sink_stops_events() {
    let h = harness();
    h.coordinator.set_event_sink(None);
    h.coordinator
        .rebind(&FakeContainer::activity("main"))
        .expect("bind");
    assert!(h.events.payloads().is_empty());
}

/// Detaches that can never run do not leave the binding stuck in `Detaching`.
#[test]
fn unbind_settles_when_looper_is_gone() {
    let h = harness();
    h.coordinator
        .rebind(&FakeContainer::activity("first"))
        .expect("bind");
    h.coordinator.unbind();
    assert_eq!(h.coordinator.binding_state(), BindingState::Detaching);

    // Queued detach is discarded with the driver.
    drop(h.looper);
    assert_eq!(h.coordinator.binding_state(), BindingState::Unbound);

    h.coordinator
        .rebind(&FakeContainer::activity("second"))
        .expect("rebind");
    h.events.clear();
    h.coordinator.unbind();

    assert_eq!(h.coordinator.binding_state(), BindingState::Unbound);
    assert_eq!(h.coordinator.snapshot().binding, BindingState::Unbound);
    assert_eq!(h.events.kinds(), vec!["host_unbound"]);
    let detaches: Vec<_> = h
        .hosts
        .created()
        .iter()
        .map(|host| host.detach_calls())
        .collect();
    assert_eq!(detaches, vec![0, 0]);
}
