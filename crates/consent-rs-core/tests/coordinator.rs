//! Queueing and result delivery behavior of the permission coordinator.

use consent_rs_core::{ConsentError, EventPayload, GrantResult, PermissionSet};
use consent_rs_protocol::PermissionSetError;
use consent_rs_test_utils::{FakeContainer, harness};
use futures_util::FutureExt;
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

fn set(items: &[&str]) -> PermissionSet {
    PermissionSet::new(items.iter().copied()).expect("set")
}

/// A second request waits until the first resolves, then starts on its own.
#[tokio::test]
async fn camera_then_location_runs_sequentially() {
    let h = harness();
    let container = FakeContainer::activity("main");
    h.coordinator.rebind(&container).expect("bind");
    let host = h.hosts.latest().expect("host");

    let camera = h.coordinator.submit(["CAMERA"]).expect("submit");
    let mut location = h.coordinator.submit(["LOCATION"]).expect("submit");

    assert_eq!(host.calls().len(), 1);
    assert_eq!(host.calls()[0].permissions, set(&["CAMERA"]));
    assert_eq!(h.coordinator.snapshot().queued, 1);

    assert!(h.coordinator.on_result(&strings(&["CAMERA"]), &[true]));
    let camera = camera.await.expect("camera result");
    assert_eq!(camera.get("CAMERA"), Some(true));
    assert_eq!(camera.len(), 1);

    assert_eq!(host.calls().len(), 2);
    assert_eq!(host.calls()[1].permissions, set(&["LOCATION"]));
    assert!((&mut location).now_or_never().is_none());

    assert!(h.coordinator.on_result(&strings(&["LOCATION"]), &[false]));
    let location = location.await.expect("location result");
    assert!(location.all_denied());
}

/// Grant flags are paired with identifiers in request order.
#[tokio::test]
async fn multi_permission_result_preserves_order() {
    let h = harness();
    h.coordinator
        .rebind(&FakeContainer::activity("main"))
        .expect("bind");

    let future = h.coordinator.submit(["CAMERA", "MIC"]).expect("submit");
    h.coordinator.on_result(&strings(&["CAMERA", "MIC"]), &[true, false]);

    let result = future.await.expect("result");
    assert_eq!(
        result
            .iter()
            .map(|grant| (grant.permission.as_str(), grant.granted))
            .collect::<Vec<_>>(),
        vec![("CAMERA", true), ("MIC", false)]
    );
}

/// Results arrive in submission order and only one prompt is ever outstanding.
#[test]
fn resolves_in_submission_order_one_at_a_time() {
    let h = harness();
    h.coordinator
        .rebind(&FakeContainer::activity("main"))
        .expect("bind");
    let host = h.hosts.latest().expect("host");
    let order = Arc::new(Mutex::new(Vec::new()));

    let names = ["CAMERA", "MIC", "CAMERA", "CONTACTS", "LOCATION"];
    for (idx, name) in names.into_iter().enumerate() {
        let order = order.clone();
        h.coordinator
            .submit_with([name], move |_| order.lock().push(idx))
            .expect("submit");
    }

    for (resolved, name) in names.into_iter().enumerate() {
        assert_eq!(host.calls().len(), resolved + 1);
        assert_eq!(h.coordinator.snapshot().queued, names.len() - resolved - 1);
        assert_eq!(host.last_call().expect("call").permissions, set(&[name]));
        assert!(h.coordinator.on_result(&strings(&[name]), &[true]));
    }

    assert_eq!(*order.lock(), vec![0, 1, 2, 3, 4]);
    assert_eq!(host.calls().len(), names.len());
    assert_eq!(h.coordinator.snapshot().current, None);
}

/// A result with nothing in flight is dropped without touching any sink.
#[test]
fn stale_result_is_ignored() {
    let h = harness();
    h.coordinator
        .rebind(&FakeContainer::activity("main"))
        .expect("bind");

    assert!(!h.coordinator.on_result(&strings(&["CAMERA"]), &[true]));

    let calls = Arc::new(Mutex::new(0));
    let counter = calls.clone();
    h.coordinator
        .submit_with(["CAMERA"], move |_| *counter.lock() += 1)
        .expect("submit");
    assert!(h.coordinator.on_result(&strings(&["CAMERA"]), &[true]));
    assert!(!h.coordinator.on_result(&strings(&["CAMERA"]), &[true]));
    assert_eq!(*calls.lock(), 1);

    let stale = h
        .events
        .payloads()
        .into_iter()
        .filter(|payload| matches!(payload, EventPayload::StaleResultIgnored { .. }))
        .count();
    assert_eq!(stale, 2);
}

/// Results naming other permissions or another request code are stale.
#[tokio::test]
async fn mismatched_results_do_not_resolve_current() {
    let h = harness();
    h.coordinator
        .rebind(&FakeContainer::activity("main"))
        .expect("bind");
    let host = h.hosts.latest().expect("host");

    let mut future = h.coordinator.submit(["CAMERA", "MIC"]).expect("submit");
    let code = host.last_call().expect("call").request_code;

    assert!(!h.coordinator.on_result(&strings(&["MIC", "CAMERA"]), &[true, true]));
    assert!(!h.coordinator.on_result(&strings(&["LOCATION"]), &[true]));
    assert!(!h.coordinator.on_result_for_code(
        code.wrapping_add(1),
        &strings(&["CAMERA", "MIC"]),
        &[true, true]
    ));
    assert!((&mut future).now_or_never().is_none());

    assert!(h.coordinator.on_result_for_code(
        code,
        &strings(&["CAMERA", "MIC"]),
        &[true, true]
    ));
    assert!(future.await.expect("result").all_granted());
}

/// An interrupted prompt reports no identifiers and resolves as denied.
#[tokio::test]
async fn interrupted_prompt_resolves_denied() {
    let h = harness();
    h.coordinator
        .rebind(&FakeContainer::activity("main"))
        .expect("bind");

    let future = h.coordinator.submit(["CAMERA", "MIC"]).expect("submit");
    assert!(h.coordinator.on_result(&[], &[]));
    let result = future.await.expect("result");
    assert_eq!(result.denied(), vec!["CAMERA", "MIC"]);
}

/// Consecutive prompts get distinct codes starting from the configured base.
#[test]
fn request_codes_start_at_base_and_advance() {
    let h = harness();
    h.coordinator
        .rebind(&FakeContainer::activity("main"))
        .expect("bind");
    let host = h.hosts.latest().expect("host");

    h.coordinator.submit_with(["CAMERA"], |_| {}).expect("submit");
    h.coordinator.submit_with(["CAMERA"], |_| {}).expect("submit");
    h.coordinator.on_result(&strings(&["CAMERA"]), &[true]);

    let codes: Vec<_> = host.calls().iter().map(|call| call.request_code).collect();
    assert_eq!(codes, vec![20, 21]);
}

/// Empty and duplicated permission sets are rejected before queueing.
#[test]
fn invalid_permission_sets_are_rejected() {
    let h = harness();

    let err = h.coordinator.submit(Vec::<String>::new()).unwrap_err();
    assert!(matches!(
        err,
        ConsentError::InvalidPermissions(PermissionSetError::Empty)
    ));

    let err = h.coordinator.submit(["CAMERA", "CAMERA"]).unwrap_err();
    assert!(matches!(
        err,
        ConsentError::InvalidPermissions(PermissionSetError::Duplicate(ref id)) if id == "CAMERA"
    ));
    assert_eq!(h.coordinator.snapshot().queued, 0);
    assert!(h.events.payloads().is_empty());
}

/// Callbacks may submit follow-up requests while their own result is delivered.
#[test]
fn callbacks_can_submit_follow_up_requests() {
    let h = harness();
    h.coordinator
        .rebind(&FakeContainer::activity("main"))
        .expect("bind");
    let host = h.hosts.latest().expect("host");

    let follow_up: Arc<Mutex<Option<GrantResult>>> = Arc::new(Mutex::new(None));
    let slot = follow_up.clone();
    let coordinator = h.coordinator.clone();
    h.coordinator
        .submit_with(["CAMERA"], move |result| {
            assert!(result.all_granted());
            coordinator
                .submit_with(["MIC"], move |result| *slot.lock() = Some(result))
                .expect("follow-up");
        })
        .expect("submit");

    h.coordinator.on_result(&strings(&["CAMERA"]), &[true]);
    assert_eq!(host.last_call().expect("call").permissions, set(&["MIC"]));

    h.coordinator.on_result(&strings(&["MIC"]), &[false]);
    let result = follow_up.lock().clone().expect("follow-up result");
    assert!(result.all_denied());
}

/// Dropping every coordinator handle abandons outstanding requests.
#[tokio::test]
async fn dropping_coordinator_abandons_requests() {
    let h = harness();
    let container = FakeContainer::activity("main");
    h.coordinator.rebind(&container).expect("bind");

    let current = h.coordinator.submit(["CAMERA"]).expect("submit");
    let queued = h.coordinator.submit(["MIC"]).expect("submit");
    let queued_id = queued.request_id();
    drop(h);

    assert!(matches!(current.await, Err(ConsentError::Abandoned(_))));
    assert!(matches!(queued.await, Err(ConsentError::Abandoned(id)) if id == queued_id));
}

/// Events trace a full request cycle in order.
#[test]
fn events_trace_request_cycle() {
    let h = harness();
    h.coordinator
        .rebind(&FakeContainer::activity("main"))
        .expect("bind");
    h.coordinator.submit_with(["CAMERA"], |_| {}).expect("submit");
    h.coordinator.on_result(&strings(&["CAMERA"]), &[true]);

    assert_eq!(
        h.events.kinds(),
        vec![
            "host_bound",
            "request_queued",
            "prompt_started",
            "prompt_resolved",
        ]
    );
}

/// A replayed callback for an earlier code cannot resolve a later identical
/// request.
#[tokio::test]
async fn replayed_code_does_not_resolve_identical_request() {
    let h = harness();
    h.coordinator
        .rebind(&FakeContainer::activity("main"))
        .expect("bind");
    let host = h.hosts.latest().expect("host");

    let first = h.coordinator.submit(["CAMERA"]).expect("submit");
    let mut second = h.coordinator.submit(["CAMERA"]).expect("submit");
    let first_code = host.last_call().expect("call").request_code;

    assert!(h.coordinator.on_result_for_code(first_code, &strings(&["CAMERA"]), &[true]));
    assert!(first.await.expect("first").all_granted());

    assert!(!h.coordinator.on_result_for_code(first_code, &strings(&["CAMERA"]), &[true]));
    assert!((&mut second).now_or_never().is_none());

    let second_code = host.last_call().expect("call").request_code;
    assert!(h.coordinator.on_result_for_code(second_code, &strings(&["CAMERA"]), &[false]));
    assert!(second.await.expect("second").all_denied());
}
