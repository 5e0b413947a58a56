use consent_rs_core::{HostFactory, HostLifecycle, PromptHost};
use consent_rs_protocol::{HostId, PermissionSet, RequestCode};
use parking_lot::Mutex;
use std::sync::Arc;
use uuid::Uuid;

/// A prompt the fake host was asked to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptCall {
    pub request_code: RequestCode,
    pub permissions: PermissionSet,
}

/// Prompt host that records requests instead of showing OS dialogs.
#[derive(Debug)]
pub struct FakePromptHost {
    id: HostId,
    lifecycle: Mutex<HostLifecycle>,
    calls: Mutex<Vec<PromptCall>>,
    detach_calls: Mutex<usize>,
}

impl FakePromptHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            id: Uuid::new_v4(),
            lifecycle: Mutex::new(HostLifecycle::Attached),
            calls: Mutex::new(Vec::new()),
            detach_calls: Mutex::new(0),
        })
    }

    pub fn calls(&self) -> Vec<PromptCall> {
        self.calls.lock().clone()
    }

    pub fn last_call(&self) -> Option<PromptCall> {
        self.calls.lock().last().cloned()
    }

    pub fn set_lifecycle(&self, lifecycle: HostLifecycle) {
        *self.lifecycle.lock() = lifecycle;
    }

    pub fn detach_calls(&self) -> usize {
        *self.detach_calls.lock()
    }
}

impl PromptHost for FakePromptHost {
    fn id(&self) -> HostId {
        self.id
    }

    fn request_permissions(&self, request_code: RequestCode, permissions: &PermissionSet) {
        self.calls.lock().push(PromptCall {
            request_code,
            permissions: permissions.clone(),
        });
    }

    fn lifecycle(&self) -> HostLifecycle {
        *self.lifecycle.lock()
    }

    fn detach(&self) {
        *self.detach_calls.lock() += 1;
        *self.lifecycle.lock() = HostLifecycle::Detached;
    }
}

/// Factory that hands out fresh fake hosts and keeps a handle to each.
#[derive(Debug, Default)]
pub struct FakeHostFactory {
    created: Mutex<Vec<Arc<FakePromptHost>>>,
}

impl FakeHostFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn created(&self) -> Vec<Arc<FakePromptHost>> {
        self.created.lock().clone()
    }

    pub fn latest(&self) -> Option<Arc<FakePromptHost>> {
        self.created.lock().last().cloned()
    }

    pub fn count(&self) -> usize {
        self.created.lock().len()
    }
}

impl HostFactory for FakeHostFactory {
    fn create(&self) -> Arc<dyn PromptHost> {
        let host = FakePromptHost::new();
        self.created.lock().push(host.clone());
        host
    }
}
