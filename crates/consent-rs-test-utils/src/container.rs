use consent_rs_core::{PromptHost, UiContainer};
use consent_rs_protocol::{ContainerKind, HostId};
use parking_lot::Mutex;
use std::sync::Arc;

/// UI container that keeps attached hosts in memory.
pub struct FakeContainer {
    name: String,
    kind: ContainerKind,
    attached: Mutex<Vec<(String, Arc<dyn PromptHost>)>>,
}

impl FakeContainer {
    pub fn activity(name: impl Into<String>) -> Self {
        Self::new(name, ContainerKind::Activity)
    }

    pub fn fragment(name: impl Into<String>) -> Self {
        Self::new(name, ContainerKind::Fragment)
    }

    pub fn unsupported(name: impl Into<String>) -> Self {
        Self::new(name, ContainerKind::Unsupported)
    }

    pub fn new(name: impl Into<String>, kind: ContainerKind) -> Self {
        Self {
            name: name.into(),
            kind,
            attached: Mutex::new(Vec::new()),
        }
    }

    /// Tags and host ids attached so far, in attachment order.
    pub fn attached(&self) -> Vec<(String, HostId)> {
        self.attached
            .lock()
            .iter()
            .map(|(tag, host)| (tag.clone(), host.id()))
            .collect()
    }

    /// Drop every attached host, as the framework does on destruction.
    pub fn destroy(&self) {
        self.attached.lock().clear();
    }
}

impl UiContainer for FakeContainer {
    fn kind(&self) -> ContainerKind {
        self.kind
    }

    fn describe(&self) -> String {
        format!("{:?}({})", self.kind, self.name)
    }

    fn attach_host(&self, tag: &str, host: Arc<dyn PromptHost>) {
        self.attached.lock().push((tag.to_string(), host));
    }
}
