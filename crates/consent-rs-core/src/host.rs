//! Prompt host and UI container seams.
//!
//! A prompt host is the short-lived attachment point that shows the OS
//! permission dialog. It lives inside a UI container owned by the host
//! framework; the coordinator only ever keeps a non-owning binding to it.

use consent_rs_protocol::{ContainerKind, HostId, PermissionSet, RequestCode};
use std::sync::{Arc, Weak};

/// Framework-reported lifecycle of a prompt host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostLifecycle {
    /// Added to a container and not being torn down.
    Attached,
    /// The framework has started removing it.
    Removing,
    /// No longer part of any container.
    Detached,
}

impl HostLifecycle {
    /// Whether the host can still show prompts and be detached.
    pub fn is_live(self) -> bool {
        matches!(self, HostLifecycle::Attached)
    }
}

/// UI attachment point able to trigger the OS permission dialog.
///
/// Implementations report the OS answer back through
/// [`PermissionCoordinator::on_result`](crate::PermissionCoordinator::on_result).
/// `id` and `lifecycle` are called while coordinator state is locked and must
/// not call back into the coordinator.
pub trait PromptHost: Send + Sync {
    /// Stable id of this host instance.
    fn id(&self) -> HostId;
    /// Ask the OS to prompt for `permissions`.
    fn request_permissions(&self, request_code: RequestCode, permissions: &PermissionSet);
    /// Current framework lifecycle.
    fn lifecycle(&self) -> HostLifecycle;
    /// Remove the host from its container.
    fn detach(&self);
}

/// A live UI container that can carry a prompt host.
pub trait UiContainer: Send + Sync {
    /// Container kind; decides the tag used for attachment.
    fn kind(&self) -> ContainerKind;
    /// Human-readable name used in errors and logs.
    fn describe(&self) -> String;
    /// Add `host` to the container hierarchy under `tag`.
    ///
    /// The container takes ownership of the host's lifetime.
    fn attach_host(&self, tag: &str, host: Arc<dyn PromptHost>);
}

/// Creates fresh prompt hosts on demand.
pub trait HostFactory: Send + Sync {
    fn create(&self) -> Arc<dyn PromptHost>;
}

impl<F> HostFactory for F
where
    F: Fn() -> Arc<dyn PromptHost> + Send + Sync,
{
    fn create(&self) -> Arc<dyn PromptHost> {
        self()
    }
}

/// Non-owning relation from the coordinator to the bound host.
#[derive(Clone)]
pub(crate) struct HostBinding {
    pub(crate) id: HostId,
    pub(crate) tag: String,
    host: Weak<dyn PromptHost>,
}

impl HostBinding {
    pub(crate) fn new(host: &Arc<dyn PromptHost>, tag: String) -> Self {
        Self {
            id: host.id(),
            tag,
            host: Arc::downgrade(host),
        }
    }

    /// The host, if its container still holds it and it is not being removed.
    pub(crate) fn live_host(&self) -> Option<Arc<dyn PromptHost>> {
        self.host
            .upgrade()
            .filter(|host| host.lifecycle().is_live())
    }
}
