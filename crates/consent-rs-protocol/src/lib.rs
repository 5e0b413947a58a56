//! Shared types for consent-rs: permission sets, grant results, and the
//! diagnostic events emitted by the coordinator.

mod grant;
mod permission;

pub use grant::{GrantResult, PermissionGrant};
pub use permission::{PermissionSet, PermissionSetError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a submitted permission request.
pub type RequestId = Uuid;
/// Unique identifier for a prompt host instance.
pub type HostId = Uuid;
/// Platform request code attached to a dispatched prompt.
pub type RequestCode = u16;

/// Kind of UI container a prompt host can be attached to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ContainerKind {
    /// Top-level screen container (activity-equivalent).
    Activity,
    /// Nested container inside a screen (fragment-equivalent).
    Fragment,
    /// A context that cannot carry a prompt host.
    Unsupported,
}

/// Prompt host binding state as seen by the coordinator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BindingState {
    /// No host bound and no detachment pending.
    Unbound,
    /// A host is bound and usable for dispatch.
    Bound,
    /// The previous host was released and its detachment has not run yet.
    Detaching,
}

/// Wrapper for diagnostic events emitted by the coordinator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMsg {
    /// Unique id for the event.
    pub id: Uuid,
    /// Timestamp when the event was created.
    pub created_at: DateTime<Utc>,
    /// Event payload content.
    pub payload: EventPayload,
}

impl EventMsg {
    /// Wrap a payload with a fresh id and timestamp.
    pub fn new(payload: EventPayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            payload,
        }
    }
}

/// All events emitted while coordinating permission prompts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "payload")]
pub enum EventPayload {
    /// A request was appended to the queue.
    RequestQueued {
        request_id: RequestId,
        permissions: PermissionSet,
        queue_len: usize,
    },
    /// A request became current and was handed to the prompt host.
    PromptStarted {
        request_id: RequestId,
        request_code: RequestCode,
        host_id: HostId,
        permissions: PermissionSet,
    },
    /// The current request was resolved with the OS outcome.
    PromptResolved {
        request_id: RequestId,
        result: GrantResult,
    },
    /// A result arrived that did not belong to any current request.
    StaleResultIgnored {
        request_code: Option<RequestCode>,
        permissions: Vec<String>,
    },
    /// A prompt host was attached to a container.
    HostBound {
        host_id: HostId,
        tag: String,
        kind: ContainerKind,
    },
    /// A rebind arrived while a host was already bound.
    HostBindIgnored { host_id: HostId },
    /// The binding was released and a detachment was scheduled.
    HostUnbound { host_id: HostId },
    /// The deferred detachment removed the host from its container.
    HostDetached { host_id: HostId },
    /// The deferred detachment found the host already gone or being removed.
    DetachSkipped { host_id: HostId },
}

/// Sink interface for coordinator events.
pub trait EventSink: Send + Sync {
    /// Emit an event to downstream listeners.
    fn emit(&self, event: EventMsg);
}
