//! Core coordination for runtime permission prompts.
//!
//! This crate owns the single-flight request queue, the process-wide
//! coordinator, and the protocol that binds the coordinator to whichever UI
//! container is currently alive.

pub mod coordinator;
pub mod error;
pub mod event_bus;
pub mod host;
pub mod looper;
pub mod pending;
pub mod queue;

pub use coordinator::{CoordinatorSnapshot, CurrentPrompt, PermissionCoordinator};
pub use error::ConsentError;
pub use event_bus::EventBus;
/// Host and container seams implemented by the UI framework glue.
pub use host::{HostFactory, HostLifecycle, PromptHost, UiContainer};
pub use looper::{Looper, LooperDriver, LooperTask, MainLooper};
pub use pending::{GrantFuture, PendingRequest};
pub use queue::RequestQueue;
/// Re-exported shared types.
pub use consent_rs_protocol::{
    BindingState, ContainerKind, EventMsg, EventPayload, EventSink, GrantResult, HostId,
    PermissionGrant, PermissionSet, RequestCode, RequestId,
};
