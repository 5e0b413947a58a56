//! Error types for the permission coordinator crate.

use consent_rs_config::ConfigError;
use consent_rs_protocol::{PermissionSetError, RequestId};
use thiserror::Error;

/// Errors surfaced synchronously to integrating code.
///
/// Grant and deny outcomes are never errors; they arrive through
/// [`GrantResult`](consent_rs_protocol::GrantResult).
#[derive(Debug, Error)]
pub enum ConsentError {
    /// `rebind` was called with a container that cannot carry a prompt host.
    #[error("unable to host a permission prompt in {0}")]
    UnsupportedContainer(String),
    /// `submit` was called with an empty or duplicated permission set.
    #[error("invalid permission set: {0}")]
    InvalidPermissions(#[from] PermissionSetError),
    /// The coordinator went away before the OS answered.
    #[error("permission request {0} was abandoned before it resolved")]
    Abandoned(RequestId),
    /// The UI looper no longer accepts tasks.
    #[error("ui looper is closed")]
    LooperClosed,
    /// Coordinator config failed validation.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}
