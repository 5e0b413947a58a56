//! Pending permission requests and their completion sinks.

use crate::error::ConsentError;
use consent_rs_protocol::{GrantResult, PermissionSet, RequestId};
use log::debug;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use uuid::Uuid;

/// Where a resolved result is delivered.
pub(crate) enum ResultSink {
    /// Resolves a [`GrantFuture`] held by the caller.
    Channel(oneshot::Sender<GrantResult>),
    /// Invokes a caller-supplied callback.
    Callback(Box<dyn FnOnce(GrantResult) + Send>),
}

/// A permission ask that has not been answered yet.
///
/// Immutable once created. Resolving consumes it, so a request can only be
/// answered once.
pub struct PendingRequest {
    id: RequestId,
    permissions: PermissionSet,
    submitted_at: Instant,
    sink: ResultSink,
}

impl PendingRequest {
    pub(crate) fn new(permissions: PermissionSet, sink: ResultSink) -> Self {
        Self {
            id: Uuid::new_v4(),
            permissions,
            submitted_at: Instant::now(),
            sink,
        }
    }

    pub fn id(&self) -> RequestId {
        self.id
    }

    pub fn permissions(&self) -> &PermissionSet {
        &self.permissions
    }

    /// Time since the request was submitted.
    pub fn waited(&self) -> Duration {
        self.submitted_at.elapsed()
    }

    /// Deliver the result to the caller.
    pub(crate) fn resolve(self, result: GrantResult) {
        match self.sink {
            ResultSink::Channel(sender) => {
                if sender.send(result).is_err() {
                    debug!(
                        "caller stopped waiting for permission result (request_id={})",
                        self.id
                    );
                }
            }
            ResultSink::Callback(callback) => callback(result),
        }
    }
}

impl std::fmt::Debug for PendingRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingRequest")
            .field("id", &self.id)
            .field("permissions", &self.permissions)
            .finish_non_exhaustive()
    }
}

/// Future returned by [`PermissionCoordinator::submit`](crate::PermissionCoordinator::submit).
///
/// Resolves with the OS outcome, or with [`ConsentError::Abandoned`] if the
/// coordinator is dropped first.
#[derive(Debug)]
pub struct GrantFuture {
    request_id: RequestId,
    receiver: oneshot::Receiver<GrantResult>,
}

impl GrantFuture {
    pub(crate) fn new(request_id: RequestId, receiver: oneshot::Receiver<GrantResult>) -> Self {
        Self {
            request_id,
            receiver,
        }
    }

    /// Id of the underlying request, as reported in events and logs.
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }
}

impl Future for GrantFuture {
    type Output = Result<GrantResult, ConsentError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let request_id = self.request_id;
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|received| received.map_err(|_| ConsentError::Abandoned(request_id)))
    }
}
