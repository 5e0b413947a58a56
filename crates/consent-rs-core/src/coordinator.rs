//! Single-flight permission coordinator.
//!
//! One coordinator exists per process. It serializes permission prompts so at
//! most one is outstanding with the OS, and it follows the UI container
//! lifecycle by binding to whichever prompt host is currently alive.

use crate::error::ConsentError;
use crate::host::{HostBinding, HostFactory, UiContainer};
use crate::looper::Looper;
use crate::pending::{GrantFuture, PendingRequest, ResultSink};
use crate::queue::RequestQueue;
use consent_rs_config::{BindingConfig, ConsentConfig};
use consent_rs_protocol::{
    BindingState, ContainerKind, EventMsg, EventPayload, EventSink, GrantResult, HostId,
    PermissionSet, RequestCode, RequestId,
};
use log::{debug, info, warn};
use parking_lot::{Mutex, RwLock};
use std::sync::{Arc, Weak};
use tokio::sync::oneshot;

/// Point-in-time view of coordinator state for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorSnapshot {
    pub binding: BindingState,
    pub host_id: Option<HostId>,
    pub current: Option<CurrentPrompt>,
    pub queued: usize,
    pub next_queued: Option<PermissionSet>,
}

/// The prompt that is outstanding with the OS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentPrompt {
    pub request_id: RequestId,
    pub request_code: RequestCode,
    pub host_id: HostId,
    pub permissions: PermissionSet,
}

/// Process-wide coordinator handle.
///
/// Construct it once at startup and hand clones to the UI layer; every clone
/// shares the same queue and binding.
#[derive(Clone)]
pub struct PermissionCoordinator {
    inner: Arc<Inner>,
}

struct Inner {
    binding_config: BindingConfig,
    host_factory: Arc<dyn HostFactory>,
    looper: Arc<dyn Looper>,
    state: Mutex<CoordinatorState>,
    event_sink: RwLock<Option<Arc<dyn EventSink>>>,
}

struct CoordinatorState {
    queue: RequestQueue<PendingRequest>,
    current: Option<InFlight>,
    binding: Option<HostBinding>,
    pending_detaches: usize,
    codes: RequestCodes,
}

/// The current request plus the code it was dispatched with.
struct InFlight {
    request: PendingRequest,
    request_code: RequestCode,
    host_id: HostId,
}

/// Sequential request code allocator.
struct RequestCodes {
    base: RequestCode,
    next: RequestCode,
}

impl RequestCodes {
    fn new(base: RequestCode) -> Self {
        Self { base, next: base }
    }

    /// Hand out the next code; consecutive codes always differ.
    fn allocate(&mut self) -> RequestCode {
        let code = self.next;
        let mut next = code.checked_add(1).unwrap_or(self.base);
        if next == code {
            next = code.wrapping_add(1);
        }
        self.next = next;
        code
    }
}

impl PermissionCoordinator {
    /// Create a coordinator from validated config.
    pub fn new(
        config: &ConsentConfig,
        host_factory: Arc<dyn HostFactory>,
        looper: Arc<dyn Looper>,
    ) -> Result<Self, ConsentError> {
        config.validate()?;
        info!(
            "permission coordinator created (base_request_code={})",
            config.requests.base_request_code
        );
        Ok(Self {
            inner: Arc::new(Inner {
                binding_config: config.binding.clone(),
                host_factory,
                looper,
                state: Mutex::new(CoordinatorState {
                    queue: RequestQueue::new(),
                    current: None,
                    binding: None,
                    pending_detaches: 0,
                    codes: RequestCodes::new(config.requests.base_request_code),
                }),
                event_sink: RwLock::new(None),
            }),
        })
    }

    /// Attach an event sink for diagnostic events.
    pub fn set_event_sink(&self, sink: Option<Arc<dyn EventSink>>) {
        *self.inner.event_sink.write() = sink;
    }

    /// Queue a permission request and return a future for its outcome.
    ///
    /// Fails only on an empty or duplicated permission set.
    pub fn submit<I, S>(&self, permissions: I) -> Result<GrantFuture, ConsentError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let permissions = PermissionSet::new(permissions)?;
        let (sender, receiver) = oneshot::channel();
        let request_id = self.enqueue(PendingRequest::new(
            permissions,
            ResultSink::Channel(sender),
        ));
        Ok(GrantFuture::new(request_id, receiver))
    }

    /// Queue a permission request whose outcome is passed to `callback`.
    ///
    /// The callback runs on whichever thread delivers the OS result.
    pub fn submit_with<I, S, F>(
        &self,
        permissions: I,
        callback: F,
    ) -> Result<RequestId, ConsentError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: FnOnce(GrantResult) + Send + 'static,
    {
        let permissions = PermissionSet::new(permissions)?;
        Ok(self.enqueue(PendingRequest::new(
            permissions,
            ResultSink::Callback(Box::new(callback)),
        )))
    }

    fn enqueue(&self, request: PendingRequest) -> RequestId {
        let request_id = request.id();
        let permissions = request.permissions().clone();
        let queue_len = {
            let mut state = self.inner.state.lock();
            state.queue.push(request);
            state.queue.len()
        };
        debug!(
            "permission request queued (request_id={}, permissions={}, queue_len={})",
            request_id, permissions, queue_len
        );
        self.emit(EventPayload::RequestQueued {
            request_id,
            permissions,
            queue_len,
        });
        self.dispatch_next();
        request_id
    }

    /// Start the next queued request if the prompt slot is free and a live
    /// host is bound.
    fn dispatch_next(&self) {
        let (host, prompt) = {
            let mut state = self.inner.state.lock();
            if let Some(current) = &state.current {
                debug!(
                    "prompt already in flight; dispatch deferred (request_id={}, queued={})",
                    current.request.id(),
                    state.queue.len()
                );
                return;
            }
            if state.queue.is_empty() {
                return;
            }
            let Some(host) = state.binding.as_ref().and_then(HostBinding::live_host) else {
                debug!(
                    "no live prompt host; requests wait for rebind (queued={})",
                    state.queue.len()
                );
                return;
            };
            let Some(request) = state.queue.pop() else {
                return;
            };
            let request_code = state.codes.allocate();
            let prompt = CurrentPrompt {
                request_id: request.id(),
                request_code,
                host_id: host.id(),
                permissions: request.permissions().clone(),
            };
            state.current = Some(InFlight {
                request,
                request_code,
                host_id: prompt.host_id,
            });
            (host, prompt)
        };

        info!(
            "starting permission prompt (request_id={}, request_code={}, host_id={}, permissions={})",
            prompt.request_id, prompt.request_code, prompt.host_id, prompt.permissions
        );
        self.emit(EventPayload::PromptStarted {
            request_id: prompt.request_id,
            request_code: prompt.request_code,
            host_id: prompt.host_id,
            permissions: prompt.permissions.clone(),
        });
        host.request_permissions(prompt.request_code, &prompt.permissions);
    }

    /// Deliver the OS answer for the current prompt.
    ///
    /// `permissions` must list the current request's identifiers in order; an
    /// empty list means the prompt was interrupted and resolves as denied.
    /// Returns `false` when the result was stale and ignored.
    ///
    /// No request code is checked, so a repeated OS callback for an earlier
    /// request resolves a later request with the same permissions. Hosts that
    /// know the request code should call
    /// [`on_result_for_code`](Self::on_result_for_code) instead.
    pub fn on_result(&self, permissions: &[String], granted: &[bool]) -> bool {
        self.resolve_current(None, permissions, granted)
    }

    /// Like [`on_result`](Self::on_result), additionally requiring the
    /// request code the prompt was dispatched with.
    pub fn on_result_for_code(
        &self,
        request_code: RequestCode,
        permissions: &[String],
        granted: &[bool],
    ) -> bool {
        self.resolve_current(Some(request_code), permissions, granted)
    }

    fn resolve_current(
        &self,
        request_code: Option<RequestCode>,
        reported: &[String],
        granted: &[bool],
    ) -> bool {
        let in_flight = {
            let mut state = self.inner.state.lock();
            let belongs_to_current = state.current.as_ref().is_some_and(|current| {
                request_code.is_none_or(|code| code == current.request_code)
                    && (reported.is_empty() || current.request.permissions().matches(reported))
            });
            if belongs_to_current {
                state.current.take()
            } else {
                None
            }
        };

        let Some(in_flight) = in_flight else {
            warn!(
                "ignoring stale permission result (request_code={:?}, permissions={:?})",
                request_code, reported
            );
            self.emit(EventPayload::StaleResultIgnored {
                request_code,
                permissions: reported.to_vec(),
            });
            return false;
        };

        let flags = if reported.is_empty() { &[][..] } else { granted };
        let result = GrantResult::from_flags(in_flight.request.permissions(), flags);
        let request_id = in_flight.request.id();
        info!(
            "permission prompt resolved (request_id={}, request_code={}, granted={:?}, denied={:?}, waited_ms={})",
            request_id,
            in_flight.request_code,
            result.granted(),
            result.denied(),
            in_flight.request.waited().as_millis()
        );
        self.emit(EventPayload::PromptResolved {
            request_id,
            result: result.clone(),
        });
        in_flight.request.resolve(result);
        self.dispatch_next();
        true
    }

    /// Bind a prompt host inside `container`, creating one if none is bound.
    ///
    /// A live existing binding wins; the new container is ignored. Queued work
    /// resumes once a host is bound. An in-flight prompt is not re-issued.
    pub fn rebind(&self, container: &dyn UiContainer) -> Result<HostId, ConsentError> {
        let kind = container.kind();
        let tag = match kind {
            ContainerKind::Activity => self.inner.binding_config.activity_tag.clone(),
            ContainerKind::Fragment => self.inner.binding_config.fragment_tag.clone(),
            ContainerKind::Unsupported => {
                return Err(ConsentError::UnsupportedContainer(container.describe()));
            }
        };

        if let Some(host_id) = self.live_binding_id() {
            debug!(
                "re-using bound prompt host (host_id={}, container={})",
                host_id,
                container.describe()
            );
            self.emit(EventPayload::HostBindIgnored { host_id });
            return Ok(host_id);
        }

        let host = self.inner.host_factory.create();
        container.attach_host(&tag, host.clone());
        let host_id = host.id();

        let raced = {
            let mut state = self.inner.state.lock();
            let live = state
                .binding
                .as_ref()
                .filter(|binding| binding.live_host().is_some())
                .map(|binding| binding.id);
            if live.is_none()
                && let Some(dead) = state.binding.replace(HostBinding::new(&host, tag.clone()))
            {
                debug!("replaced dead prompt host binding (host_id={})", dead.id);
            }
            live
        };
        if let Some(existing) = raced {
            debug!(
                "prompt host bound concurrently; dropping new host (host_id={}, bound={})",
                host_id, existing
            );
            host.detach();
            self.emit(EventPayload::HostBindIgnored { host_id: existing });
            return Ok(existing);
        }

        info!(
            "bound prompt host (host_id={}, tag={}, container={})",
            host_id,
            tag,
            container.describe()
        );
        self.emit(EventPayload::HostBound { host_id, tag, kind });
        self.dispatch_next();
        Ok(host_id)
    }

    /// Release the bound host ahead of its container being destroyed.
    ///
    /// The binding is cleared immediately; the structural detachment is posted
    /// to the UI looper. The current prompt keeps waiting for its result.
    pub fn unbind(&self) {
        let binding = {
            let mut state = self.inner.state.lock();
            let binding = state.binding.take();
            if binding.is_some() {
                state.pending_detaches += 1;
            }
            binding
        };
        let Some(binding) = binding else {
            debug!("unbind with no bound prompt host");
            return;
        };

        let host_id = binding.id;
        info!(
            "released prompt host; detachment scheduled (host_id={}, tag={})",
            host_id, binding.tag
        );
        self.emit(EventPayload::HostUnbound { host_id });

        let ticket = DetachTicket {
            inner: Arc::downgrade(&self.inner),
        };
        // A rejected or discarded task drops the ticket, which settles the count.
        let posted = self
            .inner
            .looper
            .post(Box::new(move || finish_detach(ticket, binding)));
        if let Err(err) = posted {
            warn!("failed to schedule prompt host detachment (host_id={host_id}): {err}");
        }
    }

    /// Current binding state.
    pub fn binding_state(&self) -> BindingState {
        binding_state(&self.inner.state.lock())
    }

    /// Id of the bound host, if any.
    pub fn bound_host_id(&self) -> Option<HostId> {
        self.inner.state.lock().binding.as_ref().map(|binding| binding.id)
    }

    /// Capture a diagnostic snapshot.
    pub fn snapshot(&self) -> CoordinatorSnapshot {
        let state = self.inner.state.lock();
        CoordinatorSnapshot {
            binding: binding_state(&state),
            host_id: state.binding.as_ref().map(|binding| binding.id),
            current: state.current.as_ref().map(|current| CurrentPrompt {
                request_id: current.request.id(),
                request_code: current.request_code,
                host_id: current.host_id,
                permissions: current.request.permissions().clone(),
            }),
            queued: state.queue.len(),
            next_queued: state
                .queue
                .peek()
                .map(|request| request.permissions().clone()),
        }
    }

    fn live_binding_id(&self) -> Option<HostId> {
        let state = self.inner.state.lock();
        let binding = state.binding.as_ref()?;
        binding.live_host().map(|_| binding.id)
    }

    fn emit(&self, payload: EventPayload) {
        self.inner.emit(payload);
    }
}

impl Inner {
    fn emit(&self, payload: EventPayload) {
        let Some(sink) = self.event_sink.read().clone() else {
            return;
        };
        sink.emit(EventMsg::new(payload));
    }
}

fn binding_state(state: &CoordinatorState) -> BindingState {
    if state.binding.is_some() {
        BindingState::Bound
    } else if state.pending_detaches > 0 {
        BindingState::Detaching
    } else {
        BindingState::Unbound
    }
}

/// One outstanding deferred detach. Dropping it, whether the looper ran the
/// task or discarded it, ends the `Detaching` state for that host.
struct DetachTicket {
    inner: Weak<Inner>,
}

impl Drop for DetachTicket {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.upgrade() {
            let mut state = inner.state.lock();
            state.pending_detaches = state.pending_detaches.saturating_sub(1);
        }
    }
}

/// Deferred half of `unbind`: detach the released host if the framework has
/// not already discarded it.
fn finish_detach(ticket: DetachTicket, binding: HostBinding) {
    let detached = match binding.live_host() {
        Some(host) => {
            host.detach();
            true
        }
        None => false,
    };
    let inner = ticket.inner.clone();
    drop(ticket);
    let Some(inner) = inner.upgrade() else {
        return;
    };
    if detached {
        info!("detached prompt host (host_id={})", binding.id);
        inner.emit(EventPayload::HostDetached {
            host_id: binding.id,
        });
    } else {
        debug!(
            "prompt host already gone or removing; detach skipped (host_id={})",
            binding.id
        );
        inner.emit(EventPayload::DetachSkipped {
            host_id: binding.id,
        });
    }
}
