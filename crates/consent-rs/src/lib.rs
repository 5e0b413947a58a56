//! Public SDK surface for consent-rs.
//!
//! This crate re-exports the core building blocks and provides small
//! initialization helpers to keep consumer setup consistent.

/// Re-export for convenience.
pub use consent_rs_config as config;
pub use consent_rs_core as core;
/// Re-export for convenience.
pub use consent_rs_protocol as protocol;

use consent_rs_config::ConsentConfig;
use consent_rs_core::{ConsentError, EventBus, HostFactory, Looper, PermissionCoordinator};
use std::sync::Arc;

#[inline]
/// Initialize logging using env_logger if the "logging" feature is enabled.
///
/// This is a no-op if the feature is not enabled. Binaries are still expected
/// to call this early in startup to ensure log output is wired up.
pub fn init_logging() {
    #[cfg(feature = "logging")]
    {
        let _ = env_logger::try_init();
    }
}

/// Build a coordinator and, when `events.enabled` is set, an event bus
/// already attached as its sink.
pub fn coordinator_with_events(
    config: &ConsentConfig,
    host_factory: Arc<dyn HostFactory>,
    looper: Arc<dyn Looper>,
) -> Result<(PermissionCoordinator, Option<EventBus>), ConsentError> {
    let coordinator = PermissionCoordinator::new(config, host_factory, looper)?;
    let bus = EventBus::from_config(&config.events);
    if let Some(bus) = &bus {
        coordinator.set_event_sink(Some(Arc::new(bus.clone())));
        log::debug!("event bus attached (buffer={})", config.events.buffer);
    }
    Ok((coordinator, bus))
}
