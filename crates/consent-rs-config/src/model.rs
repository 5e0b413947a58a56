//! Configuration schema for consent-rs.

use serde::{Deserialize, Serialize};

/// Root config for the permission coordinator.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ConsentConfig {
    #[serde(default, rename = "$schema")]
    pub schema: Option<String>,
    #[serde(default)]
    pub binding: BindingConfig,
    #[serde(default)]
    pub requests: RequestsConfig,
    #[serde(default)]
    pub events: EventsConfig,
}

impl ConsentConfig {
    /// Start building a config programmatically with defaults applied.
    pub fn builder() -> ConsentConfigBuilder {
        ConsentConfigBuilder::new()
    }
}

/// Builder for assembling a `ConsentConfig` in code.
#[derive(Debug, Default, Clone)]
pub struct ConsentConfigBuilder {
    config: ConsentConfig,
}

impl ConsentConfigBuilder {
    /// Create a new builder seeded with default config values.
    pub fn new() -> Self {
        Self {
            config: ConsentConfig::default(),
        }
    }

    /// Replace the host binding configuration.
    pub fn binding(mut self, binding: BindingConfig) -> Self {
        self.config.binding = binding;
        self
    }

    /// Replace the request code configuration.
    pub fn requests(mut self, requests: RequestsConfig) -> Self {
        self.config.requests = requests;
        self
    }

    /// Replace the diagnostic event configuration.
    pub fn events(mut self, events: EventsConfig) -> Self {
        self.config.events = events;
        self
    }

    /// Finalize and return the built `ConsentConfig`.
    pub fn build(self) -> ConsentConfig {
        self.config
    }
}

/// Tags used when attaching a prompt host into a container hierarchy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BindingConfig {
    #[serde(default = "default_activity_tag")]
    pub activity_tag: String,
    #[serde(default = "default_fragment_tag")]
    pub fragment_tag: String,
}

impl Default for BindingConfig {
    fn default() -> Self {
        Self {
            activity_tag: default_activity_tag(),
            fragment_tag: default_fragment_tag(),
        }
    }
}

fn default_activity_tag() -> String {
    "[consent_prompt_host/activity]".to_string()
}

fn default_fragment_tag() -> String {
    "[consent_prompt_host/fragment]".to_string()
}

/// Request code allocation for dispatched prompts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RequestsConfig {
    #[serde(default = "default_base_request_code")]
    pub base_request_code: u16,
}

impl Default for RequestsConfig {
    fn default() -> Self {
        Self {
            base_request_code: default_base_request_code(),
        }
    }
}

fn default_base_request_code() -> u16 {
    20
}

/// Diagnostic event bus settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventsConfig {
    #[serde(default = "default_events_enabled")]
    pub enabled: bool,
    #[serde(default = "default_events_buffer")]
    pub buffer: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            enabled: default_events_enabled(),
            buffer: default_events_buffer(),
        }
    }
}

fn default_events_enabled() -> bool {
    true
}

fn default_events_buffer() -> usize {
    64
}
