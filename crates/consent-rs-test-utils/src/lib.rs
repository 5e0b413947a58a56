//! Test helpers shared across consent-rs crates.

pub mod container;
pub mod events;
pub mod harness;
pub mod host;

pub use container::FakeContainer;
pub use events::RecordingEventSink;
pub use harness::{Harness, harness, harness_with_config};
pub use host::{FakeHostFactory, FakePromptHost, PromptCall};
