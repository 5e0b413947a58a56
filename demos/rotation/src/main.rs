//! Simulated screen rotation against the permission coordinator.
//!
//! A fake "system" answers prompts after a short delay while the demo tears
//! down and recreates the activity. Every request still resolves exactly once.

use anyhow::{Context, Result};
use clap::Parser;
use consent_rs::config::{ConsentConfig, LayeredConfigOptions};
use consent_rs::core::{
    ContainerKind, HostId, HostLifecycle, MainLooper, PermissionCoordinator, PermissionSet,
    PromptHost, RequestCode, UiContainer,
};
use consent_rs::{coordinator_with_events, init_logging};
use log::{debug, info};
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use uuid::Uuid;

const REQUEST_SETS: &[&[&str]] = &[
    &["CAMERA"],
    &["ACCESS_FINE_LOCATION"],
    &["CAMERA", "RECORD_AUDIO"],
    &["READ_CONTACTS"],
];

/// Command-line options for the rotation demo.
#[derive(Parser)]
#[command(name = "consent-rotation", version)]
struct Cli {
    /// Optional consent.json5 applied over the user and cwd layers
    #[arg(long)]
    config: Option<PathBuf>,
    /// Number of permission requests to submit
    #[arg(long, default_value_t = 4)]
    requests: usize,
    /// Number of activity recreations while prompts are outstanding
    #[arg(long, default_value_t = 3)]
    rotations: usize,
    /// Permissions the simulated user denies (comma separated)
    #[arg(long, value_delimiter = ',')]
    deny: Vec<String>,
    /// How long the simulated user takes to answer, in milliseconds
    #[arg(long, default_value_t = 40)]
    think_ms: u64,
}

/// A prompt forwarded to the simulated system dialog.
struct SystemPrompt {
    request_code: RequestCode,
    permissions: PermissionSet,
}

struct DemoHost {
    id: HostId,
    lifecycle: Mutex<HostLifecycle>,
    system: mpsc::UnboundedSender<SystemPrompt>,
}

impl PromptHost for DemoHost {
    fn id(&self) -> HostId {
        self.id
    }

    fn request_permissions(&self, request_code: RequestCode, permissions: &PermissionSet) {
        let prompt = SystemPrompt {
            request_code,
            permissions: permissions.clone(),
        };
        if self.system.send(prompt).is_err() {
            debug!("system dialog closed; prompt dropped (host_id={})", self.id);
        }
    }

    fn lifecycle(&self) -> HostLifecycle {
        *self.lifecycle.lock()
    }

    fn detach(&self) {
        *self.lifecycle.lock() = HostLifecycle::Detached;
    }
}

/// Activity stand-in; destroying it drops every host it carries.
struct DemoActivity {
    name: String,
    hosts: Mutex<Vec<Arc<dyn PromptHost>>>,
}

impl DemoActivity {
    fn new(generation: usize) -> Self {
        Self {
            name: format!("MainActivity#{generation}"),
            hosts: Mutex::new(Vec::new()),
        }
    }

    fn destroy(&self) {
        let hosts = std::mem::take(&mut *self.hosts.lock());
        debug!("activity destroyed (name={}, hosts={})", self.name, hosts.len());
    }
}

impl UiContainer for DemoActivity {
    fn kind(&self) -> ContainerKind {
        ContainerKind::Activity
    }

    fn describe(&self) -> String {
        self.name.clone()
    }

    fn attach_host(&self, tag: &str, host: Arc<dyn PromptHost>) {
        debug!("host attached (activity={}, tag={})", self.name, tag);
        self.hosts.lock().push(host);
    }
}

/// Answer prompts the way a user tapping through dialogs would.
async fn run_system(
    coordinator: PermissionCoordinator,
    mut prompts: mpsc::UnboundedReceiver<SystemPrompt>,
    deny: Vec<String>,
    think: Duration,
) {
    while let Some(prompt) = prompts.recv().await {
        tokio::time::sleep(think).await;
        let reported = prompt.permissions.as_slice().to_vec();
        let granted: Vec<bool> = reported
            .iter()
            .map(|permission| !deny.contains(permission))
            .collect();
        let accepted = coordinator.on_result_for_code(prompt.request_code, &reported, &granted);
        debug!(
            "system answered (request_code={}, accepted={})",
            prompt.request_code, accepted
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let cwd = std::env::current_dir().context("failed to resolve current working directory")?;
    let mut options = LayeredConfigOptions::new(&cwd);
    if let Some(path) = &cli.config {
        options = options.with_runtime_path(path);
    }
    let layered =
        ConsentConfig::load_layered_with_options(options).context("failed to load config")?;
    info!("config loaded (layers={})", layered.layers.len());

    let (looper, driver) = MainLooper::new();
    tokio::spawn(driver.run());

    let (system_tx, system_rx) = mpsc::unbounded_channel();
    let factory = move || -> Arc<dyn PromptHost> {
        Arc::new(DemoHost {
            id: Uuid::new_v4(),
            lifecycle: Mutex::new(HostLifecycle::Attached),
            system: system_tx.clone(),
        })
    };
    let (coordinator, bus) =
        coordinator_with_events(&layered.config, Arc::new(factory), Arc::new(looper))
            .context("failed to create permission coordinator")?;

    if let Some(bus) = bus {
        let mut events = bus.subscribe();
        tokio::spawn(async move {
            while let Ok(event) = events.recv().await {
                match serde_json::to_string(&event.payload) {
                    Ok(json) => println!("event {json}"),
                    Err(err) => debug!("failed to encode event: {err}"),
                }
            }
        });
    }

    let think = Duration::from_millis(cli.think_ms);
    tokio::spawn(run_system(
        coordinator.clone(),
        system_rx,
        cli.deny.clone(),
        think,
    ));

    let mut activity = DemoActivity::new(0);
    coordinator
        .rebind(&activity)
        .context("failed to bind initial activity")?;

    let mut pending = Vec::with_capacity(cli.requests);
    for idx in 0..cli.requests {
        let set = REQUEST_SETS[idx % REQUEST_SETS.len()];
        let future = coordinator
            .submit(set.iter().copied())
            .context("failed to submit permission request")?;
        pending.push((set, future));
    }

    for generation in 1..=cli.rotations {
        tokio::time::sleep(think / 2).await;
        info!("rotating (generation={generation})");
        coordinator.unbind();
        let next = DemoActivity::new(generation);
        coordinator
            .rebind(&next)
            .context("failed to rebind after rotation")?;
        tokio::time::sleep(Duration::from_millis(1)).await;
        activity.destroy();
        activity = next;
    }

    for (set, future) in pending {
        let request_id = future.request_id();
        let result = future
            .await
            .with_context(|| format!("request {request_id} was abandoned"))?;
        println!(
            "{:?} -> granted={:?} denied={:?}",
            set,
            result.granted(),
            result.denied()
        );
    }

    let snapshot = coordinator.snapshot();
    println!(
        "done (binding={:?}, host={:?}, queued={})",
        snapshot.binding, snapshot.host_id, snapshot.queued
    );
    activity.destroy();
    Ok(())
}
