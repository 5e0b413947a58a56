//! Single-threaded UI event loop used for deferred work.

use crate::error::ConsentError;
use log::{debug, trace};
use tokio::sync::mpsc;

/// Unit of work posted to the UI looper.
pub type LooperTask = Box<dyn FnOnce() + Send + 'static>;

/// Posts zero-delay tasks to run at the next idle point of the UI thread.
pub trait Looper: Send + Sync {
    fn post(&self, task: LooperTask) -> Result<(), ConsentError>;
}

/// Channel-backed looper handle. Tasks run in posting order on whichever
/// thread drives the paired [`LooperDriver`].
#[derive(Clone, Debug)]
pub struct MainLooper {
    sender: mpsc::UnboundedSender<LooperTask>,
}

impl MainLooper {
    /// Create a looper handle and the driver that executes its tasks.
    pub fn new() -> (Self, LooperDriver) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, LooperDriver { receiver })
    }
}

impl Looper for MainLooper {
    fn post(&self, task: LooperTask) -> Result<(), ConsentError> {
        self.sender
            .send(task)
            .map_err(|_| ConsentError::LooperClosed)
    }
}

/// Executes tasks posted to a [`MainLooper`].
pub struct LooperDriver {
    receiver: mpsc::UnboundedReceiver<LooperTask>,
}

impl LooperDriver {
    /// Run tasks until every looper handle has been dropped.
    pub async fn run(mut self) {
        while let Some(task) = self.receiver.recv().await {
            task();
        }
        debug!("ui looper stopped");
    }

    /// Run every task that is already queued and return how many ran.
    ///
    /// Tasks posted while draining also run before this returns.
    pub fn run_until_idle(&mut self) -> usize {
        let mut ran = 0;
        while let Ok(task) = self.receiver.try_recv() {
            task();
            ran += 1;
        }
        trace!("ui looper drained (tasks={ran})");
        ran
    }
}
