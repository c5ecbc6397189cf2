//! In-process worker runtime.
//!
//! Runs each installed worker on its own task, its own cooperative event
//! loop, and exposes the page-side [`LocalWorkerRegistry`]. The two sides
//! share no mutable state beyond the registry's snapshot of lifecycle
//! phases; the skip-waiting handshake travels over message channels.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::worker::{BuildVersion, ControllerChangeStream, WorkerRegistry};

use crate::worker::InterceptionWorker;

enum ControlMessage {
    SkipWaiting {
        instruction_id: Uuid,
        ack: oneshot::Sender<Uuid>,
    },
}

struct HostShared {
    waiting: Mutex<Option<BuildVersion>>,
    controlling: Mutex<Option<BuildVersion>>,
    control: Mutex<Option<mpsc::Sender<ControlMessage>>>,
    controller_changes: broadcast::Sender<BuildVersion>,
}

/// Hosts worker tasks and hands out registry handles.
pub struct LocalWorkerHost {
    shared: Arc<HostShared>,
}

impl LocalWorkerHost {
    pub fn new() -> Self {
        let (controller_changes, _) = broadcast::channel(16);
        Self {
            shared: Arc::new(HostShared {
                waiting: Mutex::new(None),
                controlling: Mutex::new(None),
                control: Mutex::new(None),
                controller_changes,
            }),
        }
    }

    /// A page-side registry handle over this host's workers.
    pub fn registry(&self) -> LocalWorkerRegistry {
        LocalWorkerRegistry {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Install `worker` on its own task.
    ///
    /// A worker with no controlling predecessor activates immediately;
    /// otherwise it parks as waiting until the skip-waiting instruction
    /// arrives. An install failure leaves the previous build in control.
    pub fn spawn(&self, worker: Arc<InterceptionWorker>) -> JoinHandle<()> {
        let shared = Arc::clone(&self.shared);
        let (control_tx, control_rx) = mpsc::channel(4);
        tokio::spawn(run_worker(worker, shared, control_tx, control_rx))
    }
}

impl Default for LocalWorkerHost {
    fn default() -> Self {
        Self::new()
    }
}

async fn run_worker(
    worker: Arc<InterceptionWorker>,
    shared: Arc<HostShared>,
    control_tx: mpsc::Sender<ControlMessage>,
    mut control_rx: mpsc::Receiver<ControlMessage>,
) {
    let version = worker.version().clone();

    if let Err(install_error) = worker.install().await {
        error!(%version, %install_error, "install failed; worker will never activate");
        return;
    }

    let must_wait = shared.controlling.lock().is_some();
    if must_wait {
        *shared.waiting.lock() = Some(version.clone());
        *shared.control.lock() = Some(control_tx);
        info!(%version, "worker installed and waiting");

        match control_rx.recv().await {
            Some(ControlMessage::SkipWaiting {
                instruction_id,
                ack,
            }) => {
                debug!(%version, %instruction_id, "skip-waiting instruction received");
                let _ = ack.send(instruction_id);
            }
            None => {
                // Host dropped the control channel; stay parked forever.
                return;
            }
        }
    } else {
        drop(control_tx);
    }

    match worker.activate().await {
        Ok(()) => {
            *shared.waiting.lock() = None;
            *shared.control.lock() = None;
            *shared.controlling.lock() = Some(version.clone());
            let _ = shared.controller_changes.send(version.clone());
            info!(%version, "worker now controlling");
        }
        Err(activate_error) => {
            error!(%version, %activate_error, "activation failed");
        }
    }
}

/// Page-side registry over the in-process worker host.
#[derive(Clone)]
pub struct LocalWorkerRegistry {
    shared: Arc<HostShared>,
}

#[async_trait]
impl WorkerRegistry for LocalWorkerRegistry {
    async fn waiting_build(&self) -> BridgeResult<Option<BuildVersion>> {
        Ok(self.shared.waiting.lock().clone())
    }

    async fn controlling_build(&self) -> BridgeResult<Option<BuildVersion>> {
        Ok(self.shared.controlling.lock().clone())
    }

    async fn skip_waiting(&self, instruction_id: Uuid) -> BridgeResult<()> {
        let sender = self
            .shared
            .control
            .lock()
            .clone()
            .ok_or_else(|| BridgeError::NotAvailable("no waiting worker".into()))?;

        let (ack_tx, ack_rx) = oneshot::channel();
        sender
            .send(ControlMessage::SkipWaiting {
                instruction_id,
                ack: ack_tx,
            })
            .await
            .map_err(|_| BridgeError::OperationFailed("worker control channel closed".into()))?;

        let acknowledged = ack_rx
            .await
            .map_err(|_| BridgeError::OperationFailed("waiting worker dropped the ack".into()))?;
        if acknowledged != instruction_id {
            return Err(BridgeError::OperationFailed(
                "acknowledgement for a different instruction".into(),
            ));
        }
        Ok(())
    }

    async fn subscribe_controller_changes(&self) -> BridgeResult<Box<dyn ControllerChangeStream>> {
        Ok(Box::new(BroadcastControllerStream {
            receiver: self.shared.controller_changes.subscribe(),
        }))
    }
}

struct BroadcastControllerStream {
    receiver: broadcast::Receiver<BuildVersion>,
}

#[async_trait]
impl ControllerChangeStream for BroadcastControllerStream {
    async fn next(&mut self) -> Option<BuildVersion> {
        loop {
            match self.receiver.recv().await {
                Ok(version) => return Some(version),
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!(missed, "controller change stream lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
