//! The update coordinator.

use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use bridge_traits::worker::{PageHost, WorkerRegistry};

use crate::error::{Result, UpdateError};
use crate::state::{UpdatePhase, UpdateState};

/// Update coordinator configuration.
#[derive(Debug, Clone)]
pub struct UpdateConfig {
    /// How long to wait for the skip-waiting acknowledgement before
    /// proceeding to the reload anyway.
    pub ack_timeout: Duration,

    /// Interval between periodic update checks.
    pub check_interval: Duration,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            ack_timeout: Duration::from_secs(3),
            check_interval: Duration::from_secs(3600),
        }
    }
}

/// Coordinates the build handoff between the page and a waiting worker.
pub struct UpdateCoordinator {
    registry: Arc<dyn WorkerRegistry>,
    page: Arc<dyn PageHost>,
    config: UpdateConfig,
    state: RwLock<UpdateState>,
    apply_lock: tokio::sync::Mutex<()>,
}

impl UpdateCoordinator {
    pub fn new(
        registry: Arc<dyn WorkerRegistry>,
        page: Arc<dyn PageHost>,
        config: UpdateConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            registry,
            page,
            config,
            state: RwLock::new(UpdateState::default()),
            apply_lock: tokio::sync::Mutex::new(()),
        })
    }

    pub fn state(&self) -> UpdateState {
        self.state.read().clone()
    }

    pub fn is_update_available(&self) -> bool {
        self.state.read().available()
    }

    pub fn is_update_applying(&self) -> bool {
        self.state.read().applying()
    }

    pub fn update_error(&self) -> Option<String> {
        self.state.read().error.clone()
    }

    fn set_phase(&self, phase: UpdatePhase) {
        let mut state = self.state.write();
        state.phase = phase;
        if phase != UpdatePhase::Error {
            state.error = None;
        }
    }

    fn set_error(&self, message: String) {
        let mut state = self.state.write();
        state.phase = UpdatePhase::Error;
        state.error = Some(message);
    }

    /// Check whether a newer build is installed but not yet controlling.
    ///
    /// Returns `true` when an update is waiting. Detection errors are
    /// surfaced to the caller but never change the state from its prior
    /// value.
    #[instrument(skip(self))]
    pub async fn check_for_updates(&self) -> Result<bool> {
        let waiting = self
            .registry
            .waiting_build()
            .await
            .map_err(|error| UpdateError::Registry(error.to_string()))?;
        let controlling = self
            .registry
            .controlling_build()
            .await
            .map_err(|error| UpdateError::Registry(error.to_string()))?;

        match waiting {
            Some(build) if controlling.as_ref() != Some(&build) => {
                info!(%build, "update available");
                if self.state.read().phase != UpdatePhase::Applying {
                    self.set_phase(UpdatePhase::Available);
                }
                Ok(true)
            }
            _ => {
                debug!("no update waiting");
                Ok(false)
            }
        }
    }

    /// Apply the waiting update.
    ///
    /// Sends exactly one uuid-tagged skip-waiting instruction, races the
    /// acknowledgement against `ack_timeout`, and schedules the reload
    /// regardless of the outcome: the authoritative success signal is the
    /// platform's controller-change event, not the acknowledgement. With no
    /// waiting build this surfaces [`UpdateError::NothingWaiting`] and sends
    /// nothing. Applies are serialized; at most one handshake is in flight.
    #[instrument(skip(self))]
    pub async fn apply_update(&self) -> Result<()> {
        let _in_flight = self.apply_lock.lock().await;

        let waiting = self
            .registry
            .waiting_build()
            .await
            .map_err(|error| UpdateError::Registry(error.to_string()))?;
        let Some(build) = waiting else {
            return Err(UpdateError::NothingWaiting);
        };

        self.set_phase(UpdatePhase::Applying);
        let instruction_id = Uuid::new_v4();
        info!(%build, %instruction_id, "sending skip-waiting instruction");

        tokio::select! {
            acknowledged = self.registry.skip_waiting(instruction_id) => match acknowledged {
                Ok(()) => debug!(%instruction_id, "worker acknowledged"),
                Err(error) => warn!(%instruction_id, %error, "skip-waiting failed; reloading anyway"),
            },
            _ = tokio::time::sleep(self.config.ack_timeout) => {
                let timeout = UpdateError::HandshakeTimeout(self.config.ack_timeout);
                warn!(%instruction_id, %timeout, "no acknowledgement; reloading anyway");
            }
        }

        match self.page.reload().await {
            Ok(()) => {
                info!(%build, "reload scheduled");
                self.set_phase(UpdatePhase::Reloaded);
                Ok(())
            }
            Err(error) => {
                let error = UpdateError::Reload(error.to_string());
                warn!(%error, "handoff failed; page stays on the current build");
                self.set_error(error.to_string());
                Err(error)
            }
        }
    }

    /// Spawn the periodic detection task. Check failures are logged and
    /// leave the state untouched.
    pub fn spawn_periodic_checks(self: &Arc<Self>) -> JoinHandle<()> {
        let coordinator = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(coordinator.config.check_interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick fires immediately; the cadence starts after it.
            interval.tick().await;
            loop {
                interval.tick().await;
                if let Err(error) = coordinator.check_for_updates().await {
                    warn!(%error, "periodic update check failed");
                }
            }
        })
    }
}
