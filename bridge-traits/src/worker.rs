//! Worker Registry and Page Host Abstractions
//!
//! The update coordinator and the interception worker run on independent
//! event loops and coordinate the build handoff exclusively through these two
//! seams: the registry (queries about installed builds plus the acknowledged
//! skip-waiting instruction) and the page host (reload/claim on the page
//! side).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::Result;

/// An opaque build identifier, also used as the epoch tag qualifying tier
/// names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BuildVersion(String);

impl BuildVersion {
    pub fn new(version: impl Into<String>) -> Self {
        Self(version.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BuildVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Worker registry trait
///
/// The page-side view of worker lifecycle state. A build that has finished
/// installing but does not yet control the page is "waiting"; the update
/// coordinator promotes it by sending a skip-waiting instruction.
///
/// # Acknowledgement Semantics
///
/// `skip_waiting` resolves when the waiting worker acknowledges the
/// instruction. A waiting worker may never answer (wedged, killed, paused by
/// the platform), so callers must bound the wait themselves; the registry
/// applies no timeout of its own. The authoritative handoff signal is the
/// controller-change stream, not the acknowledgement.
#[async_trait]
pub trait WorkerRegistry: Send + Sync {
    /// The build that is installed and waiting to take control, if any.
    async fn waiting_build(&self) -> Result<Option<BuildVersion>>;

    /// The build currently controlling the page, if any.
    async fn controlling_build(&self) -> Result<Option<BuildVersion>>;

    /// Instruct the waiting worker to stop waiting and take control.
    ///
    /// `instruction_id` correlates the acknowledgement with exactly one apply
    /// attempt. Resolves once the worker acknowledges this instruction.
    async fn skip_waiting(&self, instruction_id: Uuid) -> Result<()>;

    /// Subscribe to controller changes.
    ///
    /// Emits the new controlling build whenever a worker finishes activating
    /// and claims the page.
    async fn subscribe_controller_changes(&self) -> Result<Box<dyn ControllerChangeStream>>;
}

/// Stream of controller-change notifications
#[async_trait]
pub trait ControllerChangeStream: Send {
    /// Get the build that just took control.
    ///
    /// Returns `None` when the stream is closed.
    async fn next(&mut self) -> Option<BuildVersion>;
}

/// Page host trait
///
/// What the engine may do to the page itself during a handoff.
#[async_trait]
pub trait PageHost: Send + Sync {
    /// Reload the page so it boots under the new controlling build.
    async fn reload(&self) -> Result<()>;

    /// Take control of currently-open pages without waiting for a reload.
    async fn claim(&self) -> Result<()>;
}
