//! Probe-based connectivity monitor.
//!
//! Desktop hosts rarely expose a reliable native online/offline signal, so
//! this monitor answers with an HTTP probe and emits transitions from a
//! polling stream.

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use bridge_traits::connectivity::{
    ConnectivityChangeStream, ConnectivityMonitor, ConnectivityState,
};
use bridge_traits::error::{BridgeError, Result};

const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Connectivity monitor that probes a well-known endpoint.
pub struct ProbeConnectivityMonitor {
    client: reqwest::Client,
    probe_url: String,
    poll_interval: Duration,
}

impl ProbeConnectivityMonitor {
    pub fn new(probe_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_PROBE_TIMEOUT)
            .build()
            .map_err(|error| BridgeError::OperationFailed(format!("building client: {error}")))?;
        Ok(Self {
            client,
            probe_url: probe_url.into(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        })
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    async fn probe(client: &reqwest::Client, probe_url: &str) -> ConnectivityState {
        match client.head(probe_url).send().await {
            Ok(_) => ConnectivityState::Online,
            Err(error) => {
                debug!(%error, "connectivity probe failed");
                ConnectivityState::Offline
            }
        }
    }
}

#[async_trait]
impl ConnectivityMonitor for ProbeConnectivityMonitor {
    async fn state(&self) -> Result<ConnectivityState> {
        Ok(Self::probe(&self.client, &self.probe_url).await)
    }

    async fn subscribe_changes(&self) -> Result<Box<dyn ConnectivityChangeStream>> {
        Ok(Box::new(ProbePollingStream {
            client: self.client.clone(),
            probe_url: self.probe_url.clone(),
            poll_interval: self.poll_interval,
            last: None,
        }))
    }
}

struct ProbePollingStream {
    client: reqwest::Client,
    probe_url: String,
    poll_interval: Duration,
    last: Option<ConnectivityState>,
}

#[async_trait]
impl ConnectivityChangeStream for ProbePollingStream {
    async fn next(&mut self) -> Option<ConnectivityState> {
        loop {
            tokio::time::sleep(self.poll_interval).await;
            let current =
                ProbeConnectivityMonitor::probe(&self.client, &self.probe_url).await;
            if self.last != Some(current) {
                self.last = Some(current);
                return Some(current);
            }
        }
    }
}
