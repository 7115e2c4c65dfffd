use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub const HEALTH_PATH: &str = "/health";

/// Whether the last health probe reached the endpoint.
///
/// Advisory only: sends are attempted whatever the state says.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectivityState {
    #[default]
    Unknown,
    Connected,
    Simulated,
}

impl ConnectivityState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectivityState::Unknown => "unknown",
            ConnectivityState::Connected => "connected",
            ConnectivityState::Simulated => "simulated",
        }
    }

    /// Text for the status indicator.
    pub fn display_name(&self) -> &'static str {
        match self {
            ConnectivityState::Unknown => "Conectando...",
            ConnectivityState::Connected => "Conectado",
            ConnectivityState::Simulated => "Modo simulación",
        }
    }
}

/// Owned, shareable connectivity flag. Clones observe the same state.
#[derive(Debug, Clone)]
pub struct Connectivity {
    tx: Arc<watch::Sender<ConnectivityState>>,
}

impl Default for Connectivity {
    fn default() -> Self {
        Self::new()
    }
}

impl Connectivity {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(ConnectivityState::Unknown);
        Self { tx: Arc::new(tx) }
    }

    pub fn current(&self) -> ConnectivityState {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ConnectivityState> {
        self.tx.subscribe()
    }

    fn set(&self, state: ConnectivityState) {
        self.tx.send_replace(state);
    }
}

#[derive(Clone)]
pub struct ConnectionMonitor {
    client: Client,
    base_url: String,
    timeout: Duration,
    connectivity: Connectivity,
}

impl ConnectionMonitor {
    pub fn new(base_url: &str, connectivity: Connectivity) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.to_string(),
            timeout: Duration::from_secs(5),
            connectivity,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn connectivity(&self) -> &Connectivity {
        &self.connectivity
    }

    /// Issue one health check and record the result. Never fails: any error
    /// downgrades the state to [`ConnectivityState::Simulated`].
    pub async fn probe(&self) -> ConnectivityState {
        let url = endpoint(&self.base_url, HEALTH_PATH);
        debug!(%url, "probing endpoint health");

        let state = match self.client.get(&url).timeout(self.timeout).send().await {
            Ok(response) if response.status().is_success() => ConnectivityState::Connected,
            Ok(response) => {
                warn!(
                    status = response.status().as_u16(),
                    "health probe returned non-success status"
                );
                ConnectivityState::Simulated
            }
            Err(err) => {
                warn!(error = %err, "health probe failed");
                ConnectivityState::Simulated
            }
        };

        if self.connectivity.current() != state {
            info!(state = state.as_str(), "connectivity changed");
        }
        self.connectivity.set(state);
        state
    }

    /// Re-probe every `interval`, starting immediately.
    pub fn spawn_periodic(&self, interval: Duration) -> JoinHandle<()> {
        let monitor = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                monitor.probe().await;
            }
        })
    }
}

/// Join `path` onto `base_url`, tolerating a trailing slash on the base.
pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}
