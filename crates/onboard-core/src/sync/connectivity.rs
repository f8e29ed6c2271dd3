//! Connectivity signal
//!
//! The online flag lives in a `watch` channel. Hosts with real network
//! events push transitions with `set_online`; hosts without them run
//! `spawn_probe`, which polls the endpoint and pushes the result.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Shared online/offline flag
#[derive(Debug, Clone)]
pub struct Connectivity {
    tx: Arc<watch::Sender<bool>>,
}

impl Connectivity {
    pub fn new(online: bool) -> Self {
        let (tx, _rx) = watch::channel(online);
        Self { tx: Arc::new(tx) }
    }

    /// Current state
    pub fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    /// Record the current state; returns true if it changed
    pub fn set_online(&self, online: bool) -> bool {
        let changed = self.tx.send_if_modified(|current| {
            if *current == online {
                false
            } else {
                *current = online;
                true
            }
        });
        if changed {
            info!(online, "Connectivity changed");
        }
        changed
    }

    /// Receiver that wakes on every transition
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

/// Check once whether the endpoint is reachable
///
/// Any HTTP response counts as online; only a transport failure is offline.
pub async fn probe(client: &reqwest::Client, url: &str) -> bool {
    match client.head(url).send().await {
        Ok(response) => {
            debug!(status = response.status().as_u16(), "Connectivity probe answered");
            true
        }
        Err(e) => {
            debug!(error = %e, "Connectivity probe failed");
            false
        }
    }
}

/// Poll `url` every `interval` and feed the result into `connectivity`
///
/// Stands in for browser online/offline events on hosts that have none.
pub fn spawn_probe(connectivity: Connectivity, url: String, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let client = match reqwest::Client::builder()
            .timeout(interval.min(Duration::from_secs(10)))
            .build()
        {
            Ok(client) => client,
            Err(e) => {
                warn!(error = %e, "Could not build probe client");
                return;
            }
        };

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let online = probe(&client, &url).await;
            connectivity.set_online(online);
        }
    })
}
