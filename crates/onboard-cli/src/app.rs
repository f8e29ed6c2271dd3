//! Controller setup shared by all store-backed commands

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;

use onboard_core::storage::DurableStore;
use onboard_core::{
    Config, Connectivity, ControllerOptions, HttpTransport, MemoryStore, SqliteStore,
    SyncController,
};

/// The controller every command works through
pub type Controller = SyncController<dyn DurableStore, HttpTransport>;

/// How to open the store and decide connectivity
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenOptions {
    /// Treat the host as offline; no request leaves the machine
    pub offline: bool,
    /// Keep everything in memory for this run only
    pub ephemeral: bool,
}

/// Open the store and build a controller from `config`
///
/// Unless forced offline, the endpoint is probed once to seed the
/// connectivity flag.
pub async fn open(config: &Config, options: OpenOptions) -> Result<Controller> {
    let store: Arc<dyn DurableStore> = if options.ephemeral {
        Arc::new(MemoryStore::new())
    } else {
        let store = SqliteStore::open_with_config(config).with_context(|| {
            format!("Failed to open store at {}", config.store_path().display())
        })?;
        Arc::new(store)
    };

    let transport = HttpTransport::new(&config.endpoint_url, config.request_timeout())
        .context("Failed to create HTTP client")?;

    let online = if options.offline {
        false
    } else {
        transport.probe().await
    };
    debug!("Endpoint {} reachable: {}", config.endpoint_url, online);

    Ok(SyncController::new(
        store,
        transport,
        Connectivity::new(online),
        ControllerOptions::from_config(config),
    ))
}

/// In-memory, offline controller for command tests
#[cfg(test)]
pub fn test_controller() -> Controller {
    let store: Arc<dyn DurableStore> = Arc::new(MemoryStore::new());
    let transport = HttpTransport::new("http://127.0.0.1:9/", None).expect("client builds");
    SyncController::new(
        store,
        transport,
        Connectivity::new(false),
        ControllerOptions::default(),
    )
}
