//! Sync command handlers

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::info;

use onboard_core::sync::spawn_probe;
use onboard_core::Config;

use crate::app::Controller;
use crate::output::Output;

/// Drain the outbox once
pub async fn sync(controller: &Controller, output: &Output) -> Result<()> {
    let report = controller
        .drain()
        .await
        .context("Failed to read the outbox")?;
    output.print_drain(&report);
    Ok(())
}

/// Keep draining whenever connectivity comes back, until Ctrl-C
///
/// Unless forced offline, the endpoint is probed every
/// `probe_interval_secs` to drive the connectivity flag.
pub async fn watch(
    controller: Controller,
    config: &Config,
    offline: bool,
    output: &Output,
) -> Result<()> {
    let controller = Arc::new(controller);
    let connectivity = controller.connectivity().clone();
    let mut changes = connectivity.subscribe();

    let probe = (!offline).then(|| {
        spawn_probe(
            connectivity.clone(),
            config.endpoint_url.clone(),
            config.probe_interval(),
        )
    });
    let mut watcher = controller.clone().spawn_watch();

    output.message(&format!(
        "Watching {} ({}). Press Ctrl-C to stop.",
        config.endpoint_url,
        if connectivity.is_online() { "online" } else { "offline" }
    ));

    let result = loop {
        tokio::select! {
            _ = signal::ctrl_c() => {
                info!("Watch interrupted");
                break Ok(());
            }
            finished = &mut watcher => {
                break match finished {
                    Ok(Ok(())) => Ok(()),
                    Ok(Err(e)) => Err(e).context("Store failed while draining"),
                    Err(e) => Err(e).context("Drain task panicked"),
                };
            }
            changed = changes.changed() => {
                if changed.is_err() {
                    break Ok(());
                }
                let view = controller.status().await?;
                output.print_status(&view);
            }
        }
    };

    if let Some(probe) = probe {
        probe.abort();
    }
    watcher.abort();
    result
}
