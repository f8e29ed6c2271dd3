//! Queue command handlers

use anyhow::Result;

use onboard_core::DurableStoreExt;

use crate::app::Controller;
use crate::output::Output;

/// List queued submissions, oldest first
pub async fn list(controller: &Controller, output: &Output) -> Result<()> {
    let items = controller.store().queued().await?;
    output.print_queue(&items);
    Ok(())
}
