//! Performance Command Handler

use crate::display;
use crate::error::Result;
use tracing::info;

pub async fn execute(device: String, write: bool) -> Result<()> {
    info!(
        "Querying nominal {} performance: {}",
        if write { "write" } else { "read" },
        device
    );

    let descriptors = super::with_drive(device, move |scsi| scsi.performance(write)).await?;
    display::display_performance(&descriptors, write);

    Ok(())
}
