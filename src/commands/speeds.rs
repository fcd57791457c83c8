//! Speeds Command Handler
//!
//! Handles the `speeds` subcommand: GET PERFORMANCE with write speed descriptors.

use crate::display;
use crate::error::Result;
use crate::scsi::commands::max_write_speed;
use crate::utils::format_bytes;
use tracing::info;

pub async fn execute(device: String) -> Result<()> {
    info!("Querying write speeds: {}", device);

    let descriptors = super::with_drive(device, |scsi| scsi.write_speeds()).await?;

    display::display_write_speeds(&descriptors);
    if let Some(max) = max_write_speed(&descriptors) {
        println!("  Maximum: {}/s", format_bytes(max));
    }

    Ok(())
}
