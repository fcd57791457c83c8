//! Disc Info Command Handler
//!
//! Handles the `disc-info` subcommand: READ DISC INFORMATION on the loaded medium.

use crate::display;
use crate::error::Result;
use tracing::info;

pub async fn execute(device: String) -> Result<()> {
    info!("Reading disc information: {}", device);

    let disc_info = super::with_drive(device, |scsi| scsi.disc_information()).await?;
    display::display_disc_info(&disc_info);

    Ok(())
}
