//! Command Handlers Module
//!
//! This module contains handlers for all CLI subcommands.

pub mod check;
pub mod disc_info;
pub mod performance;
pub mod speeds;

use crate::error::{Result, RustBurnError};
use crate::scsi::ScsiInterface;

/// Open `device` and run `query` on a blocking worker thread
pub(crate) async fn with_drive<T, F>(device: String, query: F) -> Result<T>
where
    F: FnOnce(&mut ScsiInterface) -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut scsi = ScsiInterface::new();
        scsi.open_device(&device)?;
        query(&mut scsi)
    })
    .await
    .map_err(|e| RustBurnError::system(format!("Drive query task failed: {}", e)))?
}
