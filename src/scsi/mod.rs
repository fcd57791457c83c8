//! SCSI / MMC transport
//!
//! Command descriptor blocks, the blocking pass-through transport, and the
//! variable-length response protocol used by the MMC queries.

pub mod command;
pub mod commands;
pub mod constants;
pub mod core;
pub mod device;
pub mod ffi;
pub mod layout;
pub mod response;
pub mod sense;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use self::core::{ScsiInterface, ScsiTransport};
pub use command::ScsiCommand;
pub use constants::*;
pub use device::DeviceHandle;
pub use layout::{BitLayout, BitOrder};
pub use response::{Descriptor, VariableLengthQuery, VariableResponse};
pub use sense::SenseData;
pub use types::{CommandInfo, Direction, DiscStatus};
