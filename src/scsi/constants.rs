// SCSI / MMC constant definitions
pub const SENSE_INFO_LEN: usize = 64;

/// Largest CDB the command builder hands out (MMC uses 6, 10 and 12 byte blocks)
pub const SCSI_CMD_MAX_LEN: usize = 16;

/// Timeout applied to every pass-through call, in seconds
pub const DEFAULT_TIMEOUT_SECS: u32 = 10;

/// Upper bound for a variable-length response buffer
pub const MAX_RESPONSE_SIZE: usize = 2048;

// SCSI data direction (Windows SCSI_PASS_THROUGH_DIRECT values)
pub const SCSI_IOCTL_DATA_IN: u8 = 1;
pub const SCSI_IOCTL_DATA_OUT: u8 = 0;

#[cfg(windows)]
pub const IOCTL_SCSI_PASS_THROUGH_DIRECT: u32 = 0x0004D014;

// Linux sg driver
#[cfg(target_os = "linux")]
pub const SG_IO: libc::c_ulong = 0x2285;
#[cfg(target_os = "linux")]
pub const SG_DXFER_NONE: i32 = -1;
#[cfg(target_os = "linux")]
pub const SG_DXFER_TO_DEV: i32 = -2;
#[cfg(target_os = "linux")]
pub const SG_DXFER_FROM_DEV: i32 = -3;
#[cfg(target_os = "linux")]
pub const SG_INFO_OK_MASK: u32 = 0x1;

// MMC operation codes
pub mod mmc_commands {
    pub const READ_DISC_INFORMATION: u8 = 0x51;
    pub const GET_PERFORMANCE: u8 = 0xAC;
}

/// GET PERFORMANCE "type" selector
pub mod performance_types {
    pub const PERFORMANCE: u8 = 0x00;
    pub const WRITE_SPEED: u8 = 0x03;
}

pub mod sector_sizes {
    /// Mode 1 user data per CD sector
    pub const CD_SECTOR_SIZE: u64 = 2048;
    /// Sectors played per second of CD audio
    pub const SECTORS_PER_SECOND: i64 = 75;
}
