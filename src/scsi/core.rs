//! SCSI Core Implementation
//!
//! The transport seam and its pass-through implementation for `DeviceHandle`.

use crate::error::Result;
use tracing::{debug, warn};

use super::constants::*;
use super::device::DeviceHandle;
use super::types::Direction;

#[cfg(any(target_os = "linux", windows))]
use super::sense::SenseData;

/// One blocking command/response exchange with a drive.
///
/// Returns the number of bytes actually transferred. Errors are either
/// `ScsiTransport` (the OS call failed) or `ScsiDevice` (the drive answered with
/// CHECK CONDITION). No retry happens at this level.
pub trait ScsiTransport {
    fn execute(
        &mut self,
        cdb: &[u8],
        direction: Direction,
        buffer: &mut [u8],
        timeout_secs: u32,
    ) -> Result<usize>;
}

impl<T: ScsiTransport + ?Sized> ScsiTransport for &mut T {
    fn execute(
        &mut self,
        cdb: &[u8],
        direction: Direction,
        buffer: &mut [u8],
        timeout_secs: u32,
    ) -> Result<usize> {
        (**self).execute(cdb, direction, buffer, timeout_secs)
    }
}

impl ScsiTransport for DeviceHandle {
    #[cfg(target_os = "linux")]
    fn execute(
        &mut self,
        cdb: &[u8],
        direction: Direction,
        buffer: &mut [u8],
        timeout_secs: u32,
    ) -> Result<usize> {
        use super::ffi::SgIoHdr;

        let mut sense_buffer = [0u8; SENSE_INFO_LEN];
        let mut hdr = SgIoHdr::zeroed();

        hdr.interface_id = b'S' as libc::c_int;
        hdr.dxfer_direction = if buffer.is_empty() {
            SG_DXFER_NONE
        } else if direction.contains(Direction::READ) {
            SG_DXFER_FROM_DEV
        } else {
            SG_DXFER_TO_DEV
        };
        hdr.cmd_len = cdb.len() as libc::c_uchar;
        hdr.cmdp = cdb.as_ptr();
        hdr.mx_sb_len = SENSE_INFO_LEN as libc::c_uchar;
        hdr.sbp = sense_buffer.as_mut_ptr();
        hdr.dxfer_len = buffer.len() as libc::c_uint;
        hdr.dxferp = if buffer.is_empty() {
            std::ptr::null_mut()
        } else {
            buffer.as_mut_ptr() as *mut libc::c_void
        };
        hdr.timeout = timeout_secs.saturating_mul(1000);

        let rc = unsafe { libc::ioctl(self.fd, SG_IO as _, &mut hdr as *mut SgIoHdr) };
        if rc < 0 {
            let err = std::io::Error::last_os_error();
            warn!("SG_IO ioctl failed on {}: {}, CDB: {:02X?}", self.device_path, err, cdb);
            return Err(crate::error::RustBurnError::scsi_transport(
                err.raw_os_error().unwrap_or(-1),
                err.to_string(),
            ));
        }

        if hdr.info & SG_INFO_OK_MASK != 0 {
            let written = (hdr.sb_len_wr as usize).min(SENSE_INFO_LEN);
            if let Some(sense) = SenseData::parse(&sense_buffer[..written]) {
                warn!("Command 0x{:02X} failed: {}", cdb[0], sense.describe());
                return Err(crate::error::RustBurnError::scsi_device(sense.describe()));
            }
            warn!(
                "Command 0x{:02X} failed: host status 0x{:04X}, driver status 0x{:04X}",
                cdb[0], hdr.host_status, hdr.driver_status
            );
            return Err(crate::error::RustBurnError::scsi_transport(
                libc::EIO,
                format!(
                    "host status 0x{:04X}, driver status 0x{:04X}",
                    hdr.host_status, hdr.driver_status
                ),
            ));
        }

        let resid = hdr.resid.max(0) as usize;
        let transferred = buffer.len().saturating_sub(resid);
        debug!(
            "Command 0x{:02X} completed, {} of {} bytes transferred",
            cdb[0],
            transferred,
            buffer.len()
        );
        Ok(transferred)
    }

    #[cfg(windows)]
    fn execute(
        &mut self,
        cdb: &[u8],
        direction: Direction,
        buffer: &mut [u8],
        timeout_secs: u32,
    ) -> Result<usize> {
        use super::ffi::ScsiPassThroughDirectWithSense;
        use winapi::{
            shared::{
                minwindef::{DWORD, UCHAR, ULONG},
                ntdef::PVOID,
            },
            um::{errhandlingapi::GetLastError, ioapiset::DeviceIoControl},
        };

        let mut request = ScsiPassThroughDirectWithSense::new();
        request.sptd.cdb_length = cdb.len() as UCHAR;
        request.sptd.cdb[..cdb.len()].copy_from_slice(cdb);
        request.sptd.data_in = if direction.contains(Direction::READ) {
            SCSI_IOCTL_DATA_IN
        } else {
            SCSI_IOCTL_DATA_OUT
        };
        request.sptd.data_transfer_length = buffer.len() as ULONG;
        request.sptd.timeout_value = timeout_secs;
        request.sptd.data_buffer = if buffer.is_empty() {
            std::ptr::null_mut()
        } else {
            buffer.as_mut_ptr() as PVOID
        };

        let request_ptr = &mut request as *mut ScsiPassThroughDirectWithSense as PVOID;
        let request_len = std::mem::size_of::<ScsiPassThroughDirectWithSense>() as DWORD;
        let mut bytes_returned: DWORD = 0;
        let result = unsafe {
            DeviceIoControl(
                self.handle,
                IOCTL_SCSI_PASS_THROUGH_DIRECT,
                request_ptr,
                request_len,
                request_ptr,
                request_len,
                &mut bytes_returned,
                std::ptr::null_mut(),
            ) != 0
        };

        if !result {
            let error_code = unsafe { GetLastError() };
            warn!(
                "SCSI command failed: Windows error code 0x{:08X}, CDB: {:02X?}",
                error_code, cdb
            );
            return Err(crate::error::RustBurnError::scsi_transport(
                error_code as i32,
                format!("DeviceIoControl failed with 0x{:08X}", error_code),
            ));
        }

        if request.sptd.scsi_status != 0 {
            let description = SenseData::parse(&request.sense)
                .map(|s| s.describe())
                .unwrap_or_else(|| format!("SCSI status 0x{:02X}", request.sptd.scsi_status));
            warn!("Command 0x{:02X} failed: {}", cdb[0], description);
            return Err(crate::error::RustBurnError::scsi_device(description));
        }

        Ok(request.sptd.data_transfer_length as usize)
    }

    #[cfg(not(any(target_os = "linux", windows)))]
    fn execute(
        &mut self,
        cdb: &[u8],
        direction: Direction,
        buffer: &mut [u8],
        timeout_secs: u32,
    ) -> Result<usize> {
        let _ = (cdb, direction, buffer, timeout_secs);
        Err(crate::error::RustBurnError::unsupported(
            "No SCSI pass-through backend for this platform",
        ))
    }
}

/// Drive-level facade over an optional open handle
pub struct ScsiInterface {
    pub(crate) device_handle: Option<DeviceHandle>,
}

impl ScsiInterface {
    /// Create new SCSI interface instance
    pub fn new() -> Self {
        Self {
            device_handle: None,
        }
    }

    pub fn open_device(&mut self, device_path: &str) -> Result<()> {
        self.device_handle = Some(DeviceHandle::open(device_path)?);
        Ok(())
    }

    pub fn close_device(&mut self) {
        if let Some(handle) = self.device_handle.take() {
            handle.close();
        }
    }

    pub fn is_open(&self) -> bool {
        self.device_handle.is_some()
    }

    pub(crate) fn handle_mut(&mut self) -> Result<&mut DeviceHandle> {
        self.device_handle
            .as_mut()
            .ok_or_else(|| crate::error::RustBurnError::scsi("Device not opened"))
    }

    /// Write speeds supported for the loaded medium
    pub fn write_speeds(&mut self) -> Result<Vec<super::commands::WriteSpeedDescriptor>> {
        let handle = self.handle_mut()?;
        let response = super::commands::mmc3_get_performance_wrt_spd_desc(handle)?;
        Ok(response.descriptors().collect())
    }

    /// Nominal read or write performance curve
    pub fn performance(&mut self, write: bool) -> Result<Vec<super::commands::PerformanceDescriptor>> {
        let handle = self.handle_mut()?;
        let response = super::commands::mmc2_get_performance_perf_desc(handle, write)?;
        Ok(response.descriptors().collect())
    }

    pub fn disc_information(&mut self) -> Result<super::commands::DiscInfo> {
        let handle = self.handle_mut()?;
        super::commands::read_disc_information(handle)
    }
}

impl Default for ScsiInterface {
    fn default() -> Self {
        Self::new()
    }
}

/// Implement Drop trait to ensure SCSI interface is properly cleaned up
impl Drop for ScsiInterface {
    fn drop(&mut self) {
        self.close_device();
        debug!("SCSI interface cleanup completed");
    }
}
