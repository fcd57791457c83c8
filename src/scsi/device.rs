//! SCSI Device Management
//!
//! Opening and closing a burner for pass-through access.

use crate::error::Result;
use tracing::debug;

#[cfg(windows)]
use std::ffi::CString;

#[cfg(windows)]
use winapi::{
    shared::ntdef::HANDLE,
    um::{
        errhandlingapi::GetLastError,
        fileapi::{CreateFileA, OPEN_EXISTING},
        handleapi::{CloseHandle, INVALID_HANDLE_VALUE},
        winnt::{FILE_SHARE_READ, FILE_SHARE_WRITE, GENERIC_READ, GENERIC_WRITE},
    },
};

/// Open connection to one drive. Owned exclusively by the caller; commands borrow it
/// mutably, so two issuers can never share it without external synchronisation.
pub struct DeviceHandle {
    #[cfg(unix)]
    pub(crate) fd: libc::c_int,
    #[cfg(windows)]
    pub(crate) handle: HANDLE,
    pub(crate) device_path: String,
}

impl DeviceHandle {
    /// Open an optical drive (`/dev/sr0`, `/dev/sg1`, `\\.\CdRom0`, `D:`)
    pub fn open(device_path: &str) -> Result<Self> {
        debug!("Opening optical device: {}", device_path);

        #[cfg(unix)]
        {
            let path_cstring = std::ffi::CString::new(device_path).map_err(|e| {
                crate::error::RustBurnError::system(format!("Device path conversion error: {}", e))
            })?;

            // O_NONBLOCK lets the open succeed on a drive with no medium or an open tray
            let fd = unsafe {
                libc::open(
                    path_cstring.as_ptr(),
                    libc::O_RDWR | libc::O_NONBLOCK,
                )
            };
            if fd < 0 {
                let err = std::io::Error::last_os_error();
                return Err(crate::error::RustBurnError::scsi_transport(
                    err.raw_os_error().unwrap_or(-1),
                    format!("Cannot open device {}: {}", device_path, err),
                ));
            }

            debug!("Device opened successfully: {}", device_path);
            Ok(Self {
                fd,
                device_path: device_path.to_string(),
            })
        }

        #[cfg(windows)]
        {
            let full_path = if device_path.starts_with(r"\\.\") {
                device_path.to_string()
            } else {
                format!(r"\\.\{}", device_path)
            };

            let path_cstring = CString::new(full_path.clone()).map_err(|e| {
                crate::error::RustBurnError::system(format!("Device path conversion error: {}", e))
            })?;

            unsafe {
                let handle = CreateFileA(
                    path_cstring.as_ptr(),
                    GENERIC_READ | GENERIC_WRITE,
                    FILE_SHARE_READ | FILE_SHARE_WRITE,
                    std::ptr::null_mut(),
                    OPEN_EXISTING,
                    0,
                    std::ptr::null_mut(),
                );

                if handle == INVALID_HANDLE_VALUE {
                    let error_code = GetLastError();
                    return Err(crate::error::RustBurnError::scsi_transport(
                        error_code as i32,
                        format!(
                            "Cannot open device {}: Windows error code 0x{:08X}",
                            full_path, error_code
                        ),
                    ));
                }

                debug!("Device opened successfully: {}", full_path);
                Ok(Self {
                    handle,
                    device_path: full_path,
                })
            }
        }

        #[cfg(not(any(unix, windows)))]
        {
            Err(crate::error::RustBurnError::unsupported(format!(
                "No SCSI pass-through backend for this platform ({})",
                device_path
            )))
        }
    }

    pub fn path(&self) -> &str {
        &self.device_path
    }

    /// Explicit close. Dropping the handle has the same effect.
    pub fn close(self) {
        drop(self);
    }
}

/// Release the OS handle on every path, including early error returns
impl Drop for DeviceHandle {
    fn drop(&mut self) {
        #[cfg(unix)]
        unsafe {
            if self.fd >= 0 {
                libc::close(self.fd);
                self.fd = -1;
                debug!("Device handle closed: {}", self.device_path);
            }
        }

        #[cfg(windows)]
        unsafe {
            if self.handle != INVALID_HANDLE_VALUE {
                CloseHandle(self.handle);
                self.handle = INVALID_HANDLE_VALUE;
                debug!("Device handle closed: {}", self.device_path);
            }
        }
    }
}
