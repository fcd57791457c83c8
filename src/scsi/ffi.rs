#[cfg(windows)]
use winapi::shared::{
    minwindef::{UCHAR, ULONG, USHORT},
    ntdef::PVOID,
};

/// SCSI Pass Through Direct structure (SCSI_PASS_THROUGH_DIRECT from ntddscsi.h)
#[cfg(windows)]
#[repr(C)]
#[derive(Debug)]
pub struct ScsiPassThroughDirect {
    pub length: USHORT,
    pub scsi_status: UCHAR,
    pub path_id: UCHAR,
    pub target_id: UCHAR,
    pub lun: UCHAR,
    pub cdb_length: UCHAR,
    pub sense_info_length: UCHAR,
    pub data_in: UCHAR,
    pub data_transfer_length: ULONG,
    pub timeout_value: ULONG,
    pub data_buffer: PVOID,
    pub sense_info_offset: ULONG,
    pub cdb: [UCHAR; 16],
}

/// Pass-through header followed by its sense buffer, in one aligned block
#[cfg(windows)]
#[repr(C)]
#[derive(Debug)]
pub struct ScsiPassThroughDirectWithSense {
    pub sptd: ScsiPassThroughDirect,
    pub sense: [UCHAR; crate::scsi::constants::SENSE_INFO_LEN],
}

#[cfg(windows)]
impl ScsiPassThroughDirectWithSense {
    pub fn new() -> Self {
        Self {
            sptd: ScsiPassThroughDirect {
                length: std::mem::size_of::<ScsiPassThroughDirect>() as USHORT,
                scsi_status: 0,
                path_id: 0,
                target_id: 0,
                lun: 0,
                cdb_length: 0,
                sense_info_length: crate::scsi::constants::SENSE_INFO_LEN as UCHAR,
                data_in: 0,
                data_transfer_length: 0,
                timeout_value: 0,
                data_buffer: std::ptr::null_mut(),
                sense_info_offset: std::mem::offset_of!(ScsiPassThroughDirectWithSense, sense)
                    as ULONG,
                cdb: [0; 16],
            },
            sense: [0; crate::scsi::constants::SENSE_INFO_LEN],
        }
    }
}

#[cfg(windows)]
impl Default for ScsiPassThroughDirectWithSense {
    fn default() -> Self {
        Self::new()
    }
}

/// sg_io_hdr from <scsi/sg.h>, interface id 'S'
#[cfg(target_os = "linux")]
#[repr(C)]
#[derive(Debug)]
pub struct SgIoHdr {
    pub interface_id: libc::c_int,
    pub dxfer_direction: libc::c_int,
    pub cmd_len: libc::c_uchar,
    pub mx_sb_len: libc::c_uchar,
    pub iovec_count: libc::c_ushort,
    pub dxfer_len: libc::c_uint,
    pub dxferp: *mut libc::c_void,
    pub cmdp: *const libc::c_uchar,
    pub sbp: *mut libc::c_uchar,
    /// milliseconds
    pub timeout: libc::c_uint,
    pub flags: libc::c_uint,
    pub pack_id: libc::c_int,
    pub usr_ptr: *mut libc::c_void,
    pub status: libc::c_uchar,
    pub masked_status: libc::c_uchar,
    pub msg_status: libc::c_uchar,
    pub sb_len_wr: libc::c_uchar,
    pub host_status: libc::c_ushort,
    pub driver_status: libc::c_ushort,
    pub resid: libc::c_int,
    pub duration: libc::c_uint,
    pub info: libc::c_uint,
}

#[cfg(target_os = "linux")]
impl SgIoHdr {
    pub fn zeroed() -> Self {
        Self {
            interface_id: 0,
            dxfer_direction: 0,
            cmd_len: 0,
            mx_sb_len: 0,
            iovec_count: 0,
            dxfer_len: 0,
            dxferp: std::ptr::null_mut(),
            cmdp: std::ptr::null(),
            sbp: std::ptr::null_mut(),
            timeout: 0,
            flags: 0,
            pack_id: 0,
            usr_ptr: std::ptr::null_mut(),
            status: 0,
            masked_status: 0,
            msg_status: 0,
            sb_len_wr: 0,
            host_status: 0,
            driver_status: 0,
            resid: 0,
            duration: 0,
            info: 0,
        }
    }
}
